use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockledger_backend::{config::Config, db::connection::create_pool, handlers, middleware};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockledger_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        refresh_token_expiration_days = config.refresh_token_expiration_days,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = (pool.clone(), config.clone());
    let auth_layer = axum_middleware::from_fn_with_state(state.clone(), middleware::auth::auth);

    // Registration is open; listing the collection requires auth.
    let user_collection = post(handlers::users::register)
        .merge(get(handlers::users::list_users).route_layer(auth_layer.clone()));

    let public_routes = Router::new()
        .route("/users", user_collection)
        .route("/users/user_login", post(handlers::auth::login))
        .route("/token", post(handlers::auth::login))
        .route("/token/refresh", post(handlers::auth::refresh));

    let protected_routes = Router::new()
        .route(
            "/inventory",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route("/inventory/levels", get(handlers::items::levels))
        .route(
            "/inventory/{id}",
            get(handlers::items::get_item)
                .patch(handlers::items::update_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route("/inventory/{id}/history", get(handlers::items::history))
        .route(
            "/inventory/{id}/adjust_quantity",
            post(handlers::items::adjust_quantity),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/user_logout", post(handlers::auth::logout))
        .route_layer(auth_layer);

    // Compose app with shared layers (CORS/Trace) and shared state
    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.bind_port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
