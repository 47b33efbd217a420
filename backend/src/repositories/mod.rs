pub mod change_log;
pub mod item;
pub mod refresh_token;
pub mod user;
