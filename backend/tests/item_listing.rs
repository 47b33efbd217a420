//! List-endpoint parameter handling: ordering selection and visibility
//! scoping.

use stockledger_backend::repositories::item::{ItemOrdering, OrderField, Scope};

#[test]
fn ordering_accepts_all_exposed_fields() {
    for (raw, field) in [
        ("name", OrderField::Name),
        ("quantity", OrderField::Quantity),
        ("price", OrderField::Price),
        ("date_added", OrderField::DateAdded),
        ("last_updated", OrderField::LastUpdated),
    ] {
        let asc = ItemOrdering::parse(raw).expect("ascending");
        assert_eq!(asc.field, field);
        assert!(!asc.descending);

        let desc = ItemOrdering::parse(&format!("-{}", raw)).expect("descending");
        assert_eq!(desc.field, field);
        assert!(desc.descending);
    }
}

#[test]
fn ordering_rejects_unexposed_columns() {
    for raw in ["user_id", "password_hash", "id", "-unknown", "PRICE"] {
        assert!(ItemOrdering::parse(raw).is_none(), "{raw} must not sort");
    }
}

#[test]
fn default_ordering_is_newest_update_first() {
    let ordering = ItemOrdering::default();
    assert_eq!(ordering.field, OrderField::LastUpdated);
    assert!(ordering.descending);
}

#[test]
fn staff_scope_is_unrestricted() {
    assert!(matches!(Scope::for_caller("staff-1", true), Scope::All));
}

#[test]
fn non_staff_scope_is_owner_bound() {
    match Scope::for_caller("user-1", false) {
        Scope::Owner(owner) => assert_eq!(owner, "user-1"),
        Scope::All => panic!("non-staff caller must not see all items"),
    }
}
