use sgp_procurement_api::access::{Principal, ReadScope, Role};

#[test]
fn superadmin_scope_covers_all_rows() {
    let admin = Principal::new(1, Role::Superadmin);
    assert_eq!(admin.request_read_scope(), ReadScope::All);

    // Any owner id is visible
    for owner in [1, 7, 9, 1000] {
        assert!(admin.request_read_scope().permits(owner));
    }
}

#[test]
fn user_scope_is_limited_to_own_rows() {
    let user = Principal::new(7, Role::User);
    let scope = user.request_read_scope();

    assert_eq!(scope, ReadScope::OwnedBy(7));
    assert!(scope.permits(7));
    assert!(!scope.permits(9));
    assert_eq!(scope.owner_filter(), Some(7));
}

#[test]
fn user_cannot_mutate_foreign_requests() {
    // principal {role: user, id: 7} attempting a mutation on a row owned
    // by user 9 must be denied
    let user = Principal::new(7, Role::User);
    assert!(!user.can_update_request(9));
    assert!(!user.can_delete_request(9));

    // while the superadmin may touch anything
    let admin = Principal::new(1, Role::Superadmin);
    assert!(admin.can_update_request(9));
    assert!(admin.can_delete_request(9));
}

#[test]
fn venue_capabilities_split_by_role() {
    let admin = Principal::new(1, Role::Superadmin);
    let user = Principal::new(7, Role::User);

    assert!(admin.can_create_venue() && admin.can_update_venue() && admin.can_delete_venue());
    assert!(!user.can_create_venue() && !user.can_update_venue() && !user.can_delete_venue());

    // Request creation is open to every authenticated principal
    assert!(admin.can_create_request());
    assert!(user.can_create_request());
}

#[test]
fn role_serializes_as_lowercase_wire_values() {
    assert_eq!(serde_json::to_value(Role::Superadmin).unwrap(), "superadmin");
    assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");

    let role: Role = serde_json::from_value(serde_json::json!("superadmin")).unwrap();
    assert_eq!(role, Role::Superadmin);
}
