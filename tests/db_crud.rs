//! Database CRUD, soft-delete and API-key lookup tests

mod common;

use common::*;
use gympay::models::{PaymentMode, PaymentStatus};

#[test]
fn tenant_soft_delete_is_recorded_not_removed() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");

    assert!(queries::soft_delete_tenant(&conn, &tenant.id).unwrap());
    // Second delete is a no-op
    assert!(!queries::soft_delete_tenant(&conn, &tenant.id).unwrap());

    // Row survives with a deletion timestamp
    let fetched = queries::get_tenant_by_id(&conn, &tenant.id)
        .unwrap()
        .expect("soft-deleted tenant still readable by id");
    assert!(fetched.deleted_at.is_some());

    // Default listing hides it; include_deleted shows it
    assert!(queries::list_tenants(&conn, false).unwrap().is_empty());
    assert_eq!(queries::list_tenants(&conn, true).unwrap().len(), 1);
}

#[test]
fn branch_soft_delete_hides_from_listing() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "North");
    create_test_branch(&conn, &tenant.id, "South");

    assert!(queries::soft_delete_branch(&conn, &branch.id).unwrap());

    let remaining = queries::list_branches(&conn, &tenant.id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "South");
    assert_eq!(queries::count_branches(&conn, &tenant.id).unwrap(), 1);
}

#[test]
fn staff_api_key_lookup() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let (staff, api_key) =
        create_test_staff(&conn, &tenant.id, "Ravi Kumar", StaffRole::Staff, None);

    let found = queries::get_staff_by_api_key(&conn, &api_key)
        .unwrap()
        .expect("staff found by key");
    assert_eq!(found.id, staff.id);

    assert!(queries::get_staff_by_api_key(&conn, "gyk_wrong")
        .unwrap()
        .is_none());

    // A deleted account's key stops working
    assert!(queries::soft_delete_staff(&conn, &staff.id).unwrap());
    assert!(queries::get_staff_by_api_key(&conn, &api_key)
        .unwrap()
        .is_none());
}

#[test]
fn api_keys_are_stored_hashed() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let (staff, api_key) =
        create_test_staff(&conn, &tenant.id, "Ravi Kumar", StaffRole::Staff, None);

    assert!(api_key.starts_with("gyk_"));
    assert_ne!(staff.api_key_hash, api_key);
    assert!(!staff.api_key_hash.contains(&api_key));
}

#[test]
fn staff_permissions_round_trip() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    let (staff, _) = create_test_staff(&conn, &tenant.id, "Ravi Kumar", StaffRole::Staff, None);

    // Created without explicit permissions: defaults to nothing granted
    let perms = queries::get_staff_permissions(&conn, &staff.id)
        .unwrap()
        .expect("default permission row exists");
    assert!(!perms.allows(Capability::AccessPayments));
    assert!(perms.branch_ids.is_empty());

    let update = PermissionSet {
        access_payments: true,
        manage_members: true,
        branch_ids: vec![branch.id.clone()],
        ..Default::default()
    };
    queries::set_staff_permissions(&conn, &staff.id, &update).unwrap();

    let perms = queries::get_staff_permissions(&conn, &staff.id)
        .unwrap()
        .unwrap();
    assert!(perms.allows(Capability::AccessPayments));
    assert!(perms.allows(Capability::ManageMembers));
    assert!(!perms.allows(Capability::AccessLedger));
    assert_eq!(perms.branch_ids, vec![branch.id.clone()]);
    assert!(perms.covers_branch(&branch.id));
    assert!(!perms.covers_branch("gy_br_other"));
}

#[test]
fn platform_admin_api_key_lookup() {
    let conn = setup_test_db();
    let api_key = queries::generate_api_key();
    let admin = queries::create_platform_admin(&conn, "Root", &api_key).unwrap();

    let found = queries::get_platform_admin_by_api_key(&conn, &api_key)
        .unwrap()
        .expect("admin found by key");
    assert_eq!(found.id, admin.id);
    assert!(queries::get_platform_admin_by_api_key(&conn, "gyk_wrong")
        .unwrap()
        .is_none());
}

#[test]
fn duplicate_gateway_payment_id_is_rejected_by_schema() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    let member = create_test_member(&conn, &branch.id, "Asha Rao", "9876543210");

    queries::create_payment(
        &conn,
        &branch.id,
        Some(&member.id),
        None,
        None,
        170_000,
        PaymentMode::Online,
        PaymentStatus::Success,
        Some("order_abc"),
        Some("pay_xyz"),
    )
    .unwrap();

    // Last-resort uniqueness: even if the handler-level replay check is
    // bypassed, the same gateway payment id cannot land twice.
    let dup = queries::create_payment(
        &conn,
        &branch.id,
        Some(&member.id),
        None,
        None,
        170_000,
        PaymentMode::Online,
        PaymentStatus::Success,
        Some("order_abc"),
        Some("pay_xyz"),
    );
    assert!(dup.is_err());
    assert_eq!(queries::count_branch_payments(&conn, &branch.id).unwrap(), 1);

    // Cash payments carry no gateway id and are unaffected
    queries::create_payment(
        &conn,
        &branch.id,
        Some(&member.id),
        None,
        None,
        50_000,
        PaymentMode::Cash,
        PaymentStatus::Success,
        None,
        None,
    )
    .unwrap();
    queries::create_payment(
        &conn,
        &branch.id,
        Some(&member.id),
        None,
        None,
        50_000,
        PaymentMode::Cash,
        PaymentStatus::Success,
        None,
        None,
    )
    .unwrap();
    assert_eq!(queries::count_branch_payments(&conn, &branch.id).unwrap(), 3);
}

#[test]
fn member_phone_unique_per_branch() {
    let conn = setup_test_db();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch_a = create_test_branch(&conn, &tenant.id, "North");
    let branch_b = create_test_branch(&conn, &tenant.id, "South");

    create_test_member(&conn, &branch_a.id, "Asha Rao", "9876543210");
    assert!(queries::get_member_by_phone(&conn, &branch_a.id, "9876543210")
        .unwrap()
        .is_some());

    // Same phone in a different branch is a different person
    create_test_member(&conn, &branch_b.id, "Asha Rao", "9876543210");
    assert_eq!(queries::list_members(&conn, &branch_b.id).unwrap().len(), 1);
}
