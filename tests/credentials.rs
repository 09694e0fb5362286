//! Credential resolver precedence tests

mod common;

use common::*;
use gympay::credentials::{resolve_for_branch, ResolvedCredential};
use gympay::error::AppError;

#[test]
fn branch_credential_wins_when_verified() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");

    let tenant_cred = test_credential("rzp_test_tenant01");
    let branch_cred = test_credential("rzp_test_branch01");
    set_tenant_credential(&conn, &master_key, &tenant.id, &tenant_cred, true);
    set_branch_credential(&conn, &master_key, &branch.id, &branch_cred, true);

    let platform = test_credential("rzp_test_platform");
    let resolved =
        resolve_for_branch(&conn, &master_key, Some(&platform), &branch.id).unwrap();

    assert!(matches!(resolved, ResolvedCredential::Branch(_)));
    assert_eq!(resolved.credential().key_id, "rzp_test_branch01");
}

#[test]
fn unverified_branch_credential_is_skipped() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");

    set_branch_credential(
        &conn,
        &master_key,
        &branch.id,
        &test_credential("rzp_test_branch01"),
        false,
    );
    set_tenant_credential(
        &conn,
        &master_key,
        &tenant.id,
        &test_credential("rzp_test_tenant01"),
        true,
    );

    let resolved = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap();

    assert!(matches!(resolved, ResolvedCredential::Tenant(_)));
    assert_eq!(resolved.credential().key_id, "rzp_test_tenant01");
}

#[test]
fn platform_default_is_last_resort() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");

    let platform = test_credential("rzp_test_platform");
    let resolved =
        resolve_for_branch(&conn, &master_key, Some(&platform), &branch.id).unwrap();

    assert!(matches!(resolved, ResolvedCredential::Platform(_)));
    assert_eq!(resolved.credential().key_id, "rzp_test_platform");
}

#[test]
fn empty_chain_is_not_configured() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");

    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::GatewayNotConfigured));

    // No cross-tenant fallback: another tenant's credential changes nothing.
    let other = create_test_tenant(&conn, "Gym B");
    set_tenant_credential(
        &conn,
        &master_key,
        &other.id,
        &test_credential("rzp_test_other01"),
        true,
    );
    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::GatewayNotConfigured));
}

#[test]
fn unknown_branch_is_not_found() {
    let conn = setup_test_db();
    let master_key = test_master_key();

    let err = resolve_for_branch(&conn, &master_key, None, "gy_br_missing").unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn deleted_branch_is_not_found() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    set_tenant_credential(
        &conn,
        &master_key,
        &tenant.id,
        &test_credential("rzp_test_tenant01"),
        true,
    );
    queries::soft_delete_branch(&conn, &branch.id).unwrap();

    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn soft_deleted_tenant_blocks_resolution() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = create_test_tenant(&conn, "Gym A");
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    set_tenant_credential(
        &conn,
        &master_key,
        &tenant.id,
        &test_credential("rzp_test_tenant01"),
        true,
    );
    queries::soft_delete_tenant(&conn, &tenant.id).unwrap();

    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn expired_plan_blocks_resolution() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = queries::create_tenant(
        &conn,
        &CreateTenant {
            name: "Lapsed Gym".to_string(),
            plan_expires_at: Some(past_timestamp(1)),
            enabled_modules: None,
            max_branches: 5,
            max_staff: 10,
            max_members: 100,
            max_messages: 1000,
        },
    )
    .unwrap();
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    set_tenant_credential(
        &conn,
        &master_key,
        &tenant.id,
        &test_credential("rzp_test_tenant01"),
        true,
    );

    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn disabled_payments_module_blocks_resolution() {
    let conn = setup_test_db();
    let master_key = test_master_key();
    let tenant = queries::create_tenant(
        &conn,
        &CreateTenant {
            name: "Ledger-Only Gym".to_string(),
            plan_expires_at: None,
            enabled_modules: Some(vec!["ledger".to_string()]),
            max_branches: 5,
            max_staff: 10,
            max_members: 100,
            max_messages: 1000,
        },
    )
    .unwrap();
    let branch = create_test_branch(&conn, &tenant.id, "Main");
    set_tenant_credential(
        &conn,
        &master_key,
        &tenant.id,
        &test_credential("rzp_test_tenant01"),
        true,
    );

    let err = resolve_for_branch(&conn, &master_key, None, &branch.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
