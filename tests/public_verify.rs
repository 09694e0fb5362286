//! Tests for POST /functions/verify-payment.
//!
//! The full flow runs offline: signature verification is local HMAC, so a
//! correctly-signed callback can be driven end to end against an in-memory
//! database. Only order creation needs the live gateway and is not covered
//! here.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::*;

fn verify_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/functions/verify-payment")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn new_member_body(branch_id: &str, key_secret: &str, order_id: &str, payment_id: &str) -> Value {
    let signature = sign_checkout(key_secret, order_id, payment_id);
    json!({
        "razorpayOrderId": order_id,
        "razorpayPaymentId": payment_id,
        "razorpaySignature": signature,
        "amount": 1700.0,
        "memberName": "Asha Rao",
        "memberPhone": "9876543210",
        "isNewMember": true,
        "months": 3,
        "branchId": branch_id,
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn valid_callback_writes_entitlement() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let app = public_app(state.clone());
    let body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert!(json["memberId"].is_string());
    assert!(json["subscriptionId"].is_string());
    assert!(json["endDate"].is_string());

    let conn = state.db.get().unwrap();
    let payment = queries::get_payment_by_razorpay_payment_id(&conn, "pay_xyz")
        .unwrap()
        .expect("payment recorded");
    assert_eq!(payment.branch_id, branch_id);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_writes() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let app = public_app(state.clone());
    let mut body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");
    body["razorpaySignature"] = json!("0".repeat(64));

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let conn = state.db.get().unwrap();
    assert!(queries::get_payment_by_razorpay_payment_id(&conn, "pay_xyz")
        .unwrap()
        .is_none());
    assert!(queries::list_branch_payments(&conn, &branch_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn signature_from_another_tenants_secret_fails() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");
    let other_credential = test_credential("rzp_test_other123");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let app = public_app(state);
    let body = new_member_body(
        &branch_id,
        &other_credential.key_secret,
        "order_abc",
        "pay_xyz",
    );

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replayed_callback_returns_stored_outcome() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");

    let response = public_app(state.clone())
        .oneshot(verify_request(&body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response).await;

    // Same callback again: success with the same identifiers, no new rows
    let response = public_app(state.clone())
        .oneshot(verify_request(&body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;

    assert_eq!(second["success"], true);
    assert_eq!(second["memberId"], first["memberId"]);
    assert_eq!(second["subscriptionId"], first["subscriptionId"]);
    assert_eq!(second["endDate"], first["endDate"]);

    let conn = state.db.get().unwrap();
    assert_eq!(queries::count_branch_payments(&conn, &branch_id).unwrap(), 1);
    assert_eq!(
        queries::list_members(&conn, &branch_id).unwrap().len(),
        1,
        "replay must not create a second member"
    );
}

#[tokio::test]
async fn invalid_intent_fails_even_with_valid_signature() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let app = public_app(state);
    let mut body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");
    body["amount"] = json!(-50.0);

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unconfigured_gateway_rejects_verification() {
    let state = create_test_app_state();

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        branch_id = branch.id;
    }

    let app = public_app(state);
    let body = new_member_body(&branch_id, "whatever", "order_abc", "pay_xyz");

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn soft_deleted_tenant_cannot_be_paid() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        queries::soft_delete_tenant(&conn, &tenant.id).unwrap();
        branch_id = branch.id;
    }

    let app = public_app(state.clone());
    let body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");

    // A correctly-signed callback must not grant anything for a dead gym
    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let conn = state.db.get().unwrap();
    assert!(queries::get_payment_by_razorpay_payment_id(&conn, "pay_xyz")
        .unwrap()
        .is_none());
    assert!(queries::list_members(&conn, &branch_id).unwrap().is_empty());
}

#[tokio::test]
async fn expired_plan_blocks_verification() {
    let state = create_test_app_state();
    let credential = test_credential("rzp_test_a1b2c3d4");

    let branch_id;
    {
        let conn = state.db.get().unwrap();
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
        set_tenant_credential(&conn, &state.master_key, &tenant.id, &credential, true);
        branch_id = branch.id;
    }

    let app = public_app(state.clone());
    let body = new_member_body(&branch_id, &credential.key_secret, "order_abc", "pay_xyz");

    let response = app.oneshot(verify_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let conn = state.db.get().unwrap();
    assert!(queries::get_payment_by_razorpay_payment_id(&conn, "pay_xyz")
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn registration_page_data_is_public() {
    let state = create_test_app_state();

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        queries::create_package(
            &conn,
            &branch.id,
            &CreatePackage {
                name: "Quarterly".to_string(),
                months: 3,
                price: 1500.0,
            },
        )
        .unwrap();
        branch_id = branch.id;
    }

    let app = public_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/public/registration/{}", branch_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["branchName"], "Main");
    assert_eq!(json["packages"][0]["name"], "Quarterly");
}

#[tokio::test]
async fn registration_page_of_deleted_branch_is_gone() {
    let state = create_test_app_state();

    let branch_id;
    {
        let conn = state.db.get().unwrap();
        let tenant = create_test_tenant(&conn, "Gym A");
        let branch = create_test_branch(&conn, &tenant.id, "Main");
        queries::soft_delete_branch(&conn, &branch.id).unwrap();
        branch_id = branch.id;
    }

    let app = public_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/public/registration/{}", branch_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
