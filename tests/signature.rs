//! Checkout signature verification tests

mod common;

use common::*;
use gympay::gateway::RazorpayClient;

#[test]
fn valid_signature_passes() {
    let credential = test_credential("rzp_test_a1b2c3d4");
    let client = RazorpayClient::new(&credential);

    let signature = sign_checkout(&credential.key_secret, "order_abc", "pay_xyz");
    assert!(client.verify_checkout_signature("order_abc", "pay_xyz", &signature));
}

#[test]
fn tampered_payment_id_fails() {
    let credential = test_credential("rzp_test_a1b2c3d4");
    let client = RazorpayClient::new(&credential);

    let signature = sign_checkout(&credential.key_secret, "order_abc", "pay_xyz");
    assert!(!client.verify_checkout_signature("order_abc", "pay_other", &signature));
}

#[test]
fn signature_from_wrong_secret_fails() {
    let credential = test_credential("rzp_test_a1b2c3d4");
    let client = RazorpayClient::new(&credential);

    let signature = sign_checkout("some_other_secret", "order_abc", "pay_xyz");
    assert!(!client.verify_checkout_signature("order_abc", "pay_xyz", &signature));
}

#[test]
fn malformed_signature_fails() {
    let credential = test_credential("rzp_test_a1b2c3d4");
    let client = RazorpayClient::new(&credential);

    assert!(!client.verify_checkout_signature("order_abc", "pay_xyz", ""));
    assert!(!client.verify_checkout_signature("order_abc", "pay_xyz", "deadbeef"));
    assert!(!client.verify_checkout_signature("order_abc", "pay_xyz", "not-hex-at-all"));
}
