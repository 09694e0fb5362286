use axum::extract::State;

use crate::credentials;
use crate::db::{queries, AppState};
use crate::entitlement;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::gateway::RazorpayClient;
use crate::models::{Payment, VerifyPaymentRequest, VerifyPaymentResponse};

/// Verify a checkout callback and write the entitlement.
///
/// Order of operations matters: the signature is checked before any lookup
/// or write, so a forged callback cannot even probe for existing payments.
/// A replayed callback for an already-recorded payment returns the stored
/// outcome with `success: true` instead of an error; the client retrying a
/// dropped response must not see a failure for a purchase that went
/// through.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let resolved = {
        let conn = state.db.get()?;
        credentials::resolve_for_branch(
            &conn,
            &state.master_key,
            state.platform_credential.as_ref(),
            &request.intent.branch_id,
        )?
    };

    let client = RazorpayClient::new(resolved.credential());
    if !client.verify_checkout_signature(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    ) {
        return Err(AppError::VerificationFailed);
    }

    // The intent is client-echoed and untrusted; re-run the same rules the
    // order creation ran.
    request.intent.validate()?;

    // Collapse concurrent duplicates of the same callback. Best effort;
    // the UNIQUE index on the gateway payment id is the hard guarantee.
    let Some(_guard) = state.dedup.begin(&request.razorpay_payment_id) else {
        return Err(AppError::Conflict(
            "Verification already in progress for this payment".into(),
        ));
    };

    let mut conn = state.db.get()?;

    if let Some(existing) =
        queries::get_payment_by_razorpay_payment_id(&conn, &request.razorpay_payment_id)?
    {
        tracing::info!(
            payment_id = %existing.id,
            razorpay_payment_id = %request.razorpay_payment_id,
            "Replayed verification, returning stored outcome"
        );
        return Ok(Json(replayed_response(&conn, existing)?));
    }

    let tx = conn.transaction()?;
    let outcome = entitlement::grant(
        &tx,
        &request.intent,
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
    )?;
    tx.commit()?;

    tracing::info!(
        payment_id = %outcome.payment_id,
        branch_id = %request.intent.branch_id,
        is_daily_pass = outcome.is_daily_pass,
        "Payment verified and entitlement written"
    );

    Ok(Json(VerifyPaymentResponse {
        success: true,
        member_id: outcome.member_id,
        daily_pass_user_id: outcome.daily_pass_user_id,
        subscription_id: outcome.subscription_id,
        end_date: outcome.end_date,
        is_daily_pass: Some(outcome.is_daily_pass),
    }))
}

/// Rebuild the verification response from an already-stored payment.
fn replayed_response(
    conn: &rusqlite::Connection,
    payment: Payment,
) -> Result<VerifyPaymentResponse> {
    let end_date = match payment.subscription_id.as_deref() {
        Some(id) => queries::get_subscription_by_id(conn, id)?.map(|s| s.end_date),
        None => None,
    };

    Ok(VerifyPaymentResponse {
        success: true,
        member_id: payment.member_id,
        is_daily_pass: Some(payment.daily_pass_user_id.is_some()),
        daily_pass_user_id: payment.daily_pass_user_id,
        subscription_id: payment.subscription_id,
        end_date,
    })
}
