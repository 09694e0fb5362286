use axum::extract::{Extension, State};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{resolve_tenant_branch, TenantContext};
use crate::models::{
    Capability, CreateCashPayment, LedgerEntryType, Payment, PaymentMode, PaymentStatus,
};
use crate::util::{parse_iso_date, today, SubscriptionWindow};

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(branch_id): Path<String>,
) -> Result<Json<Vec<Payment>>> {
    ctx.require_any(&[Capability::AccessPayments], Some("payments"), Some(&branch_id))?;

    let conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &branch_id)?;

    Ok(Json(queries::list_branch_payments(&conn, &branch_id)?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashPaymentResponse {
    pub payment: Payment,
    pub subscription_id: String,
    pub end_date: String,
}

/// Record a cash payment taken at the desk. Same subscription date math as
/// the online flow, no gateway involvement, and the payment is written as
/// `cash`/`success` in one transaction with the subscription and ledger
/// entry.
pub async fn record_cash_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(input): Json<CreateCashPayment>,
) -> Result<Json<CashPaymentResponse>> {
    ctx.require_any(
        &[Capability::AccessPayments],
        Some("payments"),
        Some(&input.branch_id),
    )?;
    input.validate()?;

    let mut conn = state.db.get()?;
    resolve_tenant_branch(&conn, &ctx, &input.branch_id)?;

    let tx = conn.transaction()?;

    let member = queries::get_member_by_id(&tx, &input.member_id)?
        .ok_or_else(|| AppError::NotFound(msg::MEMBER_NOT_FOUND.into()))?;
    if member.branch_id != input.branch_id {
        return Err(AppError::NotFound(msg::MEMBER_NOT_FOUND.into()));
    }

    let previous_end = queries::latest_subscription_end(&tx, &member.id)?
        .map(|s| parse_iso_date(&s))
        .transpose()?;
    let window =
        SubscriptionWindow::compute(today(), previous_end, input.months, input.custom_days)?;
    let start = window.start.format("%Y-%m-%d").to_string();
    let end = window.end.format("%Y-%m-%d").to_string();

    let subscription = queries::create_subscription(
        &tx,
        &member.id,
        &input.branch_id,
        &start,
        &end,
        input.months,
        input.custom_days,
    )?;

    let payment = queries::create_payment(
        &tx,
        &input.branch_id,
        Some(&member.id),
        None,
        Some(&subscription.id),
        input.amount_paise(),
        PaymentMode::Cash,
        PaymentStatus::Success,
        None,
        None,
    )?;

    queries::create_ledger_entry(
        &tx,
        &input.branch_id,
        LedgerEntryType::Income,
        input.amount_paise(),
        &format!("Membership payment - {}", member.name),
        true,
    )?;

    tx.commit()?;

    tracing::info!(
        payment_id = %payment.id,
        branch_id = %input.branch_id,
        "Cash payment recorded"
    );

    Ok(Json(CashPaymentResponse {
        payment,
        subscription_id: subscription.id,
        end_date: end,
    }))
}
