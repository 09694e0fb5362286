//! Entitlement writes for a verified purchase.
//!
//! Member creation (if new), subscription, payment row and ledger entry are
//! one atomic unit: everything inside `grant` runs against the caller's
//! open transaction, and a rollback on error leaves the store in its
//! pre-purchase state. There are no compensating actions.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{msg, AppError, Result};
use crate::models::{CreateOrderRequest, PaymentMode, PaymentStatus};
use crate::util::{parse_iso_date, today, SubscriptionWindow};

/// Outcome of a granted purchase; feeds the verification response.
#[derive(Debug, Clone)]
pub struct GrantOutcome {
    pub member_id: Option<String>,
    pub daily_pass_user_id: Option<String>,
    pub subscription_id: Option<String>,
    pub payment_id: String,
    pub end_date: Option<String>,
    pub is_daily_pass: bool,
}

/// Write the entitlement for a verified online purchase.
///
/// `conn` must be inside an open transaction; the caller commits.
pub fn grant(
    conn: &Connection,
    intent: &CreateOrderRequest,
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
) -> Result<GrantOutcome> {
    let branch = queries::get_branch_by_id(conn, &intent.branch_id)?
        .ok_or_else(|| AppError::NotFound(msg::BRANCH_NOT_FOUND.into()))?;

    if intent.is_daily_pass {
        let pass_date = today().format("%Y-%m-%d").to_string();
        let user = queries::create_daily_pass_user(
            conn,
            &branch.id,
            &intent.member_name,
            &intent.member_phone,
            &pass_date,
        )?;
        let payment = queries::create_payment(
            conn,
            &branch.id,
            None,
            Some(&user.id),
            None,
            intent.amount_paise(),
            PaymentMode::Online,
            PaymentStatus::Success,
            Some(razorpay_order_id),
            Some(razorpay_payment_id),
        )?;
        queries::create_ledger_entry(
            conn,
            &branch.id,
            crate::models::LedgerEntryType::Income,
            intent.amount_paise(),
            &format!("Daily pass - {}", user.name),
            true,
        )?;
        return Ok(GrantOutcome {
            member_id: None,
            daily_pass_user_id: Some(user.id),
            subscription_id: None,
            payment_id: payment.id,
            end_date: Some(pass_date),
            is_daily_pass: true,
        });
    }

    let member = if intent.is_new_member {
        // "member exists" is checked before insert so the caller gets the
        // business error, not a bare constraint violation.
        if queries::get_member_by_phone(conn, &branch.id, &intent.member_phone)?.is_some() {
            return Err(AppError::Conflict(msg::MEMBER_EXISTS.into()));
        }

        let tenant = queries::get_tenant_by_id(conn, &branch.tenant_id)?
            .ok_or_else(|| AppError::NotFound(msg::TENANT_NOT_FOUND.into()))?;
        let member_count = queries::count_tenant_members(conn, &tenant.id)?;
        if member_count >= tenant.max_members {
            return Err(AppError::Conflict(msg::MEMBER_LIMIT_REACHED.into()));
        }

        queries::create_member(conn, &branch.id, &intent.member_name, &intent.member_phone)?
    } else {
        let member_id = intent
            .member_id
            .as_deref()
            .ok_or_else(|| AppError::Validation("memberId is required".into()))?;
        let member = queries::get_member_by_id(conn, member_id)?
            .ok_or_else(|| AppError::NotFound(msg::MEMBER_NOT_FOUND.into()))?;
        if member.branch_id != branch.id {
            return Err(AppError::NotFound(msg::MEMBER_NOT_FOUND.into()));
        }
        member
    };

    let previous_end = queries::latest_subscription_end(conn, &member.id)?
        .map(|s| parse_iso_date(&s))
        .transpose()?;

    let window =
        SubscriptionWindow::compute(today(), previous_end, intent.months, intent.custom_days)?;
    let start = window.start.format("%Y-%m-%d").to_string();
    let end = window.end.format("%Y-%m-%d").to_string();

    let subscription = queries::create_subscription(
        conn,
        &member.id,
        &branch.id,
        &start,
        &end,
        intent.months,
        intent.custom_days,
    )?;

    let payment = queries::create_payment(
        conn,
        &branch.id,
        Some(&member.id),
        None,
        Some(&subscription.id),
        intent.amount_paise(),
        PaymentMode::Online,
        PaymentStatus::Success,
        Some(razorpay_order_id),
        Some(razorpay_payment_id),
    )?;

    queries::create_ledger_entry(
        conn,
        &branch.id,
        crate::models::LedgerEntryType::Income,
        intent.amount_paise(),
        &format!("Membership payment - {}", member.name),
        true,
    )?;

    Ok(GrantOutcome {
        member_id: Some(member.id),
        daily_pass_user_id: None,
        subscription_id: Some(subscription.id),
        payment_id: payment.id,
        end_date: Some(end),
        is_daily_pass: false,
    })
}
