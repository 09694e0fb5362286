//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(
    row: &Row,
    col: usize,
    col_name: &str,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(col)?;
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_str(&s).map(Some).map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                col,
                col_name.to_string(),
                rusqlite::types::Type::Text,
            )
        }),
    }
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT constants ============

pub const TENANT_COLS: &str = "id, name, plan_expires_at, enabled_modules, max_branches, max_staff, max_members, max_messages, razorpay_config, razorpay_verified_at, created_at, updated_at, deleted_at";

pub const BRANCH_COLS: &str =
    "id, tenant_id, name, razorpay_config, razorpay_verified_at, created_at, updated_at, deleted_at";

pub const STAFF_COLS: &str = "id, tenant_id, name, role, api_key_hash, created_at, deleted_at";

pub const STAFF_PERMISSION_COLS: &str = "staff_id, manage_members, access_ledger, access_payments, access_analytics, change_settings, branch_ids";

pub const PLATFORM_ADMIN_COLS: &str = "id, name, api_key_hash, created_at";

pub const MEMBER_COLS: &str = "id, branch_id, name, phone, created_at, deleted_at";

pub const DAILY_PASS_USER_COLS: &str = "id, branch_id, name, phone, pass_date, created_at";

pub const SUBSCRIPTION_COLS: &str =
    "id, member_id, branch_id, start_date, end_date, months, custom_days, created_at";

pub const PAYMENT_COLS: &str = "id, branch_id, member_id, daily_pass_user_id, subscription_id, amount_paise, mode, status, razorpay_order_id, razorpay_payment_id, created_at";

pub const LEDGER_ENTRY_COLS: &str =
    "id, branch_id, entry_type, amount_paise, description, auto_generated, created_at";

pub const PACKAGE_COLS: &str = "id, branch_id, name, months, price_paise, created_at";

pub const TRAINER_COLS: &str =
    "id, branch_id, name, phone, specialization, monthly_fee_paise, created_at";

// ============ FromRow implementations ============

impl FromRow for Tenant {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tenant {
            id: row.get(0)?,
            name: row.get(1)?,
            plan_expires_at: row.get(2)?,
            enabled_modules: parse_json(row, 3, "enabled_modules")?,
            max_branches: row.get(4)?,
            max_staff: row.get(5)?,
            max_members: row.get(6)?,
            max_messages: row.get(7)?,
            razorpay_config_encrypted: row.get(8)?,
            razorpay_verified_at: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
            deleted_at: row.get(12)?,
        })
    }
}

impl FromRow for Branch {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Branch {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            razorpay_config_encrypted: row.get(3)?,
            razorpay_verified_at: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }
}

impl FromRow for Staff {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Staff {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            name: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            api_key_hash: row.get(4)?,
            created_at: row.get(5)?,
            deleted_at: row.get(6)?,
        })
    }
}

impl FromRow for PermissionSet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PermissionSet {
            manage_members: row.get(1)?,
            access_ledger: row.get(2)?,
            access_payments: row.get(3)?,
            access_analytics: row.get(4)?,
            change_settings: row.get(5)?,
            branch_ids: parse_json(row, 6, "branch_ids")?.unwrap_or_default(),
        })
    }
}

impl FromRow for PlatformAdmin {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PlatformAdmin {
            id: row.get(0)?,
            name: row.get(1)?,
            api_key_hash: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Member {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Member {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            created_at: row.get(4)?,
            deleted_at: row.get(5)?,
        })
    }
}

impl FromRow for DailyPassUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(DailyPassUser {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            pass_date: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            member_id: row.get(1)?,
            branch_id: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            months: row.get(5)?,
            custom_days: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            member_id: row.get(2)?,
            daily_pass_user_id: row.get(3)?,
            subscription_id: row.get(4)?,
            amount_paise: row.get(5)?,
            mode: parse_enum(row, 6, "mode")?,
            status: parse_enum(row, 7, "status")?,
            razorpay_order_id: row.get(8)?,
            razorpay_payment_id: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl FromRow for LedgerEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LedgerEntry {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            entry_type: parse_enum(row, 2, "entry_type")?,
            amount_paise: row.get(3)?,
            description: row.get(4)?,
            auto_generated: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for Package {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Package {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            name: row.get(2)?,
            months: row.get(3)?,
            price_paise: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Trainer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Trainer {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            specialization: row.get(4)?,
            monthly_fee_paise: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
