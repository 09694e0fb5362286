use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension};

use crate::crypto::hash_secret;
use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, BRANCH_COLS, DAILY_PASS_USER_COLS, LEDGER_ENTRY_COLS,
    MEMBER_COLS, PACKAGE_COLS, PAYMENT_COLS, PLATFORM_ADMIN_COLS, STAFF_COLS,
    STAFF_PERMISSION_COLS, SUBSCRIPTION_COLS, TENANT_COLS, TRAINER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Generate a bearer API key. Only its hash is stored.
pub fn generate_api_key() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("gyk_{}", hex::encode(bytes))
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? AND deleted_at IS NULL RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Tenants ============

pub fn create_tenant(conn: &Connection, input: &CreateTenant) -> Result<Tenant> {
    let id = EntityType::Tenant.gen_id();
    let ts = now();
    let modules = input
        .enabled_modules
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO tenants (id, name, plan_expires_at, enabled_modules, max_branches, max_staff, max_members, max_messages, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            id,
            input.name.trim(),
            input.plan_expires_at,
            modules,
            input.max_branches,
            input.max_staff,
            input.max_members,
            input.max_messages,
            ts
        ],
    )?;

    get_tenant_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("tenant missing after insert".into()))
}

pub fn get_tenant_by_id(conn: &Connection, id: &str) -> Result<Option<Tenant>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tenants WHERE id = ?1", TENANT_COLS),
        &[&id],
    )
}

pub fn list_tenants(conn: &Connection, include_deleted: bool) -> Result<Vec<Tenant>> {
    let sql = if include_deleted {
        format!("SELECT {} FROM tenants ORDER BY created_at DESC", TENANT_COLS)
    } else {
        format!(
            "SELECT {} FROM tenants WHERE deleted_at IS NULL ORDER BY created_at DESC",
            TENANT_COLS
        )
    };
    query_all(conn, &sql, &[])
}

pub fn update_tenant(conn: &Connection, id: &str, input: &UpdateTenant) -> Result<Option<Tenant>> {
    let modules = match &input.enabled_modules {
        None => None,
        Some(inner) => Some(inner.as_ref().map(serde_json::to_string).transpose()?),
    };

    let mut builder = UpdateBuilder::new("tenants", id)
        .set_opt("name", input.name.as_deref().map(str::trim).map(String::from))
        .set_opt("max_branches", input.max_branches)
        .set_opt("max_staff", input.max_staff)
        .set_opt("max_members", input.max_members)
        .set_opt("max_messages", input.max_messages);

    if let Some(exp) = input.plan_expires_at {
        builder = builder.set_nullable("plan_expires_at", exp);
    }
    if let Some(mods) = modules {
        builder = builder.set_nullable("enabled_modules", mods);
    }

    builder.execute_returning(conn, TENANT_COLS)
}

/// Tenants are never hard-deleted; a deletion timestamp is recorded.
pub fn soft_delete_tenant(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE tenants SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn set_tenant_razorpay_config(
    conn: &Connection,
    tenant_id: &str,
    encrypted: Option<&[u8]>,
    verified_at: Option<i64>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE tenants SET razorpay_config = ?1, razorpay_verified_at = ?2, updated_at = ?3
         WHERE id = ?4 AND deleted_at IS NULL",
        params![encrypted, verified_at, now(), tenant_id],
    )?;
    Ok(affected > 0)
}

// ============ Branches ============

pub fn create_branch(conn: &Connection, tenant_id: &str, input: &CreateBranch) -> Result<Branch> {
    let id = EntityType::Branch.gen_id();
    let ts = now();
    conn.execute(
        "INSERT INTO branches (id, tenant_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        params![id, tenant_id, input.name.trim(), ts],
    )?;
    get_branch_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("branch missing after insert".into()))
}

pub fn get_branch_by_id(conn: &Connection, id: &str) -> Result<Option<Branch>> {
    query_one(
        conn,
        &format!("SELECT {} FROM branches WHERE id = ?1", BRANCH_COLS),
        &[&id],
    )
}

pub fn list_branches(conn: &Connection, tenant_id: &str) -> Result<Vec<Branch>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM branches WHERE tenant_id = ?1 AND deleted_at IS NULL ORDER BY created_at",
            BRANCH_COLS
        ),
        &[&tenant_id],
    )
}

pub fn update_branch(conn: &Connection, id: &str, input: &UpdateBranch) -> Result<Option<Branch>> {
    UpdateBuilder::new("branches", id)
        .set_opt("name", input.name.as_deref().map(str::trim).map(String::from))
        .execute_returning(conn, BRANCH_COLS)
}

pub fn soft_delete_branch(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE branches SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn count_branches(conn: &Connection, tenant_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM branches WHERE tenant_id = ?1 AND deleted_at IS NULL",
        params![tenant_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn set_branch_razorpay_config(
    conn: &Connection,
    branch_id: &str,
    encrypted: Option<&[u8]>,
    verified_at: Option<i64>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE branches SET razorpay_config = ?1, razorpay_verified_at = ?2, updated_at = ?3
         WHERE id = ?4 AND deleted_at IS NULL",
        params![encrypted, verified_at, now(), branch_id],
    )?;
    Ok(affected > 0)
}

// ============ Staff ============

pub fn create_staff(
    conn: &Connection,
    tenant_id: &str,
    input: &CreateStaff,
    api_key: &str,
) -> Result<Staff> {
    let id = EntityType::Staff.gen_id();
    conn.execute(
        "INSERT INTO staff (id, tenant_id, name, role, api_key_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            tenant_id,
            input.name.trim(),
            input.role.as_str(),
            hash_secret(api_key),
            now()
        ],
    )?;

    if input.role == StaffRole::Staff {
        let perms = input.permissions.clone().unwrap_or_default();
        set_staff_permissions(conn, &id, &perms)?;
    }

    get_staff_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("staff missing after insert".into()))
}

pub fn get_staff_by_id(conn: &Connection, id: &str) -> Result<Option<Staff>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM staff WHERE id = ?1 AND deleted_at IS NULL",
            STAFF_COLS
        ),
        &[&id],
    )
}

pub fn get_staff_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<Staff>> {
    let hash = hash_secret(api_key);
    query_one(
        conn,
        &format!(
            "SELECT {} FROM staff WHERE api_key_hash = ?1 AND deleted_at IS NULL",
            STAFF_COLS
        ),
        &[&hash],
    )
}

pub fn list_staff(conn: &Connection, tenant_id: &str) -> Result<Vec<Staff>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM staff WHERE tenant_id = ?1 AND deleted_at IS NULL ORDER BY created_at",
            STAFF_COLS
        ),
        &[&tenant_id],
    )
}

pub fn soft_delete_staff(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE staff SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn count_staff(conn: &Connection, tenant_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM staff WHERE tenant_id = ?1 AND deleted_at IS NULL",
        params![tenant_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn get_staff_permissions(conn: &Connection, staff_id: &str) -> Result<Option<PermissionSet>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM staff_permissions WHERE staff_id = ?1",
            STAFF_PERMISSION_COLS
        ),
        &[&staff_id],
    )
}

pub fn set_staff_permissions(
    conn: &Connection,
    staff_id: &str,
    perms: &PermissionSet,
) -> Result<()> {
    let branch_ids = serde_json::to_string(&perms.branch_ids)?;
    conn.execute(
        "INSERT INTO staff_permissions (staff_id, manage_members, access_ledger, access_payments, access_analytics, change_settings, branch_ids)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(staff_id) DO UPDATE SET
            manage_members = excluded.manage_members,
            access_ledger = excluded.access_ledger,
            access_payments = excluded.access_payments,
            access_analytics = excluded.access_analytics,
            change_settings = excluded.change_settings,
            branch_ids = excluded.branch_ids",
        params![
            staff_id,
            perms.manage_members,
            perms.access_ledger,
            perms.access_payments,
            perms.access_analytics,
            perms.change_settings,
            branch_ids
        ],
    )?;
    Ok(())
}

// ============ Platform admins ============

pub fn create_platform_admin(conn: &Connection, name: &str, api_key: &str) -> Result<PlatformAdmin> {
    let id = EntityType::PlatformAdmin.gen_id();
    conn.execute(
        "INSERT INTO platform_admins (id, name, api_key_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, hash_secret(api_key), now()],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM platform_admins WHERE id = ?1", PLATFORM_ADMIN_COLS),
        &[&id],
    )?
    .ok_or_else(|| crate::error::AppError::Internal("admin missing after insert".into()))
}

pub fn get_platform_admin_by_api_key(
    conn: &Connection,
    api_key: &str,
) -> Result<Option<PlatformAdmin>> {
    let hash = hash_secret(api_key);
    query_one(
        conn,
        &format!(
            "SELECT {} FROM platform_admins WHERE api_key_hash = ?1",
            PLATFORM_ADMIN_COLS
        ),
        &[&hash],
    )
}

pub fn count_platform_admins(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM platform_admins", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Members ============

pub fn create_member(conn: &Connection, branch_id: &str, name: &str, phone: &str) -> Result<Member> {
    let id = EntityType::Member.gen_id();
    conn.execute(
        "INSERT INTO members (id, branch_id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, branch_id, name.trim(), phone, now()],
    )?;
    get_member_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("member missing after insert".into()))
}

pub fn get_member_by_id(conn: &Connection, id: &str) -> Result<Option<Member>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM members WHERE id = ?1 AND deleted_at IS NULL",
            MEMBER_COLS
        ),
        &[&id],
    )
}

pub fn get_member_by_phone(
    conn: &Connection,
    branch_id: &str,
    phone: &str,
) -> Result<Option<Member>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM members WHERE branch_id = ?1 AND phone = ?2 AND deleted_at IS NULL",
            MEMBER_COLS
        ),
        &[&branch_id, &phone],
    )
}

pub fn list_members(conn: &Connection, branch_id: &str) -> Result<Vec<Member>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM members WHERE branch_id = ?1 AND deleted_at IS NULL ORDER BY created_at DESC",
            MEMBER_COLS
        ),
        &[&branch_id],
    )
}

/// Member count across every branch of a tenant, for plan-limit checks.
pub fn count_tenant_members(conn: &Connection, tenant_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM members m
         JOIN branches b ON b.id = m.branch_id
         WHERE b.tenant_id = ?1 AND m.deleted_at IS NULL",
        params![tenant_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Daily pass users ============

pub fn create_daily_pass_user(
    conn: &Connection,
    branch_id: &str,
    name: &str,
    phone: &str,
    pass_date: &str,
) -> Result<DailyPassUser> {
    let id = EntityType::DailyPassUser.gen_id();
    conn.execute(
        "INSERT INTO daily_pass_users (id, branch_id, name, phone, pass_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, branch_id, name.trim(), phone, pass_date, now()],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM daily_pass_users WHERE id = ?1", DAILY_PASS_USER_COLS),
        &[&id],
    )?
    .ok_or_else(|| crate::error::AppError::Internal("daily pass user missing after insert".into()))
}

// ============ Subscriptions ============

pub fn create_subscription(
    conn: &Connection,
    member_id: &str,
    branch_id: &str,
    start_date: &str,
    end_date: &str,
    months: Option<u32>,
    custom_days: Option<u32>,
) -> Result<Subscription> {
    let id = EntityType::Subscription.gen_id();
    conn.execute(
        "INSERT INTO subscriptions (id, member_id, branch_id, start_date, end_date, months, custom_days, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![id, member_id, branch_id, start_date, end_date, months, custom_days, now()],
    )?;
    get_subscription_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("subscription missing after insert".into()))
}

pub fn get_subscription_by_id(conn: &Connection, id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!("SELECT {} FROM subscriptions WHERE id = ?1", SUBSCRIPTION_COLS),
        &[&id],
    )
}

/// Latest subscription end date for a member (ISO date), if any.
pub fn latest_subscription_end(conn: &Connection, member_id: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT MAX(end_date) FROM subscriptions WHERE member_id = ?1",
        params![member_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Payments ============

#[allow(clippy::too_many_arguments)]
pub fn create_payment(
    conn: &Connection,
    branch_id: &str,
    member_id: Option<&str>,
    daily_pass_user_id: Option<&str>,
    subscription_id: Option<&str>,
    amount_paise: i64,
    mode: PaymentMode,
    status: PaymentStatus,
    razorpay_order_id: Option<&str>,
    razorpay_payment_id: Option<&str>,
) -> Result<Payment> {
    let id = EntityType::Payment.gen_id();
    conn.execute(
        "INSERT INTO payments (id, branch_id, member_id, daily_pass_user_id, subscription_id, amount_paise, mode, status, razorpay_order_id, razorpay_payment_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            branch_id,
            member_id,
            daily_pass_user_id,
            subscription_id,
            amount_paise,
            mode.as_str(),
            status.as_str(),
            razorpay_order_id,
            razorpay_payment_id,
            now()
        ],
    )?;
    get_payment_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("payment missing after insert".into()))
}

pub fn get_payment_by_id(conn: &Connection, id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

/// Lookup by the gateway's payment id: the idempotency probe for replayed
/// verification calls.
pub fn get_payment_by_razorpay_payment_id(
    conn: &Connection,
    razorpay_payment_id: &str,
) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE razorpay_payment_id = ?1",
            PAYMENT_COLS
        ),
        &[&razorpay_payment_id],
    )
}

pub fn list_branch_payments(conn: &Connection, branch_id: &str) -> Result<Vec<Payment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE branch_id = ?1 ORDER BY created_at DESC",
            PAYMENT_COLS
        ),
        &[&branch_id],
    )
}

pub fn count_branch_payments(conn: &Connection, branch_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE branch_id = ?1",
        params![branch_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Ledger ============

pub fn create_ledger_entry(
    conn: &Connection,
    branch_id: &str,
    entry_type: LedgerEntryType,
    amount_paise: i64,
    description: &str,
    auto_generated: bool,
) -> Result<LedgerEntry> {
    let id = EntityType::LedgerEntry.gen_id();
    conn.execute(
        "INSERT INTO ledger_entries (id, branch_id, entry_type, amount_paise, description, auto_generated, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            branch_id,
            entry_type.as_str(),
            amount_paise,
            description,
            auto_generated,
            now()
        ],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM ledger_entries WHERE id = ?1", LEDGER_ENTRY_COLS),
        &[&id],
    )?
    .ok_or_else(|| crate::error::AppError::Internal("ledger entry missing after insert".into()))
}

pub fn list_branch_ledger(conn: &Connection, branch_id: &str) -> Result<Vec<LedgerEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM ledger_entries WHERE branch_id = ?1 ORDER BY created_at DESC",
            LEDGER_ENTRY_COLS
        ),
        &[&branch_id],
    )
}

// ============ Packages ============

pub fn create_package(conn: &Connection, branch_id: &str, input: &CreatePackage) -> Result<Package> {
    let id = EntityType::Package.gen_id();
    conn.execute(
        "INSERT INTO packages (id, branch_id, name, months, price_paise, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, branch_id, input.name.trim(), input.months, input.price_paise(), now()],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM packages WHERE id = ?1", PACKAGE_COLS),
        &[&id],
    )?
    .ok_or_else(|| crate::error::AppError::Internal("package missing after insert".into()))
}

pub fn get_package_by_id(conn: &Connection, id: &str) -> Result<Option<Package>> {
    query_one(
        conn,
        &format!("SELECT {} FROM packages WHERE id = ?1", PACKAGE_COLS),
        &[&id],
    )
}

pub fn list_branch_packages(conn: &Connection, branch_id: &str) -> Result<Vec<Package>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM packages WHERE branch_id = ?1 ORDER BY months",
            PACKAGE_COLS
        ),
        &[&branch_id],
    )
}

pub fn delete_package(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM packages WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Trainers ============

pub fn create_trainer(conn: &Connection, branch_id: &str, input: &CreateTrainer) -> Result<Trainer> {
    let id = EntityType::Trainer.gen_id();
    conn.execute(
        "INSERT INTO trainers (id, branch_id, name, phone, specialization, monthly_fee_paise, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            branch_id,
            input.name.trim(),
            input.phone,
            input.specialization,
            input.monthly_fee_paise(),
            now()
        ],
    )?;
    get_trainer_by_id(conn, &id)?
        .ok_or_else(|| crate::error::AppError::Internal("trainer missing after insert".into()))
}

pub fn get_trainer_by_id(conn: &Connection, id: &str) -> Result<Option<Trainer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM trainers WHERE id = ?1", TRAINER_COLS),
        &[&id],
    )
}

pub fn list_branch_trainers(conn: &Connection, branch_id: &str) -> Result<Vec<Trainer>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM trainers WHERE branch_id = ?1 ORDER BY created_at",
            TRAINER_COLS
        ),
        &[&branch_id],
    )
}

pub fn delete_trainer(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM trainers WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}
