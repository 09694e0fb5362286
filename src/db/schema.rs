use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Tenants (gym organizations)
        -- Soft delete only: deleted_at = timestamp when deleted, NULL = active
        CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            plan_expires_at INTEGER,
            enabled_modules TEXT,
            max_branches INTEGER NOT NULL DEFAULT 1,
            max_staff INTEGER NOT NULL DEFAULT 5,
            max_members INTEGER NOT NULL DEFAULT 200,
            max_messages INTEGER NOT NULL DEFAULT 1000,
            razorpay_config BLOB,
            razorpay_verified_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_tenants_active ON tenants(id) WHERE deleted_at IS NULL;

        -- Branches (physical locations, subject to the tenant branch limit)
        CREATE TABLE IF NOT EXISTS branches (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            razorpay_config BLOB,
            razorpay_verified_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_branches_tenant ON branches(tenant_id);
        CREATE INDEX IF NOT EXISTS idx_branches_active ON branches(id) WHERE deleted_at IS NULL;

        -- Staff (tenant owner/admin and employees, bearer-key auth)
        CREATE TABLE IF NOT EXISTS staff (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('owner', 'staff')),
            api_key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_staff_tenant ON staff(tenant_id);
        CREATE INDEX IF NOT EXISTS idx_staff_key ON staff(api_key_hash);

        -- Capability flags per staff account (owners bypass this table)
        CREATE TABLE IF NOT EXISTS staff_permissions (
            staff_id TEXT PRIMARY KEY REFERENCES staff(id) ON DELETE CASCADE,
            manage_members INTEGER NOT NULL DEFAULT 0,
            access_ledger INTEGER NOT NULL DEFAULT 0,
            access_payments INTEGER NOT NULL DEFAULT 0,
            access_analytics INTEGER NOT NULL DEFAULT 0,
            change_settings INTEGER NOT NULL DEFAULT 0,
            branch_ids TEXT NOT NULL DEFAULT '[]'
        );

        -- Members (one row per person per branch; phone is the identity)
        CREATE TABLE IF NOT EXISTS members (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            deleted_at INTEGER
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_members_branch_phone
            ON members(branch_id, phone) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_members_branch ON members(branch_id);

        -- Daily pass users (walk-ins, no subscription)
        CREATE TABLE IF NOT EXISTS daily_pass_users (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            pass_date TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_daily_pass_branch ON daily_pass_users(branch_id);

        -- Subscriptions (date windows tied to a member)
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            member_id TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            months INTEGER,
            custom_days INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_member ON subscriptions(member_id, end_date DESC);
        CREATE INDEX IF NOT EXISTS idx_subscriptions_branch ON subscriptions(branch_id);

        -- Payments
        -- razorpay_payment_id is UNIQUE: the insert-uniqueness guard against
        -- duplicate entitlement on replayed verification calls.
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            member_id TEXT REFERENCES members(id) ON DELETE SET NULL,
            daily_pass_user_id TEXT REFERENCES daily_pass_users(id) ON DELETE SET NULL,
            subscription_id TEXT REFERENCES subscriptions(id) ON DELETE SET NULL,
            amount_paise INTEGER NOT NULL,
            mode TEXT NOT NULL CHECK (mode IN ('cash', 'online')),
            status TEXT NOT NULL CHECK (status IN ('pending', 'success', 'failed')),
            razorpay_order_id TEXT,
            razorpay_payment_id TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_rzp_payment
            ON payments(razorpay_payment_id) WHERE razorpay_payment_id IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_payments_branch_time ON payments(branch_id, created_at DESC);

        -- Ledger entries (simple income/expense records)
        CREATE TABLE IF NOT EXISTS ledger_entries (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            entry_type TEXT NOT NULL CHECK (entry_type IN ('income', 'expense')),
            amount_paise INTEGER NOT NULL,
            description TEXT NOT NULL,
            auto_generated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_ledger_branch_time ON ledger_entries(branch_id, created_at DESC);

        -- Packages (plans sold at a branch)
        CREATE TABLE IF NOT EXISTS packages (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            months INTEGER NOT NULL,
            price_paise INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(branch_id, name)
        );

        -- Trainers
        CREATE TABLE IF NOT EXISTS trainers (
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            specialization TEXT,
            monthly_fee_paise INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trainers_branch ON trainers(branch_id);

        -- Platform admins (super-admin console, bearer-key auth)
        CREATE TABLE IF NOT EXISTS platform_admins (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            api_key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}
