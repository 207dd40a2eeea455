use rusqlite::Connection;

/// Initialize the database schema. Idempotent.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Tenants (provisioned accounts)
        CREATE TABLE IF NOT EXISTS tenants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Dashboard users (first user per tenant is the owner)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('owner', 'member')),
            created_at INTEGER NOT NULL,
            UNIQUE(tenant_id, email)
        );
        CREATE INDEX IF NOT EXISTS idx_users_tenant ON users(tenant_id);

        -- Payment-provider customer links
        CREATE TABLE IF NOT EXISTS billing_customers (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            provider TEXT NOT NULL,
            provider_customer_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(provider, provider_customer_id)
        );
        CREATE INDEX IF NOT EXISTS idx_billing_customers_tenant ON billing_customers(tenant_id);

        -- Subscriptions. provider_subscription_id is the provisioning
        -- idempotency key: the upsert conflicts on it.
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            provider_subscription_id TEXT NOT NULL UNIQUE,
            plan TEXT NOT NULL CHECK (plan IN ('starter', 'growth', 'unlimited')),
            price_cents INTEGER NOT NULL,
            provider_price_id TEXT,
            status TEXT NOT NULL,
            current_period_end INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_tenant ON subscriptions(tenant_id);

        -- One-time login tokens (hash only; raw token is never stored)
        CREATE TABLE IF NOT EXISTS login_tokens (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            expires_at INTEGER NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_login_tokens_user ON login_tokens(user_id);
        CREATE INDEX IF NOT EXISTS idx_login_tokens_expires ON login_tokens(expires_at);

        -- End customers, resolved from inbound SMS by phone
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            phone TEXT NOT NULL,
            name TEXT,
            created_at INTEGER NOT NULL,
            UNIQUE(tenant_id, phone)
        );
        CREATE INDEX IF NOT EXISTS idx_customers_phone ON customers(phone);

        -- Waitlist entries: pending -> contacted -> booked, monotonic.
        -- Mutated only via the conditional updates in queries.rs.
        CREATE TABLE IF NOT EXISTS waitlist_entries (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'contacted', 'booked')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_waitlist_customer_recent
            ON waitlist_entries(customer_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_waitlist_tenant_status
            ON waitlist_entries(tenant_id, status);

        CREATE TABLE IF NOT EXISTS appointments (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            customer_id TEXT NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
            start_ts INTEGER NOT NULL,
            end_ts INTEGER NOT NULL,
            status TEXT NOT NULL
                CHECK (status IN ('booked', 'confirmed', 'completed', 'cancelled', 'no_show')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_appointments_customer_upcoming
            ON appointments(tenant_id, customer_id, start_ts);
        CREATE INDEX IF NOT EXISTS idx_appointments_tenant_start ON appointments(tenant_id, start_ts);

        -- Revenue events. UNIQUE(appointment_id, event_type) is the
        -- conflict policy: at most one event of a type per appointment.
        CREATE TABLE IF NOT EXISTS revenue_events (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            event_type TEXT NOT NULL
                CHECK (event_type IN ('recovered_booking', 'prevented_no_show')),
            amount_cents INTEGER NOT NULL,
            appointment_id TEXT NOT NULL REFERENCES appointments(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            UNIQUE(appointment_id, event_type)
        );
        CREATE INDEX IF NOT EXISTS idx_revenue_tenant_time
            ON revenue_events(tenant_id, created_at);

        -- Outbound messages; rows start 'queued', the dispatcher drains them
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
            channel TEXT NOT NULL CHECK (channel IN ('sms')),
            recipient TEXT NOT NULL,
            body TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'queued'
                CHECK (status IN ('queued', 'sent', 'failed')),
            created_at INTEGER NOT NULL,
            sent_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_messages_queued
            ON messages(created_at) WHERE status = 'queued';
        "#,
    )?;
    Ok(())
}
