use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    query_all, query_one, FromRow, APPOINTMENT_COLS, CUSTOMER_COLS, MESSAGE_COLS,
    SUBSCRIPTION_COLS, TENANT_COLS, USER_COLS, WAITLIST_ENTRY_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Tenants ============

pub fn create_tenant(conn: &Connection, name: &str) -> Result<Tenant> {
    let id = EntityType::Tenant.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO tenants (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, name, now, now],
    )?;

    Ok(Tenant {
        id,
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_tenant_by_id(conn: &Connection, id: &str) -> Result<Option<Tenant>> {
    query_one(
        conn,
        &format!("SELECT {} FROM tenants WHERE id = ?1", TENANT_COLS),
        &[&id],
    )
}

// ============ Users ============

pub fn create_user(conn: &Connection, tenant_id: &str, email: &str, role: UserRole) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (id, tenant_id, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, tenant_id, &email, role.as_str(), now],
    )?;

    Ok(User {
        id,
        tenant_id: tenant_id.to_string(),
        email,
        role,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

// ============ Billing customers ============

pub fn create_billing_customer(
    conn: &Connection,
    tenant_id: &str,
    provider: &str,
    provider_customer_id: &str,
) -> Result<BillingCustomer> {
    let id = EntityType::BillingCustomer.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO billing_customers (id, tenant_id, provider, provider_customer_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, tenant_id, provider, provider_customer_id, now],
    )?;

    Ok(BillingCustomer {
        id,
        tenant_id: tenant_id.to_string(),
        provider: provider.to_string(),
        provider_customer_id: provider_customer_id.to_string(),
        created_at: now,
    })
}

pub fn list_billing_customers(conn: &Connection, tenant_id: &str) -> Result<Vec<BillingCustomer>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM billing_customers WHERE tenant_id = ?1 ORDER BY created_at",
            super::from_row::BILLING_CUSTOMER_COLS
        ),
        &[&tenant_id],
    )
}

// ============ Subscriptions ============

pub fn get_subscription_by_provider_id(
    conn: &Connection,
    provider_subscription_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE provider_subscription_id = ?1",
            SUBSCRIPTION_COLS
        ),
        &[&provider_subscription_id],
    )
}

/// Insert or refresh a subscription, conflicting on provider_subscription_id.
///
/// Retried provisioning calls land on the DO UPDATE arm and refresh
/// status/pricing instead of creating a second row.
pub fn upsert_subscription(conn: &Connection, input: &CreateSubscription) -> Result<Subscription> {
    let id = EntityType::Subscription.gen_id();
    let now = now();

    let sql = format!(
        "INSERT INTO subscriptions
            (id, tenant_id, provider_subscription_id, plan, price_cents,
             provider_price_id, status, current_period_end, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(provider_subscription_id) DO UPDATE SET
            plan = excluded.plan,
            price_cents = excluded.price_cents,
            provider_price_id = excluded.provider_price_id,
            status = excluded.status,
            current_period_end = excluded.current_period_end,
            updated_at = excluded.updated_at
         RETURNING {}",
        SUBSCRIPTION_COLS
    );

    let subscription = conn.query_row(
        &sql,
        params![
            &id,
            &input.tenant_id,
            &input.provider_subscription_id,
            input.plan.as_str(),
            input.price_cents,
            &input.provider_price_id,
            &input.status,
            input.current_period_end,
            now,
            now
        ],
        Subscription::from_row,
    )?;

    Ok(subscription)
}

/// The tenant's billable subscription for ROI math: the most recently
/// updated one still reported as active or trialing.
pub fn current_subscription_for_tenant(
    conn: &Connection,
    tenant_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions
             WHERE tenant_id = ?1 AND status IN ('active', 'trialing')
             ORDER BY updated_at DESC LIMIT 1",
            SUBSCRIPTION_COLS
        ),
        &[&tenant_id],
    )
}

// ============ Login tokens ============

pub fn create_login_token(
    conn: &Connection,
    user_id: &str,
    token_hash: &str,
    expires_at: i64,
) -> Result<LoginToken> {
    let id = EntityType::LoginToken.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO login_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, user_id, token_hash, expires_at, now],
    )?;

    Ok(LoginToken {
        id,
        user_id: user_id.to_string(),
        token_hash: token_hash.to_string(),
        expires_at,
        used: false,
        created_at: now,
    })
}

pub fn get_login_token_by_hash(conn: &Connection, token_hash: &str) -> Result<Option<LoginToken>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM login_tokens WHERE token_hash = ?1",
            super::from_row::LOGIN_TOKEN_COLS
        ),
        &[&token_hash],
    )
}

/// Delete expired or already-used login tokens. Returns the number deleted.
pub fn purge_stale_login_tokens(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM login_tokens WHERE expires_at < ?1 OR used = 1",
        params![now()],
    )?;
    Ok(deleted)
}

// ============ Customers ============

pub fn create_customer(conn: &Connection, input: &CreateCustomer) -> Result<Customer> {
    let id = EntityType::Customer.gen_id();
    let now = now();
    let phone = input.phone.trim().to_string();

    conn.execute(
        "INSERT INTO customers (id, tenant_id, phone, name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &input.tenant_id, &phone, &input.name, now],
    )?;

    Ok(Customer {
        id,
        tenant_id: input.tenant_id.clone(),
        phone,
        name: input.name.clone(),
        created_at: now,
    })
}

pub fn get_customer_by_id(conn: &Connection, id: &str) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLS),
        &[&id],
    )
}

pub fn get_customer_by_phone(
    conn: &Connection,
    tenant_id: &str,
    phone: &str,
) -> Result<Option<Customer>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM customers WHERE tenant_id = ?1 AND phone = ?2",
            CUSTOMER_COLS
        ),
        &[&tenant_id, &phone],
    )
}

// ============ Waitlist entries ============

pub fn create_waitlist_entry(conn: &Connection, input: &CreateWaitlistEntry) -> Result<WaitlistEntry> {
    let id = EntityType::WaitlistEntry.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO waitlist_entries (id, tenant_id, customer_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?5)",
        params![&id, &input.tenant_id, &input.customer_id, now, now],
    )?;

    Ok(WaitlistEntry {
        id,
        tenant_id: input.tenant_id.clone(),
        customer_id: input.customer_id.clone(),
        status: WaitlistStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_waitlist_entry_by_id(conn: &Connection, id: &str) -> Result<Option<WaitlistEntry>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM waitlist_entries WHERE id = ?1",
            WAITLIST_ENTRY_COLS
        ),
        &[&id],
    )
}

pub fn list_waitlist_entries(
    conn: &Connection,
    tenant_id: &str,
    status: Option<WaitlistStatus>,
) -> Result<Vec<WaitlistEntry>> {
    match status {
        Some(status) => query_all(
            conn,
            &format!(
                "SELECT {} FROM waitlist_entries
                 WHERE tenant_id = ?1 AND status = ?2
                 ORDER BY created_at DESC, id DESC",
                WAITLIST_ENTRY_COLS
            ),
            &[&tenant_id, &status.as_str()],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM waitlist_entries
                 WHERE tenant_id = ?1
                 ORDER BY created_at DESC, id DESC",
                WAITLIST_ENTRY_COLS
            ),
            &[&tenant_id],
        ),
    }
}

/// Resolve the most recently created waitlist entry for the customer whose
/// phone number matches an inbound SMS sender.
pub fn latest_waitlist_entry_for_phone(
    conn: &Connection,
    phone: &str,
) -> Result<Option<WaitlistEntry>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM waitlist_entries w
             JOIN customers c ON c.id = w.customer_id
             WHERE c.phone = ?1
             ORDER BY w.created_at DESC, w.id DESC
             LIMIT 1",
            super::from_row::WAITLIST_ENTRY_COLS_QUALIFIED
        ),
        &[&phone],
    )
}

/// Conditionally transition pending -> contacted. Returns false if the entry
/// was no longer pending (zero rows affected).
pub fn try_mark_waitlist_contacted(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE waitlist_entries SET status = 'contacted', updated_at = ?1
         WHERE id = ?2 AND status = 'pending'",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

/// Conditionally transition contacted -> booked. Zero rows affected means a
/// concurrent processor already booked this entry; the caller must not create
/// an appointment in that case.
pub fn try_book_waitlist_entry(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE waitlist_entries SET status = 'booked', updated_at = ?1
         WHERE id = ?2 AND status = 'contacted'",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

// ============ Appointments ============

pub fn create_appointment(conn: &Connection, input: &CreateAppointment) -> Result<Appointment> {
    let id = EntityType::Appointment.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO appointments (id, tenant_id, customer_id, start_ts, end_ts, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &id,
            &input.tenant_id,
            &input.customer_id,
            input.start_ts,
            input.end_ts,
            input.status.as_str(),
            now,
            now
        ],
    )?;

    Ok(Appointment {
        id,
        tenant_id: input.tenant_id.clone(),
        customer_id: input.customer_id.clone(),
        start_ts: input.start_ts,
        end_ts: input.end_ts,
        status: input.status,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> Result<Option<Appointment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLS),
        &[&id],
    )
}

pub fn list_appointments(conn: &Connection, tenant_id: &str) -> Result<Vec<Appointment>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM appointments WHERE tenant_id = ?1 ORDER BY start_ts",
            APPOINTMENT_COLS
        ),
        &[&tenant_id],
    )
}

/// Find an upcoming appointment (booked or confirmed, starting after
/// `after_ts`) for a tenant/customer pair. Returns its id.
///
/// Guards the webhook against re-booking a customer that some other path
/// already booked.
pub fn find_upcoming_appointment(
    conn: &Connection,
    tenant_id: &str,
    customer_id: &str,
    after_ts: i64,
) -> Result<Option<String>> {
    conn.query_row(
        "SELECT id FROM appointments
         WHERE tenant_id = ?1 AND customer_id = ?2 AND start_ts > ?3
           AND status IN ('booked', 'confirmed')
         ORDER BY start_ts LIMIT 1",
        params![tenant_id, customer_id, after_ts],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

/// Conditionally transition booked -> confirmed. Returns false if the
/// appointment was not in 'booked' (already confirmed, cancelled, ...).
pub fn try_confirm_appointment(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE appointments SET status = 'confirmed', updated_at = ?1
         WHERE id = ?2 AND status = 'booked'",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

// ============ Revenue events ============

/// Record a revenue event for an appointment, idempotently.
///
/// UNIQUE(appointment_id, event_type) + INSERT OR IGNORE: a retried delivery
/// of the same webhook cannot double-count. Returns true if a row was
/// inserted, false if the event already existed.
pub fn try_record_revenue_event(
    conn: &Connection,
    tenant_id: &str,
    event_type: RevenueEventType,
    amount_cents: i64,
    appointment_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO revenue_events
            (id, tenant_id, event_type, amount_cents, appointment_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            EntityType::RevenueEvent.gen_id(),
            tenant_id,
            event_type.as_str(),
            amount_cents,
            appointment_id,
            now()
        ],
    )?;
    Ok(affected > 0)
}

pub fn list_revenue_events(conn: &Connection, tenant_id: &str) -> Result<Vec<RevenueEvent>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM revenue_events WHERE tenant_id = ?1 ORDER BY created_at, id",
            super::from_row::REVENUE_EVENT_COLS
        ),
        &[&tenant_id],
    )
}

/// Sum and count of revenue events of one type since a timestamp.
pub fn revenue_window_totals(
    conn: &Connection,
    tenant_id: &str,
    event_type: RevenueEventType,
    since_ts: i64,
) -> Result<(i64, i64)> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0), COUNT(*) FROM revenue_events
         WHERE tenant_id = ?1 AND event_type = ?2 AND created_at >= ?3",
        params![tenant_id, event_type.as_str(), since_ts],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .map_err(Into::into)
}

/// Per-day revenue (UTC calendar days): (day, event_type, cents, count).
/// Days with no events are absent; the caller zero-fills.
pub fn daily_revenue_series(
    conn: &Connection,
    tenant_id: &str,
    since_ts: i64,
) -> Result<Vec<(String, RevenueEventType, i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT date(created_at, 'unixepoch') AS day, event_type,
                SUM(amount_cents), COUNT(*)
         FROM revenue_events
         WHERE tenant_id = ?1 AND created_at >= ?2
         GROUP BY day, event_type
         ORDER BY day",
    )?;
    let rows = stmt
        .query_map(params![tenant_id, since_ts], |row| {
            let day: String = row.get(0)?;
            let kind: String = row.get(1)?;
            let cents: i64 = row.get(2)?;
            let count: i64 = row.get(3)?;
            Ok((day, kind, cents, count))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .filter_map(|(day, kind, cents, count)| {
            kind.parse::<RevenueEventType>()
                .ok()
                .map(|t| (day, t, cents, count))
        })
        .collect())
}

/// Appointments starting on each UTC calendar day in [since_ts, until_ts).
pub fn daily_appointment_counts(
    conn: &Connection,
    tenant_id: &str,
    since_ts: i64,
    until_ts: i64,
) -> Result<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT date(start_ts, 'unixepoch') AS day, COUNT(*)
         FROM appointments
         WHERE tenant_id = ?1 AND start_ts >= ?2 AND start_ts < ?3
         GROUP BY day
         ORDER BY day",
    )?;
    let rows = stmt
        .query_map(params![tenant_id, since_ts, until_ts], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ Messages ============

pub fn enqueue_message(conn: &Connection, input: &CreateMessage) -> Result<Message> {
    let id = EntityType::Message.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO messages (id, tenant_id, channel, recipient, body, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'queued', ?6)",
        params![
            &id,
            &input.tenant_id,
            input.channel.as_str(),
            &input.recipient,
            &input.body,
            now
        ],
    )?;

    Ok(Message {
        id,
        tenant_id: input.tenant_id.clone(),
        channel: input.channel,
        recipient: input.recipient.clone(),
        body: input.body.clone(),
        status: MessageStatus::Queued,
        created_at: now,
        sent_at: None,
    })
}

pub fn list_messages(conn: &Connection, tenant_id: &str) -> Result<Vec<Message>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM messages WHERE tenant_id = ?1 ORDER BY created_at, id",
            MESSAGE_COLS
        ),
        &[&tenant_id],
    )
}

/// Atomically claim a batch of queued messages, oldest first, marking them
/// sent. The dispatcher is a logging stub, so claim and completion are one
/// step; a real gateway integration would claim into an in-flight state.
pub fn claim_queued_messages(conn: &Connection, limit: i64) -> Result<Vec<Message>> {
    let sql = format!(
        "UPDATE messages SET status = 'sent', sent_at = ?1
         WHERE status = 'queued'
           AND id IN (SELECT id FROM messages WHERE status = 'queued'
                      ORDER BY created_at, id LIMIT ?2)
         RETURNING {}",
        MESSAGE_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query_map(params![now(), limit], Message::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    // RETURNING does not promise an order; deliver oldest first regardless
    rows.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
    Ok(rows)
}
