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

// ============ SQL SELECT Constants ============

pub const TENANT_COLS: &str = "id, name, created_at, updated_at";

pub const USER_COLS: &str = "id, tenant_id, email, role, created_at";

pub const BILLING_CUSTOMER_COLS: &str =
    "id, tenant_id, provider, provider_customer_id, created_at";

pub const SUBSCRIPTION_COLS: &str = "id, tenant_id, provider_subscription_id, plan, price_cents, provider_price_id, status, current_period_end, created_at, updated_at";

pub const LOGIN_TOKEN_COLS: &str = "id, user_id, token_hash, expires_at, used, created_at";

pub const CUSTOMER_COLS: &str = "id, tenant_id, phone, name, created_at";

pub const WAITLIST_ENTRY_COLS: &str =
    "id, tenant_id, customer_id, status, created_at, updated_at";

/// Waitlist entry columns qualified for joins against customers.
pub const WAITLIST_ENTRY_COLS_QUALIFIED: &str =
    "w.id, w.tenant_id, w.customer_id, w.status, w.created_at, w.updated_at";

pub const APPOINTMENT_COLS: &str =
    "id, tenant_id, customer_id, start_ts, end_ts, status, created_at, updated_at";

pub const REVENUE_EVENT_COLS: &str =
    "id, tenant_id, event_type, amount_cents, appointment_id, created_at";

pub const MESSAGE_COLS: &str =
    "id, tenant_id, channel, recipient, body, status, created_at, sent_at";

// ============ FromRow Implementations ============

impl FromRow for Tenant {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tenant {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            email: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for BillingCustomer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BillingCustomer {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            provider: row.get(2)?,
            provider_customer_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            provider_subscription_id: row.get(2)?,
            plan: parse_enum(row, 3, "plan")?,
            price_cents: row.get(4)?,
            provider_price_id: row.get(5)?,
            status: row.get(6)?,
            current_period_end: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for LoginToken {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LoginToken {
            id: row.get(0)?,
            user_id: row.get(1)?,
            token_hash: row.get(2)?,
            expires_at: row.get(3)?,
            used: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Customer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Customer {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            phone: row.get(2)?,
            name: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for WaitlistEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WaitlistEntry {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            customer_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Appointment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Appointment {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            customer_id: row.get(2)?,
            start_ts: row.get(3)?,
            end_ts: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for RevenueEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(RevenueEvent {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            event_type: parse_enum(row, 2, "event_type")?,
            amount_cents: row.get(3)?,
            appointment_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Message {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Message {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            channel: parse_enum(row, 2, "channel")?,
            recipient: row.get(3)?,
            body: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            created_at: row.get(6)?,
            sent_at: row.get(7)?,
        })
    }
}
