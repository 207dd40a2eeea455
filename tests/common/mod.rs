//! Test utilities and fixtures for Rebook integration tests

#![allow(dead_code)]

use rusqlite::Connection;

pub use rebook::db::{init_db, queries};
pub use rebook::models::*;
pub use rebook::payments::CheckoutOutcome;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a test tenant
pub fn create_test_tenant(conn: &Connection, name: &str) -> Tenant {
    queries::create_tenant(conn, name).expect("Failed to create test tenant")
}

/// Create a test customer with the given phone number
pub fn create_test_customer(conn: &Connection, tenant_id: &str, phone: &str) -> Customer {
    queries::create_customer(
        conn,
        &CreateCustomer {
            tenant_id: tenant_id.to_string(),
            phone: phone.to_string(),
            name: Some("Test Customer".to_string()),
        },
    )
    .expect("Failed to create test customer")
}

/// Create a pending waitlist entry
pub fn create_test_waitlist_entry(
    conn: &Connection,
    tenant_id: &str,
    customer_id: &str,
) -> WaitlistEntry {
    queries::create_waitlist_entry(
        conn,
        &CreateWaitlistEntry {
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
        },
    )
    .expect("Failed to create test waitlist entry")
}

/// Create an appointment with an explicit start time and status
pub fn create_test_appointment(
    conn: &Connection,
    tenant_id: &str,
    customer_id: &str,
    start_ts: i64,
    status: AppointmentStatus,
) -> Appointment {
    queries::create_appointment(
        conn,
        &CreateAppointment {
            tenant_id: tenant_id.to_string(),
            customer_id: customer_id.to_string(),
            start_ts,
            end_ts: start_ts + 3600,
            status,
        },
    )
    .expect("Failed to create test appointment")
}

/// A validated checkout outcome as the provisioning logic receives it
pub fn test_checkout_outcome(provider_subscription_id: &str) -> CheckoutOutcome {
    CheckoutOutcome {
        customer_email: "Owner@Salon.Example".to_string(),
        provider_customer_id: Some("cus_test_1".to_string()),
        provider_subscription_id: provider_subscription_id.to_string(),
        provider_price_id: Some("price_growth".to_string()),
        subscription_status: "active".to_string(),
        current_period_end: Some(chrono::Utc::now().timestamp() + 30 * 86400),
        plan: Plan::Growth,
        tenant_name: Some("Fade Factory".to_string()),
    }
}

/// Rewrite a waitlist entry's created_at so ordering tests are deterministic
pub fn set_waitlist_entry_created_at(conn: &Connection, id: &str, created_at: i64) {
    conn.execute(
        "UPDATE waitlist_entries SET created_at = ?1 WHERE id = ?2",
        rusqlite::params![created_at, id],
    )
    .expect("Failed to backdate waitlist entry");
}

/// Rewrite a revenue event's created_at to place it on a past day
pub fn set_revenue_event_created_at(conn: &Connection, id: &str, created_at: i64) {
    conn.execute(
        "UPDATE revenue_events SET created_at = ?1 WHERE id = ?2",
        rusqlite::params![created_at, id],
    )
    .expect("Failed to backdate revenue event");
}

/// Count rows in a table (test-only shortcut)
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .expect("Failed to count rows")
}
