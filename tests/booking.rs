//! Booking confirmation processor tests
//!
//! Covers the webhook contract: non-confirmations and unknown senders touch
//! nothing, a confirmation converts a waitlist entry exactly once, and
//! duplicate deliveries (sequential or concurrent) never create a second
//! appointment or revenue event.

mod common;

use common::*;
use rebook::handlers::webhooks::{is_confirmation, process_confirmation, ConfirmationOutcome};

const PHONE: &str = "+15551234567";

/// Standard scenario: one tenant, one customer, one pending waitlist entry.
fn setup_pending_entry(conn: &rusqlite::Connection) -> (Tenant, Customer, WaitlistEntry) {
    let tenant = create_test_tenant(conn, "Test Salon");
    let customer = create_test_customer(conn, &tenant.id, PHONE);
    let entry = create_test_waitlist_entry(conn, &tenant.id, &customer.id);
    (tenant, customer, entry)
}

fn assert_no_side_effects(conn: &rusqlite::Connection) {
    assert_eq!(count_rows(conn, "appointments"), 0);
    assert_eq!(count_rows(conn, "revenue_events"), 0);
    assert_eq!(count_rows(conn, "messages"), 0);
}

// ============ Non-confirmation bodies ============

#[test]
fn test_is_confirmation_matching() {
    assert!(is_confirmation("YES"));
    assert!(is_confirmation("yes"));
    assert!(is_confirmation("  Yes  "));
    assert!(is_confirmation("\tyEs\n"));

    assert!(!is_confirmation(""));
    assert!(!is_confirmation("no"));
    assert!(!is_confirmation("yes please"));
    assert!(!is_confirmation("yess"));
    assert!(!is_confirmation("y"));
}

#[test]
fn test_non_yes_body_is_ignored_without_touching_state() {
    let mut conn = setup_test_db();
    let (_, _, entry) = setup_pending_entry(&conn);

    for body in ["no", "NO", " maybe ", "", "yess", "stop"] {
        let outcome = process_confirmation(&mut conn, PHONE, body).expect("process should succeed");
        assert_eq!(outcome, ConfirmationOutcome::Ignored, "body {:?}", body);
    }

    // Entry untouched, nothing created
    let entry = queries::get_waitlist_entry_by_id(&conn, &entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Pending);
    assert_no_side_effects(&conn);
}

// ============ Sender resolution ============

#[test]
fn test_unknown_phone_is_no_match_without_side_effects() {
    let mut conn = setup_test_db();
    setup_pending_entry(&conn);

    let outcome =
        process_confirmation(&mut conn, "+19990000000", "YES").expect("process should succeed");
    assert_eq!(outcome, ConfirmationOutcome::NoMatch);
    assert_no_side_effects(&conn);
}

#[test]
fn test_most_recent_entry_wins() {
    let mut conn = setup_test_db();
    let (tenant, customer, old_entry) = setup_pending_entry(&conn);
    let new_entry = create_test_waitlist_entry(&conn, &tenant.id, &customer.id);

    // Make ordering unambiguous: the second entry is strictly newer
    set_waitlist_entry_created_at(&conn, &old_entry.id, 1_700_000_000);
    set_waitlist_entry_created_at(&conn, &new_entry.id, 1_700_000_100);

    process_confirmation(&mut conn, PHONE, "YES").expect("process should succeed");

    let old_entry = queries::get_waitlist_entry_by_id(&conn, &old_entry.id)
        .unwrap()
        .unwrap();
    let new_entry = queries::get_waitlist_entry_by_id(&conn, &new_entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(old_entry.status, WaitlistStatus::Pending, "old entry untouched");
    assert_eq!(new_entry.status, WaitlistStatus::Booked);
}

// ============ Happy path ============

#[test]
fn test_yes_converts_pending_entry_to_booking() {
    let mut conn = setup_test_db();
    let (tenant, customer, entry) = setup_pending_entry(&conn);

    let outcome = process_confirmation(&mut conn, PHONE, "yes").expect("process should succeed");
    let ConfirmationOutcome::Booked { appointment_id } = outcome else {
        panic!("expected Booked, got {:?}", outcome);
    };

    // Entry ran pending -> contacted -> booked inside the transaction
    let entry = queries::get_waitlist_entry_by_id(&conn, &entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Booked);

    // Appointment: one-hour slot, booked, right tenant and customer
    let appointment = queries::get_appointment_by_id(&conn, &appointment_id)
        .unwrap()
        .unwrap();
    assert_eq!(appointment.tenant_id, tenant.id);
    assert_eq!(appointment.customer_id, customer.id);
    assert_eq!(appointment.status, AppointmentStatus::Booked);
    assert_eq!(appointment.end_ts - appointment.start_ts, 3600);

    // Exactly one recovered_booking revenue event of 5000 cents
    let events = queries::list_revenue_events(&conn, &tenant.id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, RevenueEventType::RecoveredBooking);
    assert_eq!(events[0].amount_cents, 5000);
    assert_eq!(events[0].appointment_id, appointment_id);

    // Confirmation message queued for the sender
    let messages = queries::list_messages(&conn, &tenant.id).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].recipient, PHONE);
    assert_eq!(messages[0].status, MessageStatus::Queued);
    assert_eq!(messages[0].channel, MessageChannel::Sms);
}

#[test]
fn test_contacted_entry_books_directly() {
    let mut conn = setup_test_db();
    let (_, _, entry) = setup_pending_entry(&conn);
    assert!(queries::try_mark_waitlist_contacted(&conn, &entry.id).unwrap());

    let outcome = process_confirmation(&mut conn, PHONE, "YES").expect("process should succeed");
    assert!(matches!(outcome, ConfirmationOutcome::Booked { .. }));

    let entry = queries::get_waitlist_entry_by_id(&conn, &entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Booked);
}

#[test]
fn test_booked_response_serialization() {
    let response = ConfirmationOutcome::Booked {
        appointment_id: "rb_apt_00000000000000000000000000000000".to_string(),
    }
    .into_response();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "ok": true,
            "appointment_id": "rb_apt_00000000000000000000000000000000"
        })
    );

    let json = serde_json::to_value(ConfirmationOutcome::Ignored.into_response()).unwrap();
    assert_eq!(json, serde_json::json!({"ok": true, "ignored": true}));

    let json = serde_json::to_value(
        ConfirmationOutcome::Already {
            appointment_id: None,
        }
        .into_response(),
    )
    .unwrap();
    assert_eq!(json, serde_json::json!({"ok": true, "already": true}));
}

// ============ Duplicate and already-handled deliveries ============

#[test]
fn test_second_yes_is_already_and_creates_nothing() {
    let mut conn = setup_test_db();
    let (tenant, _, _) = setup_pending_entry(&conn);

    let first = process_confirmation(&mut conn, PHONE, "YES").unwrap();
    assert!(matches!(first, ConfirmationOutcome::Booked { .. }));

    let second = process_confirmation(&mut conn, PHONE, "YES").unwrap();
    assert!(
        matches!(second, ConfirmationOutcome::Already { .. }),
        "duplicate delivery must be acknowledged as already handled"
    );

    assert_eq!(count_rows(&conn, "appointments"), 1);
    assert_eq!(queries::list_revenue_events(&conn, &tenant.id).unwrap().len(), 1);
    assert_eq!(queries::list_messages(&conn, &tenant.id).unwrap().len(), 1);
}

#[test]
fn test_existing_future_appointment_guards_uncontacted_entry() {
    let mut conn = setup_test_db();
    let (tenant, customer, entry) = setup_pending_entry(&conn);

    // Another path (dashboard, phone call) already booked this customer
    let future_ts = chrono::Utc::now().timestamp() + 86400;
    let existing =
        create_test_appointment(&conn, &tenant.id, &customer.id, future_ts, AppointmentStatus::Booked);

    let outcome = process_confirmation(&mut conn, PHONE, "YES").unwrap();
    assert_eq!(
        outcome,
        ConfirmationOutcome::Already {
            appointment_id: Some(existing.id.clone())
        }
    );

    // Guard takes no further action: entry still pending, nothing new
    let entry = queries::get_waitlist_entry_by_id(&conn, &entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, WaitlistStatus::Pending);
    assert_eq!(count_rows(&conn, "appointments"), 1);
    assert_eq!(count_rows(&conn, "revenue_events"), 0);
    assert_eq!(count_rows(&conn, "messages"), 0);
}

#[test]
fn test_past_appointment_does_not_guard() {
    let mut conn = setup_test_db();
    let (tenant, customer, _) = setup_pending_entry(&conn);

    // A completed visit last week is not "already handled"
    let past_ts = chrono::Utc::now().timestamp() - 7 * 86400;
    create_test_appointment(&conn, &tenant.id, &customer.id, past_ts, AppointmentStatus::Completed);

    let outcome = process_confirmation(&mut conn, PHONE, "YES").unwrap();
    assert!(matches!(outcome, ConfirmationOutcome::Booked { .. }));
}

#[test]
fn test_booked_entry_never_transitions_again() {
    let mut conn = setup_test_db();
    let (_, _, entry) = setup_pending_entry(&conn);

    process_confirmation(&mut conn, PHONE, "YES").unwrap();
    let booked_at = queries::get_waitlist_entry_by_id(&conn, &entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(booked_at.status, WaitlistStatus::Booked);

    // Several more deliveries: status stays booked, row count stays put
    for _ in 0..3 {
        let outcome = process_confirmation(&mut conn, PHONE, "YES").unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Already { .. }));
    }
    assert_eq!(count_rows(&conn, "appointments"), 1);
}

// ============ Concurrent delivery ============

/// Two deliveries of the same confirmation processed on separate pooled
/// connections: exactly one books, the other sees `already`, and exactly one
/// appointment + revenue event exist afterwards.
#[test]
fn test_parallel_duplicate_confirmations_book_once() {
    let db_path = std::env::temp_dir().join(format!(
        "rebook_race_{}.db",
        uuid::Uuid::new_v4().as_simple()
    ));
    let db_path_str = db_path.to_str().expect("temp path is utf-8").to_string();

    let pool = rebook::db::create_pool(&db_path_str).expect("Failed to create pool");
    let tenant;
    {
        let conn = pool.get().unwrap();
        init_db(&conn).expect("Failed to initialize schema");
        tenant = create_test_tenant(&conn, "Race Salon");
        let customer = create_test_customer(&conn, &tenant.id, PHONE);
        create_test_waitlist_entry(&conn, &tenant.id, &customer.id);
    }

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                let mut conn = pool.get().unwrap();
                process_confirmation(&mut conn, PHONE, "YES").expect("process should succeed")
            })
        })
        .collect();

    let outcomes: Vec<ConfirmationOutcome> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let booked = outcomes
        .iter()
        .filter(|o| matches!(o, ConfirmationOutcome::Booked { .. }))
        .count();
    let already = outcomes
        .iter()
        .filter(|o| matches!(o, ConfirmationOutcome::Already { .. }))
        .count();
    assert_eq!(booked, 1, "exactly one delivery books: {:?}", outcomes);
    assert_eq!(already, 1, "the loser acknowledges: {:?}", outcomes);

    {
        let conn = pool.get().unwrap();
        assert_eq!(count_rows(&conn, "appointments"), 1);
        assert_eq!(queries::list_revenue_events(&conn, &tenant.id).unwrap().len(), 1);
    }

    drop(pool);
    let _ = std::fs::remove_file(&db_path);
    let _ = std::fs::remove_file(format!("{}-wal", db_path_str));
    let _ = std::fs::remove_file(format!("{}-shm", db_path_str));
}
