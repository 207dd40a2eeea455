//! Inbound SMS webhook: the booking confirmation processor.
//!
//! Converts a "YES" reply from a waitlisted customer into a booked
//! appointment exactly once, recording the recovered revenue and queueing
//! the outbound confirmation in the same transaction. The SMS gateway
//! retries delivery by resending the same webhook; the conditional updates
//! and conflict-safe insert below make that safe.

use axum::extract::State;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::Json;
use crate::models::{
    CreateAppointment, CreateMessage, AppointmentStatus, MessageChannel, RevenueEventType,
    WaitlistStatus, RECOVERED_BOOKING_BOUNTY_CENTS,
};

/// Appointments booked over SMS get a default one-hour slot starting now;
/// the tenant reschedules from the dashboard if needed.
const DEFAULT_SLOT_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
pub struct InboundSms {
    pub from: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct InboundSmsResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
}

/// Outcome of processing one inbound SMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Body was not a "YES" confirmation; nothing touched
    Ignored,
    /// No waitlist entry matched the sender; nothing touched
    NoMatch,
    /// The entry was already handled (by an earlier delivery, a concurrent
    /// processor, or another booking path)
    Already { appointment_id: Option<String> },
    /// Entry converted; appointment, revenue event, and message created
    Booked { appointment_id: String },
}

impl ConfirmationOutcome {
    pub fn into_response(self) -> InboundSmsResponse {
        let mut response = InboundSmsResponse {
            ok: true,
            ignored: None,
            no_match: None,
            already: None,
            appointment_id: None,
        };
        match self {
            ConfirmationOutcome::Ignored => response.ignored = Some(true),
            ConfirmationOutcome::NoMatch => response.no_match = Some(true),
            ConfirmationOutcome::Already { appointment_id } => {
                response.already = Some(true);
                response.appointment_id = appointment_id;
            }
            ConfirmationOutcome::Booked { appointment_id } => {
                response.appointment_id = Some(appointment_id);
            }
        }
        response
    }
}

/// Whether an inbound body counts as a confirmation: "YES", case-insensitive,
/// surrounding whitespace ignored.
pub fn is_confirmation(body: &str) -> bool {
    body.trim().eq_ignore_ascii_case("yes")
}

/// Process one inbound SMS as a single unit of work.
///
/// Runs inside one IMMEDIATE transaction: the write lock is taken up front,
/// serializing concurrent deliveries the way `SELECT ... FOR UPDATE` would on
/// a row-locking store. The conditional status updates are the second line of
/// defense: even a delivery processed later sees zero rows affected rather
/// than double-booking. Every early return before `commit` rolls the
/// transaction back on drop (rollback errors are swallowed there, so the
/// original error is what the caller sees).
pub fn process_confirmation(
    conn: &mut Connection,
    from: &str,
    body: &str,
) -> Result<ConfirmationOutcome> {
    if !is_confirmation(body) {
        return Ok(ConfirmationOutcome::Ignored);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now().timestamp();

    // 1. Resolve the sender's most recent waitlist entry.
    let Some(entry) = queries::latest_waitlist_entry_for_phone(&tx, from)? else {
        return Ok(ConfirmationOutcome::NoMatch);
    };

    // 2. First confirmation for this entry: make sure another path didn't
    //    already book this customer, then mark the entry contacted.
    if entry.status != WaitlistStatus::Contacted {
        if let Some(appointment_id) =
            queries::find_upcoming_appointment(&tx, &entry.tenant_id, &entry.customer_id, now)?
        {
            return Ok(ConfirmationOutcome::Already {
                appointment_id: Some(appointment_id),
            });
        }
        // Conditional: no-ops when the entry is already booked, which keeps
        // the pending -> contacted -> booked progression monotonic.
        queries::try_mark_waitlist_contacted(&tx, &entry.id)?;
    }

    // 3. The contacted -> booked transition is the commit point. Zero rows
    //    affected means a concurrent processor won the race.
    if !queries::try_book_waitlist_entry(&tx, &entry.id)? {
        return Ok(ConfirmationOutcome::Already {
            appointment_id: None,
        });
    }

    // 4. Appointment + revenue event + confirmation message, all or nothing.
    let appointment = queries::create_appointment(
        &tx,
        &CreateAppointment {
            tenant_id: entry.tenant_id.clone(),
            customer_id: entry.customer_id.clone(),
            start_ts: now,
            end_ts: now + DEFAULT_SLOT_SECS,
            status: AppointmentStatus::Booked,
        },
    )?;

    queries::try_record_revenue_event(
        &tx,
        &entry.tenant_id,
        RevenueEventType::RecoveredBooking,
        RECOVERED_BOOKING_BOUNTY_CENTS,
        &appointment.id,
    )?;

    queries::enqueue_message(
        &tx,
        &CreateMessage {
            tenant_id: entry.tenant_id.clone(),
            channel: MessageChannel::Sms,
            recipient: from.to_string(),
            body: confirmation_body(appointment.start_ts),
        },
    )?;

    tx.commit()?;

    tracing::info!(
        waitlist_entry_id = %entry.id,
        appointment_id = %appointment.id,
        "waitlist entry converted to booking"
    );

    Ok(ConfirmationOutcome::Booked {
        appointment_id: appointment.id,
    })
}

fn confirmation_body(start_ts: i64) -> String {
    let start = DateTime::<Utc>::from_timestamp(start_ts, 0)
        .map(|t| t.format("%b %-d at %H:%M UTC").to_string())
        .unwrap_or_else(|| "your requested time".to_string());
    format!("You're booked! We'll see you {}. Reply STOP to opt out.", start)
}

/// Axum handler for `POST /webhook/sms`.
pub async fn handle_inbound_sms(
    State(state): State<AppState>,
    Json(inbound): Json<InboundSms>,
) -> Result<Json<InboundSmsResponse>> {
    // An empty body is just a non-confirmation (handled as ignored below),
    // but a blank sender can never be resolved, so reject it outright.
    let from = inbound.from.trim();
    if from.is_empty() {
        return Err(AppError::BadRequest(msg::PHONE_REQUIRED.into()));
    }

    let mut conn = state.db.get()?;
    let outcome = process_confirmation(&mut conn, from, &inbound.body)?;

    if let ConfirmationOutcome::Already { .. } = &outcome {
        tracing::debug!(from = %from, "duplicate confirmation acknowledged");
    }

    Ok(Json(outcome.into_response()))
}
