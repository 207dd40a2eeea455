//! Appointment confirmation: the prevented-no-show revenue path.
//!
//! When a customer confirms a reminder for an existing appointment, the
//! dashboard (or the reminder collaborator) posts here. Same shape as the
//! booking processor's core: conditional status update plus a conflict-safe
//! revenue insert in one transaction, so a double-click or redelivered
//! reminder callback cannot count the save twice.

use axum::extract::State;
use rusqlite::TransactionBehavior;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Path};
use crate::models::{RevenueEventType, PREVENTED_NO_SHOW_VALUE_CENTS};

#[derive(Debug, Serialize)]
pub struct ConfirmAppointmentResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already: Option<bool>,
    pub appointment_id: String,
}

/// `POST /api/appointments/{id}/confirm`
pub async fn confirm_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmAppointmentResponse>> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let appointment =
        queries::get_appointment_by_id(&tx, &id)?.or_not_found(msg::APPOINTMENT_NOT_FOUND)?;

    // booked -> confirmed, conditionally. Zero rows affected means someone
    // already confirmed (or the appointment left 'booked' another way).
    if !queries::try_confirm_appointment(&tx, &appointment.id)? {
        return Ok(Json(ConfirmAppointmentResponse {
            ok: true,
            already: Some(true),
            appointment_id: appointment.id,
        }));
    }

    queries::try_record_revenue_event(
        &tx,
        &appointment.tenant_id,
        RevenueEventType::PreventedNoShow,
        PREVENTED_NO_SHOW_VALUE_CENTS,
        &appointment.id,
    )?;

    tx.commit()?;

    tracing::info!(appointment_id = %appointment.id, "appointment confirmed");

    Ok(Json(ConfirmAppointmentResponse {
        ok: true,
        already: None,
        appointment_id: appointment.id,
    }))
}
