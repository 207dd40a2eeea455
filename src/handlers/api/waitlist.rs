use axum::extract::State;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::models::{CreateWaitlistEntry, WaitlistEntry, WaitlistStatus};

/// `POST /api/waitlist` - put a customer on the waitlist (status `pending`).
/// The booking confirmation processor owns every transition after this.
pub async fn create_waitlist_entry(
    State(state): State<AppState>,
    Json(request): Json<CreateWaitlistEntry>,
) -> Result<Json<WaitlistEntry>> {
    let conn = state.db.get()?;

    let customer = queries::get_customer_by_id(&conn, &request.customer_id)?
        .or_not_found(msg::CUSTOMER_NOT_FOUND)?;
    if customer.tenant_id != request.tenant_id {
        return Err(AppError::BadRequest(msg::CUSTOMER_WRONG_TENANT.into()));
    }

    let entry = queries::create_waitlist_entry(&conn, &request)?;
    Ok(Json(entry))
}

#[derive(Debug, Deserialize)]
pub struct ListWaitlistQuery {
    pub tenant_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /api/waitlist?tenant_id=&status=` - entries newest first.
pub async fn list_waitlist(
    State(state): State<AppState>,
    Query(query): Query<ListWaitlistQuery>,
) -> Result<Json<Vec<WaitlistEntry>>> {
    let conn = state.db.get()?;

    queries::get_tenant_by_id(&conn, &query.tenant_id)?.or_not_found(msg::TENANT_NOT_FOUND)?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            s.parse::<WaitlistStatus>()
                .map_err(|_| AppError::BadRequest(msg::INVALID_WAITLIST_STATUS.into()))?,
        ),
    };

    let entries = queries::list_waitlist_entries(&conn, &query.tenant_id, status)?;
    Ok(Json(entries))
}
