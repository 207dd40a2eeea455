use axum::extract::State;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{CreateCustomer, Customer};

/// `POST /api/customers` - register a customer under a tenant.
/// The phone number is the identity inbound SMS resolves against, so it is
/// unique per tenant.
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomer>,
) -> Result<Json<Customer>> {
    let phone = request.phone.trim();
    if phone.is_empty() {
        return Err(AppError::BadRequest("phone is required".into()));
    }

    let conn = state.db.get()?;

    queries::get_tenant_by_id(&conn, &request.tenant_id)?.or_not_found(msg::TENANT_NOT_FOUND)?;

    if queries::get_customer_by_phone(&conn, &request.tenant_id, phone)?.is_some() {
        return Err(AppError::Conflict(format!(
            "Customer with phone {} already exists",
            phone
        )));
    }

    let customer = queries::create_customer(&conn, &request)?;
    Ok(Json(customer))
}
