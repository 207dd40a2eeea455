//! Tenant provisioning from a completed checkout session.
//!
//! The success page posts the checkout session id here after payment. The
//! session is verified against the payment provider, then the tenant, owner
//! user, billing link, subscription, and a one-time login token are created
//! in a single transaction. The subscription's provider id is the
//! idempotency key, so the provider (or an impatient user refreshing the
//! success page) re-posting the same session cannot provision twice.

use axum::extract::State;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::{CreateSubscription, UserRole};
use crate::payments::CheckoutOutcome;
use crate::util::{generate_token, sha256_hex};

/// One-time login tokens are valid for 30 minutes.
const LOGIN_TOKEN_TTL_SECS: i64 = 30 * 60;

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_provisioned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Raw one-time login token; only its hash is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_token: Option<String>,
    pub login_url: String,
}

/// Result of applying a validated checkout to the database.
#[derive(Debug)]
pub enum ProvisionResult {
    /// This subscription was provisioned by an earlier call
    AlreadyProvisioned,
    Provisioned {
        tenant_id: String,
        login_token: String,
    },
}

/// Create the tenant account for a paid checkout, exactly once.
///
/// The existence check and the creations run in one IMMEDIATE transaction,
/// and the subscription insert conflicts on provider_subscription_id, so two
/// racing calls for the same checkout cannot both create a tenant.
pub fn provision_from_checkout(
    conn: &mut Connection,
    outcome: &CheckoutOutcome,
) -> Result<ProvisionResult> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::get_subscription_by_provider_id(&tx, &outcome.provider_subscription_id)?.is_some()
    {
        return Ok(ProvisionResult::AlreadyProvisioned);
    }

    let tenant_name = outcome
        .tenant_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            // Fall back to the email local part, like the checkout page does
            outcome
                .customer_email
                .split('@')
                .next()
                .unwrap_or("workspace")
                .to_string()
        });

    let tenant = queries::create_tenant(&tx, &tenant_name)?;
    let owner = queries::create_user(&tx, &tenant.id, &outcome.customer_email, UserRole::Owner)?;

    if let Some(provider_customer_id) = &outcome.provider_customer_id {
        queries::create_billing_customer(&tx, &tenant.id, "stripe", provider_customer_id)?;
    }

    queries::upsert_subscription(
        &tx,
        &CreateSubscription {
            tenant_id: tenant.id.clone(),
            provider_subscription_id: outcome.provider_subscription_id.clone(),
            plan: outcome.plan,
            price_cents: outcome.plan.monthly_price_cents(),
            provider_price_id: outcome.provider_price_id.clone(),
            status: outcome.subscription_status.clone(),
            current_period_end: outcome.current_period_end,
        },
    )?;

    // The token belongs to the owner user created above, in the same
    // transaction: a half-provisioned account can never hold a live token.
    let raw_token = generate_token();
    let expires_at = chrono::Utc::now().timestamp() + LOGIN_TOKEN_TTL_SECS;
    queries::create_login_token(&tx, &owner.id, &sha256_hex(&raw_token), expires_at)?;

    tx.commit()?;

    tracing::info!(
        tenant_id = %tenant.id,
        plan = %outcome.plan.as_str(),
        "tenant provisioned from checkout"
    );

    Ok(ProvisionResult::Provisioned {
        tenant_id: tenant.id,
        login_token: raw_token,
    })
}

/// Axum handler for `POST /api/provision/from-session`.
pub async fn provision_from_session(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Json<ProvisionResponse>> {
    if request.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("session_id is required".into()));
    }

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| AppError::BadRequest(msg::STRIPE_NOT_CONFIGURED.into()))?;

    let session = stripe
        .retrieve_checkout_session(request.session_id.trim())
        .await?
        .or_not_found(msg::CHECKOUT_SESSION_NOT_FOUND)?;

    let outcome = CheckoutOutcome::from_stripe(session)?;

    let mut conn = state.db.get()?;
    let result = provision_from_checkout(&mut conn, &outcome)?;

    let login_url = format!("{}/?logged=1", state.app_url);
    let response = match result {
        ProvisionResult::AlreadyProvisioned => ProvisionResponse {
            ok: true,
            already_provisioned: Some(true),
            tenant_id: None,
            login_token: None,
            login_url,
        },
        ProvisionResult::Provisioned {
            tenant_id,
            login_token,
        } => ProvisionResponse {
            ok: true,
            already_provisioned: None,
            tenant_id: Some(tenant_id),
            login_token: Some(login_token),
            login_url,
        },
    };

    Ok(Json(response))
}
