use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Checkout session as returned by `GET /v1/checkout/sessions/{id}` with the
/// subscription expanded. Only the fields provisioning reads are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub mode: String,
    pub payment_status: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    /// Customer id (not expanded, so a plain string)
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<StripeSubscription>,
    #[serde(default)]
    pub metadata: StripeSessionMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: Option<StripeSubscriptionItems>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

/// Session metadata set by the checkout flow. `orgName` is accepted as an
/// alias because older checkout pages sent camelCase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSessionMetadata {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default, alias = "orgName")]
    pub org_name: Option<String>,
}

/// Thin Stripe API client. Checkout-session *creation* happens in the
/// frontend's collaborator; this backend only retrieves sessions to verify
/// payment before provisioning.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Retrieve a checkout session with its subscription expanded.
    /// Returns `Ok(None)` when Stripe reports the session id unknown.
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<StripeCheckoutSession>> {
        let url = format!(
            "https://api.stripe.com/v1/checkout/sessions/{}",
            session_id
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .query(&[("expand[]", "subscription")])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe API error: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "Stripe API error: {}",
                error_text
            )));
        }

        let session: StripeCheckoutSession = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkout_session_payload() {
        let payload = serde_json::json!({
            "id": "cs_test_a1",
            "object": "checkout.session",
            "mode": "subscription",
            "payment_status": "paid",
            "customer": "cus_9",
            "customer_details": {"email": "owner@shop.example", "address": {"country": "US"}},
            "subscription": {
                "id": "sub_9",
                "status": "active",
                "current_period_end": 1760000000,
                "items": {"data": [{"price": {"id": "price_starter"}}]}
            },
            "metadata": {"tier": "starter", "orgName": "Shear Genius"}
        });

        let session: StripeCheckoutSession = serde_json::from_value(payload).unwrap();
        assert_eq!(session.mode, "subscription");
        assert_eq!(session.customer.as_deref(), Some("cus_9"));
        assert_eq!(
            session.subscription.as_ref().map(|s| s.id.as_str()),
            Some("sub_9")
        );
        // camelCase alias from older checkout pages
        assert_eq!(session.metadata.org_name.as_deref(), Some("Shear Genius"));
    }

    #[test]
    fn test_parse_session_with_sparse_fields() {
        let payload = serde_json::json!({
            "id": "cs_test_b2",
            "mode": "payment",
            "payment_status": "unpaid"
        });

        let session: StripeCheckoutSession = serde_json::from_value(payload).unwrap();
        assert!(session.customer.is_none());
        assert!(session.subscription.is_none());
        assert!(session.metadata.tier.is_none());
    }
}
