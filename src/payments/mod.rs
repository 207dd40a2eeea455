mod stripe;

pub use stripe::*;

use crate::error::{msg, AppError, Result};
use crate::models::Plan;

/// Provider-agnostic view of a completed subscription checkout, validated
/// and ready for provisioning. Built from the provider payload so the
/// provisioning logic never sees provider types.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub customer_email: String,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: String,
    pub provider_price_id: Option<String>,
    pub subscription_status: String,
    pub current_period_end: Option<i64>,
    pub plan: Plan,
    /// Business name entered at checkout, if any
    pub tenant_name: Option<String>,
}

impl CheckoutOutcome {
    /// Validate a retrieved Stripe checkout session and extract what
    /// provisioning needs. Rejections mirror the checkout flow's contract:
    /// wrong mode / missing data are 400s, an unpaid session is a 402.
    pub fn from_stripe(session: StripeCheckoutSession) -> Result<Self> {
        if session.mode != "subscription" {
            return Err(AppError::BadRequest(msg::NOT_SUBSCRIPTION_CHECKOUT.into()));
        }
        if session.payment_status != "paid" {
            return Err(AppError::PaymentRequired(msg::CHECKOUT_NOT_PAID.into()));
        }

        let customer_email = session
            .customer_details
            .as_ref()
            .and_then(|d| d.email.clone())
            .or(session.customer_email)
            .ok_or_else(|| AppError::BadRequest(msg::CHECKOUT_MISSING_EMAIL.into()))?;

        let subscription = session
            .subscription
            .ok_or_else(|| AppError::BadRequest(msg::CHECKOUT_MISSING_SUBSCRIPTION.into()))?;

        let plan = session
            .metadata
            .tier
            .as_deref()
            .and_then(|t| t.parse::<Plan>().ok())
            .ok_or_else(|| AppError::BadRequest(msg::UNKNOWN_PLAN.into()))?;

        let provider_price_id = subscription
            .items
            .as_ref()
            .and_then(|items| items.data.first())
            .map(|item| item.price.id.clone());

        Ok(CheckoutOutcome {
            customer_email,
            provider_customer_id: session.customer,
            provider_subscription_id: subscription.id,
            provider_price_id,
            subscription_status: subscription.status,
            current_period_end: subscription.current_period_end,
            plan,
            tenant_name: session.metadata.org_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paid_session() -> StripeCheckoutSession {
        StripeCheckoutSession {
            id: "cs_test_123".into(),
            mode: "subscription".into(),
            payment_status: "paid".into(),
            customer_email: Some("owner@salon.example".into()),
            customer_details: None,
            customer: Some("cus_123".into()),
            subscription: Some(StripeSubscription {
                id: "sub_123".into(),
                status: "active".into(),
                current_period_end: Some(1_760_000_000),
                items: Some(StripeSubscriptionItems {
                    data: vec![StripeSubscriptionItem {
                        price: StripePrice {
                            id: "price_growth".into(),
                        },
                    }],
                }),
            }),
            metadata: StripeSessionMetadata {
                tier: Some("growth".into()),
                org_name: Some("Fade Factory".into()),
            },
        }
    }

    #[test]
    fn test_outcome_from_paid_session() {
        let outcome = CheckoutOutcome::from_stripe(paid_session()).unwrap();
        assert_eq!(outcome.customer_email, "owner@salon.example");
        assert_eq!(outcome.provider_subscription_id, "sub_123");
        assert_eq!(outcome.plan, Plan::Growth);
        assert_eq!(outcome.provider_price_id.as_deref(), Some("price_growth"));
        assert_eq!(outcome.tenant_name.as_deref(), Some("Fade Factory"));
    }

    #[test]
    fn test_unpaid_session_is_payment_required() {
        let mut session = paid_session();
        session.payment_status = "unpaid".into();
        assert!(matches!(
            CheckoutOutcome::from_stripe(session),
            Err(AppError::PaymentRequired(_))
        ));
    }

    #[test]
    fn test_wrong_mode_rejected() {
        let mut session = paid_session();
        session.mode = "payment".into();
        assert!(matches!(
            CheckoutOutcome::from_stripe(session),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_checkout_email_prefers_customer_details() {
        let mut session = paid_session();
        session.customer_details = Some(StripeCustomerDetails {
            email: Some("entered@checkout.example".into()),
        });
        let outcome = CheckoutOutcome::from_stripe(session).unwrap();
        assert_eq!(outcome.customer_email, "entered@checkout.example");
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let mut session = paid_session();
        session.metadata.tier = Some("enterprise".into());
        assert!(matches!(
            CheckoutOutcome::from_stripe(session),
            Err(AppError::BadRequest(_))
        ));
    }
}
