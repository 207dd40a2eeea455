use serde::{Deserialize, Serialize};

/// Subscription plan tiers with fixed monthly pricing.
///
/// Prices are server-side constants so ROI math never depends on what the
/// payment provider happens to report for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Growth,
    Unlimited,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Growth => "growth",
            Plan::Unlimited => "unlimited",
        }
    }

    /// Monthly subscription price in cents.
    pub fn monthly_price_cents(&self) -> i64 {
        match self {
            Plan::Starter => 4900,
            Plan::Growth => 9900,
            Plan::Unlimited => 19900,
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Plan::Starter),
            "growth" => Ok(Plan::Growth),
            "unlimited" => Ok(Plan::Unlimited),
            _ => Err(()),
        }
    }
}

/// A tenant's subscription, upserted from checkout-session data.
/// `provider_subscription_id` is the idempotency key for provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub tenant_id: String,
    pub provider_subscription_id: String,
    pub plan: Plan,
    pub price_cents: i64,
    pub provider_price_id: Option<String>,
    /// Provider-reported status ("active", "trialing", "past_due", ...)
    pub status: String,
    pub current_period_end: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub tenant_id: String,
    pub provider_subscription_id: String,
    pub plan: Plan,
    pub price_cents: i64,
    pub provider_price_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<i64>,
}

/// Link between a tenant and its payment-provider customer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingCustomer {
    pub id: String,
    pub tenant_id: String,
    pub provider: String,
    pub provider_customer_id: String,
    pub created_at: i64,
}

/// One-time login token issued at provisioning time. Only the SHA-256 hash
/// is stored; the raw token is shown to the caller exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginToken {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: i64,
    pub used: bool,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_round_trip() {
        for plan in [Plan::Starter, Plan::Growth, Plan::Unlimited] {
            assert_eq!(plan.as_str().parse::<Plan>(), Ok(plan));
        }
        assert!("enterprise".parse::<Plan>().is_err());
    }

    #[test]
    fn test_plan_prices_ascend() {
        assert!(Plan::Starter.monthly_price_cents() < Plan::Growth.monthly_price_cents());
        assert!(Plan::Growth.monthly_price_cents() < Plan::Unlimited.monthly_price_cents());
    }
}
