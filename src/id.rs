//! Prefixed ID generation for Rebook entities.
//!
//! All IDs use an `rb_` brand prefix so they can never collide with payment
//! provider IDs (Stripe's `cus_`, `sub_`, `cs_`, etc.).
//!
//! Format: `rb_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "rb_tnt_", "rb_usr_", "rb_bc_", "rb_sub_", "rb_tok_", "rb_cus_", "rb_wle_", "rb_apt_",
    "rb_rev_", "rb_msg_",
];

/// Validate that a string is a valid Rebook prefixed ID.
///
/// Cheap format check to reject garbage before hitting the database:
/// `rb_{entity}_{32_hex_chars}`.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Rebook.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Tenant,
    User,
    BillingCustomer,
    Subscription,
    LoginToken,
    Customer,
    WaitlistEntry,
    Appointment,
    RevenueEvent,
    Message,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tenant => "rb_tnt",
            Self::User => "rb_usr",
            Self::BillingCustomer => "rb_bc",
            Self::Subscription => "rb_sub",
            Self::LoginToken => "rb_tok",
            Self::Customer => "rb_cus",
            Self::WaitlistEntry => "rb_wle",
            Self::Appointment => "rb_apt",
            Self::RevenueEvent => "rb_rev",
            Self::Message => "rb_msg",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Tenant.gen_id();
        assert!(id.starts_with("rb_tnt_"));
        // rb_tnt_ (7 chars) + 32 hex chars
        assert_eq!(id.len(), 39);
    }

    #[test]
    fn test_all_prefixes_unique() {
        let mut seen = std::collections::HashSet::new();
        for prefix in ALL_PREFIXES {
            assert!(seen.insert(prefix), "Duplicate prefix found: {}", prefix);
        }
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        assert!(is_valid_prefixed_id("rb_cus_a1b2c3d4e5f6789012345678901234ab"));
        assert!(is_valid_prefixed_id(&EntityType::WaitlistEntry.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::Appointment.gen_id()));

        assert!(!is_valid_prefixed_id(""));
        assert!(!is_valid_prefixed_id("a1b2c3d4-e5f6-7890-1234-567890123456"));
        assert!(!is_valid_prefixed_id("rb_nope_a1b2c3d4e5f6789012345678901234ab"));
        assert!(!is_valid_prefixed_id("rb_cus_a1b2c3d4"));
        assert!(!is_valid_prefixed_id("rb_cus_a1b2c3d4e5f6789012345678901234gg"));
        assert!(!is_valid_prefixed_id("cus_a1b2c3d4e5f6789012345678901234ab"));
    }
}
