use serde::{Deserialize, Serialize};

/// Waitlist entry lifecycle. Transitions are monotonic:
/// pending -> contacted -> booked. Once `booked`, no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Pending,
    Contacted,
    Booked,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitlistStatus::Pending => "pending",
            WaitlistStatus::Contacted => "contacted",
            WaitlistStatus::Booked => "booked",
        }
    }
}

impl std::str::FromStr for WaitlistStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WaitlistStatus::Pending),
            "contacted" => Ok(WaitlistStatus::Contacted),
            "booked" => Ok(WaitlistStatus::Booked),
            _ => Err(()),
        }
    }
}

/// A customer waiting for an open appointment slot.
///
/// Created when a customer is waitlisted; status is mutated only by the
/// booking confirmation processor (via conditional updates); never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: String,
    pub status: WaitlistStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateWaitlistEntry {
    pub tenant_id: String,
    pub customer_id: String,
}
