use serde::{Deserialize, Serialize};

/// Value credited for a waitlist entry recovered via SMS confirmation, in
/// cents.
pub const RECOVERED_BOOKING_BOUNTY_CENTS: i64 = 5000;

/// Value credited when a reminder confirmation prevents a likely no-show,
/// in cents.
pub const PREVENTED_NO_SHOW_VALUE_CENTS: i64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueEventType {
    RecoveredBooking,
    PreventedNoShow,
}

impl RevenueEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueEventType::RecoveredBooking => "recovered_booking",
            RevenueEventType::PreventedNoShow => "prevented_no_show",
        }
    }
}

impl std::str::FromStr for RevenueEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recovered_booking" => Ok(RevenueEventType::RecoveredBooking),
            "prevented_no_show" => Ok(RevenueEventType::PreventedNoShow),
            _ => Err(()),
        }
    }
}

/// A dollar-value outcome attributed to an appointment.
///
/// UNIQUE(appointment_id, event_type) in the schema means at most one event
/// of a given type exists per appointment; inserts go through
/// `INSERT OR IGNORE` so retried webhook deliveries cannot double-count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEvent {
    pub id: String,
    pub tenant_id: String,
    pub event_type: RevenueEventType,
    pub amount_cents: i64,
    pub appointment_id: String,
    pub created_at: i64,
}
