use serde::{Deserialize, Serialize};

/// An end customer of a tenant, resolved from inbound SMS by phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    /// E.164 phone number, the identity for inbound SMS resolution
    pub phone: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    pub tenant_id: String,
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
}
