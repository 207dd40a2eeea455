use serde::{Deserialize, Serialize};

/// A provisioned account (one salon, barbershop, clinic, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Member => "member",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(UserRole::Owner),
            "member" => Ok(UserRole::Member),
            _ => Err(()),
        }
    }
}

/// A dashboard user belonging to a tenant. The provisioning flow creates the
/// first user with the `owner` role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: i64,
}
