//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fastlanche_core::{Email, Role, UserId};

/// A registered user. The password hash is never loaded into this type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
