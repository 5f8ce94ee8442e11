//! Account model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::credential::StoredCredential;

/// A registered student as seen by the credential verifier
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Classified once when the row is read
    pub credential: StoredCredential,
}

impl Account {
    /// Build an account from its stored columns
    pub fn from_stored(id: i64, name: String, email: String, password: String) -> Self {
        Self {
            id,
            name,
            email,
            credential: StoredCredential::classify(password),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.id,
            display_name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The identity returned to the caller after login or registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub account_id: i64,
    #[serde(rename = "name")]
    pub display_name: String,
    pub email: String,
}

/// Full profile row, never carrying the credential
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentProfile {
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub major: String,
    pub year: i16,
    pub gpa: f64,
    pub learning_style: String,
    pub personality_type: String,
    pub needs_help: bool,
    pub can_teach: bool,
    pub created_date: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
}
