//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identity;

/// Server-side record binding a client to an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub account_id: i64,
    pub display_name: String,
    pub email: String,
    pub established_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    pub fn new(identity: &Identity) -> Self {
        Self {
            account_id: identity.account_id,
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            established_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.account_id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}
