//! Persistent account storage

use async_trait::async_trait;
use common::StoreResult;

use crate::models::{Account, NewStudent, ProfileChanges, StudentProfile};

pub mod account;
#[cfg(test)]
pub mod memory;

pub use account::PgAccountRepository;

/// Operations the portal needs from the account store
///
/// Email comparison is whatever the store's equality provides. For
/// PostgreSQL that is exact, case-sensitive matching on the stored text.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up the account registered under `email`
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Overwrite a legacy plaintext credential with `replacement`, but only
    /// if the row still holds `legacy`. Returns whether the row was updated.
    async fn replace_legacy_credential(
        &self,
        account_id: i64,
        legacy: &str,
        replacement: &str,
    ) -> StoreResult<bool>;

    /// Whether an account already uses `email` or the enrollment id `srn`
    async fn email_or_srn_exists(&self, email: &str, srn: &str) -> StoreResult<bool>;

    /// Insert a student with an already hashed password
    ///
    /// Returns `None` when a concurrent registration took the email or srn.
    async fn create(&self, student: &NewStudent, password_hash: &str) -> StoreResult<Option<i64>>;

    async fn find_profile(&self, account_id: i64) -> StoreResult<Option<StudentProfile>>;

    /// Apply a partial update. Returns whether a row was changed.
    async fn update_profile(&self, account_id: i64, changes: &ProfileChanges) -> StoreResult<bool>;

    /// Whether the store is reachable
    async fn ping(&self) -> StoreResult<bool>;
}
