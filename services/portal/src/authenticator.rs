//! Credential verification and session issuing
//!
//! `authenticate` runs strictly in order: validate input, throttle, look up
//! the account, verify the candidate against the classified credential,
//! migrate a legacy plaintext credential, establish the session.
//!
//! Unknown email and wrong password produce the same `InvalidCredentials`
//! error. Store outages are reported separately as `StoreUnavailable`.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    credential::{CredentialHasher, StoredCredential},
    error::{AuthError, AuthResult},
    models::{Account, Identity, RegistrationRequest},
    rate_limiter::RateLimiter,
    repositories::AccountStore,
    session::SessionContext,
    validation,
};

/// Result of the best-effort legacy credential upgrade
///
/// Never turned into a login failure; only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The plaintext was replaced by a modern hash
    Migrated,
    /// The row changed between our read and our write; left alone
    Superseded,
    /// Hashing or the write failed; the plaintext is still stored
    Failed,
}

/// Verifies credentials and establishes sessions
#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    rate_limiter: RateLimiter,
}

impl Authenticator {
    pub fn new(accounts: Arc<dyn AccountStore>, rate_limiter: RateLimiter) -> Self {
        Self {
            accounts,
            hasher: CredentialHasher::new(),
            rate_limiter,
        }
    }

    /// Verify `email` and `password` and bind `session` to the account
    pub async fn authenticate(
        &self,
        session: &mut SessionContext,
        email: &str,
        password: &str,
    ) -> AuthResult<Identity> {
        let (email, password) = validation::validate_login(email, password)?;

        let throttle_key = email.to_lowercase();
        if !self.rate_limiter.is_allowed(&throttle_key).await {
            return Err(AuthError::RateLimited);
        }

        info!("Login attempt for {}", email);

        let Some(account) = self.accounts.find_by_email(email).await? else {
            self.hasher.verify_decoy(password);
            debug!("No account registered under {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        match &account.credential {
            StoredCredential::Modern(credential) => {
                debug!(
                    "Verifying {:?} credential of account {}",
                    credential.scheme(),
                    account.id
                );
                if !self.hasher.verify(password, credential) {
                    return Err(AuthError::InvalidCredentials);
                }
            }
            StoredCredential::Legacy(stored) => {
                if stored.as_bytes() != password.as_bytes() {
                    return Err(AuthError::InvalidCredentials);
                }
                self.migrate_legacy(&account, stored, password).await;
            }
        }

        let identity = account.identity();
        session.establish(&identity).await?;
        self.rate_limiter.reset(&throttle_key).await;

        info!("Account {} logged in", identity.account_id);
        Ok(identity)
    }

    /// Replace a verified legacy plaintext with a modern hash
    ///
    /// Fire-and-forget from the caller's point of view: the outcome is
    /// logged and returned, never raised.
    pub async fn migrate_legacy(
        &self,
        account: &Account,
        legacy: &str,
        password: &str,
    ) -> MigrationOutcome {
        let outcome = match self.hasher.hash(password) {
            Ok(replacement) => match self
                .accounts
                .replace_legacy_credential(account.id, legacy, &replacement)
                .await
            {
                Ok(true) => MigrationOutcome::Migrated,
                Ok(false) => MigrationOutcome::Superseded,
                Err(e) => {
                    warn!(
                        "Failed to persist migrated credential for account {}: {}",
                        account.id, e
                    );
                    MigrationOutcome::Failed
                }
            },
            Err(e) => {
                warn!("Failed to hash credential for account {}: {}", account.id, e);
                MigrationOutcome::Failed
            }
        };

        match outcome {
            MigrationOutcome::Migrated => {
                info!("Migrated legacy credential for account {}", account.id)
            }
            MigrationOutcome::Superseded => debug!(
                "Credential of account {} changed since it was read, migration skipped",
                account.id
            ),
            MigrationOutcome::Failed => {}
        }

        outcome
    }

    /// Create an account and log it in
    pub async fn register(
        &self,
        session: &mut SessionContext,
        request: &RegistrationRequest,
    ) -> AuthResult<Identity> {
        let student = validation::validate_registration(request)?;

        let already_registered =
            || AuthError::InvalidInput("Email or SRN already registered".to_string());

        if self
            .accounts
            .email_or_srn_exists(&student.email, &student.srn)
            .await?
        {
            return Err(already_registered());
        }

        let password_hash = self.hasher.hash(&student.password).map_err(|e| {
            error!("Failed to hash password for {}: {}", student.email, e);
            AuthError::Internal
        })?;

        let account_id = self
            .accounts
            .create(&student, &password_hash)
            .await?
            .ok_or_else(already_registered)?;

        info!("Registered account {} for {}", account_id, student.email);

        let identity = Identity {
            account_id,
            display_name: student.name,
            email: student.email,
        };
        session.establish(&identity).await?;

        Ok(identity)
    }

    /// End the client's session; logging out anonymously is a no-op
    pub async fn logout(&self, session: &mut SessionContext) -> AuthResult<()> {
        session.clear().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credential::StoredCredential,
        rate_limiter::RateLimiterConfig,
        repositories::memory::MemoryAccountStore,
        session::{MemorySessionStore, SessionStore},
    };

    struct Fixture {
        accounts: Arc<MemoryAccountStore>,
        sessions: Arc<dyn SessionStore>,
        authenticator: Authenticator,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_limit(100)
        }

        fn with_limit(max_attempts: u32) -> Self {
            let accounts = Arc::new(MemoryAccountStore::new());
            let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(3600));
            let rate_limiter = RateLimiter::new(RateLimiterConfig {
                max_attempts,
                ..Default::default()
            });
            let authenticator = Authenticator::new(accounts.clone(), rate_limiter);
            Self {
                accounts,
                sessions,
                authenticator,
            }
        }

        async fn anonymous(&self) -> SessionContext {
            SessionContext::resume(self.sessions.clone(), None)
                .await
                .unwrap()
        }

        async fn login(&self, email: &str, password: &str) -> (AuthResult<Identity>, SessionContext) {
            let mut session = self.anonymous().await;
            let result = self
                .authenticator
                .authenticate(&mut session, email, password)
                .await;
            (result, session)
        }

        async fn modern_account(&self, email: &str, password: &str) -> i64 {
            let hash = CredentialHasher::new().hash(password).unwrap();
            self.accounts.insert("Modern", email, &hash).await
        }
    }

    fn modern(raw: String) -> crate::credential::ModernCredential {
        match StoredCredential::classify(raw) {
            StoredCredential::Modern(credential) => credential,
            StoredCredential::Legacy(_) => panic!("expected a modern credential"),
        }
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let fixture = Fixture::new();
        fixture
            .accounts
            .insert("Asha", "asha@example.com", "password123")
            .await;

        for email in ["nobody@example.com", "ASHA@example.com"] {
            let (result, session) = fixture.login(email, "password123").await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
            assert!(!session.is_active());
        }
    }

    #[tokio::test]
    async fn malformed_input_never_reaches_the_store() {
        let fixture = Fixture::new();

        let (result, _) = fixture.login("not-an-email", "x").await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));

        let (result, _) = fixture.login("user@example.com", "").await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));

        let (result, _) = fixture.login("  ", "secret").await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));

        assert_eq!(fixture.accounts.accesses(), 0);
    }

    #[tokio::test]
    async fn modern_credential_verifies_without_mutation() {
        let fixture = Fixture::new();
        let id = fixture.modern_account("m@example.com", "correct horse").await;
        let stored = fixture.accounts.password_of(id).await.unwrap();

        let (result, session) = fixture.login("m@example.com", "wrong horse").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!session.is_active());
        assert_eq!(fixture.accounts.password_of(id).await.unwrap(), stored);

        let (result, session) = fixture.login("m@example.com", "correct horse").await;
        let identity = result.unwrap();
        assert_eq!(identity.account_id, id);
        assert!(session.is_active());
        assert_eq!(fixture.accounts.password_of(id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn bcrypt_credential_verifies_and_is_kept() {
        let fixture = Fixture::new();
        let hash = bcrypt::hash("hunter22", 4).unwrap();
        let id = fixture.accounts.insert("Old Hash", "b@example.com", &hash).await;

        let (result, session) = fixture.login("b@example.com", "hunter23").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!session.is_active());

        let (result, session) = fixture.login("b@example.com", "hunter22").await;
        assert_eq!(result.unwrap().account_id, id);
        assert!(session.is_active());
        assert_eq!(fixture.accounts.password_of(id).await.unwrap(), hash);
    }

    #[tokio::test]
    async fn unknown_email_costs_a_full_verification() {
        let fixture = Fixture::new();
        fixture.modern_account("m@example.com", "correct horse").await;

        let started = std::time::Instant::now();
        let (result, _) = fixture.login("m@example.com", "wrong horse").await;
        let known = started.elapsed();
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let started = std::time::Instant::now();
        let (result, _) = fixture.login("nobody@example.com", "wrong horse").await;
        let unknown = started.elapsed();
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        // Both paths run one Argon2 verification with the same parameters.
        assert!(
            unknown * 4 >= known,
            "unknown email took {unknown:?}, wrong password took {known:?}"
        );
    }

    #[tokio::test]
    async fn legacy_credential_is_migrated_on_login() {
        let fixture = Fixture::new();
        let id = fixture
            .accounts
            .insert("Test User", "test@example.com", "password123")
            .await;

        let (result, session) = fixture.login("test@example.com", "password123").await;
        let identity = result.unwrap();
        assert_eq!(identity.account_id, id);
        assert_eq!(identity.display_name, "Test User");
        assert_eq!(identity.email, "test@example.com");

        let current = session.current().unwrap();
        assert_eq!(current.account_id, id);

        let stored = fixture.accounts.password_of(id).await.unwrap();
        assert_ne!(stored, "password123");
        assert!(CredentialHasher::new().verify("password123", &modern(stored.clone())));

        // A second login uses the migrated hash and leaves it alone.
        let (result, _) = fixture.login("test@example.com", "password123").await;
        assert_eq!(result.unwrap().account_id, id);
        assert_eq!(fixture.accounts.password_of(id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn legacy_mismatch_is_rejected_and_not_migrated() {
        let fixture = Fixture::new();
        let id = fixture
            .accounts
            .insert("Test User", "test@example.com", "password123")
            .await;

        let (result, _) = fixture.login("test@example.com", "Password123").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(
            fixture.accounts.password_of(id).await.unwrap(),
            "password123"
        );
    }

    #[tokio::test]
    async fn failed_migration_write_does_not_fail_login() {
        let fixture = Fixture::new();
        let id = fixture
            .accounts
            .insert("Test User", "test@example.com", "password123")
            .await;
        fixture.accounts.fail_writes(true);

        let (result, session) = fixture.login("test@example.com", "password123").await;
        assert_eq!(result.unwrap().account_id, id);
        assert!(session.is_active());
        assert_eq!(
            fixture.accounts.password_of(id).await.unwrap(),
            "password123"
        );
    }

    #[tokio::test]
    async fn migration_does_not_clobber_a_concurrent_change() {
        let fixture = Fixture::new();
        let id = fixture
            .accounts
            .insert("Test User", "test@example.com", "password123")
            .await;
        let account = fixture
            .accounts
            .find_by_email("test@example.com")
            .await
            .unwrap()
            .unwrap();

        let first = fixture
            .authenticator
            .migrate_legacy(&account, "password123", "password123")
            .await;
        let after_first = fixture.accounts.password_of(id).await.unwrap();

        // Second login raced with the first and read the same plaintext.
        let second = fixture
            .authenticator
            .migrate_legacy(&account, "password123", "password123")
            .await;

        assert_eq!(first, MigrationOutcome::Migrated);
        assert_eq!(second, MigrationOutcome::Superseded);
        assert_eq!(fixture.accounts.password_of(id).await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn concurrent_legacy_logins_both_succeed() {
        let fixture = Fixture::new();
        let id = fixture
            .accounts
            .insert("Test User", "test@example.com", "password123")
            .await;

        let (a, b) = tokio::join!(
            fixture.login("test@example.com", "password123"),
            fixture.login("test@example.com", "password123"),
        );
        assert_eq!(a.0.unwrap().account_id, id);
        assert_eq!(b.0.unwrap().account_id, id);

        let stored = fixture.accounts.password_of(id).await.unwrap();
        assert!(CredentialHasher::new().verify("password123", &modern(stored)));
    }

    #[tokio::test]
    async fn store_outage_is_distinct_from_bad_credentials() {
        let fixture = Fixture::new();
        fixture.accounts.set_unavailable(true);

        let (result, _) = fixture.login("test@example.com", "password123").await;
        let err = result.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn repeated_failures_are_throttled_per_email() {
        let fixture = Fixture::with_limit(2);
        fixture.modern_account("m@example.com", "right").await;

        for _ in 0..2 {
            let (result, _) = fixture.login("m@example.com", "wrong").await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
        let (result, _) = fixture.login("M@example.com", "right").await;
        assert!(matches!(result, Err(AuthError::RateLimited)));

        let (result, _) = fixture.login("other@example.com", "right").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    fn registration(email: &str, srn: &str, gpa: f64) -> RegistrationRequest {
        RegistrationRequest {
            name: Some("New Student".to_string()),
            email: Some(email.to_string()),
            srn: Some(srn.to_string()),
            phone: Some("9876543210".to_string()),
            password: Some("secret1".to_string()),
            major: Some("Mathematics".to_string()),
            year: Some(1),
            gpa: Some(gpa),
            learning_style: Some("Kinesthetic".to_string()),
            personality_type: Some("ESFP".to_string()),
        }
    }

    #[tokio::test]
    async fn registration_hashes_and_logs_in() {
        let fixture = Fixture::new();
        let mut session = fixture.anonymous().await;

        let identity = fixture
            .authenticator
            .register(&mut session, &registration("new@example.com", "SRN-9", 10.0))
            .await
            .unwrap();
        assert_eq!(session.current().unwrap().identity(), identity);

        let stored = fixture
            .accounts
            .password_of(identity.account_id)
            .await
            .unwrap();
        assert!(stored.starts_with("$argon2"));

        let (result, _) = fixture.login("new@example.com", "secret1").await;
        assert_eq!(result.unwrap(), identity);
    }

    #[tokio::test]
    async fn registration_rejects_duplicates_and_bad_gpa() {
        let fixture = Fixture::new();
        fixture
            .accounts
            .insert("Asha", "asha@example.com", "password123")
            .await;
        let mut session = fixture.anonymous().await;

        let err = fixture
            .authenticator
            .register(&mut session, &registration("asha@example.com", "X1", 5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(m) if m == "Email or SRN already registered"));

        let err = fixture
            .authenticator
            .register(&mut session, &registration("fresh@example.com", "SRN1", 5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));

        let err = fixture
            .authenticator
            .register(&mut session, &registration("fresh@example.com", "X2", 10.1))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let fixture = Fixture::new();
        fixture.modern_account("m@example.com", "right").await;
        let (result, mut session) = fixture.login("m@example.com", "right").await;
        result.unwrap();

        fixture.authenticator.logout(&mut session).await.unwrap();
        assert!(!session.is_active());
        // Logging out twice is harmless.
        fixture.authenticator.logout(&mut session).await.unwrap();
    }
}
