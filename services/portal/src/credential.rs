//! Stored password credentials
//!
//! The password column holds either a legacy plaintext password or a salted
//! hash. `StoredCredential::classify` decides which once, right after the row
//! is read; everything downstream matches on the variant instead of looking
//! at the string again.
//!
//! New hashes are always Argon2id PHC strings (`$argon2id$v=19$m=...`).
//! Bcrypt strings (`$2b$...`) written by the previous deployment are still
//! accepted for verification but never produced.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use std::fmt;
use tracing::warn;

const ARGON2_PREFIX: &str = "$argon2";
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Argon2id with the default parameters over a random password and salt.
/// Verifying against it costs as much as verifying a real credential.
const DECOY_ARGON2: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$cfgOuDH5vNF1qAtHjmenRQ$nqwX28ReffyvZp8K3IlvwnUPByLyqTxCzSaYwKbjrkI";

/// Hashing scheme of a modern credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Argon2,
    Bcrypt,
}

/// A salted hash in its encoded form; salt and parameters travel inside it
#[derive(Clone, PartialEq, Eq)]
pub struct ModernCredential {
    scheme: HashScheme,
    encoded: String,
}

impl ModernCredential {
    pub fn scheme(&self) -> HashScheme {
        self.scheme
    }
}

impl fmt::Debug for ModernCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModernCredential")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// The two shapes a stored password can take
#[derive(Clone, PartialEq, Eq)]
pub enum StoredCredential {
    /// Plaintext from before hashing was introduced
    Legacy(String),
    Modern(ModernCredential),
}

impl StoredCredential {
    /// Classify a raw column value by its scheme prefix
    pub fn classify(raw: String) -> Self {
        let scheme = if raw.starts_with(ARGON2_PREFIX) {
            Some(HashScheme::Argon2)
        } else if BCRYPT_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
            Some(HashScheme::Bcrypt)
        } else {
            None
        };

        match scheme {
            Some(scheme) => StoredCredential::Modern(ModernCredential {
                scheme,
                encoded: raw,
            }),
            None => StoredCredential::Legacy(raw),
        }
    }
}

// Never print the plaintext.
impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredCredential::Legacy(_) => f.write_str("Legacy(<redacted>)"),
            StoredCredential::Modern(credential) => {
                f.debug_tuple("Modern").field(credential).finish()
            }
        }
    }
}

/// Produces and checks modern credentials
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password with Argon2id and a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self.argon2.hash_password(plaintext.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// Check a plaintext candidate against a modern credential
    ///
    /// A credential that carries a scheme prefix but cannot be decoded never
    /// verifies.
    pub fn verify(&self, plaintext: &str, credential: &ModernCredential) -> bool {
        match credential.scheme {
            HashScheme::Argon2 => match PasswordHash::new(&credential.encoded) {
                Ok(parsed) => self
                    .argon2
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    warn!("Stored argon2 credential is malformed: {}", e);
                    false
                }
            },
            HashScheme::Bcrypt => match bcrypt::verify(plaintext, &credential.encoded) {
                Ok(valid) => valid,
                Err(e) => {
                    warn!("Stored bcrypt credential is malformed: {}", e);
                    false
                }
            },
        }
    }

    /// Spend one full Argon2 verification on `plaintext` without an account
    ///
    /// Used when no account matches, so that path takes as long as a wrong
    /// password for an existing account.
    pub fn verify_decoy(&self, plaintext: &str) -> bool {
        let decoy = ModernCredential {
            scheme: HashScheme::Argon2,
            encoded: DECOY_ARGON2.to_string(),
        };
        self.verify(plaintext, &decoy)
    }
}
