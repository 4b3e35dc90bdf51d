use crate::domain::id::AdminId;
use crate::domain::identity::AdminIdentity;
use crate::domain::ports::CredentialVerifier;
use crate::error::{FulfillmentError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

struct AdminAccount {
    id: AdminId,
    password_hash: SecretString,
}

/// Verifies administrator passwords against Argon2 PHC hashes.
#[derive(Default)]
pub struct Argon2CredentialVerifier {
    accounts: HashMap<String, AdminAccount>,
}

impl Argon2CredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an administrator. The hash is checked for well-formedness up front.
    pub fn with_admin(
        mut self,
        id: AdminId,
        username: impl Into<String>,
        password_hash: SecretString,
    ) -> Result<Self> {
        PasswordHash::new(password_hash.expose_secret()).map_err(|_| {
            FulfillmentError::ValidationError("Admin password hash is not a PHC string".to_string())
        })?;
        self.accounts.insert(
            username.into(),
            AdminAccount { id, password_hash },
        );
        Ok(self)
    }
}

impl CredentialVerifier for Argon2CredentialVerifier {
    fn verify(&self, username: &str, password: &SecretString) -> Result<AdminIdentity> {
        let denied =
            || FulfillmentError::Forbidden("Invalid administrator credentials".to_string());

        let account = self.accounts.get(username).ok_or_else(denied)?;
        let parsed =
            PasswordHash::new(account.password_hash.expose_secret()).map_err(|_| denied())?;
        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .map_err(|_| denied())?;

        Ok(AdminIdentity::new(account.id, username))
    }
}

/// Hashes a password with Argon2id for use in configuration.
pub fn hash_password(password: &SecretString) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| FulfillmentError::ValidationError(format!("Failed to hash password: {e}")))
}
