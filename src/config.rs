//! Runtime configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `ORDERFLOW_DB_PATH` - RocksDB directory (read by the CLI, optional)
//! - `ORDERFLOW_ADMIN_USERNAME` - administrator login
//! - `ORDERFLOW_ADMIN_PASSWORD_HASH` - Argon2 PHC hash of the administrator password
//! - `ORDERFLOW_ADMIN_PASSWORD` - password presented by an admin command. Never
//!   taken from the command line.
//!
//! The two admin variables must be set together. Without them no
//! administrator can authenticate.

use crate::domain::id::AdminId;
use crate::infrastructure::credentials::Argon2CredentialVerifier;
use secrecy::SecretString;
use thiserror::Error;
use uuid::Uuid;

pub const ENV_DB_PATH: &str = "ORDERFLOW_DB_PATH";
pub const ENV_ADMIN_USERNAME: &str = "ORDERFLOW_ADMIN_USERNAME";
pub const ENV_ADMIN_PASSWORD_HASH: &str = "ORDERFLOW_ADMIN_PASSWORD_HASH";
pub const ENV_ADMIN_PASSWORD: &str = "ORDERFLOW_ADMIN_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// The single configured administrator account.
#[derive(Clone)]
pub struct AdminAccountConfig {
    pub username: String,
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccountConfig")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AdminAccountConfig {
    /// Stable id derived from the username, so audit entries line up across runs.
    pub fn admin_id(&self) -> AdminId {
        AdminId::from_uuid(Uuid::new_v5(&Uuid::NAMESPACE_OID, self.username.as_bytes()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub admin: Option<AdminAccountConfig>,
    pub admin_password: Option<SecretString>,
}

impl AppConfig {
    /// Loads configuration, reading a `.env` file first if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let username = lookup(ENV_ADMIN_USERNAME).filter(|v| !v.trim().is_empty());
        let hash = lookup(ENV_ADMIN_PASSWORD_HASH).filter(|v| !v.trim().is_empty());

        let admin = match (username, hash) {
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    ENV_ADMIN_PASSWORD_HASH.to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(ENV_ADMIN_USERNAME.to_string()));
            }
            (Some(username), Some(hash)) => {
                if !hash.starts_with("$argon2") {
                    return Err(ConfigError::InvalidEnvVar(
                        ENV_ADMIN_PASSWORD_HASH.to_string(),
                        "expected an Argon2 PHC string".to_string(),
                    ));
                }
                Some(AdminAccountConfig {
                    username: username.trim().to_string(),
                    password_hash: SecretString::from(hash),
                })
            }
        };
        let admin_password = lookup(ENV_ADMIN_PASSWORD)
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        Ok(Self {
            admin,
            admin_password,
        })
    }

    /// Builds the credential verifier for the configured administrator.
    pub fn credential_verifier(&self) -> Result<Argon2CredentialVerifier, ConfigError> {
        let verifier = Argon2CredentialVerifier::new();
        match &self.admin {
            None => Ok(verifier),
            Some(admin) => verifier
                .with_admin(
                    admin.admin_id(),
                    admin.username.clone(),
                    admin.password_hash.clone(),
                )
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(ENV_ADMIN_PASSWORD_HASH.to_string(), e.to_string())
                }),
        }
    }
}
