use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use sha2::{Digest, Sha256};

use crate::config::AdminConfig;

/// Decides whether a username/password pair identifies the administrator.
pub trait AdminVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("admin.username is set but neither admin.password nor admin.password_hash is")]
    MissingPassword,
    #[error("admin.password is set without admin.username")]
    MissingUsername,
    #[error("admin.password_hash is not a valid PHC string: {0}")]
    InvalidHash(String),
}

enum Secret {
    /// SHA-256 of a plain configured password.
    Plain([u8; 32]),
    /// Argon2 PHC string.
    Hashed(String),
}

/// A single administrator account supplied through configuration.
pub struct StaticAdminCredentials {
    username_digest: [u8; 32],
    secret: Secret,
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

impl StaticAdminCredentials {
    /// Build from config. `Ok(None)` means no administrator is configured.
    pub fn from_config(config: &AdminConfig) -> Result<Option<Self>, CredentialsError> {
        let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) else {
            if config.password.is_some() || config.password_hash.is_some() {
                return Err(CredentialsError::MissingUsername);
            }
            return Ok(None);
        };

        let secret = match (&config.password_hash, &config.password) {
            (Some(hash), _) => {
                PasswordHash::new(hash).map_err(|e| CredentialsError::InvalidHash(e.to_string()))?;
                Secret::Hashed(hash.clone())
            }
            (None, Some(password)) if !password.is_empty() => Secret::Plain(digest(password)),
            _ => return Err(CredentialsError::MissingPassword),
        };

        Ok(Some(Self {
            username_digest: digest(username),
            secret,
        }))
    }
}

impl AdminVerifier for StaticAdminCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        // Digests keep the comparison independent of where inputs first differ.
        let username_ok = digest(username) == self.username_digest;
        let password_ok = match &self.secret {
            Secret::Plain(expected) => digest(password) == *expected,
            Secret::Hashed(phc) => PasswordHash::new(phc)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false),
        };
        username_ok && password_ok
    }
}
