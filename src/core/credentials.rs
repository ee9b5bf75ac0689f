//! Admin credential storage.
//!
//! The admin password is stored as a salted Argon2 PHC string under
//! [`PASSWORD_HASH_KEY`]. There is no built-in default password: the service provisions
//! the first credential from configuration, and login fails until one exists.

use crate::{
    core::admin_settings,
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

/// Settings key holding the password hash.
pub const PASSWORD_HASH_KEY: &str = "admin_password_hash";

/// Minimum length of a new admin password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes a password with a fresh random salt.
///
/// # Errors
/// Returns `Error::Credential` if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Credential {
            message: e.to_string(),
        })
}

/// Checks a password against a stored PHC hash.
///
/// # Errors
/// Returns `Error::Credential` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::Credential {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Checks a password against the stored admin credential.
///
/// # Errors
/// Returns `Error::PasswordNotProvisioned` if no credential is stored, or a storage or
/// credential error.
pub async fn check_admin_password(db: &DatabaseConnection, password: &str) -> Result<bool> {
    let stored = admin_settings::get_setting(db, PASSWORD_HASH_KEY)
        .await?
        .ok_or(Error::PasswordNotProvisioned)?;
    verify_password(password, &stored)
}

/// Hashes and stores a new admin password.
///
/// # Errors
/// Returns an error if hashing or the write fails.
pub async fn store_admin_password(
    db: &DatabaseConnection,
    password: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let hash = hash_password(password)?;
    admin_settings::set_setting(db, PASSWORD_HASH_KEY, &hash, now).await
}

/// Stores `initial_password` as the admin credential if none exists yet.
/// Returns `true` if a credential was written.
///
/// # Errors
/// Returns `Error::PasswordPolicy` if the initial password is too short, or a storage error.
pub async fn provision_admin_password(
    db: &DatabaseConnection,
    initial_password: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool> {
    if admin_settings::get_setting(db, PASSWORD_HASH_KEY)
        .await?
        .is_some()
    {
        return Ok(false);
    }
    let Some(password) = initial_password else {
        warn!("No admin password stored and none provided; admin login is disabled");
        return Ok(false);
    };
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::PasswordPolicy {
            message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }
    store_admin_password(db, password, now).await?;
    info!("Provisioned initial admin password");
    Ok(true)
}
