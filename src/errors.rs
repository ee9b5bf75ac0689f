//! Unified error type for the ordering service.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants are grouped the
//! way callers react to them: validation failures abort the operation without touching
//! storage, storage failures are logged and surfaced as a generic failure, and
//! authentication failures carry only what the admin needs to retry.

use thiserror::Error;

/// All errors produced by the ordering service.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Storage failure reported by `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure (config file, signal handling)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more required fields are missing or empty
    #[error("Missing or invalid fields: {}", fields.join(", "))]
    Validation {
        /// Names of the offending fields
        fields: Vec<String>,
    },

    /// Price outside [0, 1,000,000] or not a finite number
    #[error("Invalid price: {price} (must be between 0 and 1,000,000)")]
    InvalidPrice {
        /// The rejected price
        price: f64,
    },

    /// Zone multiplier outside [0, 10] or not a finite number
    #[error("Invalid multiplier: {multiplier} (must be between 0 and 10)")]
    InvalidMultiplier {
        /// The rejected multiplier
        multiplier: f64,
    },

    /// Quantity must be a positive integer
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// Category is not one of the fixed material categories
    #[error("Unknown category '{category}'")]
    UnknownCategory {
        /// The rejected category
        category: String,
    },

    /// A material with the derived identifier already exists
    #[error("Material '{id}' already exists")]
    MaterialExists {
        /// Derived identifier that collided
        id: String,
    },

    /// A unit with the derived value already exists on the material
    #[error("Unit '{value}' already exists for material '{material_id}'")]
    UnitExists {
        /// Parent material
        material_id: String,
        /// Derived unit value that collided
        value: String,
    },

    /// A zone with that name already exists
    #[error("Zone '{name}' already exists")]
    ZoneExists {
        /// The conflicting name
        name: String,
    },

    /// Material not found
    #[error("Material '{id}' not found")]
    MaterialNotFound {
        /// Identifier that was looked up
        id: String,
    },

    /// Unit not found on the given material
    #[error("Unit '{value}' not found for material '{material_id}'")]
    UnitNotFound {
        /// Parent material
        material_id: String,
        /// Unit value that was looked up
        value: String,
    },

    /// Zone not found
    #[error("Zone '{name}' not found")]
    ZoneNotFound {
        /// Zone name that was looked up
        name: String,
    },

    /// Order line not found
    #[error("Order item '{id}' not found")]
    ItemNotFound {
        /// Line item identifier
        id: String,
    },

    /// An admin-only operation was attempted without an active session
    #[error("Admin login required")]
    NotAuthenticated,

    /// Wrong password
    #[error("Incorrect password. {remaining_attempts} attempt(s) remaining.")]
    InvalidCredentials {
        /// Attempts left before lockout
        remaining_attempts: u32,
    },

    /// Too many failed attempts; login is locked
    #[error("Too many failed attempts. Try again in {retry_after_secs} seconds.")]
    Locked {
        /// Seconds until the lockout expires
        retry_after_secs: i64,
    },

    /// New password rejected
    #[error("Password change rejected: {message}")]
    PasswordPolicy {
        /// Reason shown to the admin
        message: String,
    },

    /// No admin credential has been provisioned yet
    #[error("Admin password has not been provisioned")]
    PasswordNotProvisioned,

    /// Hashing or parsing a stored credential failed
    #[error("Credential error: {message}")]
    Credential {
        /// Underlying hasher message
        message: String,
    },
}

impl Error {
    /// Builds a [`Error::Validation`] for a single field.
    #[must_use]
    pub fn missing(field: &str) -> Self {
        Self::Validation {
            fields: vec![field.to_string()],
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
