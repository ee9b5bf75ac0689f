//! Store settings loaded from config.toml.
//!
//! Every section is optional. Missing values fall back to the defaults below, which
//! match the behaviour the storefront has always had: 30 minute idle timeout, three
//! login attempts, a five minute lockout and a 30 day activity retention window.

use crate::errors::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest configurable session timeout or lockout (one year).
pub const MAX_POLICY_MINUTES: i64 = 525_600;

/// Longest configurable debounce window (one minute).
pub const MAX_DEBOUNCE_MS: i64 = 60_000;

/// All store-wide settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Company block printed on receipts
    #[serde(default)]
    pub company: CompanyInfo,
    /// Admin session policy
    #[serde(default)]
    pub session: SessionPolicy,
    /// Activity log policy
    #[serde(default)]
    pub activity: ActivityPolicy,
    /// Admin edit debouncing
    #[serde(default)]
    pub editing: EditingPolicy,
}

impl StoreSettings {
    /// Checks that every policy value is in range.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (
                "session.idle_timeout_minutes",
                (1..=MAX_POLICY_MINUTES).contains(&self.session.idle_timeout_minutes),
            ),
            (
                "session.lockout_minutes",
                (1..=MAX_POLICY_MINUTES).contains(&self.session.lockout_minutes),
            ),
            (
                "session.max_failed_attempts",
                self.session.max_failed_attempts >= 1,
            ),
            ("session.tick_seconds", self.session.tick_seconds >= 1),
            (
                "editing.debounce_ms",
                (0..=MAX_DEBOUNCE_MS).contains(&self.editing.debounce_ms),
            ),
        ];
        match checks.iter().find(|(_, ok)| !ok) {
            Some((name, _)) => Err(Error::Config {
                message: format!("{name} is out of range"),
            }),
            None => Ok(()),
        }
    }
}

/// Static company information shown on every receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    /// Trading name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact phone number
    pub phone: String,
    /// Contact email
    pub email: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Construction Aggregates Trading".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
        }
    }
}

/// Admin session timing and lockout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// Idle time after which a session is logged out
    pub idle_timeout_minutes: i64,
    /// How long login stays locked after too many failures
    pub lockout_minutes: i64,
    /// Consecutive failures that trigger a lockout
    pub max_failed_attempts: u32,
    /// Interval of the idle-expiry tick
    pub tick_seconds: u64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30,
            lockout_minutes: 5,
            max_failed_attempts: 3,
            tick_seconds: 60,
        }
    }
}

impl SessionPolicy {
    /// Idle timeout as a duration
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::minutes(self.idle_timeout_minutes.clamp(0, MAX_POLICY_MINUTES))
    }

    /// Lockout length as a duration
    #[must_use]
    pub fn lockout(&self) -> Duration {
        Duration::minutes(self.lockout_minutes.clamp(0, MAX_POLICY_MINUTES))
    }
}

/// Activity log retention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActivityPolicy {
    /// Records older than this many days are removed by the daily trim
    pub retention_days: i64,
    /// Number of records returned by the recent-activity view
    pub recent_limit: u64,
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        Self {
            retention_days: 30,
            recent_limit: 100,
        }
    }
}

/// Debounce window for admin price edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditingPolicy {
    /// Quiescence delay before a pending edit is written
    pub debounce_ms: i64,
}

impl Default for EditingPolicy {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl EditingPolicy {
    /// Debounce window as a duration
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::milliseconds(self.debounce_ms.clamp(0, MAX_DEBOUNCE_MS))
    }
}
