//! Activity log business logic.
//!
//! The activity log is an append-only, diagnostic record of admin changes: price edits,
//! availability toggles, zone pricing writes, logins, password changes and resets. It is
//! written as a separate call after the change it describes, so a failure between the two
//! leaves the log under-reporting rather than the catalog inconsistent.

use crate::{
    entities::{Activity, activity},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::fmt;
use tracing::{debug, info, instrument};

/// Kind of admin action recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    /// Base price of a unit changed
    PriceUpdate,
    /// Material or unit availability flipped
    AvailabilityToggle,
    /// Catalog restored to the seeded defaults
    Reset,
    /// Admin logged in
    Login,
    /// Admin password changed
    PasswordChange,
    /// Zone price override written
    ZonePricing,
}

impl ActivityAction {
    /// Stored name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceUpdate => "price_update",
            Self::AvailabilityToggle => "availability_toggle",
            Self::Reset => "reset",
            Self::Login => "login",
            Self::PasswordChange => "password_change",
            Self::ZonePricing => "barangay_pricing",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record about to be appended to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    /// Material name, or `"System"`
    pub material: String,
    /// Unit label or event description
    pub unit: String,
    /// Value before the change
    pub old_value: f64,
    /// Value after the change
    pub new_value: f64,
    /// What happened
    pub action: ActivityAction,
    /// Zone, for zone pricing writes
    pub zone: Option<String>,
}

impl NewActivity {
    /// A system event (login, password change) with zeroed values.
    #[must_use]
    pub fn system(unit: &str, action: ActivityAction) -> Self {
        Self {
            material: "System".to_string(),
            unit: unit.to_string(),
            old_value: 0.0,
            new_value: 0.0,
            action,
            zone: None,
        }
    }

    /// An availability flip, encoded as 0/1.
    #[must_use]
    pub fn availability(material: &str, unit: &str, old: bool, new: bool) -> Self {
        Self {
            material: material.to_string(),
            unit: unit.to_string(),
            old_value: f64::from(u8::from(old)),
            new_value: f64::from(u8::from(new)),
            action: ActivityAction::AvailabilityToggle,
            zone: None,
        }
    }
}

/// Appends one record to the activity log with the given timestamp.
///
/// # Errors
/// Returns an error if the insert fails.
#[instrument(skip(db))]
pub async fn record_activity<C>(
    db: &C,
    entry: NewActivity,
    at: DateTime<Utc>,
) -> Result<activity::Model>
where
    C: ConnectionTrait,
{
    let record = activity::ActiveModel {
        timestamp: Set(at),
        material: Set(entry.material),
        unit: Set(entry.unit),
        old_value: Set(entry.old_value),
        new_value: Set(entry.new_value),
        action: Set(entry.action.as_str().to_string()),
        zone: Set(entry.zone),
        ..Default::default()
    };
    let saved = record.insert(db).await?;
    debug!("Recorded {} activity for {}", saved.action, saved.material);
    Ok(saved)
}

/// Returns the most recent `limit` records, newest first.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn recent_activity(db: &DatabaseConnection, limit: u64) -> Result<Vec<activity::Model>> {
    Activity::find()
        .order_by_desc(activity::Column::Timestamp)
        .order_by_desc(activity::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes records strictly older than `days` days before `now` and returns how many were
/// removed. Negative values are treated as 0, which removes everything logged before `now`.
/// A window reaching past the earliest representable time removes nothing.
///
/// # Errors
/// Returns an error if the delete fails.
#[instrument(skip(db))]
pub async fn trim_activity(db: &DatabaseConnection, days: i64, now: DateTime<Utc>) -> Result<u64> {
    let days = days.max(0);
    let Some(cutoff) = Duration::try_days(days).and_then(|window| now.checked_sub_signed(window))
    else {
        debug!("Retention window of {} day(s) predates all records", days);
        return Ok(0);
    };
    let deleted = Activity::delete_many()
        .filter(activity::Column::Timestamp.lt(cutoff))
        .exec(db)
        .await?
        .rows_affected;
    info!(
        "Deleted {} activity record{} older than {} day(s)",
        deleted,
        if deleted == 1 { "" } else { "s" },
        days
    );
    Ok(deleted)
}
