//! Delivery zone management.
//!
//! Zones are first-class rows with a unique name; price overrides reference them by id.
//! Creating or renaming onto an existing name is rejected rather than merged, and
//! deleting a zone removes all of its overrides.

use crate::{
    entities::{Zone, ZonePrice, zone, zone_price},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

fn clean_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::missing("zone"));
    }
    Ok(trimmed)
}

/// Lists all zones ordered by name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn list_zones(db: &DatabaseConnection) -> Result<Vec<zone::Model>> {
    Zone::find()
        .order_by_asc(zone::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a zone by exact name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn get_zone_by_name<C>(db: &C, name: &str) -> Result<Option<zone::Model>>
where
    C: ConnectionTrait,
{
    Zone::find()
        .filter(zone::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_zone_by_name`] but a missing zone is an [`Error::ZoneNotFound`].
///
/// # Errors
/// Returns an error if the zone does not exist or the query fails.
pub async fn require_zone<C>(db: &C, name: &str) -> Result<zone::Model>
where
    C: ConnectionTrait,
{
    get_zone_by_name(db, name)
        .await?
        .ok_or_else(|| Error::ZoneNotFound {
            name: name.trim().to_string(),
        })
}

/// Creates a zone.
///
/// # Errors
/// Returns an error if the name is empty, already exists, or the insert fails.
#[instrument(skip(db))]
pub async fn create_zone(
    db: &DatabaseConnection,
    name: &str,
    now: DateTime<Utc>,
) -> Result<zone::Model> {
    let name = clean_name(name)?;
    if get_zone_by_name(db, name).await?.is_some() {
        return Err(Error::ZoneExists {
            name: name.to_string(),
        });
    }
    let saved = zone::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created zone '{}'", saved.name);
    Ok(saved)
}

/// Renames a zone. Its overrides follow it because they reference the zone by id.
///
/// # Errors
/// Returns an error if either name is empty, the old zone does not exist, the new name is
/// already taken, or the update fails.
#[instrument(skip(db))]
pub async fn rename_zone(
    db: &DatabaseConnection,
    old_name: &str,
    new_name: &str,
) -> Result<zone::Model> {
    let new_name = clean_name(new_name)?;
    let existing = require_zone(db, clean_name(old_name)?).await?;
    if get_zone_by_name(db, new_name).await?.is_some() {
        return Err(Error::ZoneExists {
            name: new_name.to_string(),
        });
    }
    let mut active: zone::ActiveModel = existing.into();
    active.name = Set(new_name.to_string());
    let saved = active.update(db).await?;
    info!("Renamed zone '{}' to '{}'", old_name.trim(), saved.name);
    Ok(saved)
}

/// Deletes a zone and all of its overrides. Returns the number of overrides removed.
///
/// # Errors
/// Returns an error if the zone does not exist or a delete fails.
#[instrument(skip(db))]
pub async fn delete_zone(db: &DatabaseConnection, name: &str) -> Result<u64> {
    let txn = db.begin().await?;
    let existing = require_zone(&txn, name).await?;
    let removed = ZonePrice::delete_many()
        .filter(zone_price::Column::ZoneId.eq(existing.id))
        .exec(&txn)
        .await?
        .rows_affected;
    existing.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted zone '{}' with {} override(s)", name.trim(), removed);
    Ok(removed)
}
