//! Key-value admin settings.
//!
//! Used for persistent admin configuration such as the stored password hash.

use crate::{
    entities::{AdminSetting, admin_setting},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, instrument};

/// Retrieves a setting value, or `None` if the key has never been set.
///
/// # Errors
/// Returns an error if the query fails.
#[instrument(skip(db))]
pub async fn get_setting(db: &DatabaseConnection, key: &str) -> Result<Option<String>> {
    let value = AdminSetting::find_by_id(key.to_string())
        .one(db)
        .await?
        .map(|row| row.value);
    debug!("Admin setting '{}' present: {}", key, value.is_some());
    Ok(value)
}

/// Sets or replaces a setting value.
///
/// # Errors
/// Returns an error if the read or write fails.
#[instrument(skip(db, value))]
pub async fn set_setting(
    db: &DatabaseConnection,
    key: &str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let existing = AdminSetting::find_by_id(key.to_string()).one(db).await?;

    if let Some(row) = existing {
        let mut active: admin_setting::ActiveModel = row.into();
        active.value = Set(value.to_string());
        active.updated_at = Set(now);
        active.update(db).await?;
    } else {
        admin_setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    info!("Admin setting '{}' updated", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_set_and_get_new_key() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, "test_key", "test_value", Utc::now()).await?;

        assert_eq!(
            get_setting(&db, "test_key").await?,
            Some("test_value".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_set_updates_existing_key() -> Result<()> {
        let db = setup_test_db().await?;
        set_setting(&db, "test_key", "initial", Utc::now()).await?;
        set_setting(&db, "test_key", "updated", Utc::now()).await?;

        assert_eq!(get_setting(&db, "test_key").await?, Some("updated".to_string()));
        assert_eq!(AdminSetting::find().all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_non_existent_key() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_setting(&db, "missing").await?.is_none());
        Ok(())
    }
}
