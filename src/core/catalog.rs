//! Catalog business logic - materials and their priced units.
//!
//! This module owns material and unit CRUD, the identifier derivation rule, and the
//! in-memory [`Catalog`] snapshot the storefront prices orders against. Every price or
//! availability change appends an activity record after the write succeeds.

use crate::{
    core::activity::{self, ActivityAction, NewActivity},
    entities::{Material, MaterialUnit, ZonePrice, material, material_unit, zone_price},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Highest base price a unit may carry.
pub const MAX_UNIT_PRICE: f64 = 1_000_000.0;

/// The fixed set of material categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    /// Blocks, bricks
    Masonry,
    /// Sand, gravel
    Aggregates,
    /// Cement, lime
    BindingMaterials,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 3] = [Self::Masonry, Self::Aggregates, Self::BindingMaterials];

    /// Display and storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Masonry => "Masonry",
            Self::Aggregates => "Aggregates",
            Self::BindingMaterials => "Binding Materials",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownCategory {
                category: s.to_string(),
            })
    }
}

/// Derives a stable identifier from a display name: lowercased, whitespace runs become a
/// single hyphen, and anything that is not `a-z`, `0-9` or `-` is dropped.
#[must_use]
pub fn derive_identifier(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                id.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            id.push(ch);
        }
    }
    id
}

/// Rejects prices outside [0, [`MAX_UNIT_PRICE`]] and non-finite values.
pub fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || !(0.0..=MAX_UNIT_PRICE).contains(&price) {
        return Err(Error::InvalidPrice { price });
    }
    Ok(())
}

/// A material together with its units.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMaterial {
    /// The material row
    pub material: material::Model,
    /// Its units, ordered by label
    pub units: Vec<material_unit::Model>,
}

impl CatalogMaterial {
    /// Units customers may order.
    pub fn available_units(&self) -> impl Iterator<Item = &material_unit::Model> {
        self.units.iter().filter(|u| u.available)
    }
}

/// In-memory snapshot of the whole catalog, reloaded after every admin write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Materials ordered by category then name
    pub materials: Vec<CatalogMaterial>,
}

impl Catalog {
    /// Looks up a material by identifier.
    #[must_use]
    pub fn material(&self, material_id: &str) -> Option<&CatalogMaterial> {
        self.materials.iter().find(|m| m.material.id == material_id)
    }

    /// Looks up a material and one of its units.
    #[must_use]
    pub fn unit(
        &self,
        material_id: &str,
        unit_value: &str,
    ) -> Option<(&material::Model, &material_unit::Model)> {
        let entry = self.material(material_id)?;
        let unit = entry.units.iter().find(|u| u.value == unit_value)?;
        Some((&entry.material, unit))
    }

    /// Looks up a unit only if both it and its material are available.
    #[must_use]
    pub fn orderable_unit(
        &self,
        material_id: &str,
        unit_value: &str,
    ) -> Option<(&material::Model, &material_unit::Model)> {
        self.unit(material_id, unit_value)
            .filter(|(m, u)| m.available && u.available)
    }

    /// The customer-facing view: available materials with only their available units,
    /// grouped by category in catalog order.
    #[must_use]
    pub fn customer_view(&self) -> Vec<(String, Vec<CatalogMaterial>)> {
        let mut groups: Vec<(String, Vec<CatalogMaterial>)> = Vec::new();
        for entry in self.materials.iter().filter(|m| m.material.available) {
            let visible = CatalogMaterial {
                material: entry.material.clone(),
                units: entry.available_units().cloned().collect(),
            };
            match groups.last_mut() {
                Some((category, items)) if *category == entry.material.category => {
                    items.push(visible);
                }
                _ => groups.push((entry.material.category.clone(), vec![visible])),
            }
        }
        groups
    }
}

/// Loads every material with its units, ordered by category then name, units by label.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn load_catalog(db: &DatabaseConnection) -> Result<Catalog> {
    let rows = Material::find()
        .order_by_asc(material::Column::Category)
        .order_by_asc(material::Column::Name)
        .find_with_related(MaterialUnit)
        .order_by_asc(material_unit::Column::Label)
        .all(db)
        .await?;

    let materials = rows
        .into_iter()
        .map(|(material, units)| CatalogMaterial { material, units })
        .collect();
    Ok(Catalog { materials })
}

/// Retrieves a material by identifier.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn get_material<C>(db: &C, material_id: &str) -> Result<Option<material::Model>>
where
    C: ConnectionTrait,
{
    Material::find_by_id(material_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a unit by its (material, value) key.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn get_unit<C>(
    db: &C,
    material_id: &str,
    unit_value: &str,
) -> Result<Option<material_unit::Model>>
where
    C: ConnectionTrait,
{
    MaterialUnit::find()
        .filter(material_unit::Column::MaterialId.eq(material_id))
        .filter(material_unit::Column::Value.eq(unit_value))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_material<C>(db: &C, material_id: &str) -> Result<material::Model>
where
    C: ConnectionTrait,
{
    get_material(db, material_id)
        .await?
        .ok_or_else(|| Error::MaterialNotFound {
            id: material_id.to_string(),
        })
}

async fn require_unit<C>(db: &C, material_id: &str, unit_value: &str) -> Result<material_unit::Model>
where
    C: ConnectionTrait,
{
    get_unit(db, material_id, unit_value)
        .await?
        .ok_or_else(|| Error::UnitNotFound {
            material_id: material_id.to_string(),
            value: unit_value.to_string(),
        })
}

fn required_fields(fields: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| (*name).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { fields: missing })
    }
}

/// Creates a new, available material.
///
/// The identifier is derived from the name with [`derive_identifier`]. If a material with
/// that identifier already exists the call fails with [`Error::MaterialExists`] instead of
/// overwriting it.
///
/// # Errors
/// Returns an error if:
/// - name, category or description is empty
/// - the category is not one of [`Category::ALL`]
/// - the name yields an empty identifier
/// - the identifier is already taken
/// - the database insert fails
#[instrument(skip(db, description))]
pub async fn create_material(
    db: &DatabaseConnection,
    name: &str,
    category: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<material::Model> {
    required_fields(&[
        ("name", name),
        ("category", category),
        ("description", description),
    ])?;
    let category: Category = category.parse()?;
    let id = derive_identifier(name.trim());
    if id.is_empty() {
        return Err(Error::missing("name"));
    }
    if get_material(db, &id).await?.is_some() {
        return Err(Error::MaterialExists { id });
    }

    let material = material::ActiveModel {
        id: Set(id),
        name: Set(name.trim().to_string()),
        category: Set(category.as_str().to_string()),
        description: Set(description.trim().to_string()),
        available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let saved = material.insert(db).await?;
    info!("Created material '{}' ({})", saved.name, saved.id);
    Ok(saved)
}

/// Updates the descriptive fields of a material. The identifier never changes.
///
/// # Errors
/// Returns an error if a field is empty, the category is unknown, the material does not
/// exist, or the update fails.
pub async fn update_material_details(
    db: &DatabaseConnection,
    material_id: &str,
    name: &str,
    category: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<material::Model> {
    required_fields(&[
        ("name", name),
        ("category", category),
        ("description", description),
    ])?;
    let category: Category = category.parse()?;
    let mut material: material::ActiveModel = require_material(db, material_id).await?.into();
    material.name = Set(name.trim().to_string());
    material.category = Set(category.as_str().to_string());
    material.description = Set(description.trim().to_string());
    material.updated_at = Set(now);
    material.update(db).await.map_err(Into::into)
}

/// Sets a material's availability and logs the change as 0/1.
///
/// # Errors
/// Returns an error if the material does not exist or a write fails.
#[instrument(skip(db))]
pub async fn set_material_availability(
    db: &DatabaseConnection,
    material_id: &str,
    available: bool,
    now: DateTime<Utc>,
) -> Result<material::Model> {
    let existing = require_material(db, material_id).await?;
    let old = existing.available;
    let mut material: material::ActiveModel = existing.into();
    material.available = Set(available);
    material.updated_at = Set(now);
    let saved = material.update(db).await?;

    activity::record_activity(
        db,
        NewActivity::availability(&saved.name, "Material Availability", old, available),
        now,
    )
    .await?;
    info!("Material '{}' availability set to {}", saved.id, available);
    Ok(saved)
}

/// Deletes a material, its units, and every zone override that references it.
///
/// # Errors
/// Returns an error if the material does not exist or a delete fails.
#[instrument(skip(db))]
pub async fn delete_material(db: &DatabaseConnection, material_id: &str) -> Result<()> {
    let txn = db.begin().await?;
    let material = require_material(&txn, material_id).await?;

    ZonePrice::delete_many()
        .filter(zone_price::Column::MaterialId.eq(material_id))
        .exec(&txn)
        .await?;
    let units = MaterialUnit::delete_many()
        .filter(material_unit::Column::MaterialId.eq(material_id))
        .exec(&txn)
        .await?
        .rows_affected;
    material.delete(&txn).await?;

    txn.commit().await?;
    info!("Deleted material '{}' and {} unit(s)", material_id, units);
    Ok(())
}

/// Creates a new, available unit under an existing material.
///
/// The unit value is derived from the label with [`derive_identifier`]; a duplicate value
/// on the same material is rejected with [`Error::UnitExists`].
///
/// # Errors
/// Returns an error if:
/// - the label is empty or yields an empty value
/// - the price is outside [0, 1,000,000]
/// - the material does not exist
/// - the derived value already exists on the material
/// - the database insert fails
#[instrument(skip(db))]
pub async fn create_unit(
    db: &DatabaseConnection,
    material_id: &str,
    label: &str,
    price: f64,
    now: DateTime<Utc>,
) -> Result<material_unit::Model> {
    required_fields(&[("material", material_id), ("label", label)])?;
    validate_price(price)?;
    let value = derive_identifier(label.trim());
    if value.is_empty() {
        return Err(Error::missing("label"));
    }
    require_material(db, material_id).await?;
    if get_unit(db, material_id, &value).await?.is_some() {
        return Err(Error::UnitExists {
            material_id: material_id.to_string(),
            value,
        });
    }

    let unit = material_unit::ActiveModel {
        material_id: Set(material_id.to_string()),
        value: Set(value),
        label: Set(label.trim().to_string()),
        price: Set(price),
        available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let saved = unit.insert(db).await?;
    info!(
        "Created unit '{}' for material '{}' at {}",
        saved.value, material_id, saved.price
    );
    Ok(saved)
}

/// Changes to apply to a unit. Both fields may be set in the same call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UnitChanges {
    /// New base price
    pub price: Option<f64>,
    /// New availability
    pub available: Option<bool>,
}

/// Applies [`UnitChanges`] to a unit. Each applied change appends its own activity record:
/// `price_update` with the numeric old and new price, `availability_toggle` with 0/1.
///
/// # Errors
/// Returns an error if the price is invalid, the unit does not exist, or a write fails.
#[instrument(skip(db))]
pub async fn update_unit(
    db: &DatabaseConnection,
    material_id: &str,
    unit_value: &str,
    changes: UnitChanges,
    now: DateTime<Utc>,
) -> Result<material_unit::Model> {
    if let Some(price) = changes.price {
        validate_price(price)?;
    }
    let material = require_material(db, material_id).await?;
    let existing = require_unit(db, material_id, unit_value).await?;
    if changes == UnitChanges::default() {
        return Ok(existing);
    }

    let old_price = existing.price;
    let old_available = existing.available;
    let mut unit: material_unit::ActiveModel = existing.into();
    if let Some(price) = changes.price {
        unit.price = Set(price);
    }
    if let Some(available) = changes.available {
        unit.available = Set(available);
    }
    unit.updated_at = Set(now);
    let saved = unit.update(db).await?;

    if let Some(price) = changes.price {
        activity::record_activity(
            db,
            NewActivity {
                material: material.name.clone(),
                unit: saved.label.clone(),
                old_value: old_price,
                new_value: price,
                action: ActivityAction::PriceUpdate,
                zone: None,
            },
            now,
        )
        .await?;
        info!(
            "Unit {}/{} price {} -> {}",
            material_id, unit_value, old_price, price
        );
    }
    if let Some(available) = changes.available {
        activity::record_activity(
            db,
            NewActivity::availability(
                &material.name,
                &format!("{} Availability", saved.label),
                old_available,
                available,
            ),
            now,
        )
        .await?;
        info!(
            "Unit {}/{} availability set to {}",
            material_id, unit_value, available
        );
    }
    Ok(saved)
}

/// Deletes one unit and any zone overrides for it.
///
/// # Errors
/// Returns an error if the unit does not exist or a delete fails.
#[instrument(skip(db))]
pub async fn delete_unit(db: &DatabaseConnection, material_id: &str, unit_value: &str) -> Result<()> {
    let txn = db.begin().await?;
    let unit = require_unit(&txn, material_id, unit_value).await?;
    let overrides = ZonePrice::delete_many()
        .filter(zone_price::Column::MaterialId.eq(material_id))
        .filter(zone_price::Column::UnitValue.eq(unit_value))
        .exec(&txn)
        .await?
        .rows_affected;
    unit.delete(&txn).await?;
    txn.commit().await?;
    if overrides > 0 {
        warn!(
            "Deleting unit {}/{} removed {} zone override(s)",
            material_id, unit_value, overrides
        );
    }
    info!("Deleted unit {}/{}", material_id, unit_value);
    Ok(())
}
