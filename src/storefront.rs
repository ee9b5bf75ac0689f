//! Per-browser-session storefront.
//!
//! A [`Storefront`] owns one visitor's view of the store: loaded catalog and pricing
//! snapshots, the cart and customer details, the admin session guard and any debounced
//! admin edits. Every admin write goes through the guard and is followed by a full
//! reload of the catalog and pricing table, so what the visitor sees is always what
//! storage holds.

use crate::{
    config::{
        catalog::{self as seed, MaterialSeed},
        settings::StoreSettings,
    },
    core::{
        activity,
        catalog::{self, Catalog, CatalogMaterial, UnitChanges},
        edits::{Edit, PendingEdits},
        export,
        order::{CustomerInfo, OrderBuilder, OrderItem},
        pricing::{self, PriceOverride, PricingTable},
        receipt::Receipt,
        session::{AdminSession, SessionGuard},
        zone,
    },
    entities::{activity as activity_entity, material, material_unit, zone as zone_entity, zone_price},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, warn};

fn report(operation: &str, e: &Error) {
    match e {
        Error::Database(_) | Error::Io(_) => error!("{} failed: {}", operation, e),
        _ => warn!("{} rejected: {}", operation, e),
    }
}

/// One visitor's session with the store.
#[derive(Debug)]
pub struct Storefront {
    db: DatabaseConnection,
    settings: StoreSettings,
    seed: Vec<MaterialSeed>,
    guard: SessionGuard,
    catalog: Catalog,
    pricing: PricingTable,
    order: OrderBuilder,
    customer: CustomerInfo,
    edits: PendingEdits,
}

impl Storefront {
    /// Opens a storefront and loads the current catalog and pricing table.
    ///
    /// # Errors
    /// Returns an error if the initial load fails.
    pub async fn open(
        db: DatabaseConnection,
        settings: StoreSettings,
        seed: Vec<MaterialSeed>,
    ) -> Result<Self> {
        let catalog = catalog::load_catalog(&db).await?;
        let pricing = pricing::load_pricing_table(&db).await?;
        debug!(
            "Storefront opened with {} material(s) and {} zone(s)",
            catalog.materials.len(),
            pricing.zones().count()
        );
        Ok(Self {
            guard: SessionGuard::new(settings.session),
            edits: PendingEdits::new(settings.editing.debounce()),
            db,
            settings,
            seed,
            catalog,
            pricing,
            order: OrderBuilder::new(),
            customer: CustomerInfo::default(),
        })
    }

    /// Re-reads the catalog and pricing table from storage.
    ///
    /// # Errors
    /// Returns an error if either load fails; the previous snapshots are kept.
    pub async fn reload(&mut self) -> Result<()> {
        let catalog = catalog::load_catalog(&self.db)
            .await
            .inspect_err(|e| report("Catalog reload", e))?;
        let pricing = pricing::load_pricing_table(&self.db)
            .await
            .inspect_err(|e| report("Pricing reload", e))?;
        self.catalog = catalog;
        self.pricing = pricing;
        Ok(())
    }

    // Customer side

    /// The full catalog snapshot.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The pricing table snapshot.
    #[must_use]
    pub const fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Available materials and units grouped by category.
    #[must_use]
    pub fn customer_view(&self) -> Vec<(String, Vec<CatalogMaterial>)> {
        self.catalog.customer_view()
    }

    /// Zones customers can choose from.
    #[must_use]
    pub fn zones(&self) -> Vec<String> {
        self.pricing.zones().map(str::to_string).collect()
    }

    /// Current customer details.
    #[must_use]
    pub const fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// Replaces the customer details. Existing lines keep their locked prices.
    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.customer = customer;
    }

    /// Selects the delivery zone used to price new lines.
    pub fn select_zone(&mut self, zone: Option<&str>) {
        self.customer.zone = zone.map(str::to_string);
    }

    /// The cart.
    #[must_use]
    pub const fn order(&self) -> &OrderBuilder {
        &self.order
    }

    /// The price a unit would be added at in the selected zone.
    #[must_use]
    pub fn price_preview(&self, material_id: &str, unit_value: &str) -> Option<f64> {
        OrderBuilder::price_preview(
            &self.catalog,
            &self.pricing,
            self.customer.pricing_zone(),
            material_id,
            unit_value,
        )
    }

    /// Adds a line priced for the selected zone.
    pub fn add_to_order(
        &mut self,
        material_id: &str,
        unit_value: &str,
        quantity: i64,
    ) -> Option<&OrderItem> {
        self.order.add(
            &self.catalog,
            &self.pricing,
            self.customer.pricing_zone(),
            material_id,
            unit_value,
            quantity,
        )
    }

    /// Removes a line.
    ///
    /// # Errors
    /// `Error::ItemNotFound` if no line has `item_id`.
    pub fn remove_from_order(&mut self, item_id: &str) -> Result<OrderItem> {
        self.order.remove(item_id).ok_or_else(|| Error::ItemNotFound {
            id: item_id.to_string(),
        })
    }

    /// Changes a line's quantity, keeping its locked price.
    ///
    /// # Errors
    /// `Error::InvalidQuantity` for a quantity below one, `Error::ItemNotFound` for an
    /// unknown line. The cart is unchanged in both cases.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> Result<&OrderItem> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
        self.order
            .update_quantity(item_id, quantity)
            .ok_or_else(|| Error::ItemNotFound {
                id: item_id.to_string(),
            })
    }

    /// Empties the cart.
    pub fn clear_order(&mut self) {
        self.order.clear();
    }

    /// Finalizes the order into a receipt. The cart is cleared only on success.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] listing missing fields; nothing changes in that case.
    pub fn checkout(&mut self, now: DateTime<Utc>) -> Result<Receipt> {
        let receipt = self
            .order
            .finalize(&self.customer, &self.settings.company, now)
            .inspect_err(|e| report("Checkout", e))?;
        info!(
            "Order {} placed: {} item(s), total {}",
            receipt.reference, receipt.total_items, receipt.grand_total
        );
        self.order.clear();
        Ok(receipt)
    }

    // Admin session

    /// True if an admin session is active.
    pub fn is_admin(&mut self, now: DateTime<Utc>) -> bool {
        self.guard.is_logged_in(now)
    }

    /// Logs the admin in.
    ///
    /// # Errors
    /// Returns an authentication error on a wrong password or while locked out.
    pub async fn login(&mut self, password: &str, now: DateTime<Utc>) -> Result<AdminSession> {
        self.guard
            .login(&self.db, password, now)
            .await
            .inspect_err(|e| report("Admin login", e))
    }

    /// Logs the admin out. Pending edits are discarded.
    ///
    /// # Errors
    /// Returns an error if the session row cannot be deleted.
    pub async fn logout(&mut self) -> Result<()> {
        self.edits.cancel_all();
        self.guard.logout(&self.db).await
    }

    /// Periodic tick: applies debounced edits that are due, then expires an idle session.
    ///
    /// # Errors
    /// Returns an error if applying an edit or ending the session fails.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.flush_due_edits(now).await?;
        if self.guard.tick(&self.db, now).await? {
            let dropped = self.edits.cancel_all();
            if dropped > 0 {
                warn!("Discarded {} edit(s) after session timeout", dropped);
            }
        }
        Ok(())
    }

    /// Changes the admin password.
    ///
    /// # Errors
    /// See [`SessionGuard::change_password`].
    pub async fn change_password(
        &mut self,
        current: &str,
        new_password: &str,
        confirm: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.guard
            .change_password(&self.db, current, new_password, confirm, now)
            .await
            .inspect_err(|e| report("Password change", e))
    }

    async fn authorize(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.guard
            .authorize(&self.db, now)
            .await
            .inspect_err(|e| report("Admin action", e))
    }

    // Catalog administration

    /// Creates a material.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or any error from
    /// [`catalog::create_material`].
    pub async fn create_material(
        &mut self,
        name: &str,
        category: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<material::Model> {
        self.authorize(now).await?;
        let saved = catalog::create_material(&self.db, name, category, description, now)
            .await
            .inspect_err(|e| report("Create material", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Edits a material's name, category and description.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a validation or storage error.
    pub async fn update_material_details(
        &mut self,
        material_id: &str,
        name: &str,
        category: &str,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<material::Model> {
        self.authorize(now).await?;
        let saved =
            catalog::update_material_details(&self.db, material_id, name, category, description, now)
                .await
                .inspect_err(|e| report("Update material", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Shows or hides a material.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a lookup or storage error.
    pub async fn set_material_availability(
        &mut self,
        material_id: &str,
        available: bool,
        now: DateTime<Utc>,
    ) -> Result<material::Model> {
        self.authorize(now).await?;
        let saved = catalog::set_material_availability(&self.db, material_id, available, now)
            .await
            .inspect_err(|e| report("Material availability", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Deletes a material with its units and overrides.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a lookup or storage error.
    pub async fn delete_material(&mut self, material_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.authorize(now).await?;
        catalog::delete_material(&self.db, material_id)
            .await
            .inspect_err(|e| report("Delete material", e))?;
        self.reload().await
    }

    /// Adds a unit to a material.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or any error from [`catalog::create_unit`].
    pub async fn create_unit(
        &mut self,
        material_id: &str,
        label: &str,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<material_unit::Model> {
        self.authorize(now).await?;
        let saved = catalog::create_unit(&self.db, material_id, label, price, now)
            .await
            .inspect_err(|e| report("Create unit", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Applies a price and/or availability change to a unit immediately.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or any error from [`catalog::update_unit`].
    pub async fn update_unit(
        &mut self,
        material_id: &str,
        unit_value: &str,
        changes: UnitChanges,
        now: DateTime<Utc>,
    ) -> Result<material_unit::Model> {
        self.authorize(now).await?;
        let saved = catalog::update_unit(&self.db, material_id, unit_value, changes, now)
            .await
            .inspect_err(|e| report("Update unit", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Deletes a unit and its overrides.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a lookup or storage error.
    pub async fn delete_unit(
        &mut self,
        material_id: &str,
        unit_value: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.authorize(now).await?;
        catalog::delete_unit(&self.db, material_id, unit_value)
            .await
            .inspect_err(|e| report("Delete unit", e))?;
        self.reload().await
    }

    /// Restores the seeded catalog defaults.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a storage error.
    pub async fn reset_to_defaults(&mut self, now: DateTime<Utc>) -> Result<usize> {
        self.authorize(now).await?;
        let restored = seed::reset_to_defaults(&self.db, &self.seed, now)
            .await
            .inspect_err(|e| report("Reset to defaults", e))?;
        self.reload().await?;
        Ok(restored)
    }

    // Zones

    /// Creates a zone.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, `Error::ZoneExists` on a name collision.
    pub async fn create_zone(&mut self, name: &str, now: DateTime<Utc>) -> Result<zone_entity::Model> {
        self.authorize(now).await?;
        let saved = zone::create_zone(&self.db, name, now)
            .await
            .inspect_err(|e| report("Create zone", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Renames a zone. Its overrides follow it.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, `Error::ZoneNotFound` or
    /// `Error::ZoneExists`.
    pub async fn rename_zone(
        &mut self,
        old_name: &str,
        new_name: &str,
        now: DateTime<Utc>,
    ) -> Result<zone_entity::Model> {
        self.authorize(now).await?;
        let saved = zone::rename_zone(&self.db, old_name, new_name)
            .await
            .inspect_err(|e| report("Rename zone", e))?;
        self.reload().await?;
        Ok(saved)
    }

    /// Deletes a zone and its overrides.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, `Error::ZoneNotFound`.
    pub async fn delete_zone(&mut self, name: &str, now: DateTime<Utc>) -> Result<u64> {
        self.authorize(now).await?;
        let removed = zone::delete_zone(&self.db, name)
            .await
            .inspect_err(|e| report("Delete zone", e))?;
        self.reload().await?;
        Ok(removed)
    }

    /// Writes a zone override immediately.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or any error from
    /// [`pricing::set_zone_price`].
    pub async fn set_zone_price(
        &mut self,
        zone: &str,
        material_id: &str,
        unit_value: &str,
        price_override: PriceOverride,
        now: DateTime<Utc>,
    ) -> Result<zone_price::Model> {
        self.authorize(now).await?;
        let saved = pricing::set_zone_price(&self.db, zone, material_id, unit_value, price_override, now)
            .await
            .inspect_err(|e| report("Zone price", e))?;
        self.reload().await?;
        Ok(saved)
    }

    // Debounced edits

    /// Queues a unit price edit; it is written once the field has been quiet for the
    /// debounce delay.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, `Error::InvalidPrice` for a bad value.
    pub async fn schedule_unit_price(
        &mut self,
        material_id: &str,
        unit_value: &str,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.authorize(now).await?;
        catalog::validate_price(price)?;
        self.edits.schedule(
            Edit::UnitPrice {
                material_id: material_id.to_string(),
                unit_value: unit_value.to_string(),
                price,
            },
            now,
        );
        Ok(())
    }

    /// Queues a zone override edit.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or an out-of-range multiplier or price.
    pub async fn schedule_zone_price(
        &mut self,
        zone: &str,
        material_id: &str,
        unit_value: &str,
        price_override: PriceOverride,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.authorize(now).await?;
        pricing::validate_override(price_override.multiplier, price_override.fixed_price)?;
        self.edits.schedule(
            Edit::ZonePrice {
                zone: zone.to_string(),
                material_id: material_id.to_string(),
                unit_value: unit_value.to_string(),
                price_override,
            },
            now,
        );
        Ok(())
    }

    /// Number of edits waiting for their quiet period.
    #[must_use]
    pub fn pending_edits(&self) -> usize {
        self.edits.len()
    }

    async fn apply_edit(&self, edit: Edit, now: DateTime<Utc>) -> Result<()> {
        match edit {
            Edit::UnitPrice {
                material_id,
                unit_value,
                price,
            } => {
                catalog::update_unit(
                    &self.db,
                    &material_id,
                    &unit_value,
                    UnitChanges {
                        price: Some(price),
                        available: None,
                    },
                    now,
                )
                .await
                .inspect_err(|e| report("Debounced price edit", e))?;
            }
            Edit::ZonePrice {
                zone,
                material_id,
                unit_value,
                price_override,
            } => {
                pricing::set_zone_price(
                    &self.db,
                    &zone,
                    &material_id,
                    &unit_value,
                    price_override,
                    now,
                )
                .await
                .inspect_err(|e| report("Debounced zone price edit", e))?;
            }
        }
        Ok(())
    }

    /// Writes every edit, even after one fails, then reloads. A failed edit is logged and
    /// dropped; the first failure is returned once the rest have been attempted.
    async fn apply_edits(&mut self, edits: Vec<Edit>, now: DateTime<Utc>) -> Result<usize> {
        if edits.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.authorize(now).await {
            warn!("Discarding {} edit(s) without an admin session", edits.len());
            self.edits.cancel_all();
            return Err(e);
        }

        let mut applied = 0;
        let mut first_error = None;
        for edit in edits {
            let key = edit.key();
            match self.apply_edit(edit, now).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    warn!("Dropped debounced edit for {:?}", key);
                    first_error.get_or_insert(e);
                }
            }
        }

        let reloaded = self.reload().await;
        debug!("Applied {} debounced edit(s)", applied);
        match (first_error, reloaded) {
            (Some(e), _) | (None, Err(e)) => Err(e),
            (None, Ok(())) => Ok(applied),
        }
    }

    /// Writes every queued edit whose quiet period has elapsed.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` if the session ended (queued edits are discarded), or the
    /// first failing write.
    pub async fn flush_due_edits(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.edits.take_due(now);
        self.apply_edits(due, now).await
    }

    /// Tears the storefront down: pending edits are written if the admin is still logged
    /// in and discarded otherwise, then the session is ended.
    ///
    /// # Errors
    /// Returns the first failing edit, or a logout error. The session is ended either way.
    pub async fn close(mut self, now: DateTime<Utc>) -> Result<()> {
        let flushed = if self.guard.is_logged_in(now) {
            let pending = self.edits.drain();
            self.apply_edits(pending, now).await.map(|_| ())
        } else {
            self.edits.cancel_all();
            Ok(())
        };
        let logged_out = self.guard.logout(&self.db).await;
        flushed.and(logged_out)
    }

    // Reporting

    /// The most recent activity records, newest first.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a storage error.
    pub async fn recent_activity(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<activity_entity::Model>> {
        self.authorize(now).await?;
        activity::recent_activity(&self.db, self.settings.activity.recent_limit)
            .await
            .inspect_err(|e| report("Activity log", e))
    }

    /// Deletes activity older than `days` days.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session, or a storage error.
    pub async fn trim_activity(&mut self, days: i64, now: DateTime<Utc>) -> Result<u64> {
        self.authorize(now).await?;
        activity::trim_activity(&self.db, days, now)
            .await
            .inspect_err(|e| report("Activity trim", e))
    }

    /// Exports the price list as `(file name, CSV text)`.
    ///
    /// # Errors
    /// `Error::NotAuthenticated` without a session.
    pub async fn export_price_list(&mut self, now: DateTime<Utc>) -> Result<(String, String)> {
        self.authorize(now).await?;
        Ok((
            export::export_file_name(now.date_naive()),
            export::export_price_list(&self.catalog, &self.pricing),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        config::catalog::UnitSeed,
        entities::AdminSession as SessionRow,
        test_utils::{TEST_ADMIN_PASSWORD, complete_customer, setup_with_admin},
    };
    use chrono::Duration;
    use sea_orm::EntityTrait;

    async fn admin_storefront(now: DateTime<Utc>) -> Result<Storefront> {
        let db = setup_with_admin().await?;
        let mut store = Storefront::open(db, StoreSettings::default(), Vec::new()).await?;
        store.login(TEST_ADMIN_PASSWORD, now).await?;
        store
            .create_material("Cement", "Binding Materials", "Portland cement", now)
            .await?;
        store.create_unit("cement", "Bag", 250.0, now).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_zone_price_locked_at_add_time() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.create_zone("Zone A", now).await?;
        store.create_zone("Zone B", now).await?;
        store
            .set_zone_price(
                "Zone A",
                "cement",
                "bag",
                PriceOverride {
                    multiplier: 1.2,
                    fixed_price: None,
                },
                now,
            )
            .await?;

        store.select_zone(Some("Zone A"));
        assert_eq!(store.price_preview("cement", "bag"), Some(300.0));
        let first = store.add_to_order("cement", "bag", 5).unwrap().clone();
        assert_eq!(first.price_per_unit, 300.0);
        assert_eq!(first.total, 1500.0);

        store.select_zone(Some("Zone B"));
        let second = store.add_to_order("cement", "bag", 1).unwrap().clone();
        assert_eq!(second.price_per_unit, 250.0);
        assert_eq!(store.order().items()[0].price_per_unit, 300.0);
        assert_eq!(store.order().items()[0].total, 1500.0);
        assert_eq!(store.order().subtotal(), 1750.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cart_edits_report_bad_lines() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        let id = store.add_to_order("cement", "bag", 2).unwrap().id.clone();

        assert!(matches!(
            store.update_quantity(&id, 0),
            Err(Error::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            store.update_quantity("missing", 3),
            Err(Error::ItemNotFound { .. })
        ));
        assert_eq!(store.order().items()[0].quantity, 2);

        assert_eq!(store.update_quantity(&id, 4)?.total, 1000.0);
        assert_eq!(store.remove_from_order(&id)?.quantity, 4);
        assert!(matches!(
            store.remove_from_order(&id),
            Err(Error::ItemNotFound { .. })
        ));
        assert_eq!(store.order().line_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_writes_require_login() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut store = Storefront::open(db, StoreSettings::default(), Vec::new()).await?;
        let now = Utc::now();

        assert!(matches!(
            store
                .create_material("Cement", "Binding Materials", "Portland cement", now)
                .await,
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            store.create_zone("Zone A", now).await,
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            store.schedule_unit_price("cement", "bag", 260.0, now).await,
            Err(Error::NotAuthenticated)
        ));
        assert!(store.catalog().materials.is_empty());
        assert!(store.zones().is_empty());
        assert_eq!(store.pending_edits(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_writes_are_visible_after_reload() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        assert_eq!(store.customer_view().len(), 1);

        store.set_material_availability("cement", false, now).await?;
        assert!(store.customer_view().is_empty());
        assert!(store.add_to_order("cement", "bag", 1).is_none());

        store.set_material_availability("cement", true, now).await?;
        store
            .update_unit(
                "cement",
                "bag",
                UnitChanges {
                    price: Some(265.0),
                    available: None,
                },
                now,
            )
            .await?;
        assert_eq!(store.price_preview("cement", "bag"), Some(265.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_only_on_success() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.add_to_order("cement", "bag", 2);

        assert!(matches!(store.checkout(now), Err(Error::Validation { .. })));
        assert_eq!(store.order().line_count(), 1);

        store.set_customer(complete_customer(now.date_naive() + Duration::days(2)));
        let receipt = store.checkout(now)?;
        assert_eq!(receipt.grand_total, 500.0);
        assert_eq!(receipt.total_items, 2);
        assert_eq!(store.order().line_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_debounced_price_edits_coalesce() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;

        store.schedule_unit_price("cement", "bag", 2.0, now).await?;
        store
            .schedule_unit_price("cement", "bag", 26.0, now + Duration::milliseconds(200))
            .await?;
        store
            .schedule_unit_price("cement", "bag", 260.0, now + Duration::milliseconds(400))
            .await?;
        assert_eq!(store.pending_edits(), 1);

        assert_eq!(
            store.flush_due_edits(now + Duration::milliseconds(600)).await?,
            0
        );
        assert_eq!(store.flush_due_edits(now + Duration::seconds(1)).await?, 1);
        assert_eq!(store.price_preview("cement", "bag"), Some(260.0));

        let log = store.recent_activity(now + Duration::seconds(1)).await?;
        let price_updates = log.iter().filter(|r| r.action == "price_update").count();
        assert_eq!(price_updates, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_flushes_pending_edits_when_logged_in() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.create_zone("Zone A", now).await?;
        store
            .schedule_zone_price(
                "Zone A",
                "cement",
                "bag",
                PriceOverride {
                    multiplier: 1.0,
                    fixed_price: Some(280.0),
                },
                now,
            )
            .await?;
        let db = store.db.clone();
        store.close(now).await?;

        let pricing = pricing::load_pricing_table(&db).await?;
        assert_eq!(pricing.resolve_price("cement", "bag", 250.0, Some("Zone A")), 280.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_edit_does_not_drop_later_edits() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.create_unit("cement", "Pallet", 9000.0, now).await?;
        store.schedule_unit_price("cement", "bag", 260.0, now).await?;
        store
            .schedule_unit_price("cement", "pallet", 9500.0, now)
            .await?;
        store.delete_unit("cement", "bag", now).await?;

        assert!(matches!(
            store.flush_due_edits(now + Duration::seconds(1)).await,
            Err(Error::UnitNotFound { .. })
        ));
        assert_eq!(store.pending_edits(), 0);
        let pallet = catalog::get_unit(&store.db, "cement", "pallet").await?.unwrap();
        assert_eq!(pallet.price, 9500.0);
        assert_eq!(store.price_preview("cement", "pallet"), Some(9500.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_ends_session_when_an_edit_fails() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.schedule_unit_price("cement", "bag", 260.0, now).await?;
        store.delete_unit("cement", "bag", now).await?;
        let db = store.db.clone();

        assert!(matches!(
            store.close(now).await,
            Err(Error::UnitNotFound { .. })
        ));
        assert!(SessionRow::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_schedule_checks_session_before_value() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut store = Storefront::open(db, StoreSettings::default(), Vec::new()).await?;
        let now = Utc::now();

        assert!(matches!(
            store.schedule_unit_price("cement", "bag", -5.0, now).await,
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            store
                .schedule_zone_price(
                    "Zone A",
                    "cement",
                    "bag",
                    PriceOverride {
                        multiplier: -1.0,
                        fixed_price: None,
                    },
                    now,
                )
                .await,
            Err(Error::NotAuthenticated)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_discards_pending_edits() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.schedule_unit_price("cement", "bag", 300.0, now).await?;
        store.logout().await?;
        assert_eq!(store.pending_edits(), 0);

        let db = store.db.clone();
        store.close(now).await?;
        let unit = catalog::get_unit(&db, "cement", "bag").await?.unwrap();
        assert_eq!(unit.price, 250.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_idle_tick_logs_out() -> Result<()> {
        let now = Utc::now();
        let mut store = admin_storefront(now).await?;
        store.tick(now + Duration::minutes(31)).await?;
        assert!(!store.is_admin(now + Duration::minutes(31)));
        assert!(matches!(
            store.create_zone("Zone A", now + Duration::minutes(31)).await,
            Err(Error::NotAuthenticated)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_and_export() -> Result<()> {
        let db = setup_with_admin().await?;
        let seed = vec![MaterialSeed {
            name: "Gravel".to_string(),
            category: "Aggregates".to_string(),
            description: "3/4 crushed gravel".to_string(),
            units: vec![UnitSeed {
                label: "Cubic Meter".to_string(),
                price: 1800.0,
            }],
        }];
        seed::seed_catalog(&db, &seed, Utc::now()).await?;
        let mut store = Storefront::open(db, StoreSettings::default(), seed).await?;
        let now = Utc::now();
        store.login(TEST_ADMIN_PASSWORD, now).await?;

        store
            .update_unit(
                "gravel",
                "cubic-meter",
                UnitChanges {
                    price: Some(2000.0),
                    available: Some(false),
                },
                now,
            )
            .await?;
        assert_eq!(store.reset_to_defaults(now).await?, 1);
        assert_eq!(store.price_preview("gravel", "cubic-meter"), Some(1800.0));

        let (file_name, csv) = store.export_price_list(now).await?;
        assert!(file_name.starts_with("construction_prices_with_barangay_"));
        assert!(csv.contains("\"Gravel\",\"Aggregates\",\"Cubic Meter\",1800,Yes"));
        Ok(())
    }
}
