//! Order building - the customer's cart.
//!
//! Line items snapshot the material name, unit label and resolved price at the moment they
//! are added. Changing a line's quantity recomputes its total from that locked price; it
//! never re-resolves the price, even if the customer has switched zones since.

use crate::{
    config::settings::CompanyInfo,
    core::{
        catalog::Catalog,
        pricing::PricingTable,
        receipt::{self, Receipt},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line identifier
    pub id: String,
    /// Material identifier
    pub material_id: String,
    /// Material name at the time the line was added
    pub material_name: String,
    /// Unit value
    pub unit_value: String,
    /// Unit label at the time the line was added
    pub unit_label: String,
    /// Positive quantity
    pub quantity: i64,
    /// Resolved price, locked when the line was added
    pub price_per_unit: f64,
    /// `quantity * price_per_unit`
    pub total: f64,
}

#[allow(clippy::cast_precision_loss)]
fn line_total(quantity: i64, price_per_unit: f64) -> f64 {
    quantity as f64 * price_per_unit
}

/// Customer and delivery details required to finalize an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer name
    pub name: String,
    /// Contact number
    pub contact_number: String,
    /// Requested delivery date, must be after today
    pub delivery_date: Option<NaiveDate>,
    /// Delivery zone, also used for pricing new lines
    pub zone: Option<String>,
    /// Free-text delivery address
    pub delivery_address: String,
}

impl CustomerInfo {
    /// Names of the fields that are missing or invalid as of `today`.
    #[must_use]
    pub fn missing_fields(&self, today: NaiveDate) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.contact_number.trim().is_empty() {
            missing.push("contact_number");
        }
        if !self.delivery_date.is_some_and(|date| date > today) {
            missing.push("delivery_date");
        }
        if self.zone.as_deref().is_none_or(|z| z.trim().is_empty()) {
            missing.push("zone");
        }
        if self.delivery_address.trim().is_empty() {
            missing.push("delivery_address");
        }
        missing
    }

    /// The selected zone, if non-empty.
    #[must_use]
    pub fn pricing_zone(&self) -> Option<&str> {
        self.zone.as_deref().filter(|z| !z.trim().is_empty())
    }
}

/// In-memory cart. Items keep insertion order for display and receipts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBuilder {
    items: Vec<OrderItem>,
}

impl OrderBuilder {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// The price [`Self::add`] would lock in right now, if the unit is orderable.
    #[must_use]
    pub fn price_preview(
        catalog: &Catalog,
        pricing: &PricingTable,
        zone: Option<&str>,
        material_id: &str,
        unit_value: &str,
    ) -> Option<f64> {
        catalog
            .orderable_unit(material_id, unit_value)
            .map(|(_, unit)| pricing.resolve_price(material_id, unit_value, unit.price, zone))
    }

    /// Adds a line priced for `zone`. Does nothing if the quantity is not positive or the
    /// material/unit is missing or unavailable.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        pricing: &PricingTable,
        zone: Option<&str>,
        material_id: &str,
        unit_value: &str,
        quantity: i64,
    ) -> Option<&OrderItem> {
        if quantity <= 0 {
            return None;
        }
        let (material, unit) = catalog.orderable_unit(material_id, unit_value)?;
        let price_per_unit = pricing.resolve_price(material_id, unit_value, unit.price, zone);

        self.items.push(OrderItem {
            id: Uuid::new_v4().to_string(),
            material_id: material.id.clone(),
            material_name: material.name.clone(),
            unit_value: unit.value.clone(),
            unit_label: unit.label.clone(),
            quantity,
            price_per_unit,
            total: line_total(quantity, price_per_unit),
        });
        debug!(
            "Added {} x {} ({}) at {}",
            quantity, material.name, unit.label, price_per_unit
        );
        self.items.last()
    }

    /// Removes the line with `item_id`. Returns the removed line, if any.
    pub fn remove(&mut self, item_id: &str) -> Option<OrderItem> {
        let index = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(index))
    }

    /// Sets a line's quantity and recomputes its total from the locked price. Does nothing
    /// if `new_quantity` is not positive or the line does not exist.
    pub fn update_quantity(&mut self, item_id: &str, new_quantity: i64) -> Option<&OrderItem> {
        if new_quantity <= 0 {
            return None;
        }
        let item = self.items.iter_mut().find(|item| item.id == item_id)?;
        item.quantity = new_quantity;
        item.total = line_total(new_quantity, item.price_per_unit);
        Some(item)
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.total).sum()
    }

    /// Equal to the subtotal; no taxes or fees apply.
    #[must_use]
    pub fn grand_total(&self) -> f64 {
        self.subtotal()
    }

    /// Validates the customer details and cart, then projects them into a [`Receipt`].
    /// Neither the cart nor the customer details are modified.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] naming every missing customer field, plus `items` when
    /// the cart is empty.
    pub fn finalize(
        &self,
        customer: &CustomerInfo,
        company: &CompanyInfo,
        now: DateTime<Utc>,
    ) -> Result<Receipt> {
        let mut missing: Vec<String> = customer
            .missing_fields(now.date_naive())
            .into_iter()
            .map(str::to_string)
            .collect();
        if self.items.is_empty() {
            missing.push("items".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::Validation { fields: missing });
        }
        Ok(receipt::generate_receipt(customer, &self.items, company, now))
    }
}
