//! Receipt generation.
//!
//! A receipt is a pure projection of the finalized customer details and order lines.
//! Prices are copied from the lines as-is; nothing is re-resolved. Two receipts built from
//! the same inputs differ only in their timestamp and order reference.

use crate::{
    config::settings::CompanyInfo,
    core::order::{CustomerInfo, OrderItem},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

/// Immutable order summary handed to the customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// Short order reference (`ORD-xxxxxxxx`)
    pub reference: String,
    /// When the receipt was generated
    pub issued_at: DateTime<Utc>,
    /// Customer block
    pub customer: CustomerInfo,
    /// Lines in the order they were added
    pub items: Vec<OrderItem>,
    /// Sum of quantities
    pub total_items: i64,
    /// Sum of line totals
    pub subtotal: f64,
    /// Amount due; equal to the subtotal
    pub grand_total: f64,
    /// Seller block
    pub company: CompanyInfo,
}

/// Builds a [`Receipt`] from finalized inputs.
#[must_use]
pub fn generate_receipt(
    customer: &CustomerInfo,
    items: &[OrderItem],
    company: &CompanyInfo,
    now: DateTime<Utc>,
) -> Receipt {
    let subtotal: f64 = items.iter().map(|item| item.total).sum();
    let simple = Uuid::new_v4().simple().to_string();
    Receipt {
        reference: format!("ORD-{}", simple[..8].to_uppercase()),
        issued_at: now,
        customer: customer.clone(),
        items: items.to_vec(),
        total_items: items.iter().map(|item| item.quantity).sum(),
        subtotal,
        grand_total: subtotal,
        company: company.clone(),
    }
}

/// Formats a peso amount with thousands separators, e.g. `₱1,500` or `₱1,234.50`.
#[must_use]
pub fn format_peso(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cents = cents as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}₱{grouped}")
    } else {
        format!("{sign}₱{grouped}.{fraction:02}")
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%B %-d, %Y").to_string())
}

impl Receipt {
    /// Plain-text rendering for printing.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let zone = self.customer.zone.as_deref().unwrap_or("-");

        let _ = writeln!(out, "{}", self.company.name);
        if !self.company.address.is_empty() {
            let _ = writeln!(out, "{}", self.company.address);
        }
        let _ = writeln!(out, "{} | {}", self.company.phone, self.company.email);
        let _ = writeln!(out);
        let _ = writeln!(out, "Order {}", self.reference);
        let _ = writeln!(out, "Date: {}", self.issued_at.format("%B %-d, %Y %H:%M"));
        let _ = writeln!(out);
        let _ = writeln!(out, "Customer: {}", self.customer.name);
        let _ = writeln!(out, "Contact: {}", self.customer.contact_number);
        let _ = writeln!(out, "Delivery date: {}", format_date(self.customer.delivery_date));
        let _ = writeln!(out, "Barangay: {zone}");
        let _ = writeln!(out, "Address: {}", self.customer.delivery_address);
        let _ = writeln!(out);

        for (index, item) in self.items.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>2}. {} ({}) x{} @ {} = {}",
                index + 1,
                item.material_name,
                item.unit_label,
                item.quantity,
                format_peso(item.price_per_unit),
                format_peso(item.total)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Items: {}", self.total_items);
        let _ = writeln!(out, "Subtotal: {}", format_peso(self.subtotal));
        let _ = writeln!(out, "Grand total: {}", format_peso(self.grand_total));
        let _ = writeln!(out);
        let _ = writeln!(out, "Thank you for your order, {}!", self.customer.name);
        let _ = writeln!(
            out,
            "We will deliver your materials to {zone} on {}.",
            format_date(self.customer.delivery_date)
        );
        let _ = write!(out, "This is a computer-generated receipt.");
        out
    }
}
