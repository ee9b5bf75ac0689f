//! CSV export of the price list with one resolved price column per zone.

use crate::core::{catalog::Catalog, pricing::PricingTable};
use chrono::NaiveDate;
use std::fmt::Write as _;

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn header_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        quote(field)
    } else {
        field.to_string()
    }
}

/// Renders every unit of every material, available or not, as CSV.
///
/// Text fields are quoted, availability is `Yes`/`No`, and each zone known to `pricing`
/// contributes a `<zone> Price` column holding the resolved price.
#[must_use]
pub fn export_price_list(catalog: &Catalog, pricing: &PricingTable) -> String {
    let zones: Vec<&str> = pricing.zones().collect();

    let mut csv = String::from("Material,Category,Unit,Base Price,Available");
    for zone in &zones {
        csv.push(',');
        csv.push_str(&header_field(&format!("{zone} Price")));
    }
    csv.push('\n');

    for entry in &catalog.materials {
        let material = &entry.material;
        for unit in &entry.units {
            let _ = write!(
                csv,
                "{},{},{},{},{}",
                quote(&material.name),
                quote(&material.category),
                quote(&unit.label),
                unit.price,
                if unit.available { "Yes" } else { "No" }
            );
            for zone in &zones {
                let price = pricing.resolve_price(&material.id, &unit.value, unit.price, Some(zone));
                let _ = write!(csv, ",{price}");
            }
            csv.push('\n');
        }
    }
    csv
}

/// File name for an export produced on `date`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!(
        "construction_prices_with_barangay_{}.csv",
        date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::pricing::PriceOverride, test_utils::sample_catalog};

    #[test]
    fn test_export_without_zones() {
        let csv = export_price_list(&sample_catalog(), &PricingTable::default());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Material,Category,Unit,Base Price,Available");
        assert_eq!(lines.len(), 4);
        assert!(lines.contains(&"\"Cement\",\"Binding Materials\",\"Bag\",250,Yes"));
        assert!(lines.contains(&"\"Cement\",\"Binding Materials\",\"Pallet\",9000,No"));
        assert!(lines.contains(&"\"Sand\",\"Aggregates\",\"Sack\",1200,Yes"));
    }

    #[test]
    fn test_export_resolves_each_zone() {
        let mut pricing = PricingTable::default();
        pricing.insert(
            "Zone A",
            "cement",
            "bag",
            PriceOverride {
                multiplier: 1.2,
                fixed_price: None,
            },
        );
        pricing.insert(
            "Zone B",
            "cement",
            "bag",
            PriceOverride {
                multiplier: 1.0,
                fixed_price: Some(275.0),
            },
        );

        let csv = export_price_list(&sample_catalog(), &pricing);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Material,Category,Unit,Base Price,Available,Zone A Price,Zone B Price"
        );
        assert!(lines.contains(&"\"Cement\",\"Binding Materials\",\"Bag\",250,Yes,300,275"));
        assert!(lines.contains(&"\"Cement\",\"Binding Materials\",\"Pallet\",9000,No,9000,9000"));
    }

    #[test]
    fn test_quotes_are_doubled() {
        assert_eq!(quote("2\" gravel"), "\"2\"\" gravel\"");
        assert_eq!(header_field("Poblacion, East Price"), "\"Poblacion, East Price\"");
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(
            export_file_name(date),
            "construction_prices_with_barangay_2026-03-09.csv"
        );
    }
}
