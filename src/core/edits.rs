//! Trailing-edge coalescing queue for admin price edits.
//!
//! Rapid edits to the same field collapse into a single write that becomes due once the
//! field has been quiet for the debounce delay. The queue holds no timers; the owner
//! polls [`PendingEdits::take_due`] and drains or cancels on teardown.

use crate::core::pricing::PriceOverride;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Identifies the field an edit writes to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditKey {
    /// Base price of a unit
    UnitPrice {
        /// Material identifier
        material_id: String,
        /// Unit value
        unit_value: String,
    },
    /// A zone's override for a unit
    ZonePrice {
        /// Zone name
        zone: String,
        /// Material identifier
        material_id: String,
        /// Unit value
        unit_value: String,
    },
}

/// A pending write.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// New base price for a unit
    UnitPrice {
        /// Material identifier
        material_id: String,
        /// Unit value
        unit_value: String,
        /// Price to store
        price: f64,
    },
    /// New zone override for a unit
    ZonePrice {
        /// Zone name
        zone: String,
        /// Material identifier
        material_id: String,
        /// Unit value
        unit_value: String,
        /// Override to store
        price_override: PriceOverride,
    },
}

impl Edit {
    /// The field this edit targets.
    #[must_use]
    pub fn key(&self) -> EditKey {
        match self {
            Self::UnitPrice {
                material_id,
                unit_value,
                ..
            } => EditKey::UnitPrice {
                material_id: material_id.clone(),
                unit_value: unit_value.clone(),
            },
            Self::ZonePrice {
                zone,
                material_id,
                unit_value,
                ..
            } => EditKey::ZonePrice {
                zone: zone.clone(),
                material_id: material_id.clone(),
                unit_value: unit_value.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Scheduled {
    edit: Edit,
    due_at: DateTime<Utc>,
}

/// Debounced edits keyed by target field.
#[derive(Debug, Clone)]
pub struct PendingEdits {
    delay: Duration,
    queue: BTreeMap<EditKey, Scheduled>,
}

impl PendingEdits {
    /// Creates an empty queue with the given quiescence delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            queue: BTreeMap::new(),
        }
    }

    /// Queues an edit, replacing any pending edit for the same field and restarting its
    /// quiet period.
    pub fn schedule(&mut self, edit: Edit, now: DateTime<Utc>) {
        let key = edit.key();
        trace!("Scheduling edit for {:?}", key);
        self.queue.insert(
            key,
            Scheduled {
                edit,
                due_at: now + self.delay,
            },
        );
    }

    /// Removes and returns every edit whose quiet period has elapsed.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Edit> {
        let due: Vec<EditKey> = self
            .queue
            .iter()
            .filter(|(_, scheduled)| scheduled.due_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        let edits: Vec<Edit> = due
            .iter()
            .filter_map(|key| self.queue.remove(key))
            .map(|scheduled| scheduled.edit)
            .collect();
        if !edits.is_empty() {
            debug!("{} debounced edit(s) due", edits.len());
        }
        edits
    }

    /// Removes and returns every pending edit regardless of deadline.
    pub fn drain(&mut self) -> Vec<Edit> {
        std::mem::take(&mut self.queue)
            .into_values()
            .map(|scheduled| scheduled.edit)
            .collect()
    }

    /// Discards every pending edit and returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        if dropped > 0 {
            debug!("Cancelled {} pending edit(s)", dropped);
        }
        dropped
    }

    /// Number of pending edits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn price_edit(price: f64) -> Edit {
        Edit::UnitPrice {
            material_id: "cement".to_string(),
            unit_value: "bag".to_string(),
            price,
        }
    }

    #[test]
    fn test_rapid_edits_coalesce() {
        let mut edits = PendingEdits::new(Duration::milliseconds(500));
        let start = Utc::now();

        edits.schedule(price_edit(2.0), start);
        edits.schedule(price_edit(25.0), start + Duration::milliseconds(200));
        edits.schedule(price_edit(255.0), start + Duration::milliseconds(400));
        assert_eq!(edits.len(), 1);

        // The deadline moved with the last keystroke.
        assert!(edits.take_due(start + Duration::milliseconds(700)).is_empty());
        let due = edits.take_due(start + Duration::milliseconds(900));
        assert_eq!(due, vec![price_edit(255.0)]);
        assert!(edits.is_empty());
    }

    #[test]
    fn test_distinct_fields_are_independent() {
        let mut edits = PendingEdits::new(Duration::milliseconds(500));
        let start = Utc::now();

        edits.schedule(price_edit(260.0), start);
        edits.schedule(
            Edit::ZonePrice {
                zone: "Zone A".to_string(),
                material_id: "cement".to_string(),
                unit_value: "bag".to_string(),
                price_override: PriceOverride {
                    multiplier: 1.2,
                    fixed_price: None,
                },
            },
            start + Duration::milliseconds(300),
        );

        let first = edits.take_due(start + Duration::milliseconds(500));
        assert_eq!(first, vec![price_edit(260.0)]);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits.take_due(start + Duration::milliseconds(800)).len(), 1);
    }

    #[test]
    fn test_drain_and_cancel() {
        let mut edits = PendingEdits::new(Duration::milliseconds(500));
        let now = Utc::now();

        edits.schedule(price_edit(1.0), now);
        assert_eq!(edits.drain(), vec![price_edit(1.0)]);
        assert!(edits.is_empty());

        edits.schedule(price_edit(2.0), now);
        assert_eq!(edits.cancel_all(), 1);
        assert!(edits.take_due(now + Duration::seconds(5)).is_empty());
    }
}
