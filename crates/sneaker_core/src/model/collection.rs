//! Collection entry model.
//!
//! # Responsibility
//! - Define the reduced item projection the user keeps in their collection.
//! - Normalize partial input with the placeholders shared by `add` and the
//!   legacy import.
//!
//! # Invariants
//! - `added_at` is set once when the entry is created and survives every
//!   catalog write-through.

use crate::model::item::{Item, ItemId, ItemValidationError, PartialItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder name for records that arrive without one.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown Sneaker";

/// One item the local user has claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(alias = "added_at")]
    pub added_at: DateTime<Utc>,
}

impl CollectionEntry {
    /// Builds an entry from partial input.
    ///
    /// Missing `name` becomes `UNKNOWN_ITEM_NAME`; missing `description` and
    /// `imageUrl` become empty strings; missing or unparseable `addedAt`
    /// becomes `now`.
    pub fn normalize(
        partial: &PartialItem,
        now: DateTime<Utc>,
    ) -> Result<Self, ItemValidationError> {
        let id = partial.require_id()?;
        Ok(Self {
            id: id.to_string(),
            name: partial
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string()),
            description: partial.description.clone().unwrap_or_default(),
            image_url: partial.image_url.clone().unwrap_or_default(),
            added_at: partial
                .added_at
                .as_ref()
                .and_then(|value| value.resolve())
                .unwrap_or(now),
        })
    }

    /// Copies the catalog-owned display fields from `item`.
    pub fn apply_item(&mut self, item: &Item) {
        self.name = item.name.clone();
        self.description = item.description.clone();
        self.image_url = item.image_url.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionEntry, UNKNOWN_ITEM_NAME};
    use crate::model::item::{Item, ItemValidationError, LooseTimestamp, PartialItem};
    use chrono::{TimeZone, Utc};

    #[test]
    fn normalize_fills_placeholders() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let entry = CollectionEntry::normalize(&PartialItem::with_id("A"), now).unwrap();
        assert_eq!(entry.name, UNKNOWN_ITEM_NAME);
        assert_eq!(entry.description, "");
        assert_eq!(entry.image_url, "");
        assert_eq!(entry.added_at, now);
    }

    #[test]
    fn normalize_keeps_parseable_timestamp_and_replaces_garbage() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut partial = PartialItem::with_id("A");
        partial.added_at = Some(LooseTimestamp::Text("2023-06-01T00:00:00Z".to_string()));
        let entry = CollectionEntry::normalize(&partial, now).unwrap();
        assert_eq!(entry.added_at, Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap());

        partial.added_at = Some(LooseTimestamp::Text("last tuesday".to_string()));
        let entry = CollectionEntry::normalize(&partial, now).unwrap();
        assert_eq!(entry.added_at, now);
    }

    #[test]
    fn normalize_requires_id() {
        let partial = PartialItem {
            name: Some("noId".to_string()),
            ..PartialItem::default()
        };
        assert_eq!(
            CollectionEntry::normalize(&partial, Utc::now()),
            Err(ItemValidationError::EmptyId)
        );
    }

    #[test]
    fn apply_item_keeps_added_at() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut entry = CollectionEntry::normalize(&PartialItem::with_id("A"), now).unwrap();
        let mut item = Item::with_id("A", "new");
        item.description = "d".to_string();
        item.image_url = "u".to_string();

        entry.apply_item(&item);
        assert_eq!(entry.name, "new");
        assert_eq!(entry.description, "d");
        assert_eq!(entry.image_url, "u");
        assert_eq!(entry.added_at, now);
    }

    #[test]
    fn deserializes_legacy_snake_case_timestamp() {
        let entry: CollectionEntry = serde_json::from_str(
            r#"{"id":"A","name":"n","description":"","imageUrl":"","added_at":"2024-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(entry.added_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }
}
