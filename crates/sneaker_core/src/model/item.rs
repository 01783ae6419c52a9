//! Catalog item model and untrusted-input parsing.
//!
//! # Responsibility
//! - Define the authoritative `Item` record and its ownership history.
//! - Parse decoded scan payloads and legacy records into `PartialItem`.
//!
//! # Invariants
//! - `id` is opaque and stable; it is never rewritten once stored.
//! - `history` is append-mostly; edits keep earlier records in order.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier of a catalog item (usually the UUID printed in the tag).
pub type ItemId = String;

/// One `{name, date}` ownership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub name: String,
    /// Free-form date text as entered by the administrator.
    pub date: String,
}

impl OwnershipRecord {
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankHistoryField("name"));
        }
        if self.date.trim().is_empty() {
            return Err(ItemValidationError::BlankHistoryField("date"));
        }
        Ok(())
    }
}

/// Authoritative catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacture_number: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub history: Vec<OwnershipRecord>,
}

impl Item {
    /// Creates an item with a generated UUID v4 id.
    ///
    /// Used when an administrator registers a pair that has no tag yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Self::generate_id(), name)
    }

    /// Fresh UUID v4 id for items registered without a tag.
    pub fn generate_id() -> ItemId {
        Uuid::new_v4().to_string()
    }

    /// Creates an item with a caller-provided id and empty optional fields.
    pub fn with_id(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            manufacture_number: None,
            image_url: String::new(),
            gallery: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Checks the invariants enforced before any catalog write.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::EmptyId);
        }
        self.history
            .iter()
            .try_for_each(OwnershipRecord::validate)
    }
}

/// Legacy timestamps arrive either as ISO-8601 text or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseTimestamp {
    Millis(i64),
    Text(String),
}

impl LooseTimestamp {
    /// Accepts integer milliseconds or text; other JSON shapes yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Millis),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }

    /// Returns `None` when the value is not a representable instant.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|value| value.with_timezone(&Utc)),
        }
    }
}

/// Loosely-shaped record from a scan payload or the legacy collection blob.
///
/// Every field is optional here; `into_item` and
/// `CollectionEntry::normalize` decide which absences are fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manufacture_number: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery: Option<Vec<String>>,
    #[serde(default)]
    pub history: Option<Vec<OwnershipRecord>>,
    #[serde(default, alias = "added_at")]
    pub added_at: Option<LooseTimestamp>,
}

impl PartialItem {
    /// Creates a partial record carrying only an id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parses a decoded scan payload.
    ///
    /// # Errors
    /// - `MalformedPayload` when the text is not a JSON object or a field has
    ///   the wrong JSON type.
    /// - `EmptyId` when the object carries no usable `id`.
    pub fn parse_payload(raw: &str) -> Result<Self, ItemValidationError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|err| ItemValidationError::MalformedPayload(err.to_string()))?;
        if !value.is_object() {
            return Err(ItemValidationError::MalformedPayload(
                "payload must be a JSON object".to_string(),
            ));
        }
        let partial: Self = serde_json::from_value(value)
            .map_err(|err| ItemValidationError::MalformedPayload(err.to_string()))?;
        partial.require_id()?;
        Ok(partial)
    }

    /// Reads a legacy record field by field, treating any wrong-typed field
    /// as absent.
    ///
    /// `id` is kept whenever it is a JSON string, whatever shape the other
    /// fields have. `addedAt` wins over `added_at` when both resolve.
    pub fn from_legacy_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let text = |field: &str| object.get(field).and_then(Value::as_str).map(str::to_string);

        Self {
            id: text("id"),
            name: text("name"),
            description: text("description"),
            manufacture_number: text("manufactureNumber"),
            image_url: text("imageUrl"),
            gallery: object.get("gallery").and_then(Value::as_array).map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
            history: object.get("history").and_then(Value::as_array).map(|records| {
                records
                    .iter()
                    .filter_map(|record| {
                        serde_json::from_value::<OwnershipRecord>(record.clone()).ok()
                    })
                    .collect()
            }),
            added_at: ["addedAt", "added_at"]
                .iter()
                .filter_map(|field| object.get(*field).and_then(LooseTimestamp::from_value))
                .find(|stamp| stamp.resolve().is_some()),
        }
    }

    /// Returns the id when present and not blank.
    pub fn usable_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    pub fn require_id(&self) -> Result<&str, ItemValidationError> {
        self.usable_id().ok_or(ItemValidationError::EmptyId)
    }

    /// Converts into a full catalog item, defaulting absent text fields to
    /// empty values.
    pub fn into_item(self) -> Result<Item, ItemValidationError> {
        let id = self.require_id()?.to_string();
        let item = Item {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            manufacture_number: self.manufacture_number.filter(|value| !value.is_empty()),
            image_url: self.image_url.unwrap_or_default(),
            gallery: self.gallery.unwrap_or_default(),
            history: self.history.unwrap_or_default(),
        };
        item.validate()?;
        Ok(item)
    }
}

impl From<&Item> for PartialItem {
    fn from(item: &Item) -> Self {
        Self {
            id: Some(item.id.clone()),
            name: Some(item.name.clone()),
            description: Some(item.description.clone()),
            manufacture_number: item.manufacture_number.clone(),
            image_url: Some(item.image_url.clone()),
            gallery: Some(item.gallery.clone()),
            history: Some(item.history.clone()),
            added_at: None,
        }
    }
}

/// Rejections raised before any write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyId,
    MalformedPayload(String),
    BlankHistoryField(&'static str),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "item id must not be empty"),
            Self::MalformedPayload(reason) => write!(f, "malformed item payload: {reason}"),
            Self::BlankHistoryField(field) => {
                write!(f, "ownership record `{field}` must not be blank")
            }
        }
    }
}

impl Error for ItemValidationError {}

#[cfg(test)]
mod tests {
    use super::{Item, ItemValidationError, LooseTimestamp, OwnershipRecord, PartialItem};

    #[test]
    fn new_item_gets_generated_id() {
        let first = Item::new("Dunk Low");
        let second = Item::new("Dunk Low");
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert!(first.validate().is_ok());
    }

    #[test]
    fn blank_id_fails_validation() {
        let item = Item::with_id("   ", "ghost");
        assert_eq!(item.validate(), Err(ItemValidationError::EmptyId));
    }

    #[test]
    fn item_serializes_camel_case_fields() {
        let mut item = Item::with_id("A", "Jordan 1");
        item.image_url = "https://img/1.png".to_string();
        item.manufacture_number = Some("555088-134".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["imageUrl"], "https://img/1.png");
        assert_eq!(json["manufactureNumber"], "555088-134");
        assert!(json["gallery"].as_array().unwrap().is_empty());
    }

    #[test]
    fn parse_payload_accepts_minimal_object() {
        let partial = PartialItem::parse_payload(r#" {"id":"abc"} "#).unwrap();
        assert_eq!(partial.usable_id(), Some("abc"));
        assert_eq!(partial.name, None);
    }

    #[test]
    fn parse_payload_rejects_non_objects_and_missing_id() {
        assert!(matches!(
            PartialItem::parse_payload("not json"),
            Err(ItemValidationError::MalformedPayload(_))
        ));
        assert!(matches!(
            PartialItem::parse_payload("[1,2]"),
            Err(ItemValidationError::MalformedPayload(_))
        ));
        assert!(matches!(
            PartialItem::parse_payload(r#"{"id": 42}"#),
            Err(ItemValidationError::MalformedPayload(_))
        ));
        assert_eq!(
            PartialItem::parse_payload(r#"{"name":"noId"}"#),
            Err(ItemValidationError::EmptyId)
        );
        assert_eq!(
            PartialItem::parse_payload(r#"{"id":"  "}"#),
            Err(ItemValidationError::EmptyId)
        );
    }

    #[test]
    fn into_item_defaults_missing_fields() {
        let item = PartialItem::with_id("A").into_item().unwrap();
        assert_eq!(item.id, "A");
        assert!(item.name.is_empty());
        assert!(item.gallery.is_empty());
        assert!(item.history.is_empty());
    }

    #[test]
    fn legacy_timestamp_accepts_both_spellings_and_shapes() {
        let snake: PartialItem =
            serde_json::from_str(r#"{"id":"A","added_at":"2024-03-01T10:00:00.000Z"}"#).unwrap();
        let camel: PartialItem =
            serde_json::from_str(r#"{"id":"B","addedAt":1709287200000}"#).unwrap();

        let snake_at = snake.added_at.unwrap().resolve().unwrap();
        let camel_at = camel.added_at.unwrap().resolve().unwrap();
        assert_eq!(snake_at, camel_at);
        assert_eq!(LooseTimestamp::Text("yesterday".to_string()).resolve(), None);
    }

    #[test]
    fn legacy_value_ignores_wrong_typed_fields() {
        let value = serde_json::json!({
            "id": "A",
            "name": 5,
            "imageUrl": "u",
            "gallery": ["g1", 2, "g2"],
            "history": [{"name": "Sam", "date": "2021"}, {"name": 1}],
            "addedAt": 1.5,
            "added_at": "2022-05-01T12:00:00Z"
        });
        let partial = PartialItem::from_legacy_value(&value);
        assert_eq!(partial.usable_id(), Some("A"));
        assert_eq!(partial.name, None);
        assert_eq!(partial.image_url.as_deref(), Some("u"));
        assert_eq!(partial.gallery, Some(vec!["g1".to_string(), "g2".to_string()]));
        assert_eq!(partial.history.map(|records| records.len()), Some(1));
        assert_eq!(
            partial.added_at,
            Some(LooseTimestamp::Text("2022-05-01T12:00:00Z".to_string()))
        );
    }

    #[test]
    fn legacy_value_without_object_has_no_id() {
        assert_eq!(
            PartialItem::from_legacy_value(&serde_json::json!("junk")),
            PartialItem::default()
        );
        assert_eq!(
            PartialItem::from_legacy_value(&serde_json::json!({"id": 7})).usable_id(),
            None
        );
    }

    #[test]
    fn ownership_record_rejects_blank_fields() {
        assert_eq!(
            OwnershipRecord::new(" ", "2024").validate(),
            Err(ItemValidationError::BlankHistoryField("name"))
        );
        assert_eq!(
            OwnershipRecord::new("Sam", "").validate(),
            Err(ItemValidationError::BlankHistoryField("date"))
        );
    }
}
