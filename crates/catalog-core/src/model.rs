use crate::errors::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// A stored record as the store sees it.
pub type Document = Map<String, JsonValue>;

pub const ID_FIELD: &str = "_id";
pub const NAME_FIELD: &str = "name";
pub const BRAND_FIELD: &str = "brandName";
pub const CATEGORIES_FIELD: &str = "categories";
pub const PRICE_FIELD: &str = "regularPrice";
pub const ADDED_TIME_FIELD: &str = "addedTime";
pub const CONVERTED_PRICE_FIELD: &str = "convertedPrice";

/// Store-assigned item identifier (ULID, text-encoded on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Ulid);

impl ItemId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ItemId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s.trim())
            .map(ItemId)
            .map_err(|e| CatalogError::InvalidId(format!("{:?}: {}", s, e)))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A catalog record exactly as the store returned it.
///
/// Reads never reshape stored documents, so field access is lenient: a field
/// that is absent or has an unexpected type reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(Document);

impl Item {
    pub fn from_document(doc: Document) -> Self {
        Self(doc)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<ItemId> {
        self.text(ID_FIELD)?.parse().ok()
    }

    pub fn name(&self) -> Option<&str> {
        self.text(NAME_FIELD)
    }

    pub fn brand_name(&self) -> Option<&str> {
        self.text(BRAND_FIELD)
    }

    pub fn regular_price(&self) -> Option<&JsonValue> {
        self.0.get(PRICE_FIELD)
    }

    /// Numeric view of `regularPrice`: decimal text or a plain number.
    pub fn price(&self) -> Option<f64> {
        let p = match self.regular_price()? {
            JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
            JsonValue::Number(n) => n.as_f64()?,
            _ => return None,
        };
        p.is_finite().then_some(p)
    }

    /// Only present on documents produced by the search pipeline.
    pub fn converted_price(&self) -> Option<f64> {
        self.0.get(CONVERTED_PRICE_FIELD)?.as_f64()
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field)?.as_str()
    }
}

impl From<Document> for Item {
    fn from(doc: Document) -> Self {
        Self(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_id_rejects_non_ulid_text() {
        assert!(matches!(
            "not-an-id".parse::<ItemId>(),
            Err(CatalogError::InvalidId(_))
        ));
        let id = ItemId::new();
        assert_eq!(id.to_string().parse::<ItemId>().unwrap(), id);
    }

    fn doc(v: JsonValue) -> Document {
        match v {
            JsonValue::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn reads_upstream_document_shapes() {
        let id = ItemId::new();
        let item = Item::from_document(doc(json!({
            "_id": id.to_string(),
            "name": "Phone Case",
            "brandName": "Acme",
            "categories": "Accessories",
            "regularPrice": " 12.5 ",
            "addedTime": "2024-03-01T10:00:00Z",
            "color": "red"
        })));
        assert_eq!(item.id(), Some(id));
        assert_eq!(item.name(), Some("Phone Case"));
        assert_eq!(item.brand_name(), Some("Acme"));
        assert_eq!(item.price(), Some(12.5));
        assert_eq!(item.converted_price(), None);
        assert_eq!(item.get("color"), Some(&json!("red")));
    }

    #[test]
    fn odd_fields_read_as_absent() {
        let item = Item::from_document(doc(json!({
            "_id": {"$oid": "65f0"},
            "name": null,
            "categories": 7,
            "regularPrice": ["1"],
            "addedTime": {"$date": "2024-01-01T00:00:00Z"}
        })));
        assert_eq!(item.id(), None);
        assert_eq!(item.name(), None);
        assert_eq!(item.price(), None);
        assert_eq!(Item::default().price(), None);
    }

    #[test]
    fn serializes_the_stored_document_unchanged() {
        let stored = doc(json!({
            "name": "Lamp",
            "regularPrice": 12.50,
            "addedTime": "2024-01-03T00:00:00.000+05:00",
            "categories": 7
        }));
        let item = Item::from_document(stored.clone());
        assert_eq!(item.price(), Some(12.5));
        assert_eq!(serde_json::to_value(&item).unwrap(), JsonValue::Object(stored.clone()));
        assert_eq!(item.into_document(), stored);
    }
}
