//! Record types stored by the collection stores.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// A stored entity: a JSON object carrying a store-assigned integer id
/// plus arbitrary other fields.
///
/// Ids are `None` until the store assigns one on save. Past the HTTP
/// boundary every id is a `u64`; path segments and body references are
/// normalized on entry.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn id(&self) -> Option<u64>;
    fn set_id(&mut self, id: u64);
}

/// Milliseconds since the Unix epoch, the `timestamp` stamped on
/// records at creation time.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A product record.
///
/// None of the conventional fields are validated; clients may omit any
/// of them and may send extra fields, which round-trip through the
/// flattened map untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Product {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// A cart record. The `products` list holds snapshots: full copies of
/// product records at the time they were added, never revalidated
/// against the live product collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Cart {
    /// An empty cart stamped with the current time.
    pub fn empty() -> Self {
        Self {
            id: None,
            timestamp: Some(now_millis()),
            products: Vec::new(),
        }
    }
}

impl Record for Cart {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// Accepts an id sent either as a JSON number or as a numeric string,
/// normalizing to `u64`. The historical wire format used both forms
/// interchangeably.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("id must be a non-negative integer")),
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("id must be a non-negative integer")),
        other => Err(serde::de::Error::custom(format!(
            "id must be a number or numeric string, got {other}"
        ))),
    }
}
