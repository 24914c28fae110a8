use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::product::Product;

/// A row of the hosted `products` table before reconciliation.
/// Everything but the id is optional, and older rows use `title` instead of `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    // Kept loose, rows have carried numbers and numeric strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<Value>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "loose_text", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Insert body for a new row. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub price_cents: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("unsupported id {}", other))),
    }
}

// A mistyped column must not sink the whole batch, so scalars are stringified
// and anything else is treated as missing
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

impl From<&Product> for RawRecord {
    fn from(p: &Product) -> Self {
        RawRecord {
            id: p.id.clone(),
            name: Some(p.name.clone()),
            title: None,
            short_description: Some(p.short_description.clone()),
            full_description: Some(p.full_description.clone()),
            price_cents: Some(Value::from(p.price)),
            image_url: Some(p.image.clone()),
            created_at: None,
        }
    }
}
