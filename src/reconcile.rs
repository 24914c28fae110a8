use serde_json::Value;

use crate::model::product::{Product, PLACEHOLDER_IMAGE, UNTITLED};
use crate::model::raw::RawRecord;

/// Maps a hosted row onto the canonical shape. Every field has a fallback, so this never fails.
pub fn reconcile(raw: RawRecord) -> Product {
    let RawRecord {
        id,
        name,
        title,
        short_description,
        full_description,
        price_cents,
        image_url,
        ..
    } = raw;
    Product {
        id,
        name: present(name)
            .or_else(|| present(title))
            .unwrap_or_else(|| UNTITLED.to_owned()),
        short_description: short_description.unwrap_or_default(),
        full_description: full_description.unwrap_or_default(),
        price: price_cents.as_ref().map(coerce_price).unwrap_or(0),
        image: present(image_url).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
    }
}

pub fn reconcile_all(raws: Vec<RawRecord>) -> Vec<Product> {
    raws.into_iter().map(reconcile).collect()
}

// Empty strings are as good as missing
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn coerce_price(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(from_float))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(from_float).unwrap_or(0),
        _ => 0,
    }
}

fn from_float(f: f64) -> u64 {
    if f.is_finite() && f > 0.0 {
        f.round() as u64
    } else {
        0
    }
}
