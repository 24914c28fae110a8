use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";
pub const UNTITLED: &str = "Untitled";

/// Canonical product. Built by the reconciler or read back from a snapshot,
/// never mutated afterwards.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    /// Minor currency units.
    pub price: u64,
    pub image: String,
}

impl Product {
    /// True when the product carries a real picture rather than nothing or the stock placeholder.
    pub fn has_image(&self) -> bool {
        !self.image.is_empty() && !self.image.to_lowercase().contains("placeholder")
    }
}

/// Formats minor units as major units with grouping, e.g. `₦12,500.00`.
pub fn format_price(minor: u64, symbol: &str) -> String {
    let major = (minor / 100).to_string();
    let mut grouped = String::with_capacity(major.len() + major.len() / 3);
    for (i, c) in major.chars().enumerate() {
        if i > 0 && (major.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}.{:02}", symbol, grouped, minor % 100)
}

/// Parses a major-unit amount typed by a person (`12500`, `12.5`, `12.50`) into minor units.
pub fn parse_amount(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let bad = || format!("'{}' is not an amount, expected e.g. 12500 or 12.50", input);
    let (whole, fraction) = match input.find('.') {
        Some(i) => (&input[..i], &input[i + 1..]),
        None => (input, ""),
    };
    if whole.is_empty() || fraction.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(bad());
    }
    let whole: u64 = whole.parse().map_err(|_| bad())?;
    let cents: u64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u64>().map_err(|_| bad())? * 10,
        _ => fraction.parse().map_err(|_| bad())?,
    };
    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_image(image: &str) -> Product {
        Product {
            id: "1".into(),
            name: "Panel".into(),
            short_description: String::new(),
            full_description: String::new(),
            price: 0,
            image: image.into(),
        }
    }

    #[test]
    fn placeholder_and_empty_images_do_not_count() {
        assert!(!with_image("").has_image());
        assert!(!with_image(PLACEHOLDER_IMAGE).has_image());
        assert!(!with_image("/img/PlaceHolder.png").has_image());
        assert!(with_image("/img/panel.jpg").has_image());
    }

    #[test]
    fn snapshot_keys_are_camel_case() {
        let json = serde_json::to_value(with_image("/img/panel.jpg")).unwrap();
        assert!(json.get("shortDescription").is_some());
        assert!(json.get("fullDescription").is_some());
        assert!(json.get("short_description").is_none());
    }

    #[test]
    fn formats_grouped_major_units() {
        assert_eq!(format_price(0, "₦"), "₦0.00");
        assert_eq!(format_price(5, "$"), "$0.05");
        assert_eq!(format_price(1_250_000, "₦"), "₦12,500.00");
        assert_eq!(format_price(123_456_789, ""), "1,234,567.89");
        assert_eq!(format_price(99_999, "₦"), "₦999.99");
    }

    #[test]
    fn parses_typed_amounts() {
        assert_eq!(parse_amount("12500"), Ok(1_250_000));
        assert_eq!(parse_amount(" 12.5 "), Ok(1250));
        assert_eq!(parse_amount("0.07"), Ok(7));
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("1.234").is_err());
        assert!(parse_amount(".5").is_err());
        assert!(parse_amount("ten").is_err());
        assert!(parse_amount("").is_err());
    }
}
