use itertools::Itertools;

use crate::catalog::Freshness;
use crate::model::product::{format_price, Product};

pub const EMPTY_STATE: &str = "No products match your filters.";

/// One line per product: id, name, price, short description.
pub fn render_list(products: &[Product], currency: &str) -> String {
    if products.is_empty() {
        return EMPTY_STATE.to_owned();
    }
    let id_width = products.iter().map(|p| p.id.chars().count()).max().unwrap_or(0);
    let name_width = products.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    products
        .iter()
        .map(|p| {
            format!(
                "{:<iw$}  {:<nw$}  {:>14}  {}",
                p.id,
                p.name,
                format_price(p.price, currency),
                p.short_description,
                iw = id_width,
                nw = name_width
            )
            .trim_end()
            .to_owned()
        })
        .join("\n")
}

pub fn render_detail(product: &Product, currency: &str) -> String {
    let mut lines = vec![
        product.name.clone(),
        format_price(product.price, currency),
        format!("Image: {}", product.image),
    ];
    if !product.short_description.is_empty() {
        lines.push(String::new());
        lines.push(product.short_description.clone());
    }
    if !product.full_description.is_empty() {
        lines.push(String::new());
        lines.push(product.full_description.clone());
    }
    lines.join("\n")
}

/// Footer telling the reader how current the list is.
pub fn render_status(shown: usize, total: usize, freshness: Freshness) -> String {
    let source = match freshness {
        Freshness::Fresh => "live",
        Freshness::Stale => "cached snapshot",
        Freshness::Empty => "nothing cached",
    };
    format!("{} of {} products ({})", shown, total, source)
}
