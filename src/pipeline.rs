use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use itertools::Itertools;
use log::debug;

use crate::model::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Keep the upstream order, which is newest first
    Newest,
    PriceAscending,
    PriceDescending,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Newest
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "price-asc" | "price-ascending" => Ok(SortMode::PriceAscending),
            "price-desc" | "price-descending" => Ok(SortMode::PriceDescending),
            other => Err(format!(
                "unknown sort mode '{}', expected newest, price-asc or price-desc",
                other
            )),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Newest => "newest",
            SortMode::PriceAscending => "price-asc",
            SortMode::PriceDescending => "price-desc",
        })
    }
}

/// Listing controls. Prices are inclusive bounds in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub search_text: String,
    pub sort: SortMode,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub require_image: bool,
}

/// Returns the products to display for `config`, leaving `products` untouched.
///
/// Filters run in a fixed order (search, min price, max price, image) and the
/// price sorts are stable, so equal prices keep their upstream order.
pub fn apply(products: &[Product], config: &FilterConfig) -> Vec<Product> {
    let query = config.search_text.trim().to_lowercase();
    let filtered = products
        .iter()
        .filter(|p| {
            query.is_empty()
                || p.name.to_lowercase().contains(&query)
                || p.short_description.to_lowercase().contains(&query)
        })
        .filter(|p| config.min_price.map_or(true, |min| p.price >= min))
        .filter(|p| config.max_price.map_or(true, |max| p.price <= max))
        .filter(|p| !config.require_image || p.has_image())
        .cloned();
    match config.sort {
        SortMode::Newest => filtered.collect(),
        SortMode::PriceAscending => filtered.sorted_by(|a, b| a.price.cmp(&b.price)).collect(),
        SortMode::PriceDescending => filtered.sorted_by(|a, b| b.price.cmp(&a.price)).collect(),
    }
}

/// Holds the last pipeline result and only recomputes when the list snapshot or the config changes.
#[derive(Debug, Default)]
pub struct FilteredView {
    last: Option<Memo>,
}

#[derive(Debug)]
struct Memo {
    products: Arc<[Product]>,
    config: FilterConfig,
    result: Arc<[Product]>,
}

impl FilteredView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, products: &Arc<[Product]>, config: &FilterConfig) -> Arc<[Product]> {
        if let Some(memo) = &self.last {
            // Lists are replaced wholesale, so pointer identity is the list's identity
            if Arc::ptr_eq(&memo.products, products) && memo.config == *config {
                return Arc::clone(&memo.result);
            }
        }
        debug!("Recomputing listing for {} products with {:?}", products.len(), config);
        let result: Arc<[Product]> = apply(products, config).into();
        self.last = Some(Memo {
            products: Arc::clone(products),
            config: config.clone(),
            result: Arc::clone(&result),
        });
        result
    }
}
