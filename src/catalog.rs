use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::cache::SnapshotCache;
use crate::error::{CatalogError, RemoteError, UploadError};
use crate::gateway::Gateway;
use crate::model::product::Product;
use crate::model::raw::NewRecord;
use crate::pipeline::{FilterConfig, FilteredView};
use crate::reconcile::{reconcile, reconcile_all};

/// Where the list on screen came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing fetched yet and no snapshot either
    Empty,
    /// Read back from the local snapshot, may be out of date
    Stale,
    /// Fetched from the backend during this session
    Fresh,
}

/// Admin form contents. Price is in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    None,
    Url(String),
    File(PathBuf),
}

/// Current product list plus the wiring to refresh and edit it.
pub struct Catalog<G: Gateway> {
    gateway: G,
    cache: SnapshotCache,
    products: Arc<[Product]>,
    freshness: Freshness,
    view: FilteredView,
}

impl<G: Gateway> Catalog<G> {
    /// Starts from the local snapshot, if there is one.
    pub fn open(gateway: G, cache: SnapshotCache) -> Self {
        let (products, freshness) = match cache.load() {
            Some(products) => (products, Freshness::Stale),
            None => (vec![], Freshness::Empty),
        };
        Catalog {
            gateway,
            cache,
            products: products.into(),
            freshness,
            view: FilteredView::new(),
        }
    }

    pub fn products(&self) -> &Arc<[Product]> {
        &self.products
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Filtered and sorted list for display, reused while neither the list nor `config` change.
    pub fn view(&mut self, config: &FilterConfig) -> Arc<[Product]> {
        self.view.get(&self.products, config)
    }

    /// Replaces the list with what the backend has now.
    /// On failure the current list stays in place so the caller can keep showing it.
    pub fn refresh(&mut self) -> Result<&[Product], RemoteError> {
        let rows = self.gateway.fetch_all()?;
        let products = reconcile_all(rows);
        info!("Fetched {} products", products.len());
        self.cache.store(&products);
        self.products = products.into();
        self.freshness = Freshness::Fresh;
        Ok(self.products.as_ref())
    }

    /// Uploads the image if needed, inserts the row, and puts the new product first.
    /// A failed upload stops before anything is inserted.
    pub fn create(&mut self, draft: ProductDraft, image: ImageSource) -> Result<Product, CatalogError> {
        if draft.name.trim().is_empty() {
            return Err(CatalogError::Invalid("name must not be empty".to_owned()));
        }
        let image_url = match image {
            ImageSource::None => None,
            ImageSource::Url(url) => Some(url),
            ImageSource::File(path) => {
                let bytes = std::fs::read(&path).map_err(|source| UploadError::Read {
                    path: path.clone(),
                    source,
                })?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_owned());
                Some(self.gateway.upload_image(&file_name, bytes)?)
            }
        };
        let record = NewRecord {
            name: draft.name.trim().to_owned(),
            short_description: draft.short_description,
            full_description: draft.full_description,
            price_cents: draft.price,
            image_url,
        };
        let product = reconcile(self.gateway.insert(&record)?);
        info!("Created product {} ({})", product.id, product.name);

        let products: Vec<Product> = std::iter::once(product.clone())
            .chain(self.products.iter().cloned())
            .collect();
        self.replace(products);
        Ok(product)
    }

    pub fn delete(&mut self, id: &str) -> Result<(), RemoteError> {
        self.gateway.delete_by_id(id)?;
        info!("Deleted product {}", id);
        let products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        if products.len() == self.products.len() {
            warn!("Deleted product {} was not in the local list", id);
        }
        self.replace(products);
        Ok(())
    }

    fn replace(&mut self, products: Vec<Product>) {
        self.cache.store(&products);
        self.products = products.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeGateway;
    use crate::model::product::PLACEHOLDER_IMAGE;
    use crate::model::raw::RawRecord;
    use crate::pipeline::SortMode;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn rows() -> Vec<RawRecord> {
        serde_json::from_value(json!([
            {"id": 3, "name": "Solar Panel X", "short_description": "400W", "price_cents": 500, "image_url": "/img/panel.jpg", "created_at": "2024-03-03T00:00:00Z"},
            {"id": 2, "title": "Battery Y", "short_description": "for solar use", "price_cents": "200", "created_at": "2024-03-02T00:00:00Z"},
            {"id": 1, "name": "Inverter Z", "price_cents": 800, "image_url": "/img/inverter.jpg", "created_at": "2024-03-01T00:00:00Z"}
        ]))
        .unwrap()
    }

    fn setup(gateway: FakeGateway) -> (TempDir, Catalog<FakeGateway>) {
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().join("products.json"));
        (dir, Catalog::open(gateway, cache))
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    fn draft(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.into(),
            short_description: "short".into(),
            full_description: "full".into(),
            price: 12_500,
        }
    }

    #[test]
    fn opens_empty_without_snapshot() {
        let (_dir, catalog) = setup(FakeGateway::default());
        assert_eq!(catalog.freshness(), Freshness::Empty);
        assert!(catalog.products().is_empty());
    }

    #[test]
    fn refresh_reconciles_and_writes_snapshot() {
        let (dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        let fetched = catalog.refresh().unwrap().to_vec();
        assert_eq!(ids(&fetched), vec!["3", "2", "1"]);
        assert_eq!(fetched[1].name, "Battery Y");
        assert_eq!(fetched[1].image, PLACEHOLDER_IMAGE);
        assert_eq!(catalog.freshness(), Freshness::Fresh);

        let snapshot = SnapshotCache::new(dir.path().join("products.json")).load();
        assert_eq!(snapshot, Some(fetched));
    }

    #[test]
    fn snapshot_is_shown_until_fetch_succeeds() {
        let (dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        catalog.refresh().unwrap();

        let gateway = FakeGateway::default();
        gateway.fail_fetch.set(true);
        let mut reopened = Catalog::open(gateway, SnapshotCache::new(dir.path().join("products.json")));
        assert_eq!(reopened.freshness(), Freshness::Stale);
        assert_eq!(reopened.products().len(), 3);

        assert!(matches!(reopened.refresh(), Err(RemoteError::Transport(_))));
        assert_eq!(reopened.freshness(), Freshness::Stale);
        assert_eq!(ids(reopened.products()), vec!["3", "2", "1"]);
    }

    #[test]
    fn fresh_fetch_supersedes_snapshot() {
        let (dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        catalog.refresh().unwrap();

        let mut reopened = Catalog::open(
            FakeGateway::with_rows(rows()[..1].to_vec()),
            SnapshotCache::new(dir.path().join("products.json")),
        );
        reopened.refresh().unwrap();
        assert_eq!(ids(reopened.products()), vec!["3"]);
    }

    #[test]
    fn broken_snapshot_does_not_fail_refresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.json");
        // Unwritable snapshot location
        std::fs::create_dir(&path).unwrap();
        let mut catalog = Catalog::open(FakeGateway::with_rows(rows()), SnapshotCache::new(&path));
        assert_eq!(catalog.freshness(), Freshness::Empty);
        assert_eq!(catalog.refresh().unwrap().len(), 3);
    }

    #[test]
    fn view_follows_list_changes() {
        let (_dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        let config = FilterConfig {
            search_text: "solar".into(),
            sort: SortMode::PriceAscending,
            ..Default::default()
        };
        assert!(catalog.view(&config).is_empty());

        catalog.refresh().unwrap();
        let first = catalog.view(&config);
        assert_eq!(ids(&first), vec!["2", "3"]);
        assert!(Arc::ptr_eq(&first, &catalog.view(&config)));

        catalog.delete("2").unwrap();
        assert_eq!(ids(&catalog.view(&config)), vec!["3"]);
    }

    #[test]
    fn create_with_url_prepends() {
        let (dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        catalog.refresh().unwrap();
        let created = catalog
            .create(draft("  Charge Controller "), ImageSource::Url("/img/cc.jpg".into()))
            .unwrap();
        assert_eq!(created.name, "Charge Controller");
        assert_eq!(created.price, 12_500);
        assert_eq!(created.image, "/img/cc.jpg");
        assert_eq!(catalog.products()[0], created);
        assert_eq!(catalog.products().len(), 4);

        let snapshot = SnapshotCache::new(dir.path().join("products.json")).load().unwrap();
        assert_eq!(snapshot[0], created);
    }

    #[test]
    fn create_without_image_uses_placeholder() {
        let (_dir, mut catalog) = setup(FakeGateway::default());
        let created = catalog.create(draft("Cable"), ImageSource::None).unwrap();
        assert_eq!(created.image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn create_uploads_file_first() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("panel.jpg");
        std::fs::write(&image, b"jpegbytes").unwrap();

        let (_cache_dir, mut catalog) = setup(FakeGateway::default());
        let created = catalog.create(draft("Panel"), ImageSource::File(image)).unwrap();
        assert_eq!(created.image, "https://cdn.example.co/product-images/panel.jpg");
        assert_eq!(
            *catalog.gateway.uploads.borrow(),
            vec![("panel.jpg".to_owned(), 9)]
        );
    }

    #[test]
    fn failed_upload_aborts_create() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("panel.jpg");
        std::fs::write(&image, b"jpegbytes").unwrap();

        let gateway = FakeGateway::default();
        gateway.fail_upload.set(true);
        let (_cache_dir, mut catalog) = setup(gateway);
        let err = catalog.create(draft("Panel"), ImageSource::File(image)).unwrap_err();
        assert!(matches!(err, CatalogError::Upload(UploadError::Rejected(_))));
        assert!(catalog.gateway.rows.borrow().is_empty());
        assert!(catalog.products().is_empty());
    }

    #[test]
    fn unreadable_image_aborts_create() {
        let (dir, mut catalog) = setup(FakeGateway::default());
        let missing = dir.path().join("missing.png");
        let err = catalog.create(draft("Panel"), ImageSource::File(missing)).unwrap_err();
        assert!(matches!(err, CatalogError::Upload(UploadError::Read { .. })));
        assert!(catalog.gateway.uploads.borrow().is_empty());
    }

    #[test]
    fn rejected_insert_leaves_list_alone() {
        let gateway = FakeGateway::with_rows(rows());
        gateway.fail_insert.set(true);
        let (_dir, mut catalog) = setup(gateway);
        catalog.refresh().unwrap();
        let err = catalog.create(draft("Panel"), ImageSource::None).unwrap_err();
        assert!(matches!(err, CatalogError::Remote(RemoteError::Rejected { status: 401, .. })));
        assert_eq!(catalog.products().len(), 3);
    }

    #[test]
    fn blank_name_is_rejected_before_any_call() {
        let (_dir, mut catalog) = setup(FakeGateway::default());
        let err = catalog.create(draft("   "), ImageSource::Url("/img/a.jpg".into())).unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert!(catalog.gateway.rows.borrow().is_empty());
    }

    #[test]
    fn delete_splices_and_stores() {
        let (dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        catalog.refresh().unwrap();
        catalog.delete("2").unwrap();
        assert_eq!(ids(catalog.products()), vec!["3", "1"]);
        let snapshot = SnapshotCache::new(dir.path().join("products.json")).load().unwrap();
        assert_eq!(ids(&snapshot), vec!["3", "1"]);
    }

    #[test]
    fn delete_unknown_id_fails() {
        let (_dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        catalog.refresh().unwrap();
        assert!(matches!(catalog.delete("99"), Err(RemoteError::NotFound(_))));
        assert_eq!(catalog.products().len(), 3);
    }

    #[test]
    fn find_by_id() {
        let (_dir, mut catalog) = setup(FakeGateway::with_rows(rows()));
        assert!(catalog.find("1").is_none());
        catalog.refresh().unwrap();
        assert_eq!(catalog.find("1").map(|p| p.name.as_str()), Some("Inverter Z"));
    }
}
