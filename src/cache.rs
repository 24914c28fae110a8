use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::CacheError;
use crate::model::product::Product;

/// Well known key the snapshot is stored under
pub const SNAPSHOT_KEY: &str = "products";
const SNAPSHOT_DIR: &str = "~/.config/shopfront";

/// Best effort copy of the last fetched product list.
/// Nothing here ever fails the caller, a bad or missing file just means no snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SnapshotCache { path: path.into() }
    }

    pub fn default_location() -> Result<Self, CacheError> {
        let dir = shellexpand::full(SNAPSHOT_DIR)
            .map_err(|e| CacheError::Location(format!("{} is invalid: {}", SNAPSHOT_DIR, e)))?;
        Ok(Self::new(Path::new(dir.as_ref()).join(format!("{}.json", SNAPSHOT_KEY))))
    }

    pub fn load(&self) -> Option<Vec<Product>> {
        match self.try_load() {
            Ok(products) => products,
            Err(e) => {
                warn!("Ignoring snapshot {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn store(&self, products: &[Product]) {
        if let Err(e) = self.try_store(products) {
            warn!("Could not write snapshot {:?}: {}", self.path, e);
        }
    }

    pub fn try_load(&self) -> Result<Option<Vec<Product>>, CacheError> {
        let contents = match read_if_found(&self.path)? {
            Some(c) => c,
            None => return Ok(None),
        };
        let products: Vec<Product> = serde_json::from_str(&contents)?;
        debug!("Loaded {} products from snapshot", products.len());
        Ok(Some(products))
    }

    pub fn try_store(&self, products: &[Product]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(products)?;
        std::fs::write(&self.path, contents)?;
        debug!("Stored {} products to snapshot", products.len());
        Ok(())
    }
}

fn read_if_found(path: &Path) -> std::io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(c) => Ok(Some(c)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
