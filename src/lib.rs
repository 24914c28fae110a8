pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod session;

pub use cache::SnapshotCache;
pub use catalog::{Catalog, Freshness, ImageSource, ProductDraft};
pub use error::{CacheError, CatalogError, RemoteError, UploadError};
pub use gateway::{Gateway, RestGateway};
pub use model::product::{Product, PLACEHOLDER_IMAGE};
pub use model::raw::{NewRecord, RawRecord};
pub use pipeline::{apply, FilterConfig, FilteredView, SortMode};
pub use reconcile::{reconcile, reconcile_all};
