pub mod config;
pub mod logging;

pub mod acquire;
pub mod catalog;
pub mod checksum;
pub mod control;
pub mod fetch;
pub mod manifest;
pub mod progress;
pub mod repository;
pub mod store;
pub mod url_model;

pub use acquire::{
    AcquisitionError, AcquisitionRequest, AcquisitionResult, Acquirer, Verification,
};
pub use catalog::{ArtifactKind, Catalog, CatalogEntry};
pub use control::CancelToken;
pub use progress::ProgressSink;
pub use repository::ImageRepository;
pub use store::LocalStore;
