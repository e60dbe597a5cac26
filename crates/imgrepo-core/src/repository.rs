//! Collaborator-facing facade: one catalog, one store root, one acquirer.

use crate::acquire::{
    check_manifest, AcquisitionError, AcquisitionRequest, AcquisitionResult, Acquirer,
    Verification,
};
use crate::catalog::{Catalog, CatalogEntry};
use crate::checksum;
use crate::config::ImgConfig;
use crate::control::CancelToken;
use crate::fetch::TransferOptions;
use crate::progress::ProgressSink;
use crate::store::LocalStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ImageRepository {
    acquirer: Acquirer,
    store: LocalStore,
}

impl ImageRepository {
    pub fn new(catalog: Arc<Catalog>, store: LocalStore, options: TransferOptions) -> Self {
        Self {
            acquirer: Acquirer::new(catalog, options),
            store,
        }
    }

    /// Build from config: catalog file (or built-in), storage root and timeouts.
    pub fn from_config(cfg: &ImgConfig) -> anyhow::Result<Self> {
        let catalog = match &cfg.catalog_path {
            Some(path) => Catalog::load(path)
                .map_err(|e| anyhow::anyhow!("catalog {}: {}", path.display(), e))?,
            None => Catalog::builtin(),
        };
        let store = LocalStore::new(cfg.storage_root()?);
        let acquirer = Acquirer::new(Arc::new(catalog), TransferOptions::from(&cfg.transfer))
            .with_progress_timeout(cfg.progress_timeout());
        Ok(Self { acquirer, store })
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn list(&self) -> &[CatalogEntry] {
        self.acquirer.catalog().list()
    }

    pub fn list_by_family(&self, family: &str) -> Vec<&CatalogEntry> {
        self.acquirer.catalog().list_by_family(family)
    }

    pub fn lookup(&self, id: &str) -> Option<&CatalogEntry> {
        self.acquirer.catalog().lookup(id)
    }

    fn entry(&self, id: &str) -> Result<&CatalogEntry, AcquisitionError> {
        self.lookup(id)
            .ok_or_else(|| AcquisitionError::UnknownImage {
                identifier: id.to_string(),
            })
    }

    pub fn is_materialized(&self, id: &str) -> Result<bool, AcquisitionError> {
        let entry = self.entry(id)?;
        self.store
            .exists(&entry.id)
            .map_err(AcquisitionError::store_io)
    }

    /// Path of a materialized image; `None` when it is not on disk.
    pub fn local_path(&self, id: &str) -> Result<Option<PathBuf>, AcquisitionError> {
        if self.is_materialized(id)? {
            Ok(Some(self.store.path_for(id)))
        } else {
            Ok(None)
        }
    }

    /// Download and verify `id` into this repository's store.
    pub fn acquire(
        &self,
        id: &str,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancelToken>,
        skip_verification: bool,
    ) -> Result<AcquisitionResult, AcquisitionError> {
        let mut request =
            AcquisitionRequest::new(id, self.store.root()).skip_verification(skip_verification);
        request.progress = progress;
        request.cancel = cancel;
        self.acquirer.acquire(&request)
    }

    /// Re-hash a stored image and check it against its manifest. Never deletes.
    pub fn verify_stored(&self, id: &str) -> Result<Verification, AcquisitionError> {
        let entry = self.entry(id)?;
        let path = self.store.path_for(&entry.id);
        if !self.is_materialized(id)? {
            return Err(AcquisitionError::store_io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not materialized", path.display()),
            )));
        }
        let Some(manifest_url) = entry.checksum_url.as_deref() else {
            return Ok(Verification::Unverified);
        };
        let digest = checksum::sha256_path(&path).map_err(|e| {
            AcquisitionError::store_io(std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)))
        })?;
        check_manifest(entry, manifest_url, &digest, self.acquirer.options())
    }
}
