//! Acquisition orchestrator.
//!
//! Sequences catalog lookup, existence check, store root creation, streaming
//! transfer, manifest verification and the final rename into the store:
//!
//! `lookup → ensure root → join flight → exists? → transfer → verify|skip → commit`
//!
//! A failed acquisition leaves the store either without the image or with a
//! complete, verified (or knowingly unverified) image; the partial file is
//! removed on every failure path after it was created.

mod error;
mod flight;
mod pipeline;

pub use error::AcquisitionError;
pub(crate) use pipeline::check_manifest;

use crate::catalog::Catalog;
use crate::control::CancelToken;
use crate::fetch::TransferOptions;
use crate::progress::ProgressSink;
use crate::store::LocalStore;
use flight::{InFlight, Role};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const DEFAULT_PROGRESS_TIMEOUT: Duration = Duration::from_secs(2);

/// One registry per process, so separate acquirers over the same store still
/// share a single transfer per image.
fn flights() -> &'static InFlight {
    static FLIGHTS: OnceLock<InFlight> = OnceLock::new();
    FLIGHTS.get_or_init(InFlight::default)
}

/// How the stored bytes were accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Digest matched the entry's checksum manifest.
    Verified,
    /// The catalog entry has no manifest; accepted as transferred.
    Unverified,
    /// The caller asked to skip verification.
    NotApplicable,
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Verification::Verified => "verified",
            Verification::Unverified => "unverified (no manifest)",
            Verification::NotApplicable => "not verified (skipped)",
        })
    }
}

/// One request to materialize an image under `root`.
#[derive(Clone)]
pub struct AcquisitionRequest {
    pub identifier: String,
    pub root: PathBuf,
    pub progress: Option<Arc<dyn ProgressSink>>,
    pub cancel: Option<CancelToken>,
    pub skip_verification: bool,
}

impl AcquisitionRequest {
    pub fn new(identifier: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            identifier: identifier.into(),
            root: root.into(),
            progress: None,
            cancel: None,
            skip_verification: false,
        }
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn skip_verification(mut self, skip: bool) -> Self {
        self.skip_verification = skip;
        self
    }
}

impl std::fmt::Debug for AcquisitionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionRequest")
            .field("identifier", &self.identifier)
            .field("root", &self.root)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .field("skip_verification", &self.skip_verification)
            .finish()
    }
}

/// A materialized image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionResult {
    pub identifier: String,
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the stored bytes.
    pub digest: String,
    pub verification: Verification,
}

/// Runs acquisitions against a shared catalog. Safe to share between threads;
/// concurrent requests for the same destination are coalesced process-wide.
pub struct Acquirer {
    catalog: Arc<Catalog>,
    options: TransferOptions,
    progress_timeout: Duration,
}

impl Acquirer {
    pub fn new(catalog: Arc<Catalog>, options: TransferOptions) -> Self {
        Self {
            catalog,
            options,
            progress_timeout: DEFAULT_PROGRESS_TIMEOUT,
        }
    }

    /// Upper bound on waiting for a progress sink to drain after a transfer.
    pub fn with_progress_timeout(mut self, timeout: Duration) -> Self {
        self.progress_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Materialize `request.identifier` under `request.root`.
    ///
    /// Blocks the calling thread for the whole transfer. If another call for
    /// the same destination is already running, waits for it and returns a
    /// copy of its outcome instead of starting a second transfer.
    pub fn acquire(
        &self,
        request: &AcquisitionRequest,
    ) -> Result<AcquisitionResult, AcquisitionError> {
        let entry = self.catalog.lookup(&request.identifier).ok_or_else(|| {
            AcquisitionError::UnknownImage {
                identifier: request.identifier.clone(),
            }
        })?;
        let store = LocalStore::new(&request.root);
        store.ensure_root().map_err(AcquisitionError::store_io)?;
        // Keyed on the resolved root so `images` and `./images` coordinate.
        let key = std::fs::canonicalize(store.root())
            .map(|root| LocalStore::new(root).path_for(&entry.id))
            .map_err(AcquisitionError::store_io)?;

        loop {
            match flights().join(&key) {
                Role::Leader(guard) => {
                    let outcome = pipeline::run(
                        entry,
                        &store,
                        request,
                        &self.options,
                        self.progress_timeout,
                    );
                    return guard.settle(outcome);
                }
                Role::Follower(flight) => {
                    tracing::debug!(
                        image = %entry.id,
                        "acquisition already in flight; waiting for it"
                    );
                    if let Some(outcome) = flight.wait(request.cancel.as_ref()) {
                        return outcome;
                    }
                }
            }
        }
    }
}
