//! Acquisition failures.

use crate::fetch::FetchError;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Every way an acquisition can fail. `Clone` because callers waiting on an
/// in-flight acquisition of the same image receive the leader's outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquisitionError {
    #[error("unknown image '{identifier}'")]
    UnknownImage { identifier: String },
    #[error("image already materialized at {}", .path.display())]
    AlreadyMaterialized { path: PathBuf },
    /// Creating the root, writing, renaming or stat-ing in the local store failed.
    #[error("local store: {0}")]
    StoreIo(#[source] Arc<io::Error>),
    #[error("remote returned HTTP {status}")]
    Remote { status: u32 },
    #[error("transfer failed: {0}")]
    TransferFailed(#[source] Arc<FetchError>),
    #[error("acquisition cancelled")]
    Cancelled,
    #[error("checksum manifest fetch failed: {0}")]
    ManifestFetch(#[source] Arc<FetchError>),
    #[error("'{filename}' is not listed in the checksum manifest")]
    NotFoundInManifest { filename: String },
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl AcquisitionError {
    /// The transferred bytes could not be verified against the manifest.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            AcquisitionError::ManifestFetch(_)
                | AcquisitionError::NotFoundInManifest { .. }
                | AcquisitionError::ChecksumMismatch { .. }
        )
    }

    pub(crate) fn store_io(e: io::Error) -> Self {
        AcquisitionError::StoreIo(Arc::new(e))
    }
}

impl From<FetchError> for AcquisitionError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Remote { status } => AcquisitionError::Remote { status },
            FetchError::Cancelled => AcquisitionError::Cancelled,
            FetchError::Storage(io_err) => AcquisitionError::store_io(io_err),
            other => AcquisitionError::TransferFailed(Arc::new(other)),
        }
    }
}
