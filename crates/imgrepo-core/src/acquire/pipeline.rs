//! The leader's side of an acquisition: the actual transfer and verification.

use super::flight::Outcome;
use super::{AcquisitionError, AcquisitionRequest, AcquisitionResult, Verification};
use crate::catalog::CatalogEntry;
use crate::fetch::{self, FetchOutcome, TransferOptions};
use crate::manifest::{self, Verdict};
use crate::progress::{ProgressRelay, ProgressSink};
use crate::store::LocalStore;
use crate::url_model::filename_from_url_path;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub(super) fn run(
    entry: &CatalogEntry,
    store: &LocalStore,
    request: &AcquisitionRequest,
    options: &TransferOptions,
    progress_timeout: Duration,
) -> Outcome {
    let destination = store.path_for(&entry.id);
    if store.exists(&entry.id).map_err(AcquisitionError::store_io)? {
        return Err(AcquisitionError::AlreadyMaterialized { path: destination });
    }

    let partial = store.partial_path_for(&entry.id);
    tracing::info!(image = %entry.id, url = %entry.url, "starting transfer");

    let relay = request.progress.clone().map(ProgressRelay::spawn);
    let handle = relay.as_ref().map(ProgressRelay::handle);
    let fetched = fetch::fetch(
        &entry.url,
        &partial,
        handle.as_ref().map(|h| h as &dyn ProgressSink),
        options,
        request.cancel.as_ref(),
    );
    if let Some(relay) = relay {
        relay.finish(progress_timeout);
    }

    let fetched = match fetched {
        Ok(f) => f,
        Err(e) => return Err(discard_after(store, &partial, AcquisitionError::from(e))),
    };

    let verification = match verify(entry, &fetched, request, options) {
        Ok(v) => v,
        Err(e) => return Err(discard_after(store, &partial, e)),
    };

    if request.cancel.as_ref().map_or(false, |c| c.is_cancelled()) {
        return Err(discard_after(store, &partial, AcquisitionError::Cancelled));
    }
    if let Err(e) = store.commit(&partial, &destination) {
        let err = if e.kind() == std::io::ErrorKind::AlreadyExists {
            tracing::warn!(
                image = %entry.id,
                path = %destination.display(),
                "image appeared during transfer; keeping the existing file"
            );
            AcquisitionError::AlreadyMaterialized {
                path: destination,
            }
        } else {
            AcquisitionError::store_io(e)
        };
        return Err(discard_after(store, &partial, err));
    }

    tracing::info!(
        image = %entry.id,
        path = %destination.display(),
        bytes = fetched.bytes,
        digest = %fetched.digest,
        %verification,
        "image materialized"
    );
    Ok(AcquisitionResult {
        identifier: entry.id.clone(),
        path: destination,
        bytes: fetched.bytes,
        digest: fetched.digest,
        verification,
    })
}

fn verify(
    entry: &CatalogEntry,
    fetched: &FetchOutcome,
    request: &AcquisitionRequest,
    options: &TransferOptions,
) -> Result<Verification, AcquisitionError> {
    if request.skip_verification {
        tracing::warn!(image = %entry.id, "checksum verification skipped by request");
        return Ok(Verification::NotApplicable);
    }
    let Some(manifest_url) = entry.checksum_url.as_deref() else {
        tracing::info!(image = %entry.id, "no checksum manifest; accepting unverified");
        return Ok(Verification::Unverified);
    };

    check_manifest(entry, manifest_url, &fetched.digest, options)
}

/// Resolve the expected digest for `entry` in its manifest and compare.
pub(crate) fn check_manifest(
    entry: &CatalogEntry,
    manifest_url: &str,
    digest: &str,
    options: &TransferOptions,
) -> Result<Verification, AcquisitionError> {
    let target = filename_from_url_path(&entry.url).unwrap_or_else(|| entry.id.clone());
    let verdict = manifest::verify(
        manifest_url,
        &target,
        entry.manifest_alias.as_deref(),
        digest,
        options,
    )
    .map_err(|e| AcquisitionError::ManifestFetch(Arc::new(e)))?;

    match verdict {
        Verdict::Verified { .. } => Ok(Verification::Verified),
        Verdict::NotFoundInManifest => Err(AcquisitionError::NotFoundInManifest { filename: target }),
        Verdict::Mismatch { expected, actual } => {
            Err(AcquisitionError::ChecksumMismatch { expected, actual })
        }
    }
}

/// Remove the partial file after `primary` failed. A removal failure is
/// logged but never replaces the primary error.
fn discard_after(store: &LocalStore, partial: &Path, primary: AcquisitionError) -> AcquisitionError {
    if let Err(e) = store.discard(partial) {
        tracing::error!(
            path = %partial.display(),
            error = %e,
            primary = %primary,
            "could not remove partial image"
        );
    } else {
        tracing::debug!(path = %partial.display(), error = %primary, "removed partial image");
    }
    primary
}
