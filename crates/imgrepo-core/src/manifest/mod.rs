//! Checksum manifest verification.
//!
//! Fetches the manifest as text, resolves the expected digest for the target
//! filename and compares it with the digest computed during transfer. The
//! comparison is case-sensitive: digests are compared exactly as published.

mod parse;

pub use parse::{find_entry, parse_manifest, ManifestEntry, MatchKind};

use crate::fetch::{self, FetchError, TransferOptions};

/// Result of checking a computed digest against a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Verified { matched: MatchKind },
    NotFoundInManifest,
    Mismatch { expected: String, actual: String },
}

/// Check `computed` against an already-fetched manifest document.
pub fn check(text: &str, target: &str, alias: Option<&str>, computed: &str) -> Verdict {
    let entries = parse_manifest(text);
    let Some((entry, matched)) = find_entry(&entries, target, alias) else {
        return Verdict::NotFoundInManifest;
    };
    if matched == MatchKind::Alias {
        tracing::warn!(
            target_file = target,
            manifest_file = %entry.filename,
            "no manifest line names the target; using alias match"
        );
    }
    if entry.digest == computed {
        Verdict::Verified { matched }
    } else {
        Verdict::Mismatch {
            expected: entry.digest.clone(),
            actual: computed.to_string(),
        }
    }
}

/// Fetch the manifest at `manifest_url` and check `computed` against it.
pub fn verify(
    manifest_url: &str,
    target: &str,
    alias: Option<&str>,
    computed: &str,
    options: &TransferOptions,
) -> Result<Verdict, FetchError> {
    let text = fetch::get_text(manifest_url, options)?;
    let verdict = check(&text, target, alias, computed);
    tracing::debug!(manifest_url, target_file = target, ?verdict, "manifest checked");
    Ok(verdict)
}
