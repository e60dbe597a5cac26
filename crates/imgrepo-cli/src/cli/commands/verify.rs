//! `imgrepo verify <id>` – re-check a stored image against its manifest.

use anyhow::{Context, Result};
use imgrepo_core::ImageRepository;
use std::sync::Arc;

pub async fn run_verify(repo: Arc<ImageRepository>, id: &str) -> Result<()> {
    let owned = id.to_string();
    // Hashing a multi-GiB image and fetching the manifest both block.
    let verification = tokio::task::spawn_blocking(move || repo.verify_stored(&owned))
        .await?
        .with_context(|| format!("verify {}", id))?;
    println!("{}: {}", id, verification);
    Ok(())
}
