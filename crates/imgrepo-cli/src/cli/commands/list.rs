//! `imgrepo list` – show catalog images and whether they are stored locally.

use anyhow::Result;
use imgrepo_core::{CatalogEntry, ImageRepository};

pub async fn run_list(repo: &ImageRepository, family: Option<&str>, json: bool) -> Result<()> {
    let entries: Vec<&CatalogEntry> = match family {
        Some(f) => repo.list_by_family(f),
        None => repo.list().iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No images in catalog.");
        return Ok(());
    }

    println!(
        "{:<22} {:<8} {:<8} {:<8} {:<9} {:<6} {}",
        "ID", "FAMILY", "VERSION", "ARCH", "VERIFIED", "LOCAL", "NAME"
    );
    for e in entries {
        let verified = if e.has_manifest() { "sha256" } else { "-" };
        let local = if repo.is_materialized(&e.id)? { "yes" } else { "-" };
        println!(
            "{:<22} {:<8} {:<8} {:<8} {:<9} {:<6} {}",
            e.id, e.os_family, e.version, e.arch, verified, local, e.name
        );
    }
    Ok(())
}
