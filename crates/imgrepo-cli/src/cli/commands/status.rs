//! `imgrepo status <id>` – catalog metadata plus local state.

use anyhow::{Context, Result};
use imgrepo_core::ImageRepository;

pub async fn run_status(repo: &ImageRepository, id: &str) -> Result<()> {
    let entry = repo
        .lookup(id)
        .with_context(|| format!("unknown image '{}'", id))?;

    println!("{:<10} {}", "ID", entry.id);
    println!("{:<10} {}", "NAME", entry.name);
    println!("{:<10} {} {} ({})", "OS", entry.os_family, entry.version, entry.arch);
    println!("{:<10} {}", "KIND", entry.kind);
    println!("{:<10} {}", "URL", entry.url);
    println!(
        "{:<10} {}",
        "MANIFEST",
        entry.checksum_url.as_deref().unwrap_or("-")
    );
    if let Some(size) = entry.size_bytes {
        println!("{:<10} {:.1} MiB", "SIZE", size as f64 / 1_048_576.0);
    }
    match repo.local_path(id)? {
        Some(path) => {
            let bytes = std::fs::metadata(&path)
                .with_context(|| format!("stat {}", path.display()))?
                .len();
            println!("{:<10} {} ({} bytes)", "LOCAL", path.display(), bytes);
        }
        None => println!("{:<10} not materialized", "LOCAL"),
    }
    Ok(())
}
