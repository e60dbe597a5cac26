//! `imgrepo path <id>` – print where a stored image lives.

use anyhow::{bail, Result};
use imgrepo_core::ImageRepository;

pub async fn run_path(repo: &ImageRepository, id: &str) -> Result<()> {
    match repo.local_path(id)? {
        Some(path) => println!("{}", path.display()),
        None => bail!("image '{}' is not in the store (run `imgrepo pull {}`)", id, id),
    }
    Ok(())
}
