//! Local image store: path derivation and file lifecycle.
//!
//! One file per identifier at `{root}/{id}.qcow2`. Existence of that file is
//! the only record that an image is materialized. Transfers write to a
//! `.part` sibling that is linked into place once the image is accepted; an
//! image that appeared at the final path in the meantime is never replaced.

mod writer;

pub use writer::ArtifactWriter;

use std::io;
use std::path::{Path, PathBuf};

/// Extension of every stored image.
pub const IMAGE_EXTENSION: &str = "qcow2";

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.qcow2` → `a.qcow2.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of `id`. No I/O.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, IMAGE_EXTENSION))
    }

    /// Where an in-progress transfer of `id` is written.
    pub fn partial_path_for(&self, id: &str) -> PathBuf {
        temp_path(&self.path_for(id))
    }

    /// Whether `id` is materialized. Stat errors other than not-found are returned.
    pub fn exists(&self, id: &str) -> io::Result<bool> {
        self.path_for(id).try_exists()
    }

    /// Create the root (mode 0755 on Unix) if missing. An existing directory is success.
    pub fn ensure_root(&self) -> io::Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.root)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.root, std::fs::Permissions::from_mode(0o755))?;
        }
        tracing::debug!(root = %self.root.display(), "created image store root");
        Ok(())
    }

    /// Move a finished temp file to its final name without replacing anything.
    ///
    /// Fails with `ErrorKind::AlreadyExists` when the final path is taken; the
    /// temp file is then left for the caller to discard.
    pub fn commit(&self, partial: &Path, final_path: &Path) -> io::Result<()> {
        match std::fs::hard_link(partial, final_path) {
            Ok(()) => {}
            // Filesystems without hard links: best-effort check, then rename.
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                if final_path.try_exists()? {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} already exists", final_path.display()),
                    ));
                }
                return std::fs::rename(partial, final_path);
            }
            Err(e) => return Err(e),
        }
        if let Err(e) = self.discard(partial) {
            tracing::warn!(path = %partial.display(), error = %e, "could not remove temp file after commit");
        }
        Ok(())
    }

    /// Remove a file; a file that is already gone counts as removed.
    pub fn discard(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("disk.qcow2"));
        assert_eq!(p.to_string_lossy(), "disk.qcow2.part");
        let p2 = temp_path(Path::new("/srv/images/alpine.qcow2"));
        assert_eq!(p2.to_string_lossy(), "/srv/images/alpine.qcow2.part");
    }

    #[test]
    fn path_for_is_deterministic() {
        let store = LocalStore::new("/srv/images");
        assert_eq!(
            store.path_for("alpine-3.22"),
            PathBuf::from("/srv/images/alpine-3.22.qcow2")
        );
        assert_eq!(store.path_for("alpine-3.22"), store.path_for("alpine-3.22"));
        assert_eq!(
            store.partial_path_for("alpine-3.22"),
            PathBuf::from("/srv/images/alpine-3.22.qcow2.part")
        );
    }

    #[test]
    fn exists_reflects_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert!(!store.exists("debian-12").unwrap());
        std::fs::write(store.path_for("debian-12"), b"img").unwrap();
        assert!(store.exists("debian-12").unwrap());
    }

    #[test]
    fn exists_surfaces_stat_errors() {
        let dir = tempfile::tempdir().unwrap();
        // Root is a regular file, so stat of a child fails with ENOTDIR, not NotFound.
        let file_root = dir.path().join("not-a-dir");
        std::fs::write(&file_root, b"x").unwrap();
        let store = LocalStore::new(&file_root);
        assert!(store.exists("debian-12").is_err());
    }

    #[test]
    fn ensure_root_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a").join("images");
        let store = LocalStore::new(&root);
        store.ensure_root().unwrap();
        assert!(root.is_dir());
        store.ensure_root().unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&root).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn ensure_root_fails_when_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let store = LocalStore::new(blocker.join("images"));
        assert!(store.ensure_root().is_err());
    }

    #[test]
    fn commit_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let part = store.partial_path_for("x");
        let fin = store.path_for("x");
        std::fs::write(&part, b"data").unwrap();
        store.commit(&part, &fin).unwrap();
        assert!(!part.exists());
        assert_eq!(std::fs::read(&fin).unwrap(), b"data");
        store.discard(&fin).unwrap();
        assert!(!fin.exists());
        // Already gone: still Ok.
        store.discard(&fin).unwrap();
    }

    #[test]
    fn commit_never_replaces_existing_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let part = store.partial_path_for("x");
        let fin = store.path_for("x");
        std::fs::write(&part, b"downloaded").unwrap();
        std::fs::write(&fin, b"placed by user").unwrap();

        let err = store.commit(&part, &fin).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&fin).unwrap(), b"placed by user");
        assert!(part.exists());
    }
}
