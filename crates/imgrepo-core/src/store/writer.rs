//! Sequential append writer for an in-progress image file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Append-only writer for a temp image file. The fetcher creates it only after
/// the response status is known to be a success.
pub struct ArtifactWriter {
    file: File,
    written: u64,
}

impl ArtifactWriter {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file, written: 0 })
    }

    /// Append one chunk.
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flush and fsync, then close. Returns bytes written.
    pub fn finish(mut self) -> io::Result<u64> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(self.written)
    }
}
