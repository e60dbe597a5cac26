//! `imgrepo pull <id>` – download and verify one image, with console progress.

use anyhow::{Context, Result};
use imgrepo_core::{AcquisitionError, CancelToken, ImageRepository, ProgressSink};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Prints a single updating progress line to stderr.
struct ConsoleProgress {
    started: Instant,
    last_print: Mutex<Option<Instant>>,
}

impl ConsoleProgress {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            last_print: Mutex::new(None),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        let now = Instant::now();
        let finished = total.map_or(false, |t| transferred >= t);
        {
            let Ok(mut last) = self.last_print.lock() else {
                return;
            };
            if !finished && last.map_or(false, |t| now.duration_since(t) < PROGRESS_INTERVAL) {
                return;
            }
            *last = Some(now);
        }

        let done_mib = transferred as f64 / 1_048_576.0;
        let elapsed = now.duration_since(self.started).as_secs_f64();
        let rate = if elapsed > 0.0 {
            transferred as f64 / elapsed
        } else {
            0.0
        };
        let rate_mib = rate / 1_048_576.0;
        let line = match total {
            Some(total) if total > 0 => {
                let pct = transferred as f64 / total as f64 * 100.0;
                let eta = if rate > 0.0 {
                    format!("{:.0}s", total.saturating_sub(transferred) as f64 / rate)
                } else {
                    "?".to_string()
                };
                format!(
                    "\r  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
                    done_mib,
                    total as f64 / 1_048_576.0,
                    pct,
                    rate_mib,
                    eta
                )
            }
            _ => format!("\r  {:.1} MiB  {:.2} MiB/s  ", done_mib, rate_mib),
        };
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(line.as_bytes());
        let _ = err.flush();
    }
}

pub async fn run_pull(repo: Arc<ImageRepository>, id: &str, no_verify: bool) -> Result<()> {
    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupted; cancelling transfer");
                cancel.cancel();
            }
        })
    };

    let progress: Arc<dyn ProgressSink> = Arc::new(ConsoleProgress::new());
    let owned = id.to_string();
    let outcome = tokio::task::spawn_blocking(move || {
        repo.acquire(&owned, Some(progress), Some(cancel), no_verify)
    })
    .await;
    ctrl_c.abort();
    eprintln!();

    match outcome? {
        Ok(result) => {
            println!(
                "{} -> {} ({} bytes, sha256 {}, {})",
                result.identifier,
                result.path.display(),
                result.bytes,
                result.digest,
                result.verification
            );
            Ok(())
        }
        Err(AcquisitionError::AlreadyMaterialized { path }) => {
            println!("{} already present at {}", id, path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("pull {}", id)),
    }
}
