//! Progress reporting for transfers.
//!
//! Callers hand in a `ProgressSink`. The pipeline never calls it on the
//! transfer thread: updates go into a latest-value slot drained by a relay
//! thread, so a slow sink only ever sees coalesced values and cannot stall I/O.
//! The final value is always delivered unless the sink is still stuck when
//! the relay's join timeout expires.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Receives `(bytes transferred so far, declared total)`. `total` is `None`
/// when the remote sent no `Content-Length`; treat that as indeterminate.
/// Not called at all for empty artifacts.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, transferred: u64, total: Option<u64>);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        self(transferred, total)
    }
}

type Update = (u64, Option<u64>);

#[derive(Default)]
struct Slot {
    latest: Option<Update>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

/// Non-blocking producer side handed to the fetcher.
#[derive(Clone)]
pub struct RelayHandle {
    shared: Arc<Shared>,
}

impl ProgressSink for RelayHandle {
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        let mut slot = self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.latest = Some((transferred, total));
        drop(slot);
        self.shared.wake.notify_one();
    }
}

/// Owns the relay thread that forwards updates to the caller's sink.
pub struct ProgressRelay {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    done_rx: mpsc::Receiver<()>,
}

impl ProgressRelay {
    pub fn spawn(sink: Arc<dyn ProgressSink>) -> Self {
        let shared = Arc::new(Shared::default());
        let (done_tx, done_rx) = mpsc::channel();
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || {
            relay_loop(&worker_shared, sink.as_ref());
            let _ = done_tx.send(());
        });
        Self {
            shared,
            worker: Some(worker),
            done_rx,
        }
    }

    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Close the relay and wait up to `timeout` for the sink to drain.
    /// A sink still busy after that is detached and keeps its thread.
    pub fn finish(mut self, timeout: Duration) {
        {
            let mut slot = self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.closed = true;
        }
        self.shared.wake.notify_one();

        match self.done_rx.recv_timeout(timeout) {
            Ok(()) => {
                if let Some(worker) = self.worker.take() {
                    let _ = worker.join();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "progress sink did not drain in time; detaching it"
                );
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!("progress sink panicked");
                if let Some(worker) = self.worker.take() {
                    let _ = worker.join();
                }
            }
        }
    }
}

fn relay_loop(shared: &Shared, sink: &dyn ProgressSink) {
    loop {
        let update = {
            let mut slot = shared.slot.lock().unwrap_or_else(PoisonError::into_inner);
            while slot.latest.is_none() && !slot.closed {
                slot = shared.wake.wait(slot).unwrap_or_else(PoisonError::into_inner);
            }
            match slot.latest.take() {
                Some(u) => u,
                None => return,
            }
        };
        sink.on_progress(update.0, update.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn final_value_is_delivered() {
        let seen: Arc<Mutex<Vec<Update>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let relay = ProgressRelay::spawn(Arc::new(move |done: u64, total: Option<u64>| {
            seen_cb.lock().unwrap().push((done, total));
        }));
        let h = relay.handle();
        for i in 1..=1000u64 {
            h.on_progress(i * 10, Some(10_000));
        }
        relay.finish(Duration::from_secs(5));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&(10_000, Some(10_000))));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn no_updates_means_no_calls() {
        let calls = Arc::new(Mutex::new(0u32));
        let calls_cb = Arc::clone(&calls);
        let relay = ProgressRelay::spawn(Arc::new(move |_: u64, _: Option<u64>| {
            *calls_cb.lock().unwrap() += 1;
        }));
        relay.finish(Duration::from_secs(5));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn slow_sink_does_not_block_producer_or_finish() {
        let relay = ProgressRelay::spawn(Arc::new(|_: u64, _: Option<u64>| {
            std::thread::sleep(Duration::from_secs(2));
        }));
        let h = relay.handle();
        let start = Instant::now();
        for i in 0..10_000u64 {
            h.on_progress(i, None);
        }
        relay.finish(Duration::from_millis(50));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }
}
