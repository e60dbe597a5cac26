//! Single-flight registry: at most one pipeline per resolved destination path.
//!
//! The first caller for a path becomes the leader and runs the pipeline;
//! callers arriving while it runs attach as followers and receive a clone of
//! the leader's outcome. The entry is removed as soon as the leader settles,
//! so later callers start fresh (and find the file already materialized).

use super::{AcquisitionError, AcquisitionResult};
use crate::control::CancelToken;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

pub(crate) type Outcome = Result<AcquisitionResult, AcquisitionError>;

/// How often a waiting follower re-checks its own cancel token.
const FOLLOWER_POLL: Duration = Duration::from_millis(100);

#[derive(Default)]
enum FlightState {
    #[default]
    Running,
    Done(Outcome),
    /// Leader went away without an outcome (panic); followers retry.
    Abandoned,
}

#[derive(Default)]
pub(crate) struct Flight {
    state: Mutex<FlightState>,
    settled: Condvar,
}

impl Flight {
    /// Block until the leader settles. `None` means the leader abandoned the
    /// flight and the caller should join again.
    pub(crate) fn wait(&self, cancel: Option<&CancelToken>) -> Option<Outcome> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                FlightState::Done(outcome) => return Some(outcome.clone()),
                FlightState::Abandoned => return None,
                FlightState::Running => {}
            }
            if cancel.map_or(false, CancelToken::is_cancelled) {
                return Some(Err(AcquisitionError::Cancelled));
            }
            state = self
                .settled
                .wait_timeout(state, FOLLOWER_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

pub(crate) enum Role<'a> {
    Leader(FlightGuard<'a>),
    Follower(Arc<Flight>),
}

#[derive(Default)]
pub(crate) struct InFlight {
    flights: Mutex<HashMap<PathBuf, Arc<Flight>>>,
}

impl InFlight {
    pub(crate) fn join(&self, key: &Path) -> Role<'_> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flight) = flights.get(key) {
            return Role::Follower(Arc::clone(flight));
        }
        let flight = Arc::new(Flight::default());
        flights.insert(key.to_path_buf(), Arc::clone(&flight));
        Role::Leader(FlightGuard {
            registry: self,
            key: key.to_path_buf(),
            flight,
            settled: false,
        })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held by the leader; settling (or dropping) it releases the path.
pub(crate) struct FlightGuard<'a> {
    registry: &'a InFlight,
    key: PathBuf,
    flight: Arc<Flight>,
    settled: bool,
}

impl FlightGuard<'_> {
    /// Publish the outcome to followers and hand it back to the leader.
    pub(crate) fn settle(mut self, outcome: Outcome) -> Outcome {
        self.publish(FlightState::Done(outcome.clone()));
        outcome
    }

    fn publish(&mut self, state: FlightState) {
        self.settled = true;
        *self.flight.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        self.registry
            .flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        self.flight.settled.notify_all();
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.publish(FlightState::Abandoned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn ok_result(bytes: u64) -> Outcome {
        Ok(AcquisitionResult {
            identifier: "img".into(),
            path: PathBuf::from("/srv/img.qcow2"),
            bytes,
            digest: "ab".into(),
            verification: super::super::Verification::Unverified,
        })
    }

    #[test]
    fn first_caller_leads_second_follows() {
        let registry = InFlight::default();
        let key = Path::new("/srv/img.qcow2");
        let leader = match registry.join(key) {
            Role::Leader(g) => g,
            Role::Follower(_) => panic!("expected leader"),
        };
        assert!(matches!(registry.join(key), Role::Follower(_)));
        assert!(matches!(
            registry.join(Path::new("/srv/other.qcow2")),
            Role::Leader(_)
        ));
        leader.settle(ok_result(1)).unwrap();
        assert_eq!(registry.len(), 0);
        assert!(matches!(registry.join(key), Role::Leader(_)));
    }

    #[test]
    fn follower_receives_leader_outcome() {
        let registry = InFlight::default();
        let key = Path::new("/srv/img.qcow2");
        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            let leader = match registry.join(key) {
                Role::Leader(g) => g,
                Role::Follower(_) => panic!("expected leader"),
            };
            let follower = s.spawn(|| {
                let flight = match registry.join(key) {
                    Role::Follower(f) => f,
                    Role::Leader(_) => panic!("expected follower"),
                };
                barrier.wait();
                flight.wait(None)
            });
            barrier.wait();
            std::thread::sleep(Duration::from_millis(50));
            leader.settle(ok_result(42)).unwrap();
            let got = follower.join().unwrap().expect("settled");
            assert_eq!(got.unwrap().bytes, 42);
        });
    }

    #[test]
    fn dropped_leader_abandons() {
        let registry = InFlight::default();
        let key = Path::new("/srv/img.qcow2");
        let leader = registry.join(key);
        let flight = match registry.join(key) {
            Role::Follower(f) => f,
            Role::Leader(_) => panic!("expected follower"),
        };
        drop(leader);
        assert!(flight.wait(None).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn follower_honours_own_cancel() {
        let registry = InFlight::default();
        let key = Path::new("/srv/img.qcow2");
        let _leader = registry.join(key);
        let flight = match registry.join(key) {
            Role::Follower(f) => f,
            Role::Leader(_) => panic!("expected follower"),
        };
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            flight.wait(Some(&token)),
            Some(Err(AcquisitionError::Cancelled))
        ));
    }
}
