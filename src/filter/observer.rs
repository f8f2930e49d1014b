//! Decision observers.
//!
//! The engine reports every decision to a [`DecisionObserver`]. Reporting is
//! best-effort: it runs after the ban table has been updated and outside any
//! lock, and a panicking observer is contained by the engine.

use super::engine::Verdict;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// One decision, as seen by observers.
#[derive(Debug, Clone, Copy)]
pub struct DecisionEvent<'a> {
    pub client_id: &'a str,
    pub uri: &'a str,
    pub verdict: &'a Verdict,
}

/// Trait for observing filter decisions.
///
/// Implementations must be cheap and should not block: `report` runs inline
/// on the request path.
pub trait DecisionObserver: Send + Sync {
    fn report(&self, event: &DecisionEvent<'_>);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DecisionObserver for NoopObserver {
    fn report(&self, _event: &DecisionEvent<'_>) {}
}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn report(&self, event: &DecisionEvent<'_>) {
        match event.verdict {
            Verdict::Pass => {
                trace!(client = %event.client_id, uri = %event.uri, "Request passed");
            }
            Verdict::BlockAlreadyBanned {
                remaining,
                rebanned_by: Some(pattern),
            } => {
                warn!(
                    client = %event.client_id,
                    uri = %event.uri,
                    pattern = %pattern,
                    ban_secs = remaining.as_secs(),
                    "Forbidden URI requested again - ban restarted"
                );
            }
            Verdict::BlockAlreadyBanned {
                remaining,
                rebanned_by: None,
            } => {
                info!(
                    client = %event.client_id,
                    uri = %event.uri,
                    remaining_secs = remaining.as_secs(),
                    "Request rejected - client banned"
                );
            }
            Verdict::BlockNewMatch { pattern, banned_for } => {
                warn!(
                    client = %event.client_id,
                    uri = %event.uri,
                    pattern = %pattern,
                    ban_secs = banned_for.as_secs(),
                    "Forbidden URI requested - client banned"
                );
            }
        }
    }
}

/// Fan-out to several observers, in order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl DecisionObserver for ObserverSet {
    fn report(&self, event: &DecisionEvent<'_>) {
        for observer in &self.observers {
            observer.report(event);
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl DecisionObserver for Recorder {
        fn report(&self, event: &DecisionEvent<'_>) {
            self.0.lock().push(format!("{}:{}", event.client_id, event.verdict.kind()));
        }
    }

    #[test]
    fn test_observer_set_fans_out_in_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let set = ObserverSet::new()
            .with(first.clone())
            .with(Arc::new(NoopObserver))
            .with(second.clone());
        assert_eq!(set.len(), 3);

        let verdict = Verdict::BlockAlreadyBanned {
            remaining: Duration::from_secs(5),
            rebanned_by: None,
        };
        set.report(&DecisionEvent {
            client_id: "A",
            uri: "/",
            verdict: &verdict,
        });

        assert_eq!(*first.0.lock(), vec!["A:banned".to_string()]);
        assert_eq!(*second.0.lock(), vec!["A:banned".to_string()]);
    }

    #[test]
    fn test_tracing_observer_handles_every_verdict() {
        let verdicts = [
            Verdict::Pass,
            Verdict::BlockAlreadyBanned {
                remaining: Duration::from_secs(1),
                rebanned_by: None,
            },
            Verdict::BlockAlreadyBanned {
                remaining: Duration::from_secs(60),
                rebanned_by: Some(Arc::from("^/x")),
            },
            Verdict::BlockNewMatch {
                pattern: Arc::from("^/x"),
                banned_for: Duration::from_secs(60),
            },
        ];
        for verdict in &verdicts {
            TracingObserver.report(&DecisionEvent {
                client_id: "",
                uri: "",
                verdict,
            });
        }
    }
}
