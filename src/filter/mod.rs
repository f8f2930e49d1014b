//! Request filter: the decision engine and its observers.

pub mod engine;
pub mod observer;

pub use engine::{DecisionEngine, FilterRules, Verdict, ban_duration_from_minutes};
pub use observer::{DecisionEvent, DecisionObserver, NoopObserver, ObserverSet, TracingObserver};
