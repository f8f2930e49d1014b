//! Per-request decision engine.
//!
//! For each request, in order:
//!
//! 1. Client banned and unexpired → [`Verdict::BlockAlreadyBanned`]
//!    (an expired ban is evicted here). A forbidden URI from a banned client
//!    restarts its ban window.
//! 2. URI matches a forbidden pattern → ban the client, then
//!    [`Verdict::BlockNewMatch`].
//! 3. Otherwise → [`Verdict::Pass`].
//!
//! The engine owns its rules as a copy-on-write snapshot so a reload swaps
//! patterns and ban duration together without touching the ban table.

use super::observer::{DecisionEvent, DecisionObserver};
use crate::error::{ConfigurationError, MAX_BAN_MINUTES};
use crate::security::{BanTable, PatternSet};
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Outcome of one filter decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Hand the request to the next handler.
    Pass,
    /// The client was already banned. `rebanned_by` is set when the URI also
    /// matched a forbidden pattern and the ban was rewritten from now.
    BlockAlreadyBanned {
        remaining: Duration,
        rebanned_by: Option<Arc<str>>,
    },
    /// The URI matched `pattern`; the client is now banned for `banned_for`.
    BlockNewMatch {
        pattern: Arc<str>,
        banned_for: Duration,
    },
}

impl Verdict {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        !matches!(self, Self::Pass)
    }

    /// The pattern that (re)wrote a ban during this decision, if any.
    pub fn ban_trigger(&self) -> Option<&Arc<str>> {
        match self {
            Self::BlockNewMatch { pattern, .. } => Some(pattern),
            Self::BlockAlreadyBanned { rebanned_by, .. } => rebanned_by.as_ref(),
            Self::Pass => None,
        }
    }

    /// Static label for logs and metrics.
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::BlockAlreadyBanned { .. } => "banned",
            Self::BlockNewMatch { .. } => "matched",
        }
    }
}

/// Validated, immutable rules: what to match and how long to ban for.
#[derive(Debug, Clone)]
pub struct FilterRules {
    patterns: PatternSet,
    ban_duration: Duration,
}

impl FilterRules {
    /// Build rules from raw pattern strings and a ban length in minutes.
    pub fn from_settings<I, S>(patterns: I, ban_minutes: i64) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ban_duration = ban_duration_from_minutes(ban_minutes)?;
        let patterns = PatternSet::compile(patterns)?;
        Ok(Self {
            patterns,
            ban_duration,
        })
    }

    /// Build rules from an already compiled pattern set.
    pub fn new(patterns: PatternSet, ban_duration: Duration) -> Result<Self, ConfigurationError> {
        if ban_duration.is_zero() {
            return Err(ConfigurationError::NonPositiveBanDuration { minutes: 0 });
        }
        let max = Duration::from_secs(MAX_BAN_MINUTES as u64 * 60);
        if ban_duration > max {
            return Err(ConfigurationError::BanDurationTooLong {
                minutes: (ban_duration.as_secs() / 60) as i64,
                max: MAX_BAN_MINUTES,
            });
        }
        Ok(Self {
            patterns,
            ban_duration,
        })
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn ban_duration(&self) -> Duration {
        self.ban_duration
    }
}

/// Convert a configured ban length to a duration, rejecting non-positive
/// and oversized values.
pub fn ban_duration_from_minutes(minutes: i64) -> Result<Duration, ConfigurationError> {
    if minutes <= 0 {
        return Err(ConfigurationError::NonPositiveBanDuration { minutes });
    }
    if minutes > MAX_BAN_MINUTES {
        return Err(ConfigurationError::BanDurationTooLong {
            minutes,
            max: MAX_BAN_MINUTES,
        });
    }
    Ok(Duration::from_secs(minutes as u64 * 60))
}

/// The request filter: ban table, current rules, and an observer.
pub struct DecisionEngine {
    rules: RwLock<Arc<FilterRules>>,
    bans: Arc<BanTable>,
    observer: Arc<dyn DecisionObserver>,
}

impl DecisionEngine {
    /// Create an engine over an injected ban table.
    ///
    /// Engines sharing one table share bans; a fresh table gives an
    /// independent filter instance.
    pub fn new(
        rules: FilterRules,
        bans: Arc<BanTable>,
        observer: Arc<dyn DecisionObserver>,
    ) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
            bans,
            observer,
        }
    }

    /// Decide whether the request from `client_id` for `uri` may proceed.
    ///
    /// Never fails and never blocks on anything but the ban table's shard
    /// locks, which are released before the observer runs.
    pub fn decide(&self, client_id: &str, uri: &str, now: Instant) -> Verdict {
        let verdict = self.evaluate(client_id, uri, now);
        self.report(&DecisionEvent {
            client_id,
            uri,
            verdict: &verdict,
        });
        verdict
    }

    fn evaluate(&self, client_id: &str, uri: &str, now: Instant) -> Verdict {
        let rules = self.rules();

        if let Some(remaining) = self.bans.active_ban(client_id, now) {
            // Re-offense resets the window from now; it never stacks.
            if let Some(pattern) = rules.patterns.first_match(uri) {
                self.bans.ban(client_id, now, rules.ban_duration);
                return Verdict::BlockAlreadyBanned {
                    remaining: rules.ban_duration,
                    rebanned_by: Some(Arc::clone(pattern)),
                };
            }
            return Verdict::BlockAlreadyBanned {
                remaining,
                rebanned_by: None,
            };
        }

        match rules.patterns.first_match(uri) {
            Some(pattern) => {
                self.bans.ban(client_id, now, rules.ban_duration);
                Verdict::BlockNewMatch {
                    pattern: Arc::clone(pattern),
                    banned_for: rules.ban_duration,
                }
            }
            None => Verdict::Pass,
        }
    }

    fn report(&self, event: &DecisionEvent<'_>) {
        let observer = &self.observer;
        if catch_unwind(AssertUnwindSafe(|| observer.report(event))).is_err() {
            warn!(
                client = %event.client_id,
                verdict = event.verdict.kind(),
                "Decision observer panicked; event dropped"
            );
        }
    }

    /// Current rules snapshot.
    pub fn rules(&self) -> Arc<FilterRules> {
        self.rules.read().clone()
    }

    /// Atomically replace patterns and ban duration.
    ///
    /// Existing bans keep their expiry; only new offenses use the new duration.
    pub fn reload(&self, rules: FilterRules) {
        *self.rules.write() = Arc::new(rules);
    }

    pub fn bans(&self) -> &Arc<BanTable> {
        &self.bans
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rules = self.rules();
        f.debug_struct("DecisionEngine")
            .field("patterns", &rules.patterns.len())
            .field("ban_duration", &rules.ban_duration)
            .field("bans", &self.bans.len())
            .finish()
    }
}
