//! In-memory ban table keyed by client identifier.
//!
//! # Expiry
//!
//! An entry is active while `now < expires_at`. Expired entries are
//! semantically absent even when still stored, and are removed:
//!
//! - lazily, by the lookup that finds them expired, and
//! - actively, by [`BanTable::sweep_expired`] run from a background task.
//!
//! Both paths decide "expired?" and "remove" under the same shard lock, so a
//! ban written concurrently by [`BanTable::ban`] is never evicted by a lookup
//! that observed the previous, expired entry.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Concurrent mapping from client identifier to ban expiry.
#[derive(Debug, Default)]
pub struct BanTable {
    entries: DashMap<String, Instant>,
}

impl BanTable {
    /// Create an empty ban table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check whether `client_id` is banned at `now`.
    ///
    /// An expired entry is evicted as part of the same atomic step. An active
    /// entry is left untouched: lookups never extend a ban.
    pub fn is_banned(&self, client_id: &str, now: Instant) -> bool {
        self.active_ban(client_id, now).is_some()
    }

    /// Like [`BanTable::is_banned`], returning the time left on an active ban.
    pub fn active_ban(&self, client_id: &str, now: Instant) -> Option<Duration> {
        let mut remaining = None;
        let evicted = self.entries.remove_if(client_id, |_, expires_at| {
            remaining = expires_at.checked_duration_since(now).filter(|left| !left.is_zero());
            remaining.is_none()
        });

        if evicted.is_some() {
            debug!(client = %client_id, "Expired ban evicted on lookup");
        }

        remaining
    }

    /// Ban `client_id` until `now + duration`.
    ///
    /// Unconditional and last-write-wins: an existing ban is replaced, not
    /// stacked, so a repeat offense restarts the window from `now`.
    /// A duration past the platform's `Instant` range saturates.
    pub fn ban(&self, client_id: &str, now: Instant, duration: Duration) {
        self.entries.insert(client_id.to_owned(), saturating_expiry(now, duration));
    }

    /// Time left on the ban for `client_id`, if one is active at `now`.
    ///
    /// Read-only: expired entries are reported as absent but not removed.
    pub fn remaining(&self, client_id: &str, now: Instant) -> Option<Duration> {
        self.entries
            .get(client_id)
            .and_then(|expires_at| expires_at.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    /// Remove every entry expired at `now`.
    ///
    /// Bounds growth from clients that are banned once and never seen again.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, expires_at| {
            if now < *expires_at {
                true
            } else {
                removed += 1;
                false
            }
        });

        if removed > 0 {
            debug!(count = removed, "Swept expired bans");
        }

        removed
    }

    /// Number of physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Latest representable instant at or before `now + duration`.
fn saturating_expiry(now: Instant, duration: Duration) -> Instant {
    if let Some(at) = now.checked_add(duration) {
        return at;
    }
    // Binary search for the largest offset that still fits.
    let (mut fits, mut overflows) = (Duration::ZERO, duration);
    while overflows - fits > Duration::from_secs(1) {
        let mid = fits + (overflows - fits) / 2;
        if now.checked_add(mid).is_some() {
            fits = mid;
        } else {
            overflows = mid;
        }
    }
    now + fits
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_ban_lifecycle() {
        let table = BanTable::new();
        let t0 = Instant::now();

        assert!(!table.is_banned("1.2.3.4", t0));

        table.ban("1.2.3.4", t0, 10 * MINUTE);
        assert_eq!(table.len(), 1);
        assert!(table.is_banned("1.2.3.4", t0 + 5 * MINUTE));
        assert_eq!(table.len(), 1);

        assert!(!table.is_banned("1.2.3.4", t0 + 11 * MINUTE));
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, MINUTE);

        assert!(table.is_banned("a", t0 + MINUTE - Duration::from_nanos(1)));
        assert!(!table.is_banned("a", t0 + MINUTE));
        assert!(table.is_empty());
    }

    #[test]
    fn test_lookup_does_not_extend() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, 10 * MINUTE);

        for m in 1..10 {
            assert!(table.is_banned("a", t0 + m * MINUTE));
        }
        assert_eq!(table.remaining("a", t0 + 9 * MINUTE), Some(MINUTE));
    }

    #[test]
    fn test_reban_resets_window() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, 15 * MINUTE);
        table.ban("a", t0 + 10 * MINUTE, 15 * MINUTE);

        assert_eq!(table.len(), 1);
        assert!(table.is_banned("a", t0 + 24 * MINUTE));
        assert!(!table.is_banned("a", t0 + 25 * MINUTE));
    }

    #[test]
    fn test_clients_are_isolated() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("A", t0, MINUTE);

        assert!(table.is_banned("A", t0));
        assert!(!table.is_banned("B", t0));
        assert!(table.remaining("B", t0).is_none());
    }

    #[test]
    fn test_empty_identifier_is_a_key() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("", t0, MINUTE);

        assert!(table.is_banned("", t0));
        assert!(!table.is_banned("x", t0));
    }

    #[test]
    fn test_remaining_does_not_mutate() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, MINUTE);

        assert_eq!(table.remaining("a", t0), Some(MINUTE));
        assert_eq!(table.remaining("a", t0 + 2 * MINUTE), None);
        // Expired but still physically present until looked up or swept.
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("short", t0, MINUTE);
        table.ban("long", t0, 60 * MINUTE);

        assert_eq!(table.sweep_expired(t0 + 2 * MINUTE), 1);
        assert_eq!(table.len(), 1);
        assert!(table.is_banned("long", t0 + 2 * MINUTE));
        assert_eq!(table.sweep_expired(t0 + 2 * MINUTE), 0);
    }

    #[test]
    fn test_active_ban_reports_remaining() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, 10 * MINUTE);

        assert_eq!(table.active_ban("a", t0 + 4 * MINUTE), Some(6 * MINUTE));
        assert_eq!(table.active_ban("a", t0 + 10 * MINUTE), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let table = BanTable::new();
        let t0 = Instant::now();
        table.ban("a", t0, Duration::MAX);

        let year = 365 * 24 * 60 * MINUTE;
        assert!(table.is_banned("a", t0 + year));
        assert!(table.remaining("a", t0).is_some_and(|left| left > 100 * year));
    }
}
