//! Per-account apply cooldown.
//!
//! The tracker is the only authority on cooldowns. Clients get the expiry from
//! the apply receipt or the cooldown query and never compute it themselves.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::AutomationError;
use crate::constants::COOLDOWN_WINDOW_SECS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownRecord {
    pub account_id: String,
    pub cooldown_until: DateTime<Utc>,
}

/// Fixed-window rate limiter keyed by account id.
///
/// Records are never deleted explicitly; a record whose `cooldown_until` is
/// not after `now` is simply treated as absent.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    records: HashMap<String, DateTime<Utc>>,
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(Duration::seconds(COOLDOWN_WINDOW_SECS))
    }
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            records: HashMap::new(),
        }
    }

    /// Active cooldown for the account at `now`, if any.
    pub fn active(&self, account_id: &str, now: DateTime<Utc>) -> Option<CooldownRecord> {
        self.records
            .get(account_id)
            .filter(|until| now < **until)
            .map(|until| CooldownRecord {
                account_id: account_id.to_string(),
                cooldown_until: *until,
            })
    }

    /// Grants a new window starting at `now`, or reports how long is left.
    pub fn check_and_reserve(
        &mut self,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, AutomationError> {
        if let Some(active) = self.active(account_id, now) {
            return Err(AutomationError::CooldownActive {
                account_id: account_id.to_string(),
                remaining_seconds: remaining_seconds(active.cooldown_until, now),
                cooldown_until: active.cooldown_until,
            });
        }
        let until = now + self.window;
        self.records.insert(account_id.to_string(), until);
        Ok(until)
    }

    /// Drops expired records. Purely housekeeping; expiry is already time based.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, until| now < *until);
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whole seconds left until `until`, rounded up. Zero once expired.
pub fn remaining_seconds(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    ((millis + 999) / 1000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_request_is_granted_full_window() {
        let mut tracker = CooldownTracker::default();
        let until = tracker.check_and_reserve("acc1", t0()).unwrap();
        assert_eq!(until, t0() + Duration::seconds(300));
    }

    #[test]
    fn rejects_inside_window_with_remaining_time() {
        let mut tracker = CooldownTracker::default();
        tracker.check_and_reserve("acc1", t0()).unwrap();

        let err = tracker
            .check_and_reserve("acc1", t0() + Duration::seconds(10))
            .unwrap_err();
        assert_eq!(
            err,
            AutomationError::CooldownActive {
                account_id: "acc1".into(),
                remaining_seconds: 290,
                cooldown_until: t0() + Duration::seconds(300),
            }
        );
    }

    #[test]
    fn rejection_does_not_extend_window() {
        let mut tracker = CooldownTracker::default();
        tracker.check_and_reserve("acc1", t0()).unwrap();
        let _ = tracker.check_and_reserve("acc1", t0() + Duration::seconds(299));

        let active = tracker.active("acc1", t0() + Duration::seconds(1)).unwrap();
        assert_eq!(active.cooldown_until, t0() + Duration::seconds(300));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let mut tracker = CooldownTracker::default();
        tracker.check_and_reserve("acc1", t0()).unwrap();

        assert!(tracker
            .check_and_reserve("acc1", t0() + Duration::milliseconds(299_999))
            .is_err());
        let renewed = tracker
            .check_and_reserve("acc1", t0() + Duration::seconds(300))
            .unwrap();
        assert_eq!(renewed, t0() + Duration::seconds(600));
    }

    #[test]
    fn accounts_are_independent() {
        let mut tracker = CooldownTracker::default();
        tracker.check_and_reserve("acc1", t0()).unwrap();
        assert!(tracker.check_and_reserve("acc2", t0()).is_ok());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn prune_only_removes_expired() {
        let mut tracker = CooldownTracker::new(Duration::seconds(60));
        tracker.check_and_reserve("old", t0()).unwrap();
        tracker
            .check_and_reserve("fresh", t0() + Duration::seconds(30))
            .unwrap();

        assert_eq!(tracker.prune_expired(t0() + Duration::seconds(60)), 1);
        assert!(tracker.active("fresh", t0() + Duration::seconds(60)).is_some());
    }

    #[test]
    fn remaining_rounds_up() {
        assert_eq!(remaining_seconds(t0(), t0()), 0);
        assert_eq!(remaining_seconds(t0(), t0() + Duration::seconds(5)), 0);
        assert_eq!(
            remaining_seconds(t0() + Duration::milliseconds(1), t0()),
            1
        );
        assert_eq!(remaining_seconds(t0() + Duration::seconds(300), t0()), 300);
    }
}
