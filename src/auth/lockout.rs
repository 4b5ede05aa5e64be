//! Login-attempt lockout state machine.
//!
//! Pure transitions over an account's failure counter and lock expiry. The
//! caller persists the returned update. An expired lock lifts the block but
//! does not touch the counter; only a successful login resets it.

use chrono::{DateTime, Duration, Utc};

/// Consecutive failures that trigger a lock.
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

/// How long a triggered lock holds.
pub const LOCK_DURATION_SECONDS: i64 = 15 * 60;

/// New lockout fields to persist after a login attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LockoutUpdate {
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Transition for a failed attempt: increment, and lock once the counter
/// reaches the threshold.
#[must_use]
pub fn record_failure(current_attempts: i32) -> LockoutUpdate {
    let attempts = current_attempts.saturating_add(1);
    let locked_until = if attempts >= MAX_LOGIN_ATTEMPTS {
        Some(Utc::now() + Duration::seconds(LOCK_DURATION_SECONDS))
    } else {
        None
    };

    LockoutUpdate {
        login_attempts: attempts,
        locked_until,
    }
}

/// Transition for a successful attempt: unconditional reset.
#[must_use]
pub const fn record_success() -> LockoutUpdate {
    LockoutUpdate {
        login_attempts: 0,
        locked_until: None,
    }
}

/// True iff the lock expiry is set and strictly in the future.
#[must_use]
pub fn is_locked(locked_until: Option<DateTime<Utc>>) -> bool {
    locked_until.is_some_and(|until| until > Utc::now())
}

/// Seconds until an active lock lifts; zero when not locked.
#[must_use]
pub fn retry_after_seconds(locked_until: Option<DateTime<Utc>>) -> u64 {
    locked_until
        .map(|until| (until - Utc::now()).num_seconds().max(0))
        .and_then(|secs| u64::try_from(secs).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_below_threshold_do_not_lock() {
        for prior in 0..MAX_LOGIN_ATTEMPTS - 1 {
            let update = record_failure(prior);
            assert_eq!(update.login_attempts, prior + 1);
            if update.login_attempts < MAX_LOGIN_ATTEMPTS {
                assert_eq!(update.locked_until, None, "locked at {prior} prior failures");
            }
        }
    }

    #[test]
    fn fifth_failure_locks_for_the_window() {
        let update = record_failure(MAX_LOGIN_ATTEMPTS - 1);
        assert_eq!(update.login_attempts, MAX_LOGIN_ATTEMPTS);

        let until = update.locked_until.expect("threshold should lock");
        let remaining = (until - Utc::now()).num_seconds();
        assert!(
            (LOCK_DURATION_SECONDS - 5..=LOCK_DURATION_SECONDS).contains(&remaining),
            "lock expiry should be ~15 minutes out, got {remaining}s"
        );
        assert!(is_locked(update.locked_until));
    }

    #[test]
    fn failures_past_threshold_stay_locked() {
        let update = record_failure(MAX_LOGIN_ATTEMPTS + 3);
        assert!(update.locked_until.is_some());
    }

    #[test]
    fn success_resets_any_counter() {
        let update = record_success();
        assert_eq!(update.login_attempts, 0);
        assert_eq!(update.locked_until, None);
    }

    #[test]
    fn past_expiry_is_not_locked() {
        let past = Some(Utc::now() - Duration::seconds(1));
        assert!(!is_locked(past));
        assert_eq!(retry_after_seconds(past), 0);
    }

    #[test]
    fn unset_expiry_is_not_locked() {
        assert!(!is_locked(None));
        assert_eq!(retry_after_seconds(None), 0);
    }

    #[test]
    fn retry_after_counts_down_remaining_window() {
        let until = Some(Utc::now() + Duration::seconds(600));
        let remaining = retry_after_seconds(until);
        assert!((595..=600).contains(&remaining), "got {remaining}");
    }
}
