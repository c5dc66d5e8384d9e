//! State transitions for qualifying activity.
//!
//! Both functions take the current snapshot and return the proposed next one.
//! Persisting it, and doing so atomically per identity, is the caller's job.

use chrono::{DateTime, Datelike, TimeZone, Utc};

use super::rules::{POLL_REWARD, QUIZ_REWARD};
use super::state::{EngagementState, QuizAttempt};

/// Same calendar day in `now`'s time zone: equal year and day-of-year.
///
/// 23:59 and 00:01 are different days even though they are two minutes apart.
pub fn is_same_calendar_day<Tz: TimeZone>(last: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    let last_local = last.with_timezone(&now.timezone());
    last_local.year() == now.year() && last_local.ordinal() == now.ordinal()
}

/// Apply a quiz attempt observed at `now`.
///
/// Incorrect attempts return the state unchanged. Correct attempts add
/// [`QUIZ_REWARD`], extend the streak unless the last activity fell on the
/// same calendar day, and stamp `last_activity_at`.
pub fn record_quiz_completion<Tz: TimeZone>(
    state: &EngagementState,
    attempt: &QuizAttempt,
    now: &DateTime<Tz>,
) -> EngagementState {
    if !attempt.is_correct {
        return state.clone();
    }

    let extends_streak = match &state.last_activity_at {
        Some(last) => !is_same_calendar_day(last, now),
        None => true,
    };

    EngagementState {
        points: state.points.saturating_add(QUIZ_REWARD),
        streak: if extends_streak {
            state.streak.saturating_add(1)
        } else {
            state.streak
        },
        last_activity_at: Some(now.with_timezone(&Utc)),
    }
}

/// Apply a poll vote. No streak effect.
///
/// Not idempotent: the caller guarantees one vote per poll per identity.
pub fn record_poll_vote(state: &EngagementState) -> EngagementState {
    EngagementState {
        points: state.points.saturating_add(POLL_REWARD),
        ..state.clone()
    }
}
