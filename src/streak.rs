//! Daily streak and XP bookkeeping.
//!
//! Days are calendar dates, so the consecutive-day check counts whole days
//! between dates rather than dividing a timestamp delta, which misfires
//! across daylight-saving changes. The last active day never moves backward:
//! a date earlier than the stored one resets the streak but keeps the date.

use chrono::NaiveDate;

use crate::models::ProfileState;

/// Counts today's activity toward the streak. Safe to call repeatedly on the
/// same day.
pub fn record_activity(profile: &ProfileState, today: NaiveDate) -> ProfileState {
    let mut next = profile.clone();

    let streak_count = match (profile.last_active_day, profile.streak_count) {
        (Some(last), _) if last == today => return next,
        (None, _) | (_, None) => 1,
        (Some(last), Some(count)) => {
            if (today - last).num_days() == 1 {
                count + 1
            } else {
                1
            }
        }
    };

    log::debug!(
        "streak {:?} -> {} (last active {:?}, today {})",
        profile.streak_count,
        streak_count,
        profile.last_active_day,
        today
    );

    next.streak_count = Some(streak_count);
    next.last_active_day = Some(profile.last_active_day.map_or(today, |last| last.max(today)));
    next
}

pub fn add_xp(profile: &ProfileState, amount: u32) -> ProfileState {
    ProfileState {
        total_xp: profile.total_xp + u64::from(amount),
        ..profile.clone()
    }
}
