use chrono::{DateTime, Duration, Utc};

use crate::models::{LearningItem, MasteryRecord};
use crate::store::RecordStore;

/// Hours until the next review, indexed by interval level.
/// Level 0 is due again immediately.
pub const INTERVAL_HOURS: [i64; 7] = [0, 12, 24, 48, 96, 168, 336];

pub const MAX_LEVEL: u8 = (INTERVAL_HOURS.len() - 1) as u8;

/// An item at or above this level counts as mastered for progress display.
pub const MASTERED_LEVEL: u8 = 3;

/// An item is due when it has never been reviewed or its due time has passed.
pub fn is_due(record: Option<&MasteryRecord>, now: DateTime<Utc>) -> bool {
    match record {
        None => true,
        Some(rec) => rec.due_at <= now,
    }
}

/// Picks the items due for review, keeping their relative order.
///
/// A review session must never be empty for a non-empty unit, so when nothing
/// is due the whole input comes back unchanged.
pub fn select_due_items(
    items: &[LearningItem],
    store: &RecordStore,
    now: DateTime<Utc>,
) -> Vec<LearningItem> {
    let due: Vec<LearningItem> = items
        .iter()
        .filter(|item| is_due(store.get(&item.id).as_ref(), now))
        .cloned()
        .collect();

    if due.is_empty() {
        log::debug!("nothing due out of {} items, reviewing all", items.len());
        items.to_vec()
    } else {
        due
    }
}

/// Calculates the next record after an answer.
///
/// The level moves exactly one rung per answer: up on a correct answer, down
/// on a wrong one, clamped to `[0, MAX_LEVEL]`. An absent record starts at
/// level 0. The store is not touched; the caller persists the result.
pub fn advance(record: Option<&MasteryRecord>, was_correct: bool, now: DateTime<Utc>) -> MasteryRecord {
    let prior = record.map_or(0, |rec| rec.interval_level.min(MAX_LEVEL));

    let interval_level = if was_correct {
        (prior + 1).min(MAX_LEVEL)
    } else {
        prior.saturating_sub(1)
    };

    let due_at = now + Duration::hours(INTERVAL_HOURS[interval_level as usize]);

    log::debug!(
        "advance: level {} -> {} (correct: {}), due {}",
        prior,
        interval_level,
        was_correct,
        due_at
    );

    MasteryRecord {
        interval_level,
        due_at,
    }
}
