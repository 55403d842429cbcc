use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Course, Unit};
use crate::srs::{is_due, MASTERED_LEVEL};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed_count: usize,
    pub total_count: usize,
}

/// Items in the unit with a record at or above the mastered level.
pub fn unit_progress(unit: &Unit, store: &RecordStore) -> Progress {
    let completed_count = unit
        .items
        .iter()
        .filter(|item| {
            store
                .get(&item.id)
                .is_some_and(|rec| rec.interval_level >= MASTERED_LEVEL)
        })
        .count();

    Progress {
        completed_count,
        total_count: unit.items.len(),
    }
}

pub fn course_progress(course: &Course, store: &RecordStore) -> Progress {
    course
        .units
        .iter()
        .map(|unit| unit_progress(unit, store))
        .fold(Progress::default(), |acc, p| Progress {
            completed_count: acc.completed_count + p.completed_count,
            total_count: acc.total_count + p.total_count,
        })
}

/// Number of items currently due, without the review fallback.
pub fn due_count(unit: &Unit, store: &RecordStore, now: DateTime<Utc>) -> usize {
    unit.items
        .iter()
        .filter(|item| is_due(store.get(&item.id).as_ref(), now))
        .count()
}
