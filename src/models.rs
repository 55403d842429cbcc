use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Comparison behavior for an item. Only multiple-choice items carry options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemKind {
    #[serde(rename = "mc", alias = "multipleChoice")]
    MultipleChoice { options: Vec<String> },
    #[serde(rename = "type", alias = "typedAnswer")]
    TypedAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    pub id: String,
    #[serde(flatten)]
    pub kind: ItemKind,
    #[serde(alias = "front")]
    pub prompt: String,
    pub answer: String,
    #[serde(alias = "xp", default)]
    pub reward_points: u32,
}

impl LearningItem {
    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, ItemKind::MultipleChoice { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<LearningItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// Per-item spaced-repetition state.
///
/// `interval_level` is a rung on the fixed ladder in [`crate::srs::INTERVAL_HOURS`].
/// `due_at` travels as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryRecord {
    pub interval_level: u8,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_at: DateTime<Utc>,
}

impl MasteryRecord {
    /// The record an item is treated as having before its first answer:
    /// level 0, due immediately.
    pub fn unreviewed(now: DateTime<Utc>) -> Self {
        Self {
            interval_level: 0,
            due_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileState {
    pub total_xp: u64,
    /// Unset until the first recorded activity.
    pub streak_count: Option<u32>,
    pub last_active_day: Option<NaiveDate>,
    pub selected_course: Option<String>,
}
