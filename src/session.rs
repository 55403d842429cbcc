use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::LearnError;
use crate::models::{LearningItem, MasteryRecord, Unit};
use crate::srs;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub item_id: String,
    pub was_correct: bool,
    /// Points to award; zero for a wrong answer.
    pub reward_points: u32,
    pub expected_answer: String,
    pub updated_record: MasteryRecord,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub correct_count: usize,
    pub total_count: usize,
}

/// One run through a fixed queue of items.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub unit_id: String,
    pub review_mode: bool,
    queue: Vec<LearningItem>,
    position: usize,
    correct_count: usize,
}

/// Trim and case-fold for answer comparison.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl Session {
    /// Review mode queues only the due items (falling back to the whole unit),
    /// otherwise the full unit in order.
    pub fn start(
        unit: &Unit,
        review_mode: bool,
        store: &RecordStore,
        now: DateTime<Utc>,
    ) -> Result<Self, LearnError> {
        if unit.items.is_empty() {
            return Err(LearnError::EmptyUnit);
        }

        let queue = if review_mode {
            srs::select_due_items(&unit.items, store, now)
        } else {
            unit.items.clone()
        };

        let session = Self {
            id: Uuid::new_v4(),
            unit_id: unit.id.clone(),
            review_mode,
            queue,
            position: 0,
            correct_count: 0,
        };
        log::info!(
            "session {} started on unit {} ({} items, review: {})",
            session.id,
            session.unit_id,
            session.queue.len(),
            review_mode
        );
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        if self.position >= self.queue.len() {
            SessionState::Complete
        } else {
            SessionState::Active
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn items(&self) -> &[LearningItem] {
        &self.queue
    }

    pub fn current_item(&self) -> Result<&LearningItem, LearnError> {
        self.queue
            .get(self.position)
            .ok_or(LearnError::SessionComplete)
    }

    /// Scores the response against the current item, schedules it, and moves on.
    ///
    /// A multiple-choice item with no selected option fails with `NoSelection`
    /// and leaves both the session and the store untouched.
    pub fn submit_answer(
        &mut self,
        response: Option<&str>,
        store: &mut RecordStore,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, LearnError> {
        let item = self.current_item()?;

        let response = match response {
            Some(r) if !(item.is_multiple_choice() && r.trim().is_empty()) => r,
            None if !item.is_multiple_choice() => "",
            _ => return Err(LearnError::NoSelection),
        };

        let was_correct = normalize(response) == normalize(&item.answer);
        let updated_record = srs::advance(store.get(&item.id).as_ref(), was_correct, now);
        store.put(&item.id, updated_record);

        let outcome = AnswerOutcome {
            item_id: item.id.clone(),
            was_correct,
            reward_points: if was_correct { item.reward_points } else { 0 },
            expected_answer: item.answer.clone(),
            updated_record,
            completed: false,
        };

        if was_correct {
            self.correct_count += 1;
        }
        self.position += 1;

        let completed = self.is_complete();
        if completed {
            self.log_completion();
        }
        Ok(AnswerOutcome { completed, ..outcome })
    }

    /// Moves past the current item without scoring or scheduling it.
    /// Returns whether this completed the session.
    pub fn skip(&mut self) -> Result<bool, LearnError> {
        let item_id = self.current_item()?.id.clone();
        log::debug!("session {} skipped item {}", self.id, item_id);

        self.position += 1;
        let completed = self.is_complete();
        if completed {
            self.log_completion();
        }
        Ok(completed)
    }

    /// Only available once the session is complete.
    pub fn summary(&self) -> Option<SessionSummary> {
        self.is_complete().then(|| SessionSummary {
            correct_count: self.correct_count,
            total_count: self.queue.len(),
        })
    }

    fn log_completion(&self) {
        log::info!(
            "session {} complete: {}/{} correct",
            self.id,
            self.correct_count,
            self.queue.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }

    fn mc(id: &str, answer: &str) -> LearningItem {
        LearningItem {
            id: id.to_string(),
            kind: ItemKind::MultipleChoice {
                options: vec!["hola".to_string(), "adiós".to_string(), "gracias".to_string()],
            },
            prompt: format!("Pick {}", answer),
            answer: answer.to_string(),
            reward_points: 10,
        }
    }

    fn typed(id: &str, answer: &str) -> LearningItem {
        LearningItem {
            id: id.to_string(),
            kind: ItemKind::TypedAnswer,
            prompt: format!("Type {}", answer),
            answer: answer.to_string(),
            reward_points: 15,
        }
    }

    fn unit(items: Vec<LearningItem>) -> Unit {
        Unit {
            id: "basics".to_string(),
            name: "Basics".to_string(),
            items,
        }
    }

    #[test]
    fn empty_unit_cannot_start() {
        let err = Session::start(&unit(vec![]), false, &RecordStore::new(), now()).unwrap_err();
        assert_eq!(err, LearnError::EmptyUnit);
    }

    #[test]
    fn correct_then_incorrect_completes() {
        let u = unit(vec![mc("q1", "hola"), mc("q2", "gracias")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.summary().is_none());

        let first = session.submit_answer(Some("hola"), &mut store, now()).unwrap();
        assert!(first.was_correct);
        assert_eq!(first.reward_points, 10);
        assert!(!first.completed);

        let second = session.submit_answer(Some("adiós"), &mut store, now()).unwrap();
        assert!(!second.was_correct);
        assert_eq!(second.reward_points, 0);
        assert!(second.completed);

        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(
            session.summary(),
            Some(SessionSummary { correct_count: 1, total_count: 2 })
        );
        assert_eq!(store.get("q1").unwrap().interval_level, 1);
        assert_eq!(store.get("q2").unwrap().interval_level, 0);
    }

    #[test]
    fn comparison_ignores_case_and_whitespace() {
        let u = unit(vec![typed("t1", "hola")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();

        let outcome = session.submit_answer(Some(" Hola "), &mut store, now()).unwrap();
        assert!(outcome.was_correct);
        assert_eq!(normalize("  ÁRBOL "), "árbol");
    }

    #[test]
    fn missing_selection_changes_nothing() {
        let u = unit(vec![mc("q1", "hola")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();

        assert_eq!(
            session.submit_answer(None, &mut store, now()).unwrap_err(),
            LearnError::NoSelection
        );
        assert_eq!(
            session.submit_answer(Some("  "), &mut store, now()).unwrap_err(),
            LearnError::NoSelection
        );
        assert_eq!(session.position(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_typed_answer_is_just_wrong() {
        let u = unit(vec![typed("t1", "hola")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();

        let outcome = session.submit_answer(None, &mut store, now()).unwrap();
        assert!(!outcome.was_correct);
        assert!(session.is_complete());
    }

    #[test]
    fn skip_is_schedule_neutral_and_can_complete() {
        let u = unit(vec![typed("t1", "hola"), typed("t2", "adiós")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();

        session.submit_answer(Some("hola"), &mut store, now()).unwrap();
        assert!(session.skip().unwrap());
        assert!(store.get("t2").is_none());
        assert_eq!(
            session.summary(),
            Some(SessionSummary { correct_count: 1, total_count: 2 })
        );
    }

    #[test]
    fn finished_session_rejects_further_work() {
        let u = unit(vec![typed("t1", "hola")]);
        let mut store = RecordStore::new();
        let mut session = Session::start(&u, false, &store, now()).unwrap();
        session.skip().unwrap();

        assert_eq!(session.current_item().unwrap_err(), LearnError::SessionComplete);
        assert_eq!(session.skip().unwrap_err(), LearnError::SessionComplete);
        assert_eq!(
            session.submit_answer(Some("hola"), &mut store, now()).unwrap_err(),
            LearnError::SessionComplete
        );
    }

    #[test]
    fn review_mode_queues_due_items_only() {
        let u = unit(vec![typed("t1", "hola"), typed("t2", "adiós"), typed("t3", "sí")]);
        let mut store = RecordStore::new();
        store.put("t2", srs::advance(None, true, now()));

        let session = Session::start(&u, true, &store, now()).unwrap();
        let ids: Vec<&str> = session.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["t1", "t3"]);

        let later = Session::start(&u, true, &store, now() + Duration::hours(12)).unwrap();
        assert_eq!(later.len(), 3);
    }
}
