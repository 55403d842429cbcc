use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::content::Catalog;
use crate::db::Db;
use crate::error::LearnError;
use crate::feedback::FeedbackGenerator;
use crate::models::{Course, LearningItem, ProfileState};
use crate::progress::{self, Progress};
use crate::session::{AnswerOutcome, Session, SessionSummary};
use crate::store::RecordStore;
use crate::streak;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInfo {
    pub id: String,
    pub name: String,
    pub flag: Option<String>,
    pub unit_count: usize,
    pub progress: Progress,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOverview {
    pub id: String,
    pub name: String,
    pub progress: Progress,
    pub due_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOverview {
    pub id: String,
    pub name: String,
    pub progress: Progress,
    pub units: Vec<UnitOverview>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub outcome: AnswerOutcome,
    pub message: String,
    pub summary: Option<SessionSummary>,
    /// Set when this answer completed the session.
    pub summary_message: Option<String>,
    pub profile: ProfileState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipResult {
    pub completed: bool,
    pub summary: Option<SessionSummary>,
    pub summary_message: Option<String>,
    pub profile: ProfileState,
}

/// In-memory state as it was before an operation, restored when the save
/// that should follow it fails.
struct Snapshot {
    profile: ProfileState,
    records: RecordStore,
    session: Option<Session>,
}

/// Owns the learner's state and drives the core on their behalf.
///
/// This is the only place persistence happens: after every answer and
/// whenever a session completes. An operation whose save fails is rolled
/// back in memory, so it has either fully happened or not at all.
pub struct App {
    pub db: Db,
    pub catalog: Catalog,
    pub profile: ProfileState,
    pub records: RecordStore,
    pub session: Option<Session>,
}

impl App {
    pub async fn new(db: Db, catalog: Catalog) -> anyhow::Result<Self> {
        let (profile, records) = db.load_profile_and_records().await?;

        Ok(Self {
            db,
            catalog,
            profile,
            records,
            session: None,
        })
    }

    /// The selected course, or the first one when the selection is missing
    /// or no longer in the catalog.
    pub fn current_course(&self) -> Result<&Course, LearnError> {
        if let Some(id) = &self.profile.selected_course {
            if let Ok(course) = self.catalog.course(id) {
                return Ok(course);
            }
            log::warn!("selected course {} not in catalog, using default", id);
        }
        self.catalog
            .default_course()
            .ok_or(LearnError::NoCourses)
    }

    pub async fn select_course(&mut self, course_id: &str) -> anyhow::Result<()> {
        self.catalog.course(course_id)?;
        let snapshot = self.snapshot();
        self.profile.selected_course = Some(course_id.to_string());
        self.persist_or_rollback(snapshot).await
    }

    pub fn courses(&self) -> Vec<CourseInfo> {
        let selected = self.current_course().ok().map(|c| c.id.as_str());
        self.catalog
            .courses
            .iter()
            .map(|c| CourseInfo {
                id: c.id.clone(),
                name: c.name.clone(),
                flag: c.flag.clone(),
                unit_count: c.units.len(),
                progress: progress::course_progress(c, &self.records),
                selected: selected == Some(c.id.as_str()),
            })
            .collect()
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Result<CourseOverview, LearnError> {
        let course = self.current_course()?;
        Ok(CourseOverview {
            id: course.id.clone(),
            name: course.name.clone(),
            progress: progress::course_progress(course, &self.records),
            units: course
                .units
                .iter()
                .map(|u| UnitOverview {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    progress: progress::unit_progress(u, &self.records),
                    due_count: progress::due_count(u, &self.records, now),
                })
                .collect(),
        })
    }

    /// Starts a lesson on a unit of the current course, abandoning any
    /// session already in progress.
    pub fn start_lesson(&mut self, unit_id: &str, review: bool, now: DateTime<Utc>) -> Result<&Session, LearnError> {
        let course = self.current_course()?;
        let unit = self.catalog.unit(&course.id, unit_id)?;
        let session = Session::start(unit, review, &self.records, now)?;

        if let Some(old) = self.session.replace(session) {
            if !old.is_complete() {
                log::info!("abandoned session {} at {}/{}", old.id, old.position(), old.len());
            }
        }
        self.session()
    }

    pub fn session(&self) -> Result<&Session, LearnError> {
        self.session.as_ref().ok_or(LearnError::NoActiveSession)
    }

    pub fn current_item(&self) -> Result<&LearningItem, LearnError> {
        self.session()?.current_item()
    }

    pub async fn submit(
        &mut self,
        response: Option<&str>,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> anyhow::Result<SubmitResult> {
        let snapshot = self.snapshot();
        let session = self.session.as_mut().ok_or(LearnError::NoActiveSession)?;
        let outcome = session.submit_answer(response, &mut self.records, now)?;
        let message = FeedbackGenerator::answer_message(&outcome, response.unwrap_or(""), session.items());
        let summary = session.summary();

        if outcome.was_correct {
            self.profile = streak::add_xp(&self.profile, outcome.reward_points);
        }
        if outcome.completed {
            self.profile = streak::record_activity(&self.profile, today);
        }
        self.persist_or_rollback(snapshot).await?;

        let summary_message = summary.map(|s| FeedbackGenerator::summary_message(&s, &self.profile));
        Ok(SubmitResult {
            outcome,
            message,
            summary,
            summary_message,
            profile: self.profile.clone(),
        })
    }

    /// Skipping the last item completes the session with the same side
    /// effects as answering it.
    pub async fn skip(&mut self, today: NaiveDate) -> anyhow::Result<SkipResult> {
        let snapshot = self.snapshot();
        let session = self.session.as_mut().ok_or(LearnError::NoActiveSession)?;
        let completed = session.skip()?;
        let summary = session.summary();

        let summary_message = match summary {
            Some(summary) => {
                self.profile = streak::record_activity(&self.profile, today);
                self.persist_or_rollback(snapshot).await?;
                Some(FeedbackGenerator::summary_message(&summary, &self.profile))
            }
            None => None,
        };

        Ok(SkipResult {
            completed,
            summary,
            summary_message,
            profile: self.profile.clone(),
        })
    }

    /// Clears every record and the profile, in memory and on disk.
    pub async fn reset(&mut self) -> anyhow::Result<()> {
        self.db.reset().await?;
        self.profile = ProfileState::default();
        self.records.clear();
        self.session = None;
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            profile: self.profile.clone(),
            records: self.records.clone(),
            session: self.session.clone(),
        }
    }

    async fn persist_or_rollback(&mut self, snapshot: Snapshot) -> anyhow::Result<()> {
        if let Err(e) = self.db.save(&self.profile, &self.records).await {
            log::error!("failed to save progress, rolling back: {:#}", e);
            self.profile = snapshot.profile;
            self.records = snapshot.records;
            self.session = snapshot.session;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
