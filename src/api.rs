use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::app::{App, CourseInfo, CourseOverview, SkipResult, SubmitResult};
use crate::error::LearnError;
use crate::models::{ItemKind, LearningItem, ProfileState};
use crate::session::{Session, SessionSummary};

/// One lock around the whole learner: the store and the profile are only
/// ever mutated under it.
#[derive(Clone)]
pub struct ApiState {
    pub app: Arc<Mutex<App>>,
}

impl ApiState {
    pub fn new(app: App) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
        }
    }
}

pub fn app_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/select", post(select_course))
        .route("/api/overview", get(overview))
        .route("/api/session/start", post(start_session))
        .route("/api/session/current", get(current_session))
        .route("/api/session/answer", post(submit_answer))
        .route("/api/session/skip", post(skip_item))
        .route("/api/profile", get(profile))
        .route("/api/reset", post(reset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<LearnError>() {
            Some(LearnError::EmptyUnit) => StatusCode::BAD_REQUEST,
            Some(LearnError::NoSelection) => StatusCode::UNPROCESSABLE_ENTITY,
            Some(LearnError::SessionComplete) | Some(LearnError::NoActiveSession) => StatusCode::CONFLICT,
            Some(LearnError::NoCourses)
            | Some(LearnError::UnknownCourse(_))
            | Some(LearnError::UnknownUnit(_)) => StatusCode::NOT_FOUND,
            None => {
                log::error!("request failed: {:#}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// What the learner sees of an item; the answer stays on the server.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemView {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<String>>,
    reward_points: u32,
}

impl From<&LearningItem> for ItemView {
    fn from(item: &LearningItem) -> Self {
        let (kind, options) = match &item.kind {
            ItemKind::MultipleChoice { options } => ("mc", Some(options.clone())),
            ItemKind::TypedAnswer => ("type", None),
        };
        Self {
            id: item.id.clone(),
            kind,
            prompt: item.prompt.clone(),
            options,
            reward_points: item.reward_points,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_id: Uuid,
    unit_id: String,
    position: usize,
    total: usize,
    correct_count: usize,
    item: Option<ItemView>,
    summary: Option<SessionSummary>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            unit_id: session.unit_id.clone(),
            position: session.position(),
            total: session.len(),
            correct_count: session.correct_count(),
            item: session.current_item().ok().map(ItemView::from),
            summary: session.summary(),
        }
    }
}

async fn list_courses(State(state): State<ApiState>) -> Json<Vec<CourseInfo>> {
    let app = state.app.lock().await;
    Json(app.courses())
}

#[derive(Deserialize)]
struct SelectCourseRequest {
    course_id: String,
}

async fn select_course(
    State(state): State<ApiState>,
    Json(payload): Json<SelectCourseRequest>,
) -> Result<StatusCode, ApiError> {
    let mut app = state.app.lock().await;
    app.select_course(&payload.course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn overview(State(state): State<ApiState>) -> Result<Json<CourseOverview>, ApiError> {
    let app = state.app.lock().await;
    Ok(Json(app.overview(Utc::now())?))
}

#[derive(Deserialize)]
struct StartRequest {
    unit_id: String,
    #[serde(default)]
    review: bool,
}

async fn start_session(
    State(state): State<ApiState>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut app = state.app.lock().await;
    let session = app.start_lesson(&payload.unit_id, payload.review, Utc::now())?;
    Ok(Json(SessionView::from(session)))
}

async fn current_session(State(state): State<ApiState>) -> Result<Json<SessionView>, ApiError> {
    let app = state.app.lock().await;
    Ok(Json(SessionView::from(app.session()?)))
}

#[derive(Deserialize)]
struct SubmitRequest {
    response: Option<String>,
}

async fn submit_answer(
    State(state): State<ApiState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResult>, ApiError> {
    let mut app = state.app.lock().await;
    let result = app
        .submit(payload.response.as_deref(), Utc::now(), today())
        .await?;
    Ok(Json(result))
}

async fn skip_item(State(state): State<ApiState>) -> Result<Json<SkipResult>, ApiError> {
    let mut app = state.app.lock().await;
    Ok(Json(app.skip(today()).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView {
    #[serde(flatten)]
    profile: ProfileState,
    course_name: Option<String>,
}

async fn profile(State(state): State<ApiState>) -> impl IntoResponse {
    let app = state.app.lock().await;
    Json(ProfileView {
        profile: app.profile.clone(),
        course_name: app.current_course().ok().map(|c| c.name.clone()),
    })
}

async fn reset(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    let mut app = state.app.lock().await;
    app.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
