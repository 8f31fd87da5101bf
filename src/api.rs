use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    api_error,
    attempt::QuizSessionSnapshot,
    errors::{ApiError, ErrorContext},
    models::*,
    news_fetcher::{
        MAX_PAGE_SIZE, MIN_PAGE_SIZE, SUPPORTED_CATEGORIES, SUPPORTED_COUNTRIES, validate_query,
    },
    session::QuizService,
    session_store::{SessionStore, SharedSession},
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn, log_validation};

pub const SESSION_NOT_FOUND: &str = "Session not found or expired";

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub sessions: SessionStore,
}

type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

#[derive(Debug, Default, Deserialize)]
pub struct FetchHeadlinesRequest {
    pub country: Option<String>,
    pub category: Option<String>,
    pub page_size: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SelectAnswerRequest {
    pub summary_index: usize,
    pub question_index: usize,
    pub option: String,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HeadlineOptions {
    pub countries: Vec<&'static str>,
    pub categories: Vec<&'static str>,
    pub min_page_size: u8,
    pub max_page_size: u8,
    pub defaults: HeadlineQuery,
    pub questions_per_summary: usize,
}

#[derive(Debug, Serialize)]
pub struct FetchHeadlinesResponse {
    pub outcome: FetchOutcome,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SelectAnswerResponse {
    pub id: QuestionId,
    pub selected: String,
    pub quiz: QuizSessionSnapshot,
}

impl FetchHeadlinesRequest {
    /// Fill missing fields from the configured defaults
    fn into_query(self, defaults: &HeadlineQuery) -> HeadlineQuery {
        HeadlineQuery {
            country: self
                .country
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_else(|| defaults.country.clone()),
            category: self
                .category
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_else(|| defaults.category.clone()),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }
}

async fn load_session(
    state: &AppState,
    operation: &str,
    id: Uuid,
) -> Result<SharedSession, ErrorResponse> {
    match state.sessions.get(id).await {
        Some(session) => Ok(session),
        None => {
            log_api_warn!(operation, session_id = id, "session not found or expired");
            let context = ErrorContext::new(operation, "session")
                .with_id(&id.to_string())
                .with_user_message(SESSION_NOT_FOUND);
            Err(ApiError::NotFound(format!("Session '{}' not found", id))
                .to_response_with_context(context))
        }
    }
}

// Options endpoint
pub async fn get_options(State(state): State<AppState>) -> Json<ApiResponse<HeadlineOptions>> {
    Json(ApiResponse::success(HeadlineOptions {
        countries: SUPPORTED_COUNTRIES.to_vec(),
        categories: SUPPORTED_CATEGORIES.to_vec(),
        min_page_size: MIN_PAGE_SIZE,
        max_page_size: MAX_PAGE_SIZE,
        defaults: state.quiz_service.default_query().clone(),
        questions_per_summary: state.quiz_service.questions_per_summary(),
    }))
}

// Session endpoints
pub async fn create_session(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    log_api_start!("create_session");

    let (id, session) = state.sessions.create().await;
    let snapshot = session.lock().await.snapshot();

    log_api_success!("create_session", session_id = id, "session created");
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionSnapshot> {
    log_api_start!("get_session", session_id = id);

    let session = load_session(&state, "get_session", id).await?;
    let snapshot = session.lock().await.snapshot();

    debug!(session_id = %id, phase = %snapshot.phase, "Session retrieved");
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ErrorResponse> {
    log_api_start!("delete_session", session_id = id);

    if state.sessions.remove(id).await {
        log_api_success!("delete_session", session_id = id, "session discarded");
        Ok(StatusCode::NO_CONTENT)
    } else {
        log_api_warn!("delete_session", session_id = id, "session not found");
        Err(api_error!(not_found, "delete_session", "session", id))
    }
}

// Main phase endpoints
pub async fn fetch_headlines(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FetchHeadlinesRequest>,
) -> ApiResult<FetchHeadlinesResponse> {
    log_api_start!("fetch_headlines", session_id = id);

    let query = request.into_query(state.quiz_service.default_query());
    if let Err(message) = validate_query(&query) {
        log_validation!(failure, "headline_query", error = message);
        return Err(api_error!(validation, "fetch_headlines", "headline_query", message));
    }
    log_validation!(success, "headline_query", "headline query accepted");

    let session = load_session(&state, "fetch_headlines", id).await?;
    let mut session = session.lock().await;

    match state.quiz_service.fetch_and_summarize(&mut session, &query).await {
        Ok(outcome) => {
            info!(
                session_id = %id,
                country = %query.country,
                category = %query.category,
                articles = outcome.article_count,
                "Headlines fetched and summarized"
            );
            Ok(Json(ApiResponse::success(FetchHeadlinesResponse {
                outcome,
                session: session.snapshot(),
            })))
        }
        Err(e) => Err(api_error!(session, "fetch_headlines", id, e)),
    }
}

pub async fn start_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuizSessionSnapshot> {
    log_api_start!("start_quiz", session_id = id);

    let session = load_session(&state, "start_quiz", id).await?;
    let mut session = session.lock().await;

    match state.quiz_service.enter_quiz(&mut session).await {
        Ok(quiz) => {
            log_api_success!("start_quiz", session_id = id, format!("{} questions", quiz.total));
            Ok(Json(ApiResponse::success(quiz)))
        }
        Err(e) => Err(api_error!(session, "start_quiz", id, e)),
    }
}

// Quiz phase endpoints
pub async fn select_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectAnswerRequest>,
) -> ApiResult<SelectAnswerResponse> {
    log_api_start!("select_answer", session_id = id);

    let question_id = QuestionId::new(request.summary_index, request.question_index);
    let session = load_session(&state, "select_answer", id).await?;
    let mut session = session.lock().await;

    match session.select_answer(question_id, &request.option) {
        Ok(()) => {
            debug!(session_id = %id, question = %question_id, "Answer recorded");
            Ok(Json(ApiResponse::success(SelectAnswerResponse {
                id: question_id,
                selected: request.option,
                quiz: session.quiz_snapshot(),
            })))
        }
        Err(e) => Err(api_error!(session, "select_answer", id, e)),
    }
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ScoreReport> {
    log_api_start!("submit_quiz", session_id = id);

    let session = load_session(&state, "submit_quiz", id).await?;
    let mut session = session.lock().await;

    match session.submit() {
        Ok(report) => {
            log_api_success!(
                "submit_quiz",
                session_id = id,
                format!("scored {}/{}", report.score, report.total)
            );
            Ok(Json(ApiResponse::success(report)))
        }
        Err(e) => Err(api_error!(session, "submit_quiz", id, e)),
    }
}

pub async fn export_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    log_api_start!("export_quiz", session_id = id);

    let session = load_session(&state, "export_quiz", id).await?;
    let session = session.lock().await;

    match session.export_quiz(Utc::now()) {
        Ok(export) => {
            log_api_success!("export_quiz", session_id = id, export.file_name.as_str());
            Ok((
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", export.file_name),
                    ),
                ],
                export.content,
            ))
        }
        Err(e) => Err(api_error!(session, "export_quiz", id, e)),
    }
}

pub async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionSnapshot> {
    log_api_start!("go_back", session_id = id);

    let session = load_session(&state, "go_back", id).await?;
    let mut session = session.lock().await;

    match session.back() {
        Ok(()) => {
            log_api_success!("go_back", session_id = id, "returned to summaries");
            Ok(Json(ApiResponse::success(session.snapshot())))
        }
        Err(e) => {
            log_api_error!("go_back", session_id = id, error = e, "cannot leave quiz");
            Err(ApiError::from(e).to_response_with_context(
                ErrorContext::new("go_back", "session").with_id(&id.to_string()),
            ))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/options", get(get_options))
        // Session routes
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Main phase routes
        .route("/api/sessions/:id/headlines", post(fetch_headlines))
        .route("/api/sessions/:id/quiz", post(start_quiz))
        // Quiz phase routes
        .route("/api/sessions/:id/quiz/answers", post(select_answer))
        .route("/api/sessions/:id/quiz/submit", post(submit_quiz))
        .route("/api/sessions/:id/quiz/export", get(export_quiz))
        .route("/api/sessions/:id/back", post(go_back))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_fill_missing_fields() {
        let defaults = HeadlineQuery {
            country: "us".to_string(),
            category: "general".to_string(),
            page_size: 3,
        };

        let query = FetchHeadlinesRequest::default().into_query(&defaults);
        assert_eq!(query, defaults);

        let query = FetchHeadlinesRequest {
            country: Some(" IN ".to_string()),
            category: None,
            page_size: Some(5),
        }
        .into_query(&defaults);
        assert_eq!(query.country, "in");
        assert_eq!(query.category, "general");
        assert_eq!(query.page_size, 5);
    }

    #[test]
    fn test_api_response_envelope() {
        let ok = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], 7);
        assert!(ok["error"].is_null());

        let err = serde_json::to_value(ApiResponse::<()>::error("nope".to_string())).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "nope");
    }
}
