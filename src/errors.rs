use crate::api::ApiResponse;
use crate::models::{Phase, QuestionId};
use axum::{http::StatusCode, response::Json};
use tracing::{error, info, warn};

/// Why quiz generation for one summary produced no questions
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Provider(#[source] anyhow::Error),

    #[error("No valid quiz found.")]
    NoQuestions,
}

/// Operations attempted from a state that does not allow them.
///
/// Returning one of these always leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Operation requires the {expected} phase, but the session is in the {actual} phase")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("No summaries available; fetch headlines first")]
    NoSummaries,

    #[error("No quiz has been generated for this session")]
    QuizNotGenerated,

    #[error("Quiz already submitted; go back to start a new attempt")]
    AlreadySubmitted,

    #[error("No question for {0}")]
    UnknownQuestion(QuestionId),

    #[error("'{option}' is not an option of {id}")]
    InvalidOption { id: QuestionId, option: String },
}

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownQuestion(_) => ApiError::NotFound(err.to_string()),
            SessionError::InvalidOption { .. } => ApiError::BadRequest(err.to_string()),
            SessionError::WrongPhase { .. }
            | SessionError::NoSummaries
            | SessionError::QuizNotGenerated
            | SessionError::AlreadySubmitted => ApiError::Conflict(err.to_string()),
        }
    }
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub user_friendly_message: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
            user_friendly_message: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_user_message(mut self, message: &str) -> Self {
        self.user_friendly_message = Some(message.to_string());
        self
    }
}

impl ApiError {
    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error(
                        context
                            .user_friendly_message
                            .unwrap_or_else(|| format!("{} not found", context.resource_type)),
                    )),
                )
            }
            ApiError::ValidationError(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::Conflict(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Operation not allowed in current state"
                );
                (
                    StatusCode::CONFLICT,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::BadRequest(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Bad request"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(self.to_string())),
                )
            }
            ApiError::InternalError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Internal server error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(
                        "An internal error occurred. Please try again.".to_string(),
                    )),
                )
            }
        }
    }
}

/// Helper macro for structured error responses
#[macro_export]
macro_rules! api_error {
    (not_found, $operation:expr, $resource_type:expr, $id:expr) => {
        $crate::errors::ApiError::NotFound(format!("{} with id '{}' not found", $resource_type, $id))
            .to_response_with_context(
                $crate::errors::ErrorContext::new($operation, $resource_type).with_id(&$id.to_string()),
            )
    };

    (validation, $operation:expr, $resource_type:expr, $message:expr) => {
        $crate::errors::ApiError::ValidationError($message.to_string())
            .to_response_with_context($crate::errors::ErrorContext::new($operation, $resource_type))
    };

    (session, $operation:expr, $id:expr, $error:expr) => {
        $crate::errors::ApiError::from($error).to_response_with_context(
            $crate::errors::ErrorContext::new($operation, "session").with_id(&$id.to_string()),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("submit_quiz", "session")
            .with_id("123")
            .with_user_message("Custom message");

        assert_eq!(context.operation, "submit_quiz");
        assert_eq!(context.resource_type, "session");
        assert_eq!(context.resource_id, Some("123".to_string()));
        assert_eq!(
            context.user_friendly_message,
            Some("Custom message".to_string())
        );
    }

    #[test]
    fn test_session_error_classification() {
        let id = QuestionId::new(0, 7);
        assert!(matches!(
            ApiError::from(SessionError::UnknownQuestion(id)),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::InvalidOption {
                id,
                option: "Zebras".to_string()
            }),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::AlreadySubmitted),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::WrongPhase {
                expected: Phase::Quiz,
                actual: Phase::Main
            }),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_api_error_responses() {
        let error = ApiError::NotFound("Session not found".to_string());
        let context = ErrorContext::new("get_session", "session").with_id("123");
        let (status, Json(body)) = error.to_response_with_context(context);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.as_deref(), Some("session not found"));

        let context = ErrorContext::new("get_session", "session")
            .with_user_message("Session not found or expired");
        let (_, Json(body)) =
            ApiError::NotFound("gone".to_string()).to_response_with_context(context);
        assert_eq!(body.error.as_deref(), Some("Session not found or expired"));

        let context = || ErrorContext::new("fetch_headlines", "session");

        let (status, _) = ApiError::ValidationError("bad country".to_string())
            .to_response_with_context(context());
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            ApiError::from(SessionError::NoSummaries).to_response_with_context(context());
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, Json(body)) = ApiError::InternalError(anyhow::anyhow!("lock poisoned"))
            .to_response_with_context(context());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body.error.as_deref(),
            Some("An internal error occurred. Please try again.")
        );
    }

    #[test]
    fn test_generation_error_messages() {
        assert_eq!(GenerationError::NoQuestions.to_string(), "No valid quiz found.");
        let provider = GenerationError::Provider(anyhow::anyhow!("Gemini API request failed: quota"));
        assert_eq!(provider.to_string(), "Gemini API request failed: quota");
    }
}
