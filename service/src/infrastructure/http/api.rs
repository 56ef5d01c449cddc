use axum::http::StatusCode;
use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::content::error::ContentError;
use crate::domain::content::input::FieldErrors;
use crate::domain::publish_gate::PublishChecklist;
use crate::domain::repository::RepositoryError;
use crate::domain::workflow::WorkflowError;

// ApiSucess is a wrapper around a response that includes a status code.

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ApiError is a wrapper around a response that includes a status code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    ValidationFailed(FieldErrors),
    PublishBlocked(PublishChecklist),
    ConflictWithServerState(String),
    Unauthorized(String),
    NotFound,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::UniqueViolation(slug) => {
                Self::ConflictWithServerState(format!("slug '{slug}' is already in use"))
            }
            RepositoryError::DatabaseError(cause) => {
                tracing::error!("{:?}", cause);
                Self::InternalServerError("Database server error".to_string())
            }
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(value: WorkflowError) -> Self {
        match value {
            WorkflowError::SchemaMissing(_) | WorkflowError::NotFound => Self::NotFound,
            WorkflowError::Validation(errors) => Self::ValidationFailed(errors),
            WorkflowError::PublishBlocked(checklist) => Self::PublishBlocked(checklist),
            WorkflowError::Content(e @ ContentError::ScheduleInPast(_)) => {
                Self::UnprocessableEntity(e.to_string())
            }
            e @ (WorkflowError::Content(_)
            | WorkflowError::SlugConflict(_)
            | WorkflowError::SlugAttemptsExhausted { .. }) => {
                Self::ConflictWithServerState(e.to_string())
            }
            WorkflowError::Repository(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        match self {
            InternalServerError(e) => {
                tracing::error!("{}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            UnprocessableEntity(message) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, message, None)
            }
            ValidationFailed(errors) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid values".to_string(),
                serde_json::to_value(&errors).ok(),
            ),
            PublishBlocked(checklist) => error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "record is not ready to be published".to_string(),
                serde_json::to_value(&checklist).ok(),
            ),
            ConflictWithServerState(message) => error_response(StatusCode::CONFLICT, message, None),
            Unauthorized(message) => error_response(StatusCode::UNAUTHORIZED, message, None),
            NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

fn error_response(status: StatusCode, message: String, details: Option<serde_json::Value>) -> Response {
    (status, Json(ApiResponseBody::new_error(status, message, details))).into_response()
}

// Generic response structure shared by all API responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    pub status_code: u16,
    pub data: T,
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message, details },
        }
    }
}

/// The response data format for all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    /// field errors or the publish checklist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use role_common::{ContentStatus, EntityKind, Field};

    use super::*;

    #[test]
    fn test_workflow_errors_map_to_status_codes() {
        let cases = [
            (WorkflowError::NotFound, StatusCode::NOT_FOUND),
            (WorkflowError::SchemaMissing(EntityKind::Event), StatusCode::NOT_FOUND),
            (
                WorkflowError::Validation(FieldErrors::single(Field::Title, "title is required")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                WorkflowError::Content(ContentError::AlreadyPublished),
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::Content(ContentError::InvalidTransition {
                    from: ContentStatus::Archived,
                    to: ContentStatus::Draft,
                }),
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::SlugConflict("jazz".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::Repository(RepositoryError::DatabaseError("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            let response = ApiError::from(error.clone()).into_response();
            assert_eq!(response.status(), status, "{error:?}");
        }
    }

    #[test]
    fn test_database_errors_are_masked() {
        let error = ApiError::from(RepositoryError::DatabaseError("password leaked".to_string()));
        assert_eq!(
            error,
            ApiError::InternalServerError("Database server error".to_string())
        );
    }
}
