use axum::http::StatusCode;
use role_common::EntityKind;
use uuid::Uuid;

use crate::domain::content::ContentId;
use crate::infrastructure::http::api::ApiError;

pub mod content;
pub mod editor;
pub mod meta;
pub mod telemetry;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Unknown kinds are reported as missing resources
fn parse_entity(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse::<EntityKind>().map_err(|_| ApiError::NotFound)
}

fn parse_content_id(raw: &str) -> Result<ContentId, ApiError> {
    ContentId::try_from(raw).map_err(|err| ApiError::UnprocessableEntity(err.to_string()))
}

fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|err| ApiError::UnprocessableEntity(err.to_string()))
}
