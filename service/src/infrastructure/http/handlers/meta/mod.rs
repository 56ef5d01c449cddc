use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::AppState;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::meta::dto::{DetailedEntityResponse, EntityResponse};
use crate::infrastructure::http::handlers::parse_entity;

mod dto;

pub async fn entities_metadata<S: AppState>(
    State(state): State<S>,
) -> Result<ApiSuccess<Vec<EntityResponse>>, ApiError> {
    let mut result = state
        .schemas()
        .schemas()
        .map(EntityResponse::from)
        .collect::<Vec<_>>();
    result.sort_by_key(|entity| entity.entity);

    Ok(ApiSuccess::new(StatusCode::OK, result))
}

pub async fn one_entity_metadata<S: AppState>(
    Path(entity): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<DetailedEntityResponse>, ApiError> {
    let entity = parse_entity(&entity)?;

    state
        .schemas()
        .get(entity)
        .map(DetailedEntityResponse::from)
        .map(|schema| ApiSuccess::new(StatusCode::OK, schema))
        .ok_or(ApiError::NotFound)
}
