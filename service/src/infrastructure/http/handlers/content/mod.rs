use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::AppState;
use crate::domain::content::AdminContext;
use crate::domain::content::input::DraftInput;
use crate::domain::publish_gate::PublishChecklist;
use crate::domain::repository::query::{ContentQuery, MAX_PAGE_SIZE};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::content::dto::{
    ChecklistRequest, ListParams, ManyContentResponse, OneContentResponse, ScheduleRequest,
    SlugParams, SlugStatusResponse, SlugSuggestionResponse,
};
use crate::infrastructure::http::handlers::{parse_content_id, parse_entity};
use crate::infrastructure::http::querystring::QueryString;

mod dto;

const DEFAULT_PAGE_SIZE: u16 = 25;

pub async fn list_content<S: AppState>(
    Path(entity): Path<String>,
    QueryString(params): QueryString<ListParams>,
    State(state): State<S>,
) -> Result<ApiSuccess<ManyContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut query = ContentQuery::new().paginate(page, page_size);
    if let Some(status) = params.status {
        query = query.with_status(status);
    }
    if let Some(order) = params.order_by {
        query = query.order_by(order.into());
    }

    let (items, total) = state.workflow().list(entity, query).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        ManyContentResponse::new(items, total, page, page_size),
    ))
}

pub async fn create_content<S: AppState>(
    Path(entity): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
    Json(values): Json<DraftInput>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let draft = state.workflow().create_draft(&ctx, entity, values).await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, draft.into()))
}

pub async fn find_content_by_id<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    State(state): State<S>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().get(entity, id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

pub async fn update_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
    Json(values): Json<DraftInput>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().save(&ctx, entity, id, values).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

pub async fn delete_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<StatusCode, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    state.workflow().delete(&ctx, entity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().publish(&ctx, entity, id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

pub async fn schedule_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
    Json(request): Json<ScheduleRequest>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().schedule(&ctx, entity, id, request.at).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

pub async fn unpublish_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().unpublish(&ctx, entity, id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

pub async fn archive_content<S: AppState>(
    Path((entity, id)): Path<(String, String)>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<OneContentResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let id = parse_content_id(&id)?;
    let draft = state.workflow().archive(&ctx, entity, id).await?;
    Ok(ApiSuccess::new(StatusCode::OK, draft.into()))
}

/// Live checklist for unsaved values
pub async fn content_checklist<S: AppState>(
    Path(entity): Path<String>,
    State(state): State<S>,
    Json(request): Json<ChecklistRequest>,
) -> Result<ApiSuccess<PublishChecklist>, ApiError> {
    let entity = parse_entity(&entity)?;
    let checklist = state
        .workflow()
        .checklist(entity, &request.values, request.id)
        .await?;
    Ok(ApiSuccess::new(StatusCode::OK, checklist))
}

pub async fn check_slug<S: AppState>(
    Path(entity): Path<String>,
    QueryString(params): QueryString<SlugParams>,
    State(state): State<S>,
) -> Result<ApiSuccess<SlugStatusResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let exclude = params.exclude_id.as_deref().map(parse_content_id).transpose()?;
    let status = state.workflow().check_slug(entity, &params.slug, exclude).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        SlugStatusResponse {
            slug: params.slug,
            status,
        },
    ))
}

pub async fn suggest_slug<S: AppState>(
    Path(entity): Path<String>,
    QueryString(params): QueryString<SlugParams>,
    State(state): State<S>,
) -> Result<ApiSuccess<SlugSuggestionResponse>, ApiError> {
    let entity = parse_entity(&entity)?;
    let exclude = params.exclude_id.as_deref().map(parse_content_id).transpose()?;
    let slug = state.workflow().suggest_slug(entity, &params.slug, exclude).await?;
    Ok(ApiSuccess::new(StatusCode::OK, SlugSuggestionResponse { slug }))
}
