use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::AppState;
use crate::domain::content::AdminContext;
use crate::domain::editor::{DraftEditor, EditorSnapshot, LeaveOutcome, SessionId};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::editor::dto::{
    LeaveRequest, LeaveResponse, OpenSessionRequest, UnloadResponse, UpdateFieldRequest,
};
use crate::infrastructure::http::handlers::parse_uuid;

mod dto;

/// Session of the requesting admin; sessions of other admins look missing.
fn find_editor<S: AppState>(
    state: &S,
    session_id: &str,
    ctx: &AdminContext,
) -> Result<Arc<DraftEditor<S::R>>, ApiError> {
    let session_id = SessionId(parse_uuid(session_id)?);
    state
        .editors()
        .get(session_id)
        .filter(|editor| editor.admin_id() == &ctx.admin_id)
        .ok_or(ApiError::NotFound)
}

pub async fn open_session<S: AppState>(
    ctx: AdminContext,
    State(state): State<S>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = state
        .editors()
        .open(ctx, request.entity, request.content_id)
        .await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, editor.snapshot()))
}

pub async fn session_snapshot<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

/// Closes without saving, the client asked the guard beforehand
pub async fn close_session<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<StatusCode, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    state.editors().close(editor.session_id());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_field<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
    Json(request): Json<UpdateFieldRequest>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    editor.update_field(request.field, request.value);
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

pub async fn check_session_slug<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    editor.check_slug().await?;
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

pub async fn suggest_session_slug<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    editor.suggest_slug().await?;
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

pub async fn save_session<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    editor.save_draft().await?;
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

pub async fn publish_session<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<EditorSnapshot>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    editor.publish().await?;
    Ok(ApiSuccess::new(StatusCode::OK, editor.snapshot()))
}

/// In-app navigation away from the editor, the session ends once the admin leaves
pub async fn leave_session<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
    request: Option<Json<LeaveRequest>>,
) -> Result<ApiSuccess<LeaveResponse>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    let Json(request) = request.unwrap_or_default();

    let outcome = editor.request_leave(request.choice).await?;
    if outcome == LeaveOutcome::Left {
        state.editors().close(editor.session_id());
    }
    Ok(ApiSuccess::new(StatusCode::OK, LeaveResponse { outcome }))
}

/// Whether the browser should prompt before closing the tab
pub async fn before_unload<S: AppState>(
    Path(session_id): Path<String>,
    ctx: AdminContext,
    State(state): State<S>,
) -> Result<ApiSuccess<UnloadResponse>, ApiError> {
    let editor = find_editor(&state, &session_id, &ctx)?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        UnloadResponse {
            confirm: editor.before_unload(),
        },
    ))
}
