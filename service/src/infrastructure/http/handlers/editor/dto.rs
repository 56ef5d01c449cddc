use role_common::{EntityKind, Field};
use serde::{Deserialize, Serialize};

use crate::domain::content::ContentId;
use crate::domain::editor::LeaveOutcome;
use crate::domain::navigation::LeaveChoice;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub entity: EntityKind,
    pub content_id: Option<ContentId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaveRequest {
    pub choice: Option<LeaveChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveResponse {
    pub outcome: LeaveOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnloadResponse {
    pub confirm: bool,
}
