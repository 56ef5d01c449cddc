use chrono::{DateTime, Utc};
use role_common::{ContentStatus, EntityKind};
use serde::{Deserialize, Serialize};

use crate::domain::content::input::DraftInput;
use crate::domain::content::{ContentDraft, ContentId};
use crate::domain::repository::query::ContentOrder;
use crate::domain::slug::SlugStatus;

#[derive(Debug, Clone, Serialize)]
pub struct ManyContentResponse {
    data: Vec<ContentResponse>,
    meta: MetadataResponse,
}

impl ManyContentResponse {
    pub fn new(items: Vec<ContentDraft>, total: i64, page: u16, page_size: u16) -> Self {
        Self {
            data: items.into_iter().map(ContentResponse::from).collect(),
            meta: MetadataResponse {
                total,
                page,
                page_size,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    total: i64,
    page: u16,
    page_size: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct OneContentResponse {
    data: ContentResponse,
}

impl From<ContentDraft> for OneContentResponse {
    fn from(value: ContentDraft) -> Self {
        Self { data: value.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    id: ContentId,
    entity: EntityKind,
    status: ContentStatus,
    values: DraftInput,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
    published_at: Option<DateTime<Utc>>,
    scheduled_for: Option<DateTime<Utc>>,
}

impl From<ContentDraft> for ContentResponse {
    fn from(value: ContentDraft) -> Self {
        let audit = value.audit;
        Self {
            id: value.id,
            entity: value.entity,
            status: value.status,
            values: value.values,
            created_at: audit.created_at,
            created_by: audit.created_by.map(|admin| admin.to_string()),
            updated_at: audit.updated_at,
            updated_by: audit.updated_by.map(|admin| admin.to_string()),
            published_at: audit.published_at,
            scheduled_for: audit.scheduled_for,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<ContentStatus>,
    pub page: Option<u16>,
    pub page_size: Option<u16>,
    pub order_by: Option<OrderParam>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderParam {
    UpdatedAt,
    StartAt,
}

impl From<OrderParam> for ContentOrder {
    fn from(value: OrderParam) -> Self {
        match value {
            OrderParam::UpdatedAt => ContentOrder::RecentlyUpdated,
            OrderParam::StartAt => ContentOrder::StartAt,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistRequest {
    pub id: Option<ContentId>,
    pub values: DraftInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugParams {
    pub slug: String,
    pub exclude_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlugStatusResponse {
    pub slug: String,
    pub status: SlugStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlugSuggestionResponse {
    pub slug: String,
}
