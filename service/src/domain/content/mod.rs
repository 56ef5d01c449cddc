pub mod error;
pub mod input;

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use nutype::nutype;
use role_common::{ContentStatus, EntityKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::{error::ContentError, input::DraftInput};

/// A content record as it is persisted: one agenda item, highlight or event.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    /// Assigned on the first save, never changes afterwards
    pub id: ContentId,

    pub entity: EntityKind,

    /// Raw field values, drafts may hold incomplete ones
    pub values: DraftInput,

    pub status: ContentStatus,

    pub audit: AuditTrail,
}

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub Uuid);

impl ContentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ContentId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for ContentId {
    type Error = uuid::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 200),
    derive(Clone, Debug, Display, AsRef, PartialEq, Eq, Serialize)
)]
pub struct ContentTitle(String);

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 64),
    derive(Clone, Debug, Display, AsRef, PartialEq, Eq, Hash, Serialize, Deserialize)
)]
pub struct AdminId(String);

/// Identity of the admin performing an operation.
/// Passed explicitly through every workflow call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    pub admin_id: AdminId,
}

impl AdminContext {
    pub fn new(admin_id: AdminId) -> Self {
        Self { admin_id }
    }
}

/// System metadata: WHO did WHAT WHEN
#[derive(Debug, Clone, PartialEq)]
pub struct AuditTrail {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<AdminId>,

    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<AdminId>,

    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl ContentDraft {
    pub fn new(
        entity: EntityKind,
        values: DraftInput,
        ctx: &AdminContext,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ContentId::new(),
            entity,
            values,
            status: ContentStatus::Draft,
            audit: AuditTrail {
                created_at: now,
                created_by: Some(ctx.admin_id.clone()),
                updated_at: now,
                updated_by: Some(ctx.admin_id.clone()),
                published_at: None,
                scheduled_for: None,
            },
        }
    }

    /// Full replace of the field values, status is kept
    pub fn apply_values(&mut self, values: DraftInput, ctx: &AdminContext, now: DateTime<Utc>) {
        self.values = values;
        self.touch(ctx, now);
    }

    /// Publish immediately
    pub fn publish(&mut self, ctx: &AdminContext, now: DateTime<Utc>) -> Result<(), ContentError> {
        match self.status {
            ContentStatus::Draft | ContentStatus::Scheduled | ContentStatus::Archived => {
                self.status = ContentStatus::Published;
                self.audit.published_at = Some(now);
                self.audit.scheduled_for = None;
                self.touch(ctx, now);
                Ok(())
            }
            ContentStatus::Published => Err(ContentError::AlreadyPublished),
        }
    }

    /// Publish at a later moment
    pub fn schedule(
        &mut self,
        ctx: &AdminContext,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), ContentError> {
        if at <= now {
            return Err(ContentError::ScheduleInPast(at));
        }
        match self.status {
            ContentStatus::Draft | ContentStatus::Scheduled | ContentStatus::Archived => {
                self.status = ContentStatus::Scheduled;
                self.audit.scheduled_for = Some(at);
                self.touch(ctx, now);
                Ok(())
            }
            ContentStatus::Published => Err(ContentError::InvalidTransition {
                from: self.status,
                to: ContentStatus::Scheduled,
            }),
        }
    }

    /// Unpublish back to draft
    pub fn unpublish(&mut self, ctx: &AdminContext, now: DateTime<Utc>) -> Result<(), ContentError> {
        match self.status {
            ContentStatus::Published | ContentStatus::Scheduled => {
                self.status = ContentStatus::Draft;
                self.audit.published_at = None;
                self.audit.scheduled_for = None;
                self.touch(ctx, now);
                Ok(())
            }
            ContentStatus::Draft => Err(ContentError::AlreadyDraft),
            ContentStatus::Archived => Err(ContentError::InvalidTransition {
                from: self.status,
                to: ContentStatus::Draft,
            }),
        }
    }

    pub fn archive(&mut self, ctx: &AdminContext, now: DateTime<Utc>) -> Result<(), ContentError> {
        match self.status {
            ContentStatus::Published | ContentStatus::Scheduled => {
                self.status = ContentStatus::Archived;
                self.audit.scheduled_for = None;
                self.touch(ctx, now);
                Ok(())
            }
            _ => Err(ContentError::InvalidTransition {
                from: self.status,
                to: ContentStatus::Archived,
            }),
        }
    }

    fn touch(&mut self, ctx: &AdminContext, now: DateTime<Utc>) {
        self.audit.updated_at = now;
        self.audit.updated_by = Some(ctx.admin_id.clone());
    }
}
