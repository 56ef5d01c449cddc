use chrono::{DateTime, Utc};
use role_common::ContentStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("content is already published")]
    AlreadyPublished,
    #[error("content is already a draft")]
    AlreadyDraft,
    #[error("cannot move content from {from} to {to}")]
    InvalidTransition {
        from: ContentStatus,
        to: ContentStatus,
    },
    #[error("cannot schedule publication in the past ({0})")]
    ScheduleInPast(DateTime<Utc>),
}
