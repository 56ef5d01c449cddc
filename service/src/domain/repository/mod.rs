use std::future::Future;

use role_common::{ContentStatus, EntityKind};

use crate::domain::content::{ContentDraft, ContentId};
use crate::domain::repository::query::ContentQuery;

pub mod query;

/// Storage of content records, one table per entity kind.
/// Writes are full-row upserts, never field-level patches.
pub trait ContentRepository: Clone + Send + Sync + 'static {
    /// Find records matching query
    fn find(
        &self,
        entity: EntityKind,
        query: ContentQuery,
    ) -> impl Future<Output = Result<Vec<ContentDraft>, RepositoryError>> + Send;

    /// Find single record by ID
    fn find_by_id(
        &self,
        entity: EntityKind,
        id: ContentId,
    ) -> impl Future<Output = Result<Option<ContentDraft>, RepositoryError>> + Send;

    /// Whether another record of the same kind already uses `slug`
    fn slug_taken(
        &self,
        entity: EntityKind,
        slug: &str,
        exclude: Option<ContentId>,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert or fully replace a record
    fn save(
        &self,
        draft: &ContentDraft,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Hard delete
    fn delete(
        &self,
        entity: EntityKind,
        id: ContentId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Get total count of records, optionally with one status
    fn count(
        &self,
        entity: EntityKind,
        status: Option<ContentStatus>,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    DatabaseError(String),
}
