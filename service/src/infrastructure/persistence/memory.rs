use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use role_common::{ContentStatus, EntityKind};

use crate::domain::content::input::parse_timestamp;
use crate::domain::content::{ContentDraft, ContentId};
use crate::domain::repository::query::{ContentOrder, ContentQuery};
use crate::domain::repository::{ContentRepository, RepositoryError};

type Records = HashMap<(EntityKind, ContentId), ContentDraft>;

/// Process-local storage, used when no database is configured and in tests.
///
/// Mirrors the database constraint: two published or scheduled records of
/// one kind never share a slug.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentRepository {
    records: Arc<RwLock<Records>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContentRepository for InMemoryContentRepository {
    async fn find(
        &self,
        entity: EntityKind,
        query: ContentQuery,
    ) -> Result<Vec<ContentDraft>, RepositoryError> {
        let mut items: Vec<ContentDraft> = self
            .read()
            .values()
            .filter(|draft| draft.entity == entity)
            .filter(|draft| query.status.is_none_or(|status| draft.status == status))
            .cloned()
            .collect();

        match query.order {
            ContentOrder::RecentlyUpdated => {
                items.sort_by(|a, b| b.audit.updated_at.cmp(&a.audit.updated_at))
            }
            ContentOrder::StartAt => items.sort_by_key(|draft| {
                let start = parse_timestamp(&draft.values.start_at);
                (start.is_none(), start)
            }),
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit.max(0) as usize);
        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_id(
        &self,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<Option<ContentDraft>, RepositoryError> {
        Ok(self.read().get(&(entity, id)).cloned())
    }

    async fn slug_taken(
        &self,
        entity: EntityKind,
        slug: &str,
        exclude: Option<ContentId>,
    ) -> Result<bool, RepositoryError> {
        let slug = slug.trim();
        Ok(self.read().values().any(|draft| {
            draft.entity == entity && Some(draft.id) != exclude && draft.values.slug.trim() == slug
        }))
    }

    async fn save(&self, draft: &ContentDraft) -> Result<(), RepositoryError> {
        let mut records = self.write();

        if draft.status.requires_publish_gate() {
            let clash = records.values().any(|other| {
                other.entity == draft.entity
                    && other.id != draft.id
                    && other.status.requires_publish_gate()
                    && other.values.slug.trim() == draft.values.slug.trim()
            });
            if clash {
                return Err(RepositoryError::UniqueViolation(draft.values.slug.clone()));
            }
        }

        records.insert((draft.entity, draft.id), draft.clone());
        Ok(())
    }

    async fn delete(&self, entity: EntityKind, id: ContentId) -> Result<(), RepositoryError> {
        self.write()
            .remove(&(entity, id))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn count(
        &self,
        entity: EntityKind,
        status: Option<ContentStatus>,
    ) -> Result<i64, RepositoryError> {
        let count = self
            .read()
            .values()
            .filter(|draft| draft.entity == entity)
            .filter(|draft| status.is_none_or(|status| draft.status == status))
            .count();
        Ok(count as i64)
    }
}
