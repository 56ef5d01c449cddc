use chrono::{DateTime, Utc};
use role_common::{ContentStatus, EntityKind, EntitySchema, EntitySchemas, Field};

use crate::domain::content::error::ContentError;
use crate::domain::content::input::{DraftInput, FieldErrors};
use crate::domain::content::{AdminContext, ContentDraft, ContentId};
use crate::domain::publish_gate::{self, PublishChecklist};
use crate::domain::repository::query::ContentQuery;
use crate::domain::repository::{ContentRepository, RepositoryError};
use crate::domain::slug::{SlugStatus, derive_slug, with_suffix};

#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    /// bound of the suffix loop in [`ContentWorkflow::suggest_slug`]
    pub max_slug_attempts: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_slug_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkflowError {
    #[error("no schema registered for {0}")]
    SchemaMissing(EntityKind),
    #[error("content not found")]
    NotFound,
    #[error("invalid values: {0}")]
    Validation(FieldErrors),
    #[error("record is not ready to be published")]
    PublishBlocked(PublishChecklist),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("slug '{0}' is already in use")]
    SlugConflict(String),
    #[error("no free slug for '{base}' after {attempts} attempts")]
    SlugAttemptsExhausted { base: String, attempts: u32 },
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => WorkflowError::NotFound,
            RepositoryError::UniqueViolation(slug) => WorkflowError::SlugConflict(slug),
            other => WorkflowError::Repository(other),
        }
    }
}

/// Draft/publish workflow shared by every entity kind.
///
/// Each operation takes the acting admin explicitly. Everything that can
/// make a record publicly visible goes through the publish gate again here,
/// whatever the client already checked.
#[derive(Debug, Clone)]
pub struct ContentWorkflow<R: ContentRepository> {
    repository: R,
    schemas: &'static dyn EntitySchemas,
    settings: WorkflowSettings,
}

impl<R: ContentRepository> ContentWorkflow<R> {
    pub fn new(repository: R, schemas: &'static dyn EntitySchemas, settings: WorkflowSettings) -> Self {
        Self {
            repository,
            schemas,
            settings,
        }
    }

    pub fn schemas(&self) -> &'static dyn EntitySchemas {
        self.schemas
    }

    pub fn schema(&self, entity: EntityKind) -> Result<&'static EntitySchema, WorkflowError> {
        self.schemas
            .get(entity)
            .ok_or(WorkflowError::SchemaMissing(entity))
    }

    pub async fn create_draft(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        mut values: DraftInput,
    ) -> Result<ContentDraft, WorkflowError> {
        self.schema(entity)?;
        values.normalize();
        if !values.is_set(Field::Slug) {
            values.slug = derive_slug(&values.title);
        }
        values.validate_title().map_err(WorkflowError::Validation)?;

        let draft = ContentDraft::new(entity, values, ctx, Utc::now());
        self.repository.save(&draft).await?;

        tracing::info!(%entity, id = %draft.id, admin = %ctx.admin_id, "draft created");
        Ok(draft)
    }

    pub async fn get(&self, entity: EntityKind, id: ContentId) -> Result<ContentDraft, WorkflowError> {
        self.repository
            .find_by_id(entity, id)
            .await?
            .ok_or(WorkflowError::NotFound)
    }

    pub async fn list(
        &self,
        entity: EntityKind,
        query: ContentQuery,
    ) -> Result<(Vec<ContentDraft>, i64), WorkflowError> {
        let total = self.repository.count(entity, query.status).await?;
        let items = self.repository.find(entity, query).await?;
        Ok((items, total))
    }

    /// Full replace of the values, status unchanged.
    ///
    /// Drafts only need a title; live and scheduled records stay behind the
    /// full publish gate.
    pub async fn save(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
        mut values: DraftInput,
    ) -> Result<ContentDraft, WorkflowError> {
        let mut draft = self.get(entity, id).await?;
        values.normalize();
        if draft.status.requires_publish_gate() {
            self.ensure_publishable(entity, id, &mut values).await?;
        } else {
            values.validate_title().map_err(WorkflowError::Validation)?;
        }

        draft.apply_values(values, ctx, Utc::now());
        self.repository.save(&draft).await?;

        tracing::debug!(%entity, %id, status = %draft.status, "content saved");
        Ok(draft)
    }

    pub async fn publish(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<ContentDraft, WorkflowError> {
        let mut draft = self.get(entity, id).await?;
        if draft.status == ContentStatus::Published {
            return Err(ContentError::AlreadyPublished.into());
        }

        let mut values = draft.values.clone();
        self.ensure_publishable(entity, id, &mut values).await?;

        let now = Utc::now();
        draft.apply_values(values, ctx, now);
        draft.publish(ctx, now)?;
        self.repository.save(&draft).await?;

        tracing::info!(%entity, %id, admin = %ctx.admin_id, "content published");
        Ok(draft)
    }

    pub async fn schedule(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
        at: DateTime<Utc>,
    ) -> Result<ContentDraft, WorkflowError> {
        let now = Utc::now();
        if at <= now {
            return Err(ContentError::ScheduleInPast(at).into());
        }
        let mut draft = self.get(entity, id).await?;
        if draft.status == ContentStatus::Published {
            return Err(ContentError::InvalidTransition {
                from: draft.status,
                to: ContentStatus::Scheduled,
            }
            .into());
        }

        let mut values = draft.values.clone();
        self.ensure_publishable(entity, id, &mut values).await?;

        draft.apply_values(values, ctx, now);
        draft.schedule(ctx, at, now)?;
        self.repository.save(&draft).await?;

        tracing::info!(%entity, %id, %at, admin = %ctx.admin_id, "content scheduled");
        Ok(draft)
    }

    pub async fn unpublish(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<ContentDraft, WorkflowError> {
        let mut draft = self.get(entity, id).await?;
        draft.unpublish(ctx, Utc::now())?;
        self.repository.save(&draft).await?;

        tracing::info!(%entity, %id, admin = %ctx.admin_id, "content unpublished");
        Ok(draft)
    }

    pub async fn archive(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<ContentDraft, WorkflowError> {
        let mut draft = self.get(entity, id).await?;
        draft.archive(ctx, Utc::now())?;
        self.repository.save(&draft).await?;

        tracing::info!(%entity, %id, admin = %ctx.admin_id, "content archived");
        Ok(draft)
    }

    pub async fn delete(
        &self,
        ctx: &AdminContext,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<(), WorkflowError> {
        self.repository.delete(entity, id).await?;
        tracing::info!(%entity, %id, admin = %ctx.admin_id, "content deleted");
        Ok(())
    }

    /// Availability of `slug`, the record `exclude` does not conflict with itself.
    pub async fn check_slug(
        &self,
        entity: EntityKind,
        slug: &str,
        exclude: Option<ContentId>,
    ) -> Result<SlugStatus, WorkflowError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(SlugStatus::Idle);
        }
        let taken = self.repository.slug_taken(entity, slug, exclude).await?;
        Ok(if taken {
            SlugStatus::Taken
        } else {
            SlugStatus::Available
        })
    }

    /// First free slug among `base`, `base-2`, `base-3`...
    pub async fn suggest_slug(
        &self,
        entity: EntityKind,
        base: &str,
        exclude: Option<ContentId>,
    ) -> Result<String, WorkflowError> {
        let base = derive_slug(base);
        let attempts = self.settings.max_slug_attempts.max(1);

        for attempt in 1..=attempts {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                with_suffix(&base, attempt)
            };
            if candidate.is_empty() {
                continue;
            }
            if !self.repository.slug_taken(entity, &candidate, exclude).await? {
                return Ok(candidate);
            }
        }

        tracing::warn!(%entity, %base, attempts, "slug suggestion gave up");
        Err(WorkflowError::SlugAttemptsExhausted { base, attempts })
    }

    /// Live checklist for values not necessarily saved yet.
    pub async fn checklist(
        &self,
        entity: EntityKind,
        values: &DraftInput,
        id: Option<ContentId>,
    ) -> Result<PublishChecklist, WorkflowError> {
        let schema = self.schema(entity)?;
        let slug_available = self.check_slug(entity, &values.slug, id).await? != SlugStatus::Taken;
        Ok(publish_gate::evaluate(schema, values, slug_available))
    }

    /// Validation, slug uniqueness and the publish gate; rounds start/end on success.
    async fn ensure_publishable(
        &self,
        entity: EntityKind,
        id: ContentId,
        values: &mut DraftInput,
    ) -> Result<(), WorkflowError> {
        let schema = self.schema(entity)?;
        let validated = values.validate().map_err(WorkflowError::Validation)?;

        let checklist = self.checklist(entity, values, Some(id)).await?;
        if !checklist.can_publish {
            tracing::debug!(%entity, %id, missing = ?checklist.missing_fields, "publish blocked");
            return Err(WorkflowError::PublishBlocked(checklist));
        }

        publish_gate::round_schedule(schema, values, &validated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use role_common::test_utils::bundled_schemas;

    use super::*;
    use crate::domain::content::AdminId;
    use crate::infrastructure::persistence::memory::InMemoryContentRepository;

    fn workflow() -> ContentWorkflow<InMemoryContentRepository> {
        ContentWorkflow::new(
            InMemoryContentRepository::new(),
            bundled_schemas(),
            WorkflowSettings::default(),
        )
    }

    fn admin() -> AdminContext {
        AdminContext::new(AdminId::try_new("ana").unwrap())
    }

    fn complete(title: &str) -> DraftInput {
        DraftInput::new(title)
            .with(Field::City, "Belo Horizonte")
            .with(Field::StartAt, "2026-11-20T18:07")
            .with(Field::EndAt, "2026-11-20T23:00")
            .with(Field::CoverUrl, "https://cdn.example.com/parque.jpg")
            .with(Field::CoverAlt, "Palco no parque")
    }

    #[tokio::test]
    async fn test_show_no_parque_scenario() {
        let workflow = workflow();
        let ctx = admin();
        let entity = EntityKind::AgendaItem;

        let draft = workflow
            .create_draft(&ctx, entity, DraftInput::new("Show no Parque"))
            .await
            .unwrap();
        assert_eq!(draft.status, ContentStatus::Draft);
        assert_eq!(draft.values.slug, "show-no-parque");

        let checklist = workflow.checklist(entity, &draft.values, Some(draft.id)).await.unwrap();
        assert!(!checklist.can_publish);
        for field in [Field::City, Field::StartAt, Field::EndAt, Field::CoverUrl] {
            assert!(checklist.missing_fields.contains(&field), "{field} should be missing");
        }

        let blocked = workflow.publish(&ctx, entity, draft.id).await;
        assert!(matches!(blocked, Err(WorkflowError::PublishBlocked(_))));

        let values = complete("Show no Parque").with(Field::Slug, "show-no-parque");
        let saved = workflow.save(&ctx, entity, draft.id, values).await.unwrap();
        let checklist = workflow.checklist(entity, &saved.values, Some(saved.id)).await.unwrap();
        assert!(checklist.can_publish);

        let published = workflow.publish(&ctx, entity, draft.id).await.unwrap();
        assert_eq!(published.status, ContentStatus::Published);
        assert!(published.audit.published_at.is_some());
        // agenda items round to the quarter hour
        assert_eq!(published.values.start_at, "2026-11-20T18:00:00Z");

        let again = workflow.publish(&ctx, entity, draft.id).await;
        assert!(matches!(
            again,
            Err(WorkflowError::Content(ContentError::AlreadyPublished))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let result = workflow()
            .create_draft(&admin(), EntityKind::Event, DraftInput::default())
            .await;
        match result {
            Err(WorkflowError::Validation(errors)) => assert!(errors.contains(Field::Title)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_draft_save_tolerates_invalid_fields_until_publish() {
        let workflow = workflow();
        let ctx = admin();
        let entity = EntityKind::AgendaItem;

        let values = complete("Jazz")
            .with(Field::TicketUrl, "ingressos.com")
            .with(Field::StartAt, "amanhã");
        let draft = workflow.create_draft(&ctx, entity, values.clone()).await.unwrap();
        assert_eq!(draft.values.ticket_url, "ingressos.com");

        let saved = workflow
            .save(&ctx, entity, draft.id, values.with(Field::Title, "Jazz ao vivo"))
            .await
            .unwrap();
        assert_eq!(saved.values.title, "Jazz ao vivo");

        match workflow.publish(&ctx, entity, draft.id).await {
            Err(WorkflowError::Validation(errors)) => {
                assert!(errors.contains(Field::TicketUrl));
                assert!(errors.contains(Field::StartAt));
            }
            other => panic!("unexpected {other:?}"),
        }
        let untitled = workflow
            .save(&ctx, entity, draft.id, saved.values.with(Field::Title, ""))
            .await;
        assert!(matches!(untitled, Err(WorkflowError::Validation(_))));
    }

    #[tokio::test]
    async fn test_padded_slug_conflicts_with_bare_slug() {
        let workflow = workflow();
        let ctx = admin();
        let entity = EntityKind::AgendaItem;

        let padded = DraftInput {
            slug: " jazz ".into(),
            ..complete("Jazz")
        };
        let first = workflow.create_draft(&ctx, entity, padded).await.unwrap();
        assert_eq!(first.values.slug, "jazz");
        workflow.publish(&ctx, entity, first.id).await.unwrap();

        let second = workflow
            .create_draft(&ctx, entity, complete("Jazz de novo").with(Field::Slug, "jazz-2"))
            .await
            .unwrap();
        let bare = DraftInput {
            slug: "jazz".into(),
            ..second.values.clone()
        };
        workflow.save(&ctx, entity, second.id, bare).await.unwrap();

        let status = workflow.check_slug(entity, "jazz", Some(second.id)).await.unwrap();
        assert_eq!(status, SlugStatus::Taken);
        match workflow.publish(&ctx, entity, second.id).await {
            Err(WorkflowError::PublishBlocked(checklist)) => assert!(checklist.slug_conflict),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slug_check_excludes_self() {
        let workflow = workflow();
        let entity = EntityKind::Highlight;
        let draft = workflow
            .create_draft(&admin(), entity, DraftInput::new("Forró & Samba!!"))
            .await
            .unwrap();

        let own = workflow.check_slug(entity, "forro-samba", Some(draft.id)).await.unwrap();
        assert_eq!(own, SlugStatus::Available);

        let other = workflow.check_slug(entity, "forro-samba", None).await.unwrap();
        assert_eq!(other, SlugStatus::Taken);

        // other kinds have their own namespace
        let event = workflow.check_slug(EntityKind::Event, "forro-samba", None).await.unwrap();
        assert_eq!(event, SlugStatus::Available);

        assert_eq!(workflow.check_slug(entity, "  ", None).await.unwrap(), SlugStatus::Idle);
    }

    #[tokio::test]
    async fn test_suggest_slug_appends_counter() {
        let workflow = workflow();
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        workflow.create_draft(&ctx, entity, DraftInput::new("Jazz")).await.unwrap();
        workflow
            .create_draft(&ctx, entity, DraftInput::new("Jazz").with(Field::Slug, "jazz-2"))
            .await
            .unwrap();

        let suggestion = workflow.suggest_slug(entity, "Jazz", None).await.unwrap();
        assert_eq!(suggestion, "jazz-3");
    }

    #[tokio::test]
    async fn test_suggest_slug_is_bounded() {
        let workflow = ContentWorkflow::new(
            InMemoryContentRepository::new(),
            bundled_schemas(),
            WorkflowSettings { max_slug_attempts: 2 },
        );
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        workflow.create_draft(&ctx, entity, DraftInput::new("Jazz")).await.unwrap();
        workflow
            .create_draft(&ctx, entity, DraftInput::new("Jazz").with(Field::Slug, "jazz-2"))
            .await
            .unwrap();

        let result = workflow.suggest_slug(entity, "jazz", None).await;
        assert!(matches!(
            result,
            Err(WorkflowError::SlugAttemptsExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_rejects_taken_slug() {
        let workflow = workflow();
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        workflow.create_draft(&ctx, entity, complete("Jazz")).await.unwrap();
        let twin = workflow
            .create_draft(&ctx, entity, complete("Jazz").with(Field::Slug, "jazz-ao-vivo"))
            .await
            .unwrap();

        let values = twin.values.clone().with(Field::Slug, "jazz");
        workflow.save(&ctx, entity, twin.id, values).await.unwrap();

        match workflow.publish(&ctx, entity, twin.id).await {
            Err(WorkflowError::PublishBlocked(checklist)) => assert!(checklist.slug_conflict),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_published_record_keeps_passing_gate_on_save() {
        let workflow = workflow();
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        let draft = workflow.create_draft(&ctx, entity, complete("Jazz")).await.unwrap();
        let published = workflow.publish(&ctx, entity, draft.id).await.unwrap();

        let emptied = published.values.clone().with(Field::City, "");
        let result = workflow.save(&ctx, entity, draft.id, emptied).await;
        assert!(matches!(result, Err(WorkflowError::PublishBlocked(_))));

        let stored = workflow.get(entity, draft.id).await.unwrap();
        assert_eq!(stored.values.city, "Belo Horizonte");
    }

    #[tokio::test]
    async fn test_schedule_unpublish_archive_transitions() {
        let workflow = workflow();
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        let draft = workflow.create_draft(&ctx, entity, complete("Jazz")).await.unwrap();

        let past = workflow.schedule(&ctx, entity, draft.id, Utc::now() - Duration::hours(1)).await;
        assert!(matches!(
            past,
            Err(WorkflowError::Content(ContentError::ScheduleInPast(_)))
        ));

        let at = Utc::now() + Duration::days(3);
        let scheduled = workflow.schedule(&ctx, entity, draft.id, at).await.unwrap();
        assert_eq!(scheduled.status, ContentStatus::Scheduled);
        assert_eq!(scheduled.audit.scheduled_for, Some(at));

        let archived = workflow.archive(&ctx, entity, draft.id).await.unwrap();
        assert_eq!(archived.status, ContentStatus::Archived);

        let unpublish = workflow.unpublish(&ctx, entity, draft.id).await;
        assert!(matches!(
            unpublish,
            Err(WorkflowError::Content(ContentError::InvalidTransition { .. }))
        ));

        let republished = workflow.publish(&ctx, entity, draft.id).await.unwrap();
        assert_eq!(republished.status, ContentStatus::Published);
        let back = workflow.unpublish(&ctx, entity, draft.id).await.unwrap();
        assert_eq!(back.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let workflow = workflow();
        let entity = EntityKind::Event;
        let ctx = admin();
        let draft = workflow.create_draft(&ctx, entity, DraftInput::new("Sarau")).await.unwrap();

        workflow.delete(&ctx, entity, draft.id).await.unwrap();
        assert!(matches!(workflow.get(entity, draft.id).await, Err(WorkflowError::NotFound)));
        assert!(matches!(
            workflow.delete(&ctx, entity, draft.id).await,
            Err(WorkflowError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let workflow = workflow();
        let entity = EntityKind::AgendaItem;
        let ctx = admin();
        let first = workflow.create_draft(&ctx, entity, complete("Jazz")).await.unwrap();
        workflow.create_draft(&ctx, entity, DraftInput::new("Choro")).await.unwrap();
        workflow.publish(&ctx, entity, first.id).await.unwrap();

        let (items, total) = workflow
            .list(entity, ContentQuery::new().with_status(ContentStatus::Published))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, first.id);

        let (all, total) = workflow.list(entity, ContentQuery::new()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);
    }
}
