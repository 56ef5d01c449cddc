mod sessions;

pub use sessions::{EditorSessions, SessionId};

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use role_common::{ContentStatus, EntityKind, EntitySchema, Field};
use serde::Serialize;
use tokio::time::Instant;

use crate::domain::autosave::{AutosaveOutcome, AutosaveTimer};
use crate::domain::content::input::{DraftInput, FieldErrors};
use crate::domain::content::error::ContentError;
use crate::domain::content::{AdminContext, AdminId, ContentDraft, ContentId};
use crate::domain::form::FormState;
use crate::domain::navigation::{GuardResolution, LeaveChoice, NavigationDecision, NavigationGuard};
use crate::domain::publish_gate::{self, PublishChecklist};
use crate::domain::repository::ContentRepository;
use crate::domain::slug::{SlugStatus, SlugValidator};
use crate::domain::workflow::{ContentWorkflow, WorkflowError};

/// Everything the admin UI renders for one editing session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub session_id: SessionId,
    pub entity: EntityKind,
    pub content_id: Option<ContentId>,
    pub status: Option<ContentStatus>,
    pub values: DraftInput,
    pub errors: FieldErrors,
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub slug_status: SlugStatus,
    pub checklist: PublishChecklist,
    pub navigation: NavigationDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaveOutcome {
    Left,
    Stayed,
    ConfirmationRequired,
}

#[derive(Debug)]
struct EditorState {
    form: FormState,
    /// None until the first save creates the record
    record: Option<(ContentId, ContentStatus)>,
    publishing: bool,
}

/// One record being edited by one admin.
///
/// Ties together the form state, the slug validator, the autosave timer and
/// the navigation guard. Saves of one editor never overlap: manual save,
/// autosave and publish all go through `persist_lock`.
#[derive(Debug)]
pub struct DraftEditor<R: ContentRepository> {
    session_id: SessionId,
    entity: EntityKind,
    schema: &'static EntitySchema,
    admin: AdminContext,
    workflow: ContentWorkflow<R>,
    state: Mutex<EditorState>,
    slug: SlugValidator,
    persist_lock: tokio::sync::Mutex<()>,
    autosave: AutosaveTimer,
    last_active: Mutex<Instant>,
}

impl<R: ContentRepository> DraftEditor<R> {
    /// Editor for a new record when `existing` is None.
    ///
    /// Must be called within a tokio runtime, the autosave timer runs as a task.
    pub fn open(
        session_id: SessionId,
        admin: AdminContext,
        workflow: ContentWorkflow<R>,
        schema: &'static EntitySchema,
        existing: Option<ContentDraft>,
        default_delay: Duration,
    ) -> Arc<Self> {
        let delay = schema.autosave_delay.unwrap_or(default_delay);
        let (form, record) = match existing {
            Some(draft) => (
                FormState::from_values(draft.values, Some(draft.audit.updated_at)),
                Some((draft.id, draft.status)),
            ),
            None => (FormState::default(), None),
        };

        Arc::new_cyclic(|editor: &Weak<Self>| {
            let editor = editor.clone();
            let autosave = AutosaveTimer::spawn(delay, move || {
                let editor = editor.upgrade();
                async move {
                    match editor {
                        Some(editor) => editor.autosave().await,
                        None => AutosaveOutcome::Closed,
                    }
                }
            });

            Self {
                session_id,
                entity: schema.entity,
                schema,
                admin,
                workflow,
                state: Mutex::new(EditorState {
                    form,
                    record,
                    publishing: false,
                }),
                slug: SlugValidator::default(),
                persist_lock: tokio::sync::Mutex::new(()),
                autosave,
                last_active: Mutex::new(Instant::now()),
            }
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn admin_id(&self) -> &AdminId {
        &self.admin.admin_id
    }

    /// Records admin activity; timer-driven autosaves do not count.
    pub fn touch_activity(&self) {
        *self.last_active.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().form.is_dirty()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let slug_status = self.slug.status();
        let navigation = self.guard().decision();
        let state = self.lock();
        let checklist = publish_gate::evaluate(
            self.schema,
            state.form.values(),
            slug_status != SlugStatus::Taken,
        );

        EditorSnapshot {
            session_id: self.session_id,
            entity: self.entity,
            content_id: state.record.map(|(id, _)| id),
            status: state.record.map(|(_, status)| status),
            values: state.form.values().clone(),
            errors: state.form.errors().clone(),
            dirty: state.form.is_dirty(),
            last_saved_at: state.form.last_saved_at(),
            slug_status,
            checklist,
            navigation,
        }
    }

    /// Returns whether the slug changed, in which case it needs a new check.
    pub fn update_field(&self, field: Field, value: impl Into<String>) -> bool {
        let mut state = self.lock();
        let slug_changed = state.form.update(field, value);
        // reset under the state lock, like `begin` in check_slug
        if slug_changed {
            self.slug.reset(SlugStatus::Idle);
        }
        drop(state);
        self.autosave.touch();
        slug_changed
    }

    /// Checks the current slug. A check superseded by a newer one does not
    /// change the indicator; the latest known status is returned.
    pub async fn check_slug(&self) -> Result<SlugStatus, WorkflowError> {
        let (slug, id, generation) = {
            let state = self.lock();
            let generation = self.slug.begin();
            (state.form.values().slug.clone(), state.record.map(|(id, _)| id), generation)
        };

        match self.workflow.check_slug(self.entity, &slug, id).await {
            Ok(status) => {
                self.slug.finish(generation, status);
                Ok(self.slug.status())
            }
            Err(err) => {
                self.slug.finish(generation, SlugStatus::Idle);
                Err(err)
            }
        }
    }

    /// Finds a free slug and puts it into the form.
    pub async fn suggest_slug(&self) -> Result<String, WorkflowError> {
        let (base, id) = {
            let state = self.lock();
            let values = state.form.values();
            let base = if values.is_set(Field::Slug) {
                values.slug.clone()
            } else {
                values.title.clone()
            };
            (base, state.record.map(|(id, _)| id))
        };

        let suggestion = self.workflow.suggest_slug(self.entity, &base, id).await?;
        {
            let mut state = self.lock();
            state.form.update(Field::Slug, suggestion.clone());
            self.slug.reset(SlugStatus::Available);
        }
        self.autosave.touch();
        Ok(suggestion)
    }

    /// Manual save; unlike autosave every failure reaches the caller.
    pub async fn save_draft(&self) -> Result<ContentDraft, WorkflowError> {
        let _guard = self.persist_lock.lock().await;
        self.persist().await
    }

    /// One autosave attempt, called by the timer.
    ///
    /// A title is all it takes; field errors only block publishing.
    pub async fn autosave(&self) -> AutosaveOutcome {
        {
            let state = self.lock();
            let form = &state.form;
            if !form.is_dirty() || !form.has_title() || state.publishing {
                return AutosaveOutcome::Skipped;
            }
        }

        let Ok(_guard) = self.persist_lock.try_lock() else {
            return AutosaveOutcome::Busy;
        };

        match self.persist().await {
            Ok(draft) => {
                tracing::debug!(session = %self.session_id, id = %draft.id, "autosaved");
                AutosaveOutcome::Saved
            }
            Err(err @ (WorkflowError::Validation(_) | WorkflowError::PublishBlocked(_) | WorkflowError::SlugConflict(_))) => {
                tracing::debug!(session = %self.session_id, error = %err, "autosave not possible");
                AutosaveOutcome::Skipped
            }
            Err(err) => {
                tracing::warn!(session = %self.session_id, error = %err, "autosave failed");
                AutosaveOutcome::Failed
            }
        }
    }

    /// Saves pending changes and publishes the record.
    ///
    /// The gate is checked against the form before anything is written, so
    /// a blocked publish leaves the stored record untouched.
    pub async fn publish(&self) -> Result<ContentDraft, WorkflowError> {
        let _guard = self.persist_lock.lock().await;
        self.lock().publishing = true;
        let result = self.publish_locked().await;
        self.lock().publishing = false;
        result
    }

    async fn publish_locked(&self) -> Result<ContentDraft, WorkflowError> {
        let (values, errors, record, dirty, revision) = {
            let state = self.lock();
            (
                state.form.values().clone(),
                state.form.errors().clone(),
                state.record,
                state.form.is_dirty(),
                state.form.revision(),
            )
        };
        if matches!(record, Some((_, ContentStatus::Published))) {
            return Err(ContentError::AlreadyPublished.into());
        }
        if !errors.is_empty() {
            return Err(WorkflowError::Validation(errors));
        }

        let checklist = self
            .workflow
            .checklist(self.entity, &values, record.map(|(id, _)| id))
            .await?;
        if !checklist.can_publish {
            return Err(WorkflowError::PublishBlocked(checklist));
        }

        let id = match record {
            Some((id, _)) if !dirty => id,
            _ => self.persist().await?.id,
        };

        let published = self.workflow.publish(&self.admin, self.entity, id).await?;
        let mut state = self.lock();
        state.record = Some((published.id, published.status));
        state.form.mark_saved(revision, published.audit.updated_at);
        state.form.adopt_saved(revision, published.values.clone());
        Ok(published)
    }

    /// Leaves right away when nothing is pending, otherwise follows `choice`.
    pub async fn request_leave(&self, choice: Option<LeaveChoice>) -> Result<LeaveOutcome, WorkflowError> {
        match self.guard().intercept(choice, || LeaveOutcome::Left) {
            Ok(outcome) => Ok(outcome),
            Err(GuardResolution::SaveThenLeave) => {
                self.save_draft().await?;
                Ok(LeaveOutcome::Left)
            }
            Err(GuardResolution::Stay) => Ok(LeaveOutcome::Stayed),
            Err(_) => Ok(LeaveOutcome::ConfirmationRequired),
        }
    }

    pub fn before_unload(&self) -> bool {
        self.guard().before_unload()
    }

    fn guard(&self) -> NavigationGuard {
        let save_in_flight = self.persist_lock.try_lock().is_err();
        NavigationGuard::new(self.lock().form.is_dirty(), save_in_flight)
    }

    /// Writes the current form; callers hold `persist_lock`.
    async fn persist(&self) -> Result<ContentDraft, WorkflowError> {
        let (values, revision, record) = {
            let state = self.lock();
            (state.form.values().clone(), state.form.revision(), state.record)
        };

        let draft = match record {
            None => self.workflow.create_draft(&self.admin, self.entity, values).await?,
            Some((id, _)) => self.workflow.save(&self.admin, self.entity, id, values).await?,
        };

        let mut state = self.lock();
        state.record = Some((draft.id, draft.status));
        state.form.mark_saved(revision, draft.audit.updated_at);
        state.form.adopt_saved(revision, draft.values.clone());
        Ok(draft)
    }

    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use role_common::test_utils::{bundled_schema, bundled_schemas};
    use tokio::time::sleep;

    use tokio::sync::Semaphore;

    use super::*;
    use crate::domain::repository::RepositoryError;
    use crate::domain::repository::query::ContentQuery;
    use crate::domain::workflow::WorkflowSettings;
    use crate::infrastructure::persistence::memory::InMemoryContentRepository;

    /// Holds every slug lookup until the test hands out a permit.
    #[derive(Debug, Clone)]
    struct GatedSlugRepository {
        inner: InMemoryContentRepository,
        gate: Arc<Semaphore>,
    }

    impl ContentRepository for GatedSlugRepository {
        async fn find(&self, entity: EntityKind, query: ContentQuery) -> Result<Vec<ContentDraft>, RepositoryError> {
            self.inner.find(entity, query).await
        }

        async fn find_by_id(&self, entity: EntityKind, id: ContentId) -> Result<Option<ContentDraft>, RepositoryError> {
            self.inner.find_by_id(entity, id).await
        }

        async fn slug_taken(
            &self,
            entity: EntityKind,
            slug: &str,
            exclude: Option<ContentId>,
        ) -> Result<bool, RepositoryError> {
            self.gate.acquire().await.unwrap().forget();
            self.inner.slug_taken(entity, slug, exclude).await
        }

        async fn save(&self, draft: &ContentDraft) -> Result<(), RepositoryError> {
            self.inner.save(draft).await
        }

        async fn delete(&self, entity: EntityKind, id: ContentId) -> Result<(), RepositoryError> {
            self.inner.delete(entity, id).await
        }

        async fn count(&self, entity: EntityKind, status: Option<ContentStatus>) -> Result<i64, RepositoryError> {
            self.inner.count(entity, status).await
        }
    }

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

    fn new_agenda_editor(
        workflow: ContentWorkflow<InMemoryContentRepository>,
    ) -> Arc<DraftEditor<InMemoryContentRepository>> {
        DraftEditor::open(
            SessionId::new(),
            admin(),
            workflow,
            bundled_schema(EntityKind::AgendaItem),
            None,
            Duration::from_secs(3),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_never_fires_without_title() {
        let editor = new_agenda_editor(workflow());

        editor.update_field(Field::City, "Belo Horizonte");
        sleep(Duration::from_secs(30)).await;

        let snapshot = editor.snapshot();
        assert!(snapshot.content_id.is_none());
        assert!(snapshot.dirty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_creates_record_and_cleans_form() {
        let workflow = workflow();
        let editor = new_agenda_editor(workflow.clone());

        editor.update_field(Field::Title, "Show no Parque");
        sleep(Duration::from_secs(1)).await;
        assert!(editor.snapshot().content_id.is_none(), "waits for the quiet period");

        sleep(Duration::from_secs(3)).await;
        let snapshot = editor.snapshot();
        let id = snapshot.content_id.expect("autosave creates the record");
        assert!(!snapshot.dirty);
        assert_eq!(snapshot.status, Some(ContentStatus::Draft));
        assert!(snapshot.last_saved_at.is_some());

        let stored = workflow.get(EntityKind::AgendaItem, id).await.unwrap();
        assert_eq!(stored.values.slug, "show-no-parque");

        // the next edit makes the form dirty again and saves the same record
        editor.update_field(Field::City, "Belo Horizonte");
        assert!(editor.snapshot().dirty);
        sleep(Duration::from_secs(4)).await;
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.content_id, Some(id));
        assert!(!snapshot.dirty);
        let stored = workflow.get(EntityKind::AgendaItem, id).await.unwrap();
        assert_eq!(stored.values.city, "Belo Horizonte");
    }

    #[tokio::test]
    async fn test_publish_through_editor() {
        let editor = new_agenda_editor(workflow());
        editor.update_field(Field::Title, "Show no Parque");

        let draft = editor.save_draft().await.unwrap();
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.content_id, Some(draft.id));
        assert!(!snapshot.checklist.can_publish);
        assert!(snapshot.checklist.missing_fields.contains(&Field::City));

        let blocked = editor.publish().await;
        assert!(matches!(blocked, Err(WorkflowError::PublishBlocked(_))));

        editor.update_field(Field::City, "Belo Horizonte");
        editor.update_field(Field::StartAt, "2026-11-20T18:07");
        editor.update_field(Field::EndAt, "2026-11-20T23:00");
        editor.update_field(Field::CoverUrl, "https://cdn.example.com/parque.jpg");
        editor.update_field(Field::CoverAlt, "Palco no parque");
        assert!(editor.snapshot().checklist.can_publish);

        let published = editor.publish().await.unwrap();
        assert_eq!(published.id, draft.id);
        assert_eq!(published.status, ContentStatus::Published);

        let snapshot = editor.snapshot();
        assert_eq!(snapshot.status, Some(ContentStatus::Published));
        assert!(!snapshot.dirty);
        assert_eq!(snapshot.values.start_at, "2026-11-20T18:00:00Z");
    }

    #[tokio::test]
    async fn test_slug_check_on_own_record_is_available() {
        let editor = new_agenda_editor(workflow());
        editor.update_field(Field::Title, "Forró & Samba!!");
        editor.save_draft().await.unwrap();

        assert_eq!(editor.check_slug().await.unwrap(), SlugStatus::Available);
        assert_eq!(editor.snapshot().slug_status, SlugStatus::Available);

        // an edit invalidates the indicator
        assert!(editor.update_field(Field::Slug, "forro-e-samba"));
        assert_eq!(editor.snapshot().slug_status, SlugStatus::Idle);
    }

    #[tokio::test]
    async fn test_suggest_slug_applies_free_slug() {
        let workflow = workflow();
        workflow
            .create_draft(&admin(), EntityKind::AgendaItem, DraftInput::new("Jazz"))
            .await
            .unwrap();

        let editor = new_agenda_editor(workflow);
        editor.update_field(Field::Title, "Jazz");
        assert_eq!(editor.check_slug().await.unwrap(), SlugStatus::Taken);
        assert!(!editor.snapshot().checklist.can_publish);

        let suggestion = editor.suggest_slug().await.unwrap();
        assert_eq!(suggestion, "jazz-2");
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.values.slug, "jazz-2");
        assert_eq!(snapshot.slug_status, SlugStatus::Available);
    }

    #[tokio::test]
    async fn test_leave_with_unsaved_changes() {
        let editor = new_agenda_editor(workflow());
        assert_eq!(editor.request_leave(None).await.unwrap(), LeaveOutcome::Left);

        editor.update_field(Field::Title, "Sarau");
        assert!(editor.before_unload());
        assert_eq!(
            editor.request_leave(None).await.unwrap(),
            LeaveOutcome::ConfirmationRequired
        );
        assert_eq!(
            editor.request_leave(Some(LeaveChoice::Stay)).await.unwrap(),
            LeaveOutcome::Stayed
        );

        assert_eq!(
            editor.request_leave(Some(LeaveChoice::SaveThenLeave)).await.unwrap(),
            LeaveOutcome::Left
        );
        let snapshot = editor.snapshot();
        assert!(snapshot.content_id.is_some());
        assert!(!editor.before_unload());
    }

    #[tokio::test]
    async fn test_open_existing_record_is_clean() {
        let workflow = workflow();
        let draft = workflow
            .create_draft(&admin(), EntityKind::Event, DraftInput::new("Sarau"))
            .await
            .unwrap();

        let editor = DraftEditor::open(
            SessionId::new(),
            admin(),
            workflow,
            bundled_schema(EntityKind::Event),
            Some(draft.clone()),
            Duration::from_secs(3),
        );
        let snapshot = editor.snapshot();
        assert_eq!(snapshot.content_id, Some(draft.id));
        assert!(!snapshot.dirty);
        assert_eq!(snapshot.navigation, NavigationDecision::Proceed);
        assert_eq!(snapshot.values.title, "Sarau");
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_keeps_title_only_draft_with_field_errors() {
        let workflow = workflow();
        let editor = new_agenda_editor(workflow.clone());

        editor.update_field(Field::Title, "Jazz");
        editor.update_field(Field::TicketUrl, "ingressos.com");
        assert!(editor.snapshot().errors.contains(Field::TicketUrl));

        sleep(Duration::from_secs(4)).await;
        let snapshot = editor.snapshot();
        let id = snapshot.content_id.expect("autosave creates the record");
        assert!(!snapshot.dirty);
        assert!(snapshot.errors.contains(Field::TicketUrl));

        let stored = workflow.get(EntityKind::AgendaItem, id).await.unwrap();
        assert_eq!(stored.values.ticket_url, "ingressos.com");

        let blocked = editor.publish().await;
        assert!(matches!(blocked, Err(WorkflowError::Validation(_))));
    }

    #[tokio::test]
    async fn test_publish_of_live_record_does_not_overwrite_it() {
        let workflow = workflow();
        let ctx = admin();
        let entity = EntityKind::AgendaItem;
        let values = DraftInput::new("Jazz")
            .with(Field::City, "Belo Horizonte")
            .with(Field::StartAt, "2026-11-20T18:00")
            .with(Field::EndAt, "2026-11-20T23:00")
            .with(Field::CoverUrl, "https://cdn.example.com/jazz.jpg")
            .with(Field::CoverAlt, "Palco");
        let draft = workflow.create_draft(&ctx, entity, values).await.unwrap();
        let live = workflow.publish(&ctx, entity, draft.id).await.unwrap();

        let editor = DraftEditor::open(
            SessionId::new(),
            admin(),
            workflow.clone(),
            bundled_schema(entity),
            Some(live),
            Duration::from_secs(3),
        );
        editor.update_field(Field::City, "Ouro Preto");

        let result = editor.publish().await;
        assert!(matches!(
            result,
            Err(WorkflowError::Content(ContentError::AlreadyPublished))
        ));

        let stored = workflow.get(entity, draft.id).await.unwrap();
        assert_eq!(stored.values.city, "Belo Horizonte");
        assert!(editor.snapshot().dirty);
    }

    #[tokio::test]
    async fn test_slug_edit_discards_running_check() {
        let inner = InMemoryContentRepository::new();
        let entity = EntityKind::AgendaItem;
        ContentWorkflow::new(inner.clone(), bundled_schemas(), WorkflowSettings::default())
            .create_draft(&admin(), entity, DraftInput::new("Jazz"))
            .await
            .unwrap();

        let gate = Arc::new(Semaphore::new(0));
        let workflow = ContentWorkflow::new(
            GatedSlugRepository { inner, gate: gate.clone() },
            bundled_schemas(),
            WorkflowSettings::default(),
        );
        let editor = DraftEditor::open(
            SessionId::new(),
            admin(),
            workflow,
            bundled_schema(entity),
            None,
            Duration::from_secs(3),
        );
        editor.update_field(Field::Title, "Jazz");

        let check = tokio::spawn({
            let editor = editor.clone();
            async move { editor.check_slug().await }
        });
        while editor.snapshot().slug_status != SlugStatus::Checking {
            tokio::task::yield_now().await;
        }

        assert!(editor.update_field(Field::Slug, "samba"));
        gate.add_permits(1);

        // "jazz" is taken, but that answer is about a slug no longer in the form
        assert_eq!(check.await.unwrap().unwrap(), SlugStatus::Idle);
        assert_eq!(editor.snapshot().slug_status, SlugStatus::Idle);

        gate.add_permits(1);
        assert_eq!(editor.check_slug().await.unwrap(), SlugStatus::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_tracks_admin_activity() {
        let editor = new_agenda_editor(workflow());
        sleep(Duration::from_secs(60)).await;
        assert_eq!(editor.idle_for(), Duration::from_secs(60));

        editor.touch_activity();
        assert_eq!(editor.idle_for(), Duration::ZERO);
    }
}
