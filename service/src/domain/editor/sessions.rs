use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use role_common::EntityKind;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::content::{AdminContext, ContentId};
use crate::domain::autosave::AutosaveOutcome;
use crate::domain::editor::DraftEditor;
use crate::domain::repository::ContentRepository;
use crate::domain::workflow::{ContentWorkflow, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

type Editors<R> = HashMap<SessionId, Arc<DraftEditor<R>>>;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Open editing sessions, keyed by session id.
///
/// Sessions nobody touched for `idle_timeout` are evicted, so abandoned
/// tabs do not keep their editor and autosave task alive forever.
#[derive(Debug)]
pub struct EditorSessions<R: ContentRepository> {
    sessions: Arc<RwLock<Editors<R>>>,
    workflow: ContentWorkflow<R>,
    default_autosave_delay: Duration,
    idle_timeout: Duration,
}

impl<R: ContentRepository> Clone for EditorSessions<R> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            workflow: self.workflow.clone(),
            default_autosave_delay: self.default_autosave_delay,
            idle_timeout: self.idle_timeout,
        }
    }
}

impl<R: ContentRepository> EditorSessions<R> {
    pub fn new(workflow: ContentWorkflow<R>, default_autosave_delay: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            workflow,
            default_autosave_delay,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Opens an editor on a new record, or on `content_id` when given.
    pub async fn open(
        &self,
        admin: AdminContext,
        entity: EntityKind,
        content_id: Option<ContentId>,
    ) -> Result<Arc<DraftEditor<R>>, WorkflowError> {
        let schema = self.workflow.schema(entity)?;
        let existing = match content_id {
            Some(id) => Some(self.workflow.get(entity, id).await?),
            None => None,
        };

        let session_id = SessionId::new();
        let editor = DraftEditor::open(
            session_id,
            admin,
            self.workflow.clone(),
            schema,
            existing,
            self.default_autosave_delay,
        );
        self.write().insert(session_id, editor.clone());

        tracing::debug!(session = %session_id, %entity, admin = %editor.admin_id(), "editor opened");
        Ok(editor)
    }

    /// Looking a session up counts as activity on it.
    pub fn get(&self, session_id: SessionId) -> Option<Arc<DraftEditor<R>>> {
        let editor = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&session_id)
            .cloned()?;
        editor.touch_activity();
        Some(editor)
    }

    /// Drops the session; its autosave timer stops with the last reference.
    pub fn close(&self, session_id: SessionId) -> Option<Arc<DraftEditor<R>>> {
        let editor = self.write().remove(&session_id);
        if editor.is_some() {
            tracing::debug!(session = %session_id, "editor closed");
        }
        editor
    }

    /// Removes sessions idle for longer than the timeout and returns how many.
    ///
    /// Pending changes of an evicted editor get one last autosave attempt.
    pub async fn evict_idle(&self) -> usize {
        let evicted: Vec<_> = {
            let mut sessions = self.write();
            let expired: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, editor)| editor.idle_for() >= self.idle_timeout)
                .map(|(id, _)| *id)
                .collect();
            expired
                .into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect()
        };

        for editor in &evicted {
            if editor.is_dirty() {
                let outcome = editor.autosave().await;
                if outcome != AutosaveOutcome::Saved {
                    tracing::warn!(session = %editor.session_id(), ?outcome, "evicted editor had unsaved changes");
                }
            }
            tracing::info!(session = %editor.session_id(), admin = %editor.admin_id(), "idle editor evicted");
        }
        evicted.len()
    }

    /// Runs [`Self::evict_idle`] every `every` until the runtime shuts down.
    pub fn spawn_eviction(&self, every: Duration) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = sessions.evict_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "idle sessions swept");
                }
            }
        })
    }

    #[cfg(test)]
    pub fn open_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Editors<R>> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
