use std::time::Duration;

use role_common::EntitySchemas;

use crate::domain::AppState;
use crate::domain::editor::EditorSessions;
use crate::domain::repository::ContentRepository;
use crate::domain::workflow::{ContentWorkflow, WorkflowSettings};

pub mod http;
pub mod persistence;
pub mod settings;

#[derive(Clone)]
pub struct AppStateImpl<R: ContentRepository> {
    schemas: &'static dyn EntitySchemas,
    workflow: ContentWorkflow<R>,
    editors: EditorSessions<R>,
}

impl<R: ContentRepository> AppStateImpl<R> {
    pub fn new(
        schemas: &'static dyn EntitySchemas,
        repository: R,
        settings: WorkflowSettings,
        default_autosave_delay: Duration,
    ) -> Self {
        let workflow = ContentWorkflow::new(repository, schemas, settings);
        let editors = EditorSessions::new(workflow.clone(), default_autosave_delay);
        Self {
            schemas,
            workflow,
            editors,
        }
    }

    pub fn with_session_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.editors = self.editors.with_idle_timeout(idle_timeout);
        self
    }
}

impl<R: ContentRepository> AppState for AppStateImpl<R> {
    type R = R;

    fn schemas(&self) -> &'static dyn EntitySchemas {
        self.schemas
    }

    fn workflow(&self) -> &ContentWorkflow<Self::R> {
        &self.workflow
    }

    fn editors(&self) -> &EditorSessions<Self::R> {
        &self.editors
    }
}
