use role_common::EntitySchemas;

use crate::domain::editor::EditorSessions;
use crate::domain::repository::ContentRepository;
use crate::domain::workflow::ContentWorkflow;

pub mod autosave;
pub mod content;
pub mod editor;
pub mod form;
pub mod navigation;
pub mod publish_gate;
pub mod repository;
pub mod slug;
pub mod workflow;

//// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type R: ContentRepository;
    fn schemas(&self) -> &'static dyn EntitySchemas;
    fn workflow(&self) -> &ContentWorkflow<Self::R>;
    fn editors(&self) -> &EditorSessions<Self::R>;
}
