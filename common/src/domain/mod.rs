pub mod entities;
pub mod fields;
pub mod schemas;

pub use entities::{ContentStatus, EntityKind, UnknownValueError};
pub use fields::{Field, FieldKind};
pub use schemas::{ConditionalRequirement, EntitySchema, EntitySchemas, PublishRules, SchemaInfo};
