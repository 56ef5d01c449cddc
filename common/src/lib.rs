mod domain;
mod infrastructure;

pub mod test_utils;

// Persisted content column names

pub const ID_FIELD_NAME: &str = "id";
pub const TITLE_FIELD_NAME: &str = "title";
pub const SLUG_FIELD_NAME: &str = "slug";
pub const STATUS_FIELD_NAME: &str = "status";
pub const FIELDS_FIELD_NAME: &str = "fields";
pub const START_AT_FIELD_NAME: &str = "start_at";

pub const CREATED_FIELD_NAME: &str = "created_at";
pub const UPDATED_FIELD_NAME: &str = "updated_at";
pub const PUBLISHED_FIELD_NAME: &str = "published_at";
pub const SCHEDULED_FIELD_NAME: &str = "scheduled_for";

pub const CREATED_BY_FIELD_NAME: &str = "created_by";
pub const UPDATED_BY_FIELD_NAME: &str = "updated_by";

// expose domain module

pub use domain::*;
pub use infrastructure::schemas::{load as load_schemas, parse as parse_schema};

// expose database module

pub use infrastructure::database;
