use std::fmt::Debug;
use std::time::Duration;

use nutype::nutype;
use serde::Serialize;

use crate::domain::entities::EntityKind;
use crate::domain::fields::Field;

pub trait EntitySchemas: Send + Sync + Debug + 'static {
    /// iterate all entity schemas
    fn schemas(&self) -> Box<dyn Iterator<Item = &'static EntitySchema> + '_>;
    /// find entity schema by its kind
    fn get(&self, entity: EntityKind) -> Option<&'static EntitySchema>;
}

/// Editorial rules of one content kind.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    pub entity: EntityKind,
    pub info: SchemaInfo,
    pub publish: PublishRules,
    #[serde(skip)]
    pub autosave_delay: Option<Duration>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub title: SchemaTitle,
    pub description: Option<String>,
}

#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 80),
    derive(Clone, Debug, Display, AsRef, PartialEq, Eq, Hash, Serialize)
)]
pub struct SchemaTitle(String);

/// Fields that must be filled before a record may leave the draft state.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRules {
    pub required: Vec<Field>,
    pub required_if: Vec<ConditionalRequirement>,
    /// start/end are rounded to this many minutes on publish
    pub round_to_minutes: Option<u32>,
}

/// `field` is required only while `present` holds a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRequirement {
    pub field: Field,
    pub present: Field,
}

impl EntitySchema {
    /// Every field that may show up in a publish checklist, in declaration order.
    pub fn checklist_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.publish
            .required
            .iter()
            .copied()
            .chain(self.publish.required_if.iter().map(|rule| rule.field))
    }
}
