use role_common::{ConditionalRequirement, EntityKind, EntitySchema, Field};
use serde::Serialize;

/// Response for list entities route
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    pub entity: EntityKind,
    title: String,
    description: Option<String>,
}

impl From<&EntitySchema> for EntityResponse {
    fn from(value: &EntitySchema) -> Self {
        Self {
            entity: value.entity,
            title: value.info.title.to_string(),
            description: value.info.description.clone(),
        }
    }
}

/// Response for one entity route, everything the editor needs to build its form
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedEntityResponse {
    entity: EntityKind,
    title: String,
    description: Option<String>,
    publish: PublishRulesResponse,
    autosave_delay_ms: Option<u64>,
    checklist_fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRulesResponse {
    required: Vec<Field>,
    required_if: Vec<ConditionalRequirement>,
    round_to_minutes: Option<u32>,
}

impl From<&EntitySchema> for DetailedEntityResponse {
    fn from(value: &EntitySchema) -> Self {
        Self {
            entity: value.entity,
            title: value.info.title.to_string(),
            description: value.info.description.clone(),
            publish: PublishRulesResponse {
                required: value.publish.required.clone(),
                required_if: value.publish.required_if.clone(),
                round_to_minutes: value.publish.round_to_minutes,
            },
            autosave_delay_ms: value.autosave_delay.map(|delay| delay.as_millis() as u64),
            checklist_fields: value.checklist_fields().collect(),
        }
    }
}
