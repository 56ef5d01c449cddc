use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use serde::Deserialize;

use crate::domain::{
    ConditionalRequirement, EntityKind, EntitySchema, EntitySchemas, Field, PublishRules,
    SchemaInfo, schemas::SchemaTitle,
};

/// Loads every `*.json` entity schema found in `schema_config_path`.
pub fn load(schema_config_path: &str) -> Result<&'static dyn EntitySchemas, anyhow::Error> {
    let loaded = EntitySchemasAdapter::load(schema_config_path)?;
    let schemas: &'static dyn EntitySchemas = Box::leak(Box::new(loaded));
    Ok(schemas)
}

/// Parses one entity schema from its JSON representation.
pub fn parse(content: &str) -> Result<EntitySchema, anyhow::Error> {
    let record = serde_json::from_str::<EntitySchemaRecord>(content)
        .context("failed to parse JSON entity schema")?;
    record.try_into()
}

#[derive(Debug)]
struct EntitySchemasAdapter {
    schemas: HashMap<EntityKind, &'static EntitySchema>,
}

impl EntitySchemas for EntitySchemasAdapter {
    fn schemas(&self) -> Box<dyn Iterator<Item = &'static EntitySchema> + '_> {
        Box::new(self.schemas.values().copied())
    }

    fn get(&self, entity: EntityKind) -> Option<&'static EntitySchema> {
        self.schemas.get(&entity).copied()
    }
}

impl EntitySchemasAdapter {
    fn load(schema_config_path: &str) -> Result<Self, anyhow::Error> {
        use std::fs;

        let dir_path = Path::new(schema_config_path);

        tracing::debug!("Loading entity schemas from {}", dir_path.to_string_lossy());

        let entries = fs::read_dir(dir_path).with_context(|| {
            format!(
                "failed to read schema config directory: {}",
                dir_path.to_string_lossy()
            )
        })?;

        let mut schemas = HashMap::new();
        for entry_res in entries {
            let entry =
                entry_res.map_err(|e| anyhow!("failed to read a directory entry: {}", e))?;
            let path = entry.path();
            if path.is_file() && is_json(&path) {
                let schema = load_schema(&path)?;
                if schemas.contains_key(&schema.entity) {
                    bail!("entity '{}' is defined more than once", schema.entity);
                }
                let static_ref: &'static EntitySchema = Box::leak(Box::new(schema));
                schemas.insert(static_ref.entity, static_ref);
            }
        }

        tracing::info!("{} entity schemas loaded", schemas.len());
        Ok(Self { schemas })
    }
}

fn load_schema(path: &Path) -> Result<EntitySchema, anyhow::Error> {
    use std::fs;

    let path_str = path.to_string_lossy().into_owned();

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read entity schema file '{}'", path_str))?;

    parse(&content).with_context(|| format!("invalid entity schema '{}'", path_str))
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

// internal structs for Deserializing

#[derive(Clone, Debug, Deserialize)]
#[serde(bound = "'de: 'a")]
#[serde(rename_all = "camelCase")]
struct EntitySchemaRecord<'a> {
    entity: EntityKind,
    info: SchemaInfoRecord<'a>,
    #[serde(default)]
    publish: PublishRulesRecord,
    autosave: Option<AutosaveRecord>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(bound = "'de: 'a")]
#[serde(rename_all = "camelCase")]
struct SchemaInfoRecord<'a> {
    title: &'a str,
    description: Option<&'a str>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishRulesRecord {
    #[serde(default)]
    required: Vec<Field>,
    #[serde(default)]
    required_if: Vec<ConditionalRecord>,
    round_to_minutes: Option<u32>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionalRecord {
    field: Field,
    present: Field,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutosaveRecord {
    delay_ms: u64,
}

// conversion into schema model

impl<'a> TryFrom<EntitySchemaRecord<'a>> for EntitySchema {
    type Error = anyhow::Error;

    fn try_from(record: EntitySchemaRecord<'a>) -> Result<Self, Self::Error> {
        let info = SchemaInfo::try_from(&record.info)?;
        let publish = PublishRules::try_from(record.publish)?;
        let autosave_delay = record
            .autosave
            .map(|autosave| match autosave.delay_ms {
                0 => Err(anyhow!("autosave delay must be positive")),
                ms => Ok(Duration::from_millis(ms)),
            })
            .transpose()?;

        Ok(Self {
            entity: record.entity,
            info,
            publish,
            autosave_delay,
        })
    }
}

impl<'a> TryFrom<&SchemaInfoRecord<'a>> for SchemaInfo {
    type Error = anyhow::Error;

    fn try_from(value: &SchemaInfoRecord<'a>) -> Result<Self, Self::Error> {
        let title = SchemaTitle::try_new(value.title)?;
        let description = value.description.map(String::from);
        Ok(Self { title, description })
    }
}

impl TryFrom<PublishRulesRecord> for PublishRules {
    type Error = anyhow::Error;

    fn try_from(value: PublishRulesRecord) -> Result<Self, Self::Error> {
        if !value.required.contains(&Field::Title) {
            bail!("title must always be required for publish");
        }

        let mut required_if = Vec::with_capacity(value.required_if.len());
        for rule in value.required_if {
            if rule.field == rule.present {
                bail!("field '{}' cannot depend on itself", rule.field);
            }
            if value.required.contains(&rule.field) {
                bail!(
                    "field '{}' is both required and conditionally required",
                    rule.field
                );
            }
            required_if.push(ConditionalRequirement {
                field: rule.field,
                present: rule.present,
            });
        }

        if let Some(minutes) = value.round_to_minutes {
            if minutes == 0 || minutes > 60 {
                bail!("roundToMinutes must be between 1 and 60, got {}", minutes);
            }
        }

        Ok(Self {
            required: value.required,
            required_if,
            round_to_minutes: value.round_to_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agenda_schema() {
        let schema = parse(include_str!("../../../schemas/agenda-item.json")).unwrap();

        assert_eq!(schema.entity, EntityKind::AgendaItem);
        assert!(schema.publish.required.contains(&Field::City));
        assert_eq!(
            schema.publish.required_if,
            vec![ConditionalRequirement {
                field: Field::CoverAlt,
                present: Field::CoverUrl
            }]
        );
        assert_eq!(schema.publish.round_to_minutes, Some(15));
        assert_eq!(schema.autosave_delay, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_reject_unknown_field() {
        let result = parse(
            r#"{"entity": "event", "info": {"title": "Events"},
                "publish": {"required": ["title", "lineup"]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_schema_without_title_requirement() {
        let result = parse(
            r#"{"entity": "event", "info": {"title": "Events"},
                "publish": {"required": ["slug"]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reject_self_dependent_rule() {
        let result = parse(
            r#"{"entity": "event", "info": {"title": "Events"},
                "publish": {"required": ["title"],
                            "requiredIf": [{"field": "coverAlt", "present": "coverAlt"}]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_schema_directory() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../schemas");
        let schemas = load(path).unwrap();

        for entity in EntityKind::ALL {
            assert!(schemas.get(entity).is_some(), "missing schema for {entity}");
        }
    }
}
