use std::collections::HashMap;

use crate::domain::{EntityKind, EntitySchema, EntitySchemas};
use crate::infrastructure::schemas::parse;

/// Simple registry storing the bundled entity schemas.
///
/// Public so that other crates can reuse it for their own tests.
#[derive(Debug)]
pub struct SimpleSchemas {
    pub schemas: HashMap<EntityKind, &'static EntitySchema>,
}

impl EntitySchemas for SimpleSchemas {
    fn schemas(&self) -> Box<dyn Iterator<Item = &'static EntitySchema> + '_> {
        Box::new(self.schemas.values().copied())
    }

    fn get(&self, entity: EntityKind) -> Option<&'static EntitySchema> {
        self.schemas.get(&entity).copied()
    }
}

/// Registry with every bundled schema, leaked for a `'static` lifetime.
pub fn bundled_schemas() -> &'static dyn EntitySchemas {
    let schemas = EntityKind::ALL
        .into_iter()
        .map(|entity| (entity, bundled_schema(entity)))
        .collect();
    Box::leak(Box::new(SimpleSchemas { schemas }))
}

/// Helper for building a leaked schema from the files under `schemas/`.
pub fn bundled_schema(entity: EntityKind) -> &'static EntitySchema {
    let content = match entity {
        EntityKind::AgendaItem => include_str!("../../schemas/agenda-item.json"),
        EntityKind::Highlight => include_str!("../../schemas/highlight.json"),
        EntityKind::Event => include_str!("../../schemas/event.json"),
    };
    let schema = parse(content).expect("bundled schemas must be valid");
    Box::leak(Box::new(schema))
}
