use role_common::EntitySchemas;

use crate::domain::persistence::Persistence;
use crate::domain::tables::{Column, Index, Table, schemas_into_tables};

pub trait MigrationStep {
    fn ctx(&self) -> &'static str;
    fn ddls(self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStep {
    ddls: Vec<String>,
}

impl CreateTableStep {
    fn new(database_schema: &str, table: &Table) -> Self {
        let ddls = create_table_ddl(database_schema, table);
        Self { ddls }
    }
}

impl MigrationStep for CreateTableStep {
    fn ctx(&self) -> &'static str {
        "CREATE TABLE"
    }

    fn ddls(self) -> Vec<String> {
        self.ddls
    }
}

/// Creates the content tables missing from the database; existing tables
/// are left untouched.
pub struct Migration<P: Persistence> {
    schemas: &'static dyn EntitySchemas,
    persistence: P,
}

impl<P: Persistence> Migration<P> {
    pub fn new(schemas: &'static dyn EntitySchemas, persistence: P) -> Self {
        Self {
            schemas,
            persistence,
        }
    }

    pub async fn migration_steps(&self) -> Result<Vec<CreateTableStep>, anyhow::Error> {
        let needed_schema = schemas_into_tables(self.schemas);
        let actual_schema = self.persistence.load().await?;
        let database_schema = self.persistence.database_schema();

        let steps = needed_schema
            .iter()
            .filter(|table| !actual_schema.contains(&table.name))
            .map(|table| CreateTableStep::new(database_schema, table))
            .collect();

        Ok(steps)
    }

    /// returns the number of applied steps
    pub async fn migrate(&self) -> Result<usize, anyhow::Error> {
        let steps = self.migration_steps().await?;
        let count = steps.len();
        self.persistence.apply_migration_steps(steps).await?;
        Ok(count)
    }
}

fn create_table_ddl(schema: &str, table: &Table) -> Vec<String> {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for column in table.columns.iter() {
        columns.push(column_ddl(column));
        if column.primary_key {
            pk_columns.push(format!("\"{}\"", column.name));
        }
    }

    let columns_sql = columns.join(",\n    ");
    let pk_columns_sql = pk_columns.join(", ");

    let table_ddl = format!(
        "CREATE TABLE \"{}\".\"{}\" (\n    {},\n    PRIMARY KEY({})\n)",
        schema, table.name, columns_sql, pk_columns_sql
    );

    let mut ddls = vec![table_ddl];

    for index in table.indexes.iter() {
        ddls.push(create_index_ddl(schema, index));
    }

    ddls
}

fn column_ddl(column: &Column) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default_value) = &column.default_value {
        sql.push_str(&format!(" DEFAULT {}", default_value));
    }
    sql
}

fn create_index_ddl(schema: &str, index: &Index) -> String {
    let columns_sql: Vec<String> = index.columns.iter().map(|c| format!("\"{c}\"")).collect();
    let mut sql = format!(
        "CREATE {}INDEX \"{}\" ON \"{}\".\"{}\" ({})",
        if index.unique { "UNIQUE " } else { "" },
        index.name(),
        schema,
        index.table_name,
        columns_sql.join(", ")
    );
    if let Some(predicate) = &index.predicate {
        sql.push_str(&format!(" WHERE {}", predicate));
    }
    sql
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use role_common::EntityKind;
    use role_common::test_utils::bundled_schemas;

    use super::*;
    use crate::domain::tables::content_table;

    #[derive(Clone, Default)]
    struct RecordingPersistence {
        existing: HashSet<String>,
        applied: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl Persistence for RecordingPersistence {
        async fn load(&self) -> Result<HashSet<String>, anyhow::Error> {
            Ok(self.existing.clone())
        }

        async fn apply_migration_steps(
            &self,
            steps: Vec<impl MigrationStep + Send>,
        ) -> Result<(), anyhow::Error> {
            let mut applied = self.applied.lock().unwrap();
            for step in steps {
                applied.push(step.ddls());
            }
            Ok(())
        }

        fn database_schema(&self) -> &str {
            "content"
        }
    }

    #[test]
    fn test_create_table_ddl() {
        let ddls = create_table_ddl("content", &content_table(EntityKind::Highlight));

        assert_eq!(ddls.len(), 3);
        assert!(ddls[0].starts_with("CREATE TABLE \"content\".\"highlights\" (\n    \"id\" UUID NOT NULL,"));
        assert!(ddls[0].contains("\"status\" TEXT NOT NULL DEFAULT 'draft'"));
        assert!(ddls[0].contains("\"fields\" JSONB NOT NULL DEFAULT '{}'::jsonb"));
        assert!(ddls[0].ends_with("PRIMARY KEY(\"id\")\n)"));
        assert_eq!(
            ddls[1],
            "CREATE INDEX \"highlights_status_idx\" ON \"content\".\"highlights\" (\"status\")"
        );
        assert_eq!(
            ddls[2],
            "CREATE UNIQUE INDEX \"highlights_slug_partial_idx\" ON \"content\".\"highlights\" (\"slug\") \
             WHERE \"status\" IN ('published', 'scheduled')"
        );
    }

    #[tokio::test]
    async fn test_only_missing_tables_are_created() {
        let persistence = RecordingPersistence {
            existing: HashSet::from(["events".to_string()]),
            ..Default::default()
        };
        let migration = Migration::new(bundled_schemas(), persistence.clone());

        assert_eq!(migration.migrate().await.unwrap(), 2);

        let applied = persistence.applied.lock().unwrap();
        let created: Vec<&str> = applied.iter().map(|ddls| ddls[0].as_str()).collect();
        assert!(created[0].starts_with("CREATE TABLE \"content\".\"agenda_items\""));
        assert!(created[1].starts_with("CREATE TABLE \"content\".\"highlights\""));
    }
}
