use std::fmt::{Display, Formatter};

use role_common::{
    CREATED_BY_FIELD_NAME, CREATED_FIELD_NAME, ContentStatus, EntityKind, EntitySchemas,
    FIELDS_FIELD_NAME, ID_FIELD_NAME, PUBLISHED_FIELD_NAME, SCHEDULED_FIELD_NAME,
    SLUG_FIELD_NAME, START_AT_FIELD_NAME, STATUS_FIELD_NAME, TITLE_FIELD_NAME,
    UPDATED_BY_FIELD_NAME, UPDATED_FIELD_NAME,
};

/// Represents table in a database, used for ddl generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

/// Represents one column in the database table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    Jsonb,
    TimestampTZ,
}

/// Represents an index in the database table, optionally limited to the rows
/// matching `predicate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub table_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub predicate: Option<String>,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sql = match self {
            ColumnType::Uuid => "UUID",
            ColumnType::Text => "TEXT",
            ColumnType::Jsonb => "JSONB",
            ColumnType::TimestampTZ => "TIMESTAMPTZ",
        };
        f.write_str(sql)
    }
}

impl Column {
    pub fn new<T: Into<String>>(name: T, column_type: ColumnType, not_null: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key<T: Into<String>>(name: T, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: true,
            primary_key: true,
            default_value: None,
        }
    }

    pub fn with_default<T: Into<String>>(mut self, default_value: T) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

impl Index {
    pub fn new<T: Into<String>>(table_name: T, columns: Vec<&str>, unique: bool) -> Self {
        Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(str::to_string).collect(),
            unique,
            predicate: None,
        }
    }

    pub fn partial<T: Into<String>>(mut self, predicate: T) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn name(&self) -> String {
        let suffix = if self.predicate.is_some() { "partial_idx" } else { "idx" };
        format!("{}_{}_{}", self.table_name, self.columns.join("_"), suffix)
    }
}

/// returns database tables for every configured content kind, sorted by name
pub fn schemas_into_tables(schemas: &dyn EntitySchemas) -> Vec<Table> {
    let mut tables: Vec<Table> = schemas
        .schemas()
        .map(|schema| content_table(schema.entity))
        .collect();
    tables.sort_by(|a, b| a.name.cmp(&b.name));
    tables
}

/// Every kind shares one layout: form values in a jsonb column, the columns
/// used for filtering and slug uniqueness next to it.
pub fn content_table(entity: EntityKind) -> Table {
    let table_name = entity.table_name();

    let columns = vec![
        Column::primary_key(ID_FIELD_NAME, ColumnType::Uuid),
        Column::new(TITLE_FIELD_NAME, ColumnType::Text, true),
        Column::new(SLUG_FIELD_NAME, ColumnType::Text, false),
        Column::new(STATUS_FIELD_NAME, ColumnType::Text, true)
            .with_default(format!("'{}'", ContentStatus::Draft)),
        Column::new(FIELDS_FIELD_NAME, ColumnType::Jsonb, true).with_default("'{}'::jsonb"),
        Column::new(START_AT_FIELD_NAME, ColumnType::TimestampTZ, false),
        Column::new(CREATED_FIELD_NAME, ColumnType::TimestampTZ, true).with_default("now()"),
        Column::new(UPDATED_FIELD_NAME, ColumnType::TimestampTZ, true).with_default("now()"),
        Column::new(PUBLISHED_FIELD_NAME, ColumnType::TimestampTZ, false),
        Column::new(SCHEDULED_FIELD_NAME, ColumnType::TimestampTZ, false),
        Column::new(CREATED_BY_FIELD_NAME, ColumnType::Text, false),
        Column::new(UPDATED_BY_FIELD_NAME, ColumnType::Text, false),
    ];

    // two live records of one kind never share a slug, drafts may
    let live_slug = Index::new(table_name, vec![SLUG_FIELD_NAME], true).partial(format!(
        "\"{}\" IN ('{}', '{}')",
        STATUS_FIELD_NAME,
        ContentStatus::Published,
        ContentStatus::Scheduled
    ));

    let indexes = vec![
        Index::new(table_name, vec![STATUS_FIELD_NAME], false),
        live_slug,
    ];

    Table {
        name: table_name.to_string(),
        columns,
        indexes,
    }
}
