use std::borrow::Cow;

use role_common::EntityKind;

// Represents a table in database
#[derive(Debug, Clone)]
pub struct Table<'a> {
    pub name: &'a str,
    pub alias: &'static str,
}

impl Table<'_> {
    /// Get qualified table name with alias
    pub fn qualified(&self) -> String {
        format!("\"{}\" AS \"{}\"", self.name, self.alias)
    }
}

impl From<EntityKind> for Table<'static> {
    fn from(value: EntityKind) -> Self {
        Table {
            name: value.table_name(),
            alias: "m",
        }
    }
}

/// Represents one column in the database table
#[derive(Debug, Clone)]
pub struct Column<'a> {
    pub qualifier: &'static str,
    pub name: &'a str,
}

impl Column<'_> {
    /// Get qualified column name
    pub fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.qualifier, self.name)
    }
}

/// Column reference which can be either borrowed or owned
pub type ColumnRef<'a> = Cow<'a, Column<'a>>;
