use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::types::Uuid;
use sqlx::Postgres;

use crate::infrastructure::persistence::schema::{ColumnRef, Table};

/// Small composable SELECT builder, parameters are numbered in order of appearance
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    from_table: Table<'a>,
    projection: Projection<'a>,
    where_conditions: Vec<Condition<'a>>,
    order_by: Vec<OrderBy<'a>>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Clone)]
enum Projection<'a> {
    Columns(Vec<ColumnRef<'a>>),
    Count,
}

/// A where condition that will be AND'ed together
#[derive(Debug, Clone)]
pub enum Condition<'a> {
    /// field = value
    Equals {
        column: ColumnRef<'a>,
        value: ConditionValue,
    },

    /// field <> value
    NotEquals {
        column: ColumnRef<'a>,
        value: ConditionValue,
    },
}

#[derive(Debug, Clone)]
pub enum ConditionValue {
    Text(String),
    Uuid(Uuid),
}

#[derive(Debug, Clone)]
pub struct OrderBy<'a> {
    pub column: ColumnRef<'a>,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl<'a> From<Table<'a>> for QueryBuilder<'a> {
    fn from(value: Table<'a>) -> Self {
        QueryBuilder {
            from_table: value,
            projection: Projection::Columns(vec![]),
            where_conditions: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }
}

impl<'a> QueryBuilder<'a> {
    /// Select specified columns
    pub fn select(mut self, columns: Vec<ColumnRef<'a>>) -> Self {
        self.projection = Projection::Columns(columns);
        self
    }

    /// Select COUNT(*) instead of columns
    pub fn count(mut self) -> Self {
        self.projection = Projection::Count;
        self
    }

    /// Add where condition
    pub fn where_condition(mut self, condition: Condition<'a>) -> Self {
        self.where_conditions.push(condition);
        self
    }

    pub fn order_by(mut self, column: ColumnRef<'a>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    /// Build the SQL query string
    pub fn build(self) -> (String, Vec<SqlParameter>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        let mut param_counter = 1;

        // SELECT clause
        sql.push_str("SELECT ");
        match &self.projection {
            Projection::Columns(columns) => {
                let columns: Vec<String> = columns.iter().map(|c| c.qualified()).collect();
                sql.push_str(&columns.join(", "));
            }
            Projection::Count => sql.push_str("COUNT(*)"),
        }

        // FROM clause
        sql.push_str(&format!("\nFROM {}", self.from_table.qualified()));

        // WHERE clause
        if !self.where_conditions.is_empty() {
            let conditions: Vec<String> = self
                .where_conditions
                .iter()
                .map(|condition| {
                    let (cond_sql, param) = condition.to_sql(param_counter);
                    param_counter += 1;
                    params.push(param);
                    cond_sql
                })
                .collect();
            sql.push_str("\nWHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        // ORDER BY clause
        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|ob| {
                    let direction = match ob.direction {
                        SortDirection::Ascending => "ASC NULLS LAST",
                        SortDirection::Descending => "DESC NULLS LAST",
                    };
                    format!("{} {}", ob.column.qualified(), direction)
                })
                .collect();
            sql.push_str("\nORDER BY ");
            sql.push_str(&order_clauses.join(", "));
        }

        // LIMIT clause
        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {}", limit));
        }
        // OFFSET clause
        if let Some(offset) = self.offset {
            sql.push_str(&format!("\nOFFSET {}", offset));
        }

        (sql, params)
    }
}

impl Condition<'_> {
    /// SQL fragment using placeholder `$index`, and the value to bind to it
    pub fn to_sql(&self, index: usize) -> (String, SqlParameter) {
        match self {
            Condition::Equals { column, value } => {
                (format!("{} = ${}", column.qualified(), index), value.into())
            }
            Condition::NotEquals { column, value } => {
                (format!("{} <> ${}", column.qualified(), index), value.into())
            }
        }
    }
}

impl From<&ConditionValue> for SqlParameter {
    fn from(value: &ConditionValue) -> Self {
        match value {
            ConditionValue::Text(s) => SqlParameter::Text(s.clone()),
            ConditionValue::Uuid(u) => SqlParameter::Uuid(*u),
        }
    }
}

// SQL parameter that will be bound to query
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParameter {
    Text(String),
    Uuid(Uuid),
}

impl SqlParameter {
    /// Bind to sqlx query
    pub fn bind_to_query<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParameter::Text(s) => query.bind(s),
            SqlParameter::Uuid(u) => query.bind(u),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use role_common::EntityKind;

    use super::*;
    use crate::infrastructure::persistence::schema::Column;

    #[test]
    fn test_simple_select() {
        let table = Table::from(EntityKind::AgendaItem);
        let id = Uuid::new_v4();
        let builder = QueryBuilder::from(table)
            .select(vec![Cow::Owned(Column { qualifier: "m", name: "id" })])
            .where_condition(Condition::Equals {
                column: Cow::Owned(Column { qualifier: "m", name: "slug" }),
                value: ConditionValue::Text("jazz".to_string()),
            })
            .where_condition(Condition::NotEquals {
                column: Cow::Owned(Column { qualifier: "m", name: "id" }),
                value: ConditionValue::Uuid(id),
            })
            .limit(Some(1));

        let (sql, params) = builder.build();

        assert!(sql.starts_with("SELECT \"m\".\"id\"\nFROM \"agenda_items\" AS \"m\""));
        assert!(sql.contains("WHERE \"m\".\"slug\" = $1 AND \"m\".\"id\" <> $2"));
        assert!(sql.ends_with("LIMIT 1"));
        assert_eq!(
            params,
            vec![SqlParameter::Text("jazz".to_string()), SqlParameter::Uuid(id)]
        );
    }

    #[test]
    fn test_count_with_order_and_page() {
        let (sql, params) = QueryBuilder::from(Table::from(EntityKind::Event))
            .count()
            .build();
        assert_eq!(sql, "SELECT COUNT(*)\nFROM \"events\" AS \"m\"");
        assert!(params.is_empty());

        let (sql, _) = QueryBuilder::from(Table::from(EntityKind::Event))
            .select(vec![Cow::Owned(Column { qualifier: "m", name: "id" })])
            .order_by(
                Cow::Owned(Column { qualifier: "m", name: "start_at" }),
                SortDirection::Ascending,
            )
            .limit(Some(20))
            .offset(Some(40))
            .build();
        assert!(sql.contains("ORDER BY \"m\".\"start_at\" ASC NULLS LAST\nLIMIT 20\nOFFSET 40"));
    }
}
