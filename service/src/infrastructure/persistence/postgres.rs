use std::borrow::Cow;

use chrono::{DateTime, Utc};
use role_common::database::Database;
use role_common::{
    CREATED_BY_FIELD_NAME, CREATED_FIELD_NAME, ContentStatus, EntityKind, FIELDS_FIELD_NAME,
    ID_FIELD_NAME, PUBLISHED_FIELD_NAME, SCHEDULED_FIELD_NAME, SLUG_FIELD_NAME,
    START_AT_FIELD_NAME, STATUS_FIELD_NAME, TITLE_FIELD_NAME, UPDATED_BY_FIELD_NAME,
    UPDATED_FIELD_NAME,
};
use sqlx::postgres::PgRow;
use sqlx::types::{Json, Uuid};
use sqlx::Row;

use crate::domain::content::input::{DraftInput, parse_timestamp};
use crate::domain::content::{AdminId, AuditTrail, ContentDraft, ContentId};
use crate::domain::repository::query::{ContentOrder, ContentQuery};
use crate::domain::repository::{ContentRepository, RepositoryError};
use crate::infrastructure::persistence::query::{
    Condition, ConditionValue, QueryBuilder, SortDirection,
};
use crate::infrastructure::persistence::schema::{Column, ColumnRef, Table};

/// Columns of every content table, in insert order
const COLUMNS: [&str; 12] = [
    ID_FIELD_NAME,
    TITLE_FIELD_NAME,
    SLUG_FIELD_NAME,
    STATUS_FIELD_NAME,
    FIELDS_FIELD_NAME,
    START_AT_FIELD_NAME,
    CREATED_FIELD_NAME,
    UPDATED_FIELD_NAME,
    PUBLISHED_FIELD_NAME,
    SCHEDULED_FIELD_NAME,
    CREATED_BY_FIELD_NAME,
    UPDATED_BY_FIELD_NAME,
];

const fn column(name: &'static str) -> Column<'static> {
    Column {
        qualifier: "m",
        name,
    }
}

const ID_COLUMN: Column<'static> = column(ID_FIELD_NAME);
const SLUG_COLUMN: Column<'static> = column(SLUG_FIELD_NAME);
const STATUS_COLUMN: Column<'static> = column(STATUS_FIELD_NAME);
const START_AT_COLUMN: Column<'static> = column(START_AT_FIELD_NAME);
const UPDATED_COLUMN: Column<'static> = column(UPDATED_FIELD_NAME);

/// One table per entity kind; the raw form values live in a jsonb column,
/// the columns used for filtering and uniqueness are kept next to it.
#[derive(Clone, Debug)]
pub struct PostgresContentRepository {
    database: &'static Database,
}

impl PostgresContentRepository {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    fn all_columns() -> Vec<ColumnRef<'static>> {
        COLUMNS.iter().map(|name| Cow::Owned(column(name))).collect()
    }
}

impl ContentRepository for PostgresContentRepository {
    async fn find(
        &self,
        entity: EntityKind,
        query: ContentQuery,
    ) -> Result<Vec<ContentDraft>, RepositoryError> {
        let mut builder = QueryBuilder::from(Table::from(entity))
            .select(Self::all_columns())
            .limit(query.limit)
            .offset(query.offset);

        if let Some(status) = query.status {
            builder = builder.where_condition(Condition::Equals {
                column: Cow::Borrowed(&STATUS_COLUMN),
                value: ConditionValue::Text(status.to_string()),
            });
        }

        builder = match query.order {
            ContentOrder::RecentlyUpdated => {
                builder.order_by(Cow::Borrowed(&UPDATED_COLUMN), SortDirection::Descending)
            }
            ContentOrder::StartAt => {
                builder.order_by(Cow::Borrowed(&START_AT_COLUMN), SortDirection::Ascending)
            }
        };

        let (sql, params) = builder.build();
        tracing::debug!("{}", sql);

        let mut query_object = sqlx::query(&sql);
        for param in params {
            query_object = param.bind_to_query(query_object);
        }

        let rows = query_object
            .fetch_all(self.database.database_pool())
            .await
            .map_err(database_error)?;

        rows.iter().map(|row| row_to_draft(row, entity)).collect()
    }

    async fn find_by_id(
        &self,
        entity: EntityKind,
        id: ContentId,
    ) -> Result<Option<ContentDraft>, RepositoryError> {
        let (sql, params) = QueryBuilder::from(Table::from(entity))
            .select(Self::all_columns())
            .where_condition(Condition::Equals {
                column: Cow::Borrowed(&ID_COLUMN),
                value: ConditionValue::Uuid(id.0),
            })
            .build();

        let mut query_object = sqlx::query(&sql);
        for param in params {
            query_object = param.bind_to_query(query_object);
        }

        let row = query_object
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(database_error)?;

        row.map(|row| row_to_draft(&row, entity)).transpose()
    }

    async fn slug_taken(
        &self,
        entity: EntityKind,
        slug: &str,
        exclude: Option<ContentId>,
    ) -> Result<bool, RepositoryError> {
        let mut builder = QueryBuilder::from(Table::from(entity))
            .select(vec![Cow::Borrowed(&ID_COLUMN)])
            .where_condition(Condition::Equals {
                column: Cow::Borrowed(&SLUG_COLUMN),
                value: ConditionValue::Text(slug.trim().to_string()),
            })
            .limit(Some(1));

        if let Some(exclude) = exclude {
            builder = builder.where_condition(Condition::NotEquals {
                column: Cow::Borrowed(&ID_COLUMN),
                value: ConditionValue::Uuid(exclude.0),
            });
        }

        let (sql, params) = builder.build();
        let mut query_object = sqlx::query(&sql);
        for param in params {
            query_object = param.bind_to_query(query_object);
        }

        let row = query_object
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(database_error)?;

        Ok(row.is_some())
    }

    async fn save(&self, draft: &ContentDraft) -> Result<(), RepositoryError> {
        let sql = upsert_sql(draft.entity);
        let values = &draft.values;
        let slug = Some(values.slug.trim()).filter(|slug| !slug.is_empty());

        sqlx::query(&sql)
            .bind(draft.id.0)
            .bind(values.title.trim())
            .bind(slug)
            .bind(draft.status.as_str())
            .bind(Json(values.clone()))
            .bind(parse_timestamp(&values.start_at))
            .bind(draft.audit.created_at)
            .bind(draft.audit.updated_at)
            .bind(draft.audit.published_at)
            .bind(draft.audit.scheduled_for)
            .bind(draft.audit.created_by.as_ref().map(ToString::to_string))
            .bind(draft.audit.updated_by.as_ref().map(ToString::to_string))
            .execute(self.database.database_pool())
            .await
            .map_err(|err| {
                let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
                if unique {
                    RepositoryError::UniqueViolation(values.slug.clone())
                } else {
                    database_error(err)
                }
            })?;

        Ok(())
    }

    async fn delete(&self, entity: EntityKind, id: ContentId) -> Result<(), RepositoryError> {
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = $1",
            entity.table_name(),
            ID_FIELD_NAME
        );
        let result = sqlx::query(&sql)
            .bind(id.0)
            .execute(self.database.database_pool())
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count(
        &self,
        entity: EntityKind,
        status: Option<ContentStatus>,
    ) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::from(Table::from(entity)).count();
        if let Some(status) = status {
            builder = builder.where_condition(Condition::Equals {
                column: Cow::Borrowed(&STATUS_COLUMN),
                value: ConditionValue::Text(status.to_string()),
            });
        }

        let (sql, params) = builder.build();
        let mut query_object = sqlx::query(&sql);
        for param in params {
            query_object = param.bind_to_query(query_object);
        }

        let row = query_object
            .fetch_one(self.database.database_pool())
            .await
            .map_err(database_error)?;

        row.try_get(0).map_err(database_error)
    }
}

fn upsert_sql(entity: EntityKind) -> String {
    let columns: Vec<String> = COLUMNS.iter().map(|c| format!("\"{c}\"")).collect();
    let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("${i}")).collect();
    let updates: Vec<String> = COLUMNS
        .iter()
        .filter(|c| **c != ID_FIELD_NAME && **c != CREATED_FIELD_NAME && **c != CREATED_BY_FIELD_NAME)
        .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
        .collect();

    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})\nON CONFLICT (\"{}\") DO UPDATE SET {}",
        entity.table_name(),
        columns.join(", "),
        placeholders.join(", "),
        ID_FIELD_NAME,
        updates.join(", ")
    )
}

fn row_to_draft(row: &PgRow, entity: EntityKind) -> Result<ContentDraft, RepositoryError> {
    let id: Uuid = try_get(row, ID_FIELD_NAME)?;
    let status: String = try_get(row, STATUS_FIELD_NAME)?;
    let status = status
        .parse::<ContentStatus>()
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
    let Json(values): Json<DraftInput> = try_get(row, FIELDS_FIELD_NAME)?;

    let created_at: DateTime<Utc> = try_get(row, CREATED_FIELD_NAME)?;
    let updated_at: DateTime<Utc> = try_get(row, UPDATED_FIELD_NAME)?;
    let published_at: Option<DateTime<Utc>> = try_get(row, PUBLISHED_FIELD_NAME)?;
    let scheduled_for: Option<DateTime<Utc>> = try_get(row, SCHEDULED_FIELD_NAME)?;
    let created_by: Option<String> = try_get(row, CREATED_BY_FIELD_NAME)?;
    let updated_by: Option<String> = try_get(row, UPDATED_BY_FIELD_NAME)?;

    Ok(ContentDraft {
        id: ContentId(id),
        entity,
        values,
        status,
        audit: AuditTrail {
            created_at,
            created_by: created_by.and_then(|admin| AdminId::try_new(admin).ok()),
            updated_at,
            updated_by: updated_by.and_then(|admin| AdminId::try_new(admin).ok()),
            published_at,
            scheduled_for,
        },
    })
}

fn try_get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::DatabaseError(format!("Failed to parse {column}: {e}")))
}

fn database_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_keeps_creation_audit() {
        let sql = upsert_sql(EntityKind::Highlight);

        assert!(sql.starts_with("INSERT INTO \"highlights\" (\"id\", \"title\""));
        assert!(sql.contains("$12)"));
        assert!(sql.contains("ON CONFLICT (\"id\") DO UPDATE SET \"title\" = EXCLUDED.\"title\""));
        assert!(!sql.contains("\"created_at\" = EXCLUDED"));
        assert!(!sql.contains("\"created_by\" = EXCLUDED"));
    }
}
