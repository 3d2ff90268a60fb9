use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Collection, DocumentStore, Filter, StoreError, StoredDocument};

/// Documents kept as JSON text in a single SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentRow> for StoredDocument {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| StoreError::Corrupt(format!("id {}: {e}", row.id)))?;
        let fields = match serde_json::from_str(&row.data)? {
            Value::Object(map) => map,
            _ => return Err(StoreError::NotAnObject),
        };
        Ok(StoredDocument {
            id,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            fields,
        })
    }
}

// Fixed-width so that text ordering in SQL equals time ordering
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp {raw}: {e}")))
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

impl SqliteStore {
    /// Open (creating if needed) the database and apply pending migrations
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // An in-memory database lives and dies with its single connection
        let pool = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Document store migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn push_equality(builder: &mut QueryBuilder<'_, Sqlite>, field: &str, value: &Value) {
    builder.push(" AND json_extract(data, ");
    builder.push_bind(format!("$.{field}"));
    builder.push(")");
    match value {
        Value::Null => {
            builder.push(" IS NULL");
        }
        Value::Bool(flag) => {
            builder.push(" = ");
            builder.push_bind(i64::from(*flag));
        }
        Value::Number(number) => {
            builder.push(" = ");
            if let Some(int) = number.as_i64() {
                builder.push_bind(int);
            } else {
                builder.push_bind(number.as_f64().unwrap_or_default());
            }
        }
        Value::String(text) => {
            builder.push(" = ");
            builder.push_bind(text.clone());
        }
        Value::Array(_) | Value::Object(_) => {
            builder.push(" = ");
            builder.push_bind(value.to_string());
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let now = format_timestamp(Utc::now());
        sqlx::query(
            r#"INSERT INTO documents (collection, id, data, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(Value::Object(fields).to_string())
        .bind(now.clone())
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(collection = %collection, id = %id, "Document created");
        Ok(id)
    }

    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"SELECT id, data, created_at, updated_at
               FROM documents
               WHERE collection = $1 AND id = $2"#,
        )
        .bind(collection.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(StoredDocument::try_from).transpose()
    }

    async fn list(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ",
        );
        builder.push_bind(collection.to_string());
        for (field, value) in &filter.equals {
            push_equality(&mut builder, field, value);
        }
        builder.push(" ORDER BY updated_at DESC, rowid ASC");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(StoredDocument::try_from).collect()
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let current: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.to_string())
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let Some((data,)) = current else {
            return Err(StoreError::NotFound { collection, id });
        };

        let mut fields = match serde_json::from_str(&data)? {
            Value::Object(map) => map,
            _ => return Err(StoreError::NotAnObject),
        };
        fields.extend(patch);

        sqlx::query(
            r#"UPDATE documents
               SET data = $3, updated_at = $4
               WHERE collection = $1 AND id = $2"#,
        )
        .bind(collection.to_string())
        .bind(id.to_string())
        .bind(Value::Object(fields).to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(())
    }
}
