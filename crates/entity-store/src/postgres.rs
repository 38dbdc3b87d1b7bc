use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};

use crate::{
    EntityId, RecordDraft, Result, StoreConfig, StoreError, StoredRecord,
    store::{EntityStore, Transaction},
};

const SELECT_COLUMNS: &str =
    "SELECT id, kind, code, foreign_keys, payload, created_at, updated_at FROM entities";

/// PostgreSQL-backed entity store implementation.
///
/// All kinds share one `entities` table; foreign keys live in a JSONB
/// column matched with containment so they can use the GIN index.
#[derive(Clone)]
pub struct PostgresEntityStore {
    pool: PgPool,
}

impl PostgresEntityStore {
    /// Creates a new PostgreSQL entity store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool as described by the configuration.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::Config("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "connected entity store");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let mut tx = self.pool.begin().await?;

        // Guard checks and the deletes they allow must not interleave with
        // a concurrent insert of a dependent record.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        Ok(PostgresTransaction { tx })
    }
}

/// Transaction over a [`PostgresEntityStore`].
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    fn row_to_record(row: PgRow) -> Result<StoredRecord> {
        let foreign_keys: serde_json::Value = row.try_get("foreign_keys")?;
        let foreign_keys: BTreeMap<String, EntityId> = serde_json::from_value(foreign_keys)?;

        Ok(StoredRecord {
            kind: row.try_get("kind")?,
            id: EntityId::new(row.try_get("id")?)?,
            code: row.try_get("code")?,
            foreign_keys,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn foreign_key_filter(field: &str, value: EntityId) -> serde_json::Value {
        let mut filter = serde_json::Map::new();
        filter.insert(field.to_string(), value.as_i64().into());
        serde_json::Value::Object(filter)
    }

    fn map_write_error(e: sqlx::Error, record: &RecordDraft) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.constraint() == Some("unique_entity_code")
        {
            return StoreError::DuplicateCode {
                kind: record.kind.clone(),
                code: record.code.clone().unwrap_or_default(),
            };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn get(&mut self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE kind = $1 AND id = $2"))
            .bind(kind)
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn get_by_code(&mut self, kind: &str, code: &str) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE kind = $1 AND code = $2"))
            .bind(kind)
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list_all(&mut self, kind: &str) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE kind = $1 ORDER BY id"))
            .bind(kind)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn list_by_foreign_key(
        &mut self,
        kind: &str,
        field: &str,
        value: EntityId,
    ) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE kind = $1 AND foreign_keys @> $2 ORDER BY id"
        ))
        .bind(kind)
        .bind(Self::foreign_key_filter(field, value))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn count_by_foreign_key(
        &mut self,
        kind: &str,
        field: &str,
        value: EntityId,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entities WHERE kind = $1 AND foreign_keys @> $2",
        )
        .bind(kind)
        .bind(Self::foreign_key_filter(field, value))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn save(&mut self, record: RecordDraft) -> Result<StoredRecord> {
        let foreign_keys = serde_json::to_value(&record.foreign_keys)?;

        let row = match record.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE entities
                    SET code = $3, foreign_keys = $4, payload = $5, updated_at = NOW()
                    WHERE kind = $1 AND id = $2
                    RETURNING id, kind, code, foreign_keys, payload, created_at, updated_at
                    "#,
                )
                .bind(&record.kind)
                .bind(id.as_i64())
                .bind(&record.code)
                .bind(&foreign_keys)
                .bind(&record.payload)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| Self::map_write_error(e, &record))?
                .ok_or_else(|| StoreError::RecordNotFound {
                    kind: record.kind.clone(),
                    id,
                })?
            }
            None => sqlx::query(
                r#"
                INSERT INTO entities (kind, code, foreign_keys, payload)
                VALUES ($1, $2, $3, $4)
                RETURNING id, kind, code, foreign_keys, payload, created_at, updated_at
                "#,
            )
            .bind(&record.kind)
            .bind(&record.code)
            .bind(&foreign_keys)
            .bind(&record.payload)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| Self::map_write_error(e, &record))?,
        };

        Self::row_to_record(row)
    }

    async fn delete(&mut self, kind: &str, id: EntityId) -> Result<()> {
        let result = sqlx::query("DELETE FROM entities WHERE kind = $1 AND id = $2")
            .bind(kind)
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound {
                kind: kind.to_string(),
                id,
            });
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
