/// Repository layer for preference storage
use crate::errors::ApiResult;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Key-value storage for JSON documents
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    async fn read(&self, key: &str) -> ApiResult<Option<Value>>;
    async fn write(&self, key: &str, value: Value) -> ApiResult<()>;
    async fn remove(&self, key: &str) -> ApiResult<()>;
}

/// Postgres-backed preference repository
#[derive(Clone)]
pub struct PgPreferenceRepo {
    pool: PgPool,
}

impl PgPreferenceRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceBackend for PgPreferenceRepo {
    async fn read(&self, key: &str) -> ApiResult<Option<Value>> {
        let row = sqlx::query_as::<_, (Value,)>(
            "SELECT value FROM filter_preferences WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Upsert by key
    async fn write(&self, key: &str, value: Value) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO filter_preferences(key, value)
             VALUES($1, $2)
             ON CONFLICT (key) DO UPDATE
             SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM filter_preferences WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Process-local preference repository
#[derive(Default)]
pub struct MemoryPreferenceRepo {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryPreferenceRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceBackend for MemoryPreferenceRepo {
    async fn read(&self, key: &str) -> ApiResult<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> ApiResult<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Initialize database tables
pub async fn init_db(pool: &PgPool) -> ApiResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS filter_preferences(
            key TEXT PRIMARY KEY,
            value JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
