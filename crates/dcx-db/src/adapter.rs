use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};

use dcx_core::ports::adapter::{AdapterError, DatabaseAdapter, DatabaseTransaction, ProtocolAdapter, Row};

use crate::error::DbAdapterError;
use crate::row::{check_bindable, row_to_map};

/// `sqlx`-backed SQL adapter. Connects lazily: `connect` opens the pool,
/// `execute`/`execute_write` borrow a pooled connection per call, and
/// `transaction` checks out a dedicated connection for the scope of one
/// `DatabaseTransaction`.
pub struct SqlxDatabaseAdapter {
    database_url: String,
    max_connections: u32,
    pool: tokio::sync::RwLock<Option<SqlitePool>>,
}

impl SqlxDatabaseAdapter {
    #[must_use]
    pub fn new(database_url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections,
            pool: tokio::sync::RwLock::new(None),
        }
    }

    async fn pool(&self) -> Result<SqlitePool, AdapterError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or(AdapterError::NotConnected)
    }
}

#[async_trait]
impl ProtocolAdapter for SqlxDatabaseAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(|e| DbAdapterError::Pool(e.to_string()))?;
        *self.pool.write().await = Some(pool);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.pool.try_read().map(|guard| guard.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl DatabaseAdapter for SqlxDatabaseAdapter {
    async fn execute(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, AdapterError> {
        check_bindable(params).map_err(AdapterError::from)?;
        let pool = self.pool().await?;

        let mut q = sqlx::query(query);
        for param in params {
            q = bind_one(q, param);
        }

        let rows = q
            .fetch_all(&pool)
            .await
            .map_err(|e| DbAdapterError::Query(e.to_string()))?;
        rows.iter()
            .map(|row| row_to_map(row).map_err(AdapterError::from))
            .collect()
    }

    async fn execute_write(&self, query: &str, params: &[Value]) -> Result<u64, AdapterError> {
        check_bindable(params).map_err(AdapterError::from)?;
        let pool = self.pool().await?;

        let mut q = sqlx::query(query);
        for param in params {
            q = bind_one(q, param);
        }

        let result = q
            .execute(&pool)
            .await
            .map_err(|e| DbAdapterError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn transaction(&self) -> Result<Box<dyn DatabaseTransaction>, AdapterError> {
        let pool = self.pool().await?;
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbAdapterError::Query(e.to_string()))?;
        Ok(Box::new(SqliteTransaction { tx: Some(tx) }))
    }
}

fn bind_one<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    param: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) if n.is_f64() && !n.is_i64() => query.bind(n.as_f64()),
        Value::Number(n) => query.bind(n.as_i64().or_else(|| n.as_u64().map(|v| v as i64))),
        Value::String(s) => query.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => query.bind(None::<String>),
    }
}

/// One `BEGIN`/`COMMIT`/`ROLLBACK` scope over a dedicated `sqlx` connection.
/// `tx` is `None` only after `commit`/`rollback` consumed it — every other
/// method treats that as [`DbAdapterError::TransactionClosed`].
pub struct SqliteTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

#[async_trait]
impl DatabaseTransaction for SqliteTransaction {
    async fn execute(&mut self, query: &str, params: &[Value]) -> Result<Vec<Row>, AdapterError> {
        check_bindable(params).map_err(AdapterError::from)?;
        let tx = self.tx.as_mut().ok_or(DbAdapterError::TransactionClosed)?;

        let mut q = sqlx::query(query);
        for param in params {
            q = bind_one(q, param);
        }
        let rows = q
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| DbAdapterError::Query(e.to_string()))?;
        rows.iter()
            .map(|row| row_to_map(row).map_err(AdapterError::from))
            .collect()
    }

    async fn execute_write(&mut self, query: &str, params: &[Value]) -> Result<u64, AdapterError> {
        check_bindable(params).map_err(AdapterError::from)?;
        let tx = self.tx.as_mut().ok_or(DbAdapterError::TransactionClosed)?;

        let mut q = sqlx::query(query);
        for param in params {
            q = bind_one(q, param);
        }
        let result = q
            .execute(&mut **tx)
            .await
            .map_err(|e| DbAdapterError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), AdapterError> {
        let tx = self.tx.take().ok_or(DbAdapterError::TransactionClosed)?;
        tx.commit().await.map_err(|e| DbAdapterError::Query(e.to_string()))?;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), AdapterError> {
        let tx = self.tx.take().ok_or(DbAdapterError::TransactionClosed)?;
        tx.rollback().await.map_err(|e| DbAdapterError::Query(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected_adapter() -> SqlxDatabaseAdapter {
        let adapter = SqlxDatabaseAdapter::new("sqlite::memory:", 1);
        adapter.connect().await.unwrap();
        adapter
            .execute_write("CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT, active BOOLEAN)", &[])
            .await
            .unwrap();
        adapter
    }

    #[tokio::test]
    async fn is_connected_reflects_pool_lifecycle() {
        let adapter = SqlxDatabaseAdapter::new("sqlite::memory:", 1);
        assert!(!adapter.is_connected());
        adapter.connect().await.unwrap();
        assert!(adapter.is_connected());
        adapter.disconnect().await.unwrap();
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn execute_write_then_execute_round_trips_a_row() {
        let adapter = connected_adapter().await;
        let affected = adapter
            .execute_write(
                "INSERT INTO widgets (id, name, active) VALUES (?, ?, ?)",
                &[Value::from(1), Value::from("sprocket"), Value::from(true)],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = adapter.execute("SELECT id, name, active FROM widgets", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::from("sprocket")));
    }

    #[tokio::test]
    async fn transaction_rollback_leaves_no_trace() {
        let adapter = connected_adapter().await;
        let mut tx = adapter.transaction().await.unwrap();
        tx.execute_write(
            "INSERT INTO widgets (id, name, active) VALUES (?, ?, ?)",
            &[Value::from(2), Value::from("gizmo"), Value::from(false)],
        )
        .await
        .unwrap();
        tx.rollback().await.unwrap();

        let rows = adapter.execute("SELECT id FROM widgets", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn transaction_commit_persists_writes() {
        let adapter = connected_adapter().await;
        let mut tx = adapter.transaction().await.unwrap();
        tx.execute_write(
            "INSERT INTO widgets (id, name, active) VALUES (?, ?, ?)",
            &[Value::from(3), Value::from("cog"), Value::from(true)],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let rows = adapter.execute("SELECT id FROM widgets", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn nested_param_shapes_are_rejected() {
        let adapter = connected_adapter().await;
        let err = adapter
            .execute("SELECT * FROM widgets WHERE name = ?", &[Value::Array(vec![])])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Other(_)));
    }
}
