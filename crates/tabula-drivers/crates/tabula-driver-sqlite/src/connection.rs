//! SQLite connection implementation

use async_trait::async_trait;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use std::sync::Arc;
use tabula_core::{
    ColumnInfo, Connection, QueryResult, Result, Row, SchemaIntrospection, StatementResult,
    TabulaError, Transaction, Value,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// SQLite connection wrapper.
///
/// One rusqlite handle shared by every caller. Plain statements lock it per
/// call; a transaction holds the lock from `BEGIN` until commit or
/// rollback, so other callers wait instead of running inside it.
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                TabulaError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(TabulaError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                TabulaError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
            TabulaError::Connection(format!("Failed to enable foreign keys: {}", e))
        })?;

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                let home_path = std::path::PathBuf::from(home);
                home_path.join(rest).to_string_lossy().to_string()
            } else {
                return Err(TabulaError::Configuration(
                    "Unable to determine HOME directory".into(),
                ));
            }
        } else if path.starts_with('~') {
            return Err(TabulaError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()
                .map_err(TabulaError::Io)?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }

    /// Execute multiple SQL statements in a batch.
    ///
    /// Used to run schema scripts and fixtures; no per-statement results.
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)
            .map_err(|e| TabulaError::Query(format!("Failed to execute batch: {}", e)))
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let conn = self.conn.lock().await;
        run_statement(&conn, sql, params)
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let conn = self.conn.lock().await;
        run_query(&conn, sql, params)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        tracing::debug!("beginning SQLite transaction");
        // DEFERRED: the write lock is only taken at the first write.
        conn.execute_batch("BEGIN DEFERRED")
            .map_err(|e| TabulaError::Query(format!("Failed to begin transaction: {}", e)))?;
        Ok(Box::new(SqliteTransaction {
            conn: parking_lot::Mutex::new(conn),
            committed: false,
            rolled_back: false,
        }))
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

#[async_trait]
impl SchemaIntrospection for SqliteConnection {
    #[tracing::instrument(skip(self))]
    async fn get_columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>> {
        tracing::trace!(table = %table, "fetching column information");
        let result = self
            .query(
                "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?, ?) ORDER BY cid",
                &[
                    Value::String(table.to_string()),
                    Value::String(schema.unwrap_or("main").to_string()),
                ],
            )
            .await?;

        let columns = result
            .rows
            .iter()
            .map(|row| {
                let ordinal = row.get(0).and_then(|v| v.as_i64()).unwrap_or(0) as usize;
                let name = row
                    .get(1)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                let data_type = row
                    .get(2)
                    .and_then(|v| v.as_str())
                    .unwrap_or("TEXT")
                    .to_string();
                let nullable = row.get(3).and_then(|v| v.as_i64()).unwrap_or(0) == 0;
                let default_value = row.get(4).and_then(|v| {
                    if v.is_null() {
                        None
                    } else {
                        Some(v.to_string())
                    }
                });
                let is_primary_key = row.get(5).and_then(|v| v.as_i64()).unwrap_or(0) > 0;

                ColumnInfo {
                    name,
                    ordinal,
                    data_type,
                    nullable,
                    default_value,
                    is_primary_key,
                }
            })
            .collect();

        Ok(columns)
    }
}

/// SQLite transaction wrapper.
///
/// Owns the connection lock for its whole lifetime and issues raw
/// `COMMIT` / `ROLLBACK` SQL, so no other caller can run a statement
/// between `BEGIN` and the end of the transaction.
pub struct SqliteTransaction {
    // The owned guard is Send but not Sync; the inner mutex makes the
    // transaction shareable across awaits.
    conn: parking_lot::Mutex<OwnedMutexGuard<RusqliteConnection>>,
    committed: bool,
    rolled_back: bool,
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            tracing::warn!(
                "SQLite transaction dropped without commit or rollback, issuing automatic rollback"
            );
            if let Err(e) = self.conn.get_mut().execute_batch("ROLLBACK") {
                tracing::error!(error = %e, "automatic rollback on drop failed");
            }
        }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("committing SQLite transaction");

        if self.rolled_back {
            return Err(TabulaError::Query("Transaction already rolled back".into()));
        }
        if self.committed {
            return Err(TabulaError::Query("Transaction already committed".into()));
        }

        self.conn
            .get_mut()
            .execute_batch("COMMIT")
            .map_err(|e| TabulaError::Query(format!("Failed to commit transaction: {}", e)))?;

        self.committed = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back SQLite transaction");

        if self.committed {
            return Err(TabulaError::Query("Transaction already committed".into()));
        }
        if self.rolled_back {
            return Ok(());
        }

        self.conn
            .get_mut()
            .execute_batch("ROLLBACK")
            .map_err(|e| TabulaError::Query(format!("Failed to rollback transaction: {}", e)))?;

        self.rolled_back = true;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing query in SQLite transaction");
        let conn = self.conn.lock();
        run_query(&conn, sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing statement in SQLite transaction");
        let conn = self.conn.lock();
        run_statement(&conn, sql, params)
    }
}

fn run_statement(conn: &RusqliteConnection, sql: &str, params: &[Value]) -> Result<StatementResult> {
    let rusqlite_params = values_to_rusqlite(params);

    let rows_affected = conn
        .execute(sql, params_from_iter(rusqlite_params.iter()))
        .map_err(|e| TabulaError::Query(format!("Failed to execute statement: {}", e)))?;

    tracing::debug!(affected_rows = rows_affected, "statement executed");
    Ok(StatementResult {
        affected_rows: rows_affected as u64,
    })
}

fn run_query(conn: &RusqliteConnection, sql: &str, params: &[Value]) -> Result<QueryResult> {
    let start_time = std::time::Instant::now();
    let rusqlite_params = values_to_rusqlite(params);

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| TabulaError::Query(format!("Failed to prepare query: {}", e)))?;
    let column_count = stmt.column_count();

    let mut rows = Vec::new();
    let mut query_rows = stmt
        .query(params_from_iter(rusqlite_params.iter()))
        .map_err(|e| TabulaError::Query(format!("Failed to execute query: {}", e)))?;

    while let Some(row) = query_rows
        .next()
        .map_err(|e| TabulaError::Query(format!("Failed to fetch row: {}", e)))?
    {
        let values = (0..column_count)
            .map(|i| rusqlite_to_value(row, i))
            .collect::<Result<Vec<_>>>()?;
        rows.push(Row::new(values));
    }

    tracing::debug!(
        row_count = rows.len(),
        execution_time_ms = start_time.elapsed().as_millis() as u64,
        "query executed successfully"
    );
    Ok(QueryResult { rows })
}

/// Convert our Value types to rusqlite-compatible types
fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Int32(i) => rusqlite::types::Value::Integer(*i as i64),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| TabulaError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        // BLOBs in untyped columns frequently hold text
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn people() -> SqliteConnection {
        let conn = SqliteConnection::open(":memory:").expect("Failed to open in-memory db");
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, full_name TEXT NOT NULL, age INTEGER DEFAULT 30);
             INSERT INTO people (id, full_name) VALUES (1, 'Ada'), (2, 'Grace');",
        )
        .await
        .expect("Failed to seed");
        conn
    }

    async fn name_of(conn: &SqliteConnection, id: i64) -> Option<Value> {
        conn.query("SELECT full_name FROM people WHERE id = ?", &[Value::Int64(id)])
            .await
            .expect("query")
            .scalar()
            .cloned()
    }

    #[tokio::test]
    async fn query_returns_typed_values() {
        let conn = people().await;
        let result = conn
            .query("SELECT id, full_name FROM people ORDER BY id", &[])
            .await
            .expect("query");

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[1].get(0), Some(&Value::Int64(2)));
        assert_eq!(result.rows[1].get(1), Some(&Value::String("Grace".into())));
    }

    #[tokio::test]
    async fn get_columns_reflects_table_info() {
        let conn = people().await;
        let schema = conn
            .as_schema_introspection()
            .expect("Should have schema introspection");

        let columns = schema.get_columns(None, "people").await.expect("columns");
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "full_name", "age"]);
        assert!(columns[0].is_primary_key);
        assert!(!columns[1].nullable);
        assert_eq!(columns[2].default_value.as_deref(), Some("30"));
    }

    #[tokio::test]
    async fn get_columns_for_missing_table_is_empty() {
        let conn = people().await;
        let columns = conn.get_columns(None, "nope").await.expect("columns");
        assert!(columns.is_empty());

        let columns = conn
            .get_columns(Some("main"), "people")
            .await
            .expect("columns with explicit schema");
        assert_eq!(columns.len(), 3);
    }

    #[tokio::test]
    async fn execute_reports_affected_rows() {
        let conn = people().await;
        let result = conn
            .execute(
                "UPDATE people SET full_name = ? WHERE id = ?",
                &[Value::String("Ada L.".into()), Value::Int64(1)],
            )
            .await
            .expect("update");
        assert_eq!(result.affected_rows, 1);

        let result = conn
            .execute("UPDATE people SET full_name = 'x' WHERE id = 99", &[])
            .await
            .expect("update");
        assert_eq!(result.affected_rows, 0);
    }

    #[tokio::test]
    async fn committed_transaction_persists() {
        let conn = people().await;
        let tx = conn.begin_transaction().await.expect("begin");
        tx.execute("DELETE FROM people WHERE id = 2", &[])
            .await
            .expect("delete");
        tx.commit().await.expect("commit");

        let result = conn.query("SELECT COUNT(*) FROM people", &[]).await.unwrap();
        assert_eq!(result.scalar(), Some(&Value::Int64(1)));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let conn = people().await;
        {
            let tx = conn.begin_transaction().await.expect("begin");
            tx.execute("DELETE FROM people", &[]).await.expect("delete");
            let inside = tx.query("SELECT COUNT(*) FROM people", &[]).await.unwrap();
            assert_eq!(inside.scalar(), Some(&Value::Int64(0)));
        }

        let result = conn.query("SELECT COUNT(*) FROM people", &[]).await.unwrap();
        assert_eq!(result.scalar(), Some(&Value::Int64(2)));
    }

    #[tokio::test]
    async fn explicit_rollback_discards_changes() {
        let conn = people().await;
        let tx = conn.begin_transaction().await.expect("begin");
        tx.execute("UPDATE people SET full_name = 'changed'", &[])
            .await
            .expect("update");
        tx.rollback().await.expect("rollback");

        assert_eq!(name_of(&conn, 1).await, Some(Value::String("Ada".into())));
    }

    #[tokio::test]
    async fn writes_wait_for_an_open_transaction() {
        let conn = Arc::new(people().await);
        let tx = conn.begin_transaction().await.expect("begin");
        tx.execute("UPDATE people SET full_name = 'first' WHERE id = 1", &[])
            .await
            .expect("update in transaction");

        let other = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move {
                conn.execute("UPDATE people SET full_name = 'second' WHERE id = 1", &[])
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!other.is_finished(), "write ran inside another transaction");

        tx.rollback().await.expect("rollback");
        other.await.expect("join").expect("write after rollback");
        assert_eq!(name_of(&conn, 1).await, Some(Value::String("second".into())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transactions_do_not_nest() {
        let conn = Arc::new(people().await);
        let tasks = (0..50)
            .map(|i| {
                let conn = Arc::clone(&conn);
                tokio::spawn(async move {
                    let tx = conn.begin_transaction().await?;
                    tx.execute(
                        "UPDATE people SET age = ? WHERE id = 1",
                        &[Value::Int64(i)],
                    )
                    .await?;
                    tokio::task::yield_now().await;
                    tx.commit().await
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            task.await.expect("join").expect("transaction");
        }
    }

    #[tokio::test]
    async fn open_rejects_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("db.sqlite");
        let err = SqliteConnection::open(path.to_str().unwrap())
            .err()
            .expect("should fail");
        assert!(matches!(err, TabulaError::Connection(_)));
    }
}
