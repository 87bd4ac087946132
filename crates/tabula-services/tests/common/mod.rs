//! Common test utilities and mocks
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tabula_catalog::{
    ColumnDescriptor, ForeignKeyDescriptor, PrimaryKeyDescriptor, TableCatalog, TableDescriptor,
    TableGroup,
};
use tabula_core::{
    ColumnInfo, Connection, QueryResult, Result, Row, SchemaIntrospection, StatementResult,
    Transaction, Value,
};
use tabula_drivers::sqlite::SqliteConnection;

/// The `employees` fixture: a self-referencing manager lookup.
///
/// Row 5 (K. Lee) reports to M. Smith (3); J. Doe has id 2.
pub const EMPLOYEES_SQL: &str = "
    CREATE TABLE employees (
        id INTEGER PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT,
        salary REAL DEFAULT 0,
        manager_id INTEGER REFERENCES employees(id)
    );
    INSERT INTO employees (id, full_name, email, salary, manager_id) VALUES
        (1, 'A. Boss',  'boss@example.com',  9000.0, NULL),
        (2, 'J. Doe',   'jdoe@example.com',  5000.0, 1),
        (3, 'M. Smith', 'msmith@example.com', 5200.0, 1),
        (4, 'B. Young', NULL,                3100.0, 2),
        (5, 'K. Lee',   'klee@example.com',  3300.0, 3);
";

pub async fn sqlite_with(sql: &str) -> Arc<SqliteConnection> {
    let connection = SqliteConnection::open(":memory:").expect("open in-memory sqlite");
    connection.execute_batch(sql).await.expect("load fixture");
    Arc::new(connection)
}

pub async fn employees_db() -> Arc<SqliteConnection> {
    sqlite_with(EMPLOYEES_SQL).await
}

pub fn manager_lookup() -> ForeignKeyDescriptor {
    ForeignKeyDescriptor::new("employees", "id", "full_name").order_by("full_name", false)
}

pub fn employees_table() -> TableDescriptor {
    TableDescriptor::new(
        "employees",
        PrimaryKeyDescriptor {
            display_name: "ID".into(),
            ..PrimaryKeyDescriptor::new("id")
        },
    )
    .display_name("Employees")
    .with_column(ColumnDescriptor::new("full_name").display_name("Name"))
    .with_column(ColumnDescriptor::new("email"))
    .with_column(
        ColumnDescriptor::new("manager_id")
            .display_name("Manager")
            .foreign_key(manager_lookup()),
    )
}

pub fn hr_catalog() -> TableCatalog {
    TableCatalog::new(vec![
        TableGroup::new("hr").with_table(employees_table()),
    ])
    .expect("valid catalog")
}

pub async fn scalar(connection: &dyn Connection, sql: &str) -> Value {
    connection
        .query(sql, &[])
        .await
        .expect("query")
        .scalar()
        .cloned()
        .unwrap_or(Value::Null)
}

pub fn column(name: &str, data_type: &str) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable: true,
        ..Default::default()
    }
}

/// A canned query result
pub fn result(rows: Vec<Vec<Value>>) -> QueryResult {
    QueryResult {
        rows: rows.into_iter().map(Row::new).collect(),
    }
}

/// Mock connection for asserting the SQL the services generate.
///
/// Queries are answered from SQL-pattern responses; statements report
/// `affected_rows`. Everything run through the connection or one of its
/// transactions is appended to one shared log, including `BEGIN`,
/// `COMMIT` and `ROLLBACK` markers.
pub struct MockConnection {
    pub driver: String,
    pub tables: HashMap<String, Vec<ColumnInfo>>,
    /// If a query contains the pattern, the corresponding result is returned
    pub query_responses: Vec<(String, QueryResult)>,
    pub affected_rows: u64,
    /// Log of all SQL executed, for assertion in tests
    pub query_log: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            driver: "mock".to_string(),
            tables: HashMap::new(),
            query_responses: vec![],
            affected_rows: 1,
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        self.tables.insert(name.into(), columns);
        self
    }

    /// Register a response for queries containing the given SQL pattern.
    pub fn with_query_response(
        mut self,
        sql_contains: impl Into<String>,
        result: QueryResult,
    ) -> Self {
        self.query_responses.push((sql_contains.into(), result));
        self
    }

    pub fn with_affected_rows(mut self, affected_rows: u64) -> Self {
        self.affected_rows = affected_rows;
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    fn respond(&self, sql: &str) -> QueryResult {
        self.query_log.lock().push(sql.to_string());
        self.query_responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(QueryResult::empty)
    }

    fn run(&self, sql: &str) -> StatementResult {
        self.query_log.lock().push(sql.to_string());
        StatementResult {
            affected_rows: self.affected_rows,
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        Ok(self.run(sql))
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        Ok(self.respond(sql))
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        self.query_log.lock().push("BEGIN".to_string());
        Ok(Box::new(MockTransaction {
            log: Arc::clone(&self.query_log),
            responses: self.query_responses.clone(),
            affected_rows: self.affected_rows,
        }))
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

#[async_trait]
impl SchemaIntrospection for MockConnection {
    async fn get_columns(&self, _schema: Option<&str>, table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }
}

pub struct MockTransaction {
    log: Arc<parking_lot::Mutex<Vec<String>>>,
    responses: Vec<(String, QueryResult)>,
    affected_rows: u64,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.log.lock().push("COMMIT".to_string());
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.log.lock().push("ROLLBACK".to_string());
        Ok(())
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.log.lock().push(sql.to_string());
        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(QueryResult::empty))
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.log.lock().push(sql.to_string());
        Ok(StatementResult {
            affected_rows: self.affected_rows,
        })
    }
}
