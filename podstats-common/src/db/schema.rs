//! Declarative table schemas
//!
//! Each table is described once by a [`TableSchema`] implementation. The
//! `CREATE TABLE` and index DDL are generated from that description, and the
//! same description is used to check that an existing store carries every
//! expected column.
//!
//! ```rust,ignore
//! pub struct PodcastsTableSchema;
//!
//! impl TableSchema for PodcastsTableSchema {
//!     fn table_name() -> &'static str { "podcasts" }
//!
//!     fn expected_columns() -> Vec<ColumnDefinition> {
//!         vec![
//!             ColumnDefinition::new("url", "TEXT").not_null(),
//!             ColumnDefinition::new("sheet", "TEXT").not_null(),
//!         ]
//!     }
//!
//!     fn unique_keys() -> Vec<&'static [&'static str]> {
//!         vec![&["url", "sheet"]]
//!     }
//! }
//! ```

use crate::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT value, as SQL text
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

/// Defines expected schema for a database table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    /// Expected column definitions (order matters for table creation)
    fn expected_columns() -> Vec<ColumnDefinition>;

    /// Table-level UNIQUE constraints, one column list each
    fn unique_keys() -> Vec<&'static [&'static str]> {
        Vec::new()
    }

    /// Secondary indexes as (index name, columns)
    fn indexes() -> Vec<(&'static str, &'static [&'static str])> {
        Vec::new()
    }

    /// `CREATE TABLE` statement for this schema
    fn create_table_sql() -> String {
        let mut parts: Vec<String> = Self::expected_columns()
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect();

        for key in Self::unique_keys() {
            parts.push(format!("UNIQUE ({})", key.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            Self::table_name(),
            parts.join(",\n    ")
        )
    }

    /// `CREATE INDEX` statements for this schema
    fn create_index_sql() -> Vec<String> {
        Self::indexes()
            .into_iter()
            .map(|(name, columns)| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    name,
                    Self::table_name(),
                    columns.join(", ")
                )
            })
            .collect()
    }
}

/// Create the table and its indexes on `conn`
///
/// Takes a connection rather than a pool so callers can run it inside the
/// same transaction as the first inserts.
pub async fn create_table<T: TableSchema>(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(&T::create_table_sql()).execute(&mut *conn).await?;

    for statement in T::create_index_sql() {
        sqlx::query(&statement).execute(&mut *conn).await?;
    }

    debug!(table = T::table_name(), "Created table");
    Ok(())
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
}

/// Schema introspection - read actual database schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns from database table using PRAGMA table_info
    ///
    /// Returns columns in database order (by cid)
    pub async fn introspect_table(
        pool: &SqlitePool,
        table_name: &str,
    ) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    /// Check if table exists
    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Expected columns of `T` that the database table lacks
    pub async fn missing_columns<T: TableSchema>(pool: &SqlitePool) -> Result<Vec<String>> {
        let actual = Self::introspect_table(pool, T::table_name()).await?;

        Ok(T::expected_columns()
            .into_iter()
            .filter(|expected| !actual.iter().any(|a| a.name.eq_ignore_ascii_case(&expected.name)))
            .map(|c| c.name)
            .collect())
    }
}
