//! SQL dialects and the vendor adapter that selects one.

use std::fmt;
use std::sync::Arc;

use super::schema::{ColumnType, TableSchema};
use crate::db::Driver;
use crate::error::{AppError, AppResult};

/// Database-specific SQL generation.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Driver this dialect speaks.
    fn driver(&self) -> Driver;

    fn column_type(&self, ty: ColumnType) -> &'static str;

    /// Query returning the number of tables named by its single bind parameter.
    fn table_exists_sql(&self) -> &'static str;

    fn drop_table_sql(&self, table: &str) -> String;

    fn create_table_sql(&self, table: &TableSchema, if_not_exists: bool) -> String {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", c.name, self.column_type(c.ty));
                if c.primary_key {
                    def.push_str(" PRIMARY KEY");
                } else if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        format!(
            "CREATE TABLE {}{} ({})",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            table.name,
            columns.join(", ")
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::Identity => "BIGSERIAL",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMPTZ",
        }
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name = $1"
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {table} CASCADE")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match ty {
            // INTEGER PRIMARY KEY aliases the rowid
            ColumnType::Identity | ColumnType::BigInt | ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Double => "REAL",
            ColumnType::Text | ColumnType::Timestamp => "TEXT",
        }
    }

    fn table_exists_sql(&self) -> &'static str {
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {table}")
    }
}

/// Vendor adapter descriptor. Carries no settings of its own; it only knows which
/// dialects are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorAdapter;

impl VendorAdapter {
    pub fn provider(&self) -> &'static str {
        "sqlx"
    }

    /// Select a dialect from a configured name such as
    /// `org.hibernate.dialect.PostgreSQLDialect` or `sqlite`.
    pub fn resolve_dialect(&self, name: &str) -> AppResult<Arc<dyn Dialect>> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("postgres") {
            Ok(Arc::new(PostgresDialect))
        } else if lower.contains("sqlite") {
            Ok(Arc::new(SqliteDialect))
        } else {
            Err(AppError::UnsupportedDialect(name.to_string()))
        }
    }
}
