//! Persistence factory and the runtime unit it produces.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::dialect::{Dialect, VendorAdapter};
use super::schema::{SchemaMode, TableSchema};
use crate::config::{self, PropertySource};
use crate::db::ConnectionPool;
use crate::error::{AppError, AppResult};

/// Provider properties copied verbatim from the property source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceProperties {
    values: BTreeMap<String, String>,
}

impl PersistenceProperties {
    /// Copy every forwarded key. A missing key is an error; nothing is defaulted.
    pub fn from_source(source: &PropertySource) -> AppResult<Self> {
        let mut values = BTreeMap::new();
        for key in config::FORWARDED_KEYS {
            values.insert(key.to_string(), source.require(key)?.to_string());
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }
}

/// Java-style boolean: only `true` (any case) is true.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Configured but not yet initialized persistence unit.
#[derive(Debug)]
pub struct PersistenceFactory {
    pool: Arc<ConnectionPool>,
    vendor_adapter: VendorAdapter,
    properties: PersistenceProperties,
    tables: Vec<TableSchema>,
}

impl PersistenceFactory {
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn vendor_adapter(&self) -> &VendorAdapter {
        &self.vendor_adapter
    }

    pub fn properties(&self) -> &PersistenceProperties {
        &self.properties
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Add a managed table; schema generation covers managed tables only.
    pub fn register(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }

    /// Open the persistence unit: resolve the dialect, warm the pool and apply the
    /// schema-generation mode to the managed tables.
    #[instrument(skip_all, fields(tables = self.tables.len()))]
    pub async fn initialize(self) -> AppResult<PersistenceUnit> {
        let dialect_name = self.properties.get_or_empty(config::HIBERNATE_DIALECT);
        let dialect = self.vendor_adapter.resolve_dialect(dialect_name)?;
        if dialect.driver() != self.pool.driver() {
            return Err(AppError::DialectMismatch {
                dialect: dialect.name().to_string(),
                driver: self.pool.driver().to_string(),
            });
        }

        let schema_mode: SchemaMode = self
            .properties
            .get_or_empty(config::HIBERNATE_HBM2DDL_AUTO)
            .parse()?;
        let second_level_cache = parse_flag(
            self.properties
                .get_or_empty(config::HIBERNATE_USE_SECOND_LEVEL_CACHE),
        );
        let query_cache =
            parse_flag(self.properties.get_or_empty(config::HIBERNATE_USE_QUERY_CACHE));

        self.pool.warm_up().await?;

        let unit = PersistenceUnit {
            pool: self.pool,
            dialect,
            properties: self.properties,
            schema_mode,
            second_level_cache,
            query_cache,
            tables: self.tables,
            initialized_at: Instant::now(),
        };
        unit.apply_schema().await?;

        info!(
            provider = self.vendor_adapter.provider(),
            dialect = unit.dialect.name(),
            schema_mode = unit.schema_mode.as_str(),
            second_level_cache,
            query_cache,
            "persistence unit initialized"
        );
        Ok(unit)
    }
}

/// Build a persistence factory bound to an existing pool.
pub fn build_persistence_factory(
    source: &PropertySource,
    pool: Arc<ConnectionPool>,
) -> AppResult<PersistenceFactory> {
    let properties = PersistenceProperties::from_source(source)?;
    debug!(properties = properties.len(), "persistence factory configured");
    Ok(PersistenceFactory {
        pool,
        vendor_adapter: VendorAdapter,
        properties,
        tables: Vec::new(),
    })
}

/// Runtime handle of an initialized persistence unit.
#[derive(Debug)]
pub struct PersistenceUnit {
    pool: Arc<ConnectionPool>,
    dialect: Arc<dyn Dialect>,
    properties: PersistenceProperties,
    schema_mode: SchemaMode,
    second_level_cache: bool,
    query_cache: bool,
    tables: Vec<TableSchema>,
    initialized_at: Instant,
}

impl PersistenceUnit {
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn properties(&self) -> &PersistenceProperties {
        &self.properties
    }

    pub fn schema_mode(&self) -> SchemaMode {
        self.schema_mode
    }

    pub fn second_level_cache_enabled(&self) -> bool {
        self.second_level_cache
    }

    pub fn query_cache_enabled(&self) -> bool {
        self.query_cache
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn initialized_at(&self) -> Instant {
        self.initialized_at
    }

    pub fn is_open(&self) -> bool {
        !self.pool.is_closed()
    }

    pub async fn table_exists(&self, table: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(self.dialect.table_exists_sql())
            .bind(table.to_string())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(count > 0)
    }

    async fn apply_schema(&self) -> AppResult<()> {
        let mode = self.schema_mode;
        if mode == SchemaMode::Validate {
            for table in &self.tables {
                if !self.table_exists(&table.name).await? {
                    return Err(AppError::SchemaValidation(table.name.clone()));
                }
            }
            return Ok(());
        }

        if mode.drops_on_start() {
            self.drop_tables().await?;
        }
        if matches!(
            mode,
            SchemaMode::Create | SchemaMode::CreateDrop | SchemaMode::CreateOnly | SchemaMode::Update
        ) {
            let if_not_exists = mode == SchemaMode::Update;
            for table in &self.tables {
                let sql = self.dialect.create_table_sql(table, if_not_exists);
                debug!(table = %table.name, "creating table");
                sqlx::query(&sql).execute(self.pool.inner()).await?;
            }
        }
        Ok(())
    }

    async fn drop_tables(&self) -> AppResult<()> {
        for table in self.tables.iter().rev() {
            let sql = self.dialect.drop_table_sql(&table.name);
            debug!(table = %table.name, "dropping table");
            sqlx::query(&sql).execute(self.pool.inner()).await?;
        }
        Ok(())
    }

    /// Release the unit: drop managed tables under `create-drop`, then close the pool.
    pub async fn close(&self) -> AppResult<()> {
        if self.schema_mode.drops_on_shutdown() && self.is_open() {
            self.drop_tables().await?;
        }
        self.pool.close().await;
        Ok(())
    }
}
