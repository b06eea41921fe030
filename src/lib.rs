//! Persistence bootstrap: builds a connection pool, a persistence unit and a
//! transaction coordinator from a properties file, in that order.

pub mod config;
pub mod db;
pub mod error;
pub mod persistence;
pub mod transaction;

pub use config::{ConfigError, PropertySource};
pub use db::{build_connection_pool, ConnectionPool, Driver, PoolSettings};
pub use error::{AppError, AppResult};
pub use persistence::{
    build_persistence_factory, PersistenceFactory, PersistenceUnit, SchemaMode, TableSchema,
};
pub use transaction::{build_transaction_coordinator, TransactionCoordinator};

use std::sync::Arc;
use tracing::info;

/// Handles produced at startup, for the layers above.
#[derive(Debug, Clone)]
pub struct Persistence {
    pub pool: Arc<ConnectionPool>,
    pub unit: Arc<PersistenceUnit>,
    pub transactions: TransactionCoordinator,
}

impl Persistence {
    /// Teardown hook: closes the unit (and with it the pool).
    pub async fn shutdown(self) -> AppResult<()> {
        self.unit.close().await?;
        info!("persistence shut down");
        Ok(())
    }
}

/// Composition root. One pool is built and shared by the factory; the coordinator is
/// bound only after the unit is initialized. Used by main and by integration tests.
pub async fn bootstrap(source: &PropertySource, tables: Vec<TableSchema>) -> AppResult<Persistence> {
    let pool = build_connection_pool(source)?;

    let mut factory = build_persistence_factory(source, Arc::clone(&pool))?;
    for table in tables {
        factory = factory.register(table);
    }
    let unit = Arc::new(factory.initialize().await?);

    let transactions = build_transaction_coordinator(&unit);
    info!(driver = %pool.driver(), "persistence ready");

    Ok(Persistence {
        pool,
        unit,
        transactions,
    })
}
