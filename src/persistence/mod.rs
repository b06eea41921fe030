//! Persistence factory, vendor adapter and dialects, schema generation.

mod dialect;
mod factory;
mod schema;

pub use dialect::{Dialect, PostgresDialect, SqliteDialect, VendorAdapter};
pub use factory::{
    build_persistence_factory, PersistenceFactory, PersistenceProperties, PersistenceUnit,
};
pub use schema::{Column, ColumnType, SchemaMode, TableSchema};
