//! Recognized property keys.

pub const DB_DRIVER_CLASS: &str = "db.driver.class";
pub const DB_URL: &str = "db.url";
pub const DB_USERNAME: &str = "db.username";
pub const DB_PASSWORD: &str = "db.password";

pub const DBCP_INITIAL_SIZE: &str = "dbcp.initial.size";
pub const DBCP_MAX_IDLE: &str = "dbcp.max.idle";
pub const DBCP_MAX_TOTAL: &str = "dbcp.max.total";
pub const DBCP_MIN_IDLE: &str = "dbcp.min.idle";

pub const HIBERNATE_HBM2DDL_AUTO: &str = "hibernate.hbm2ddl.auto";
pub const HIBERNATE_DIALECT: &str = "hibernate.dialect";
pub const HIBERNATE_USE_SECOND_LEVEL_CACHE: &str = "hibernate.cache.use_second_level_cache";
pub const HIBERNATE_USE_QUERY_CACHE: &str = "hibernate.cache.use_query_cache";

/// Keys forwarded verbatim into the persistence properties bag.
pub const FORWARDED_KEYS: [&str; 4] = [
    HIBERNATE_HBM2DDL_AUTO,
    HIBERNATE_DIALECT,
    HIBERNATE_USE_SECOND_LEVEL_CACHE,
    HIBERNATE_USE_QUERY_CACHE,
];

pub const ALL_KEYS: [&str; 12] = [
    DB_DRIVER_CLASS,
    DB_URL,
    DB_USERNAME,
    DB_PASSWORD,
    DBCP_INITIAL_SIZE,
    DBCP_MAX_IDLE,
    DBCP_MAX_TOTAL,
    DBCP_MIN_IDLE,
    HIBERNATE_HBM2DDL_AUTO,
    HIBERNATE_DIALECT,
    HIBERNATE_USE_SECOND_LEVEL_CACHE,
    HIBERNATE_USE_QUERY_CACHE,
];
