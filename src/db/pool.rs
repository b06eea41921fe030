//! Connection pool built from the `db.*` and `dbcp.*` properties.

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{driver, Driver};
use crate::config::{self, PropertySource};
use crate::error::AppResult;

pub const DEFAULT_INITIAL_SIZE: i32 = 0;
pub const DEFAULT_MAX_IDLE: i32 = 5;
pub const DEFAULT_MAX_TOTAL: i32 = 0;
pub const DEFAULT_MIN_IDLE: i32 = 0;

/// Used when `max_total` is not positive.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing bounds as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub initial_size: i32,
    pub max_idle: i32,
    pub max_total: i32,
    pub min_idle: i32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            max_idle: DEFAULT_MAX_IDLE,
            max_total: DEFAULT_MAX_TOTAL,
            min_idle: DEFAULT_MIN_IDLE,
        }
    }
}

impl PoolSettings {
    /// Parse the four sizing keys; absent keys take their defaults.
    pub fn from_source(source: &PropertySource) -> AppResult<Self> {
        Ok(Self {
            initial_size: source.get_i32_or(config::DBCP_INITIAL_SIZE, DEFAULT_INITIAL_SIZE)?,
            max_idle: source.get_i32_or(config::DBCP_MAX_IDLE, DEFAULT_MAX_IDLE)?,
            max_total: source.get_i32_or(config::DBCP_MAX_TOTAL, DEFAULT_MAX_TOTAL)?,
            min_idle: source.get_i32_or(config::DBCP_MIN_IDLE, DEFAULT_MIN_IDLE)?,
        })
    }

    /// Upper bound handed to sqlx. Zero or negative `max_total` means unbounded,
    /// which sqlx cannot express, so the provider default applies.
    pub fn max_connections(&self) -> u32 {
        if self.max_total > 0 {
            self.max_total as u32
        } else {
            DEFAULT_MAX_CONNECTIONS
        }
    }

    /// Idle floor kept open by sqlx: `min_idle`, capped by a non-negative `max_idle`
    /// and by `max_connections`.
    pub fn min_connections(&self) -> u32 {
        let mut min = self.min_idle.max(0);
        if self.max_idle >= 0 {
            min = min.min(self.max_idle);
        }
        (min as u32).min(self.max_connections())
    }

    /// Connections opened when the persistence unit starts.
    pub fn warm_up_connections(&self) -> u32 {
        (self.initial_size.max(0) as u32).min(self.max_connections())
    }
}

/// Live pool handle. Shared as `Arc<ConnectionPool>` between the factory and the unit.
#[derive(Debug)]
pub struct ConnectionPool {
    inner: AnyPool,
    driver: Driver,
    settings: PoolSettings,
    username: String,
    in_memory: bool,
    created_at: Instant,
}

impl ConnectionPool {
    pub fn inner(&self) -> &AnyPool {
        &self.inner
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether the pool serves a SQLite in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Open `initial_size` connections and return them to the pool as idle.
    pub async fn warm_up(&self) -> AppResult<u32> {
        let count = self.settings.warm_up_connections();
        let mut held = Vec::with_capacity(count as usize);
        for _ in 0..count {
            held.push(self.inner.acquire().await?);
        }
        drop(held);
        debug!(count, "pool warmed up");
        Ok(count)
    }

    pub async fn close(&self) {
        self.inner.close().await;
        info!(driver = %self.driver, "connection pool closed");
    }
}

/// Build a connection pool from the properties. Sizing is parsed before the driver is
/// resolved, so a bad number fails before anything touches the database.
///
/// The pool connects lazily. Must be called inside a Tokio runtime.
///
/// An in-memory SQLite database lives only while a connection to it is open, so such a
/// pool keeps at least one connection and never expires idle ones.
pub fn build_connection_pool(source: &PropertySource) -> AppResult<Arc<ConnectionPool>> {
    let settings = PoolSettings::from_source(source)?;

    let driver = Driver::from_class(source.get_or_empty(config::DB_DRIVER_CLASS))?;
    let username = source.get_or_empty(config::DB_USERNAME);
    let url = driver.connection_url(
        source.get_or_empty(config::DB_URL),
        username,
        source.get_or_empty(config::DB_PASSWORD),
    )?;

    let in_memory = driver == Driver::Sqlite && driver::is_in_memory(&url);

    sqlx::any::install_default_drivers();
    let mut options = AnyPoolOptions::new()
        .max_connections(settings.max_connections())
        .min_connections(settings.min_connections())
        .acquire_timeout(ACQUIRE_TIMEOUT);
    if in_memory {
        options = options
            .min_connections(settings.min_connections().max(1))
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let inner = options.connect_lazy(&url)?;

    info!(
        driver = %driver,
        initial_size = settings.initial_size,
        max_idle = settings.max_idle,
        max_total = settings.max_total,
        min_idle = settings.min_idle,
        in_memory,
        "connection pool created"
    );

    Ok(Arc::new(ConnectionPool {
        inner,
        driver,
        settings,
        username: username.to_string(),
        in_memory,
        created_at: Instant::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::error::AppError;

    fn sqlite_source(extra: &[(&str, &str)]) -> PropertySource {
        let mut pairs = vec![
            (DB_DRIVER_CLASS, "sqlite"),
            (DB_URL, "sqlite::memory:"),
            (DB_USERNAME, "sa"),
            (DB_PASSWORD, ""),
        ];
        pairs.extend_from_slice(extra);
        pairs.into_iter().collect()
    }

    #[test]
    fn sizing_defaults_when_absent() {
        let settings = PoolSettings::from_source(&PropertySource::default()).unwrap();
        assert_eq!(settings.initial_size, 0);
        assert_eq!(settings.max_idle, 5);
        assert_eq!(settings.max_total, 0);
        assert_eq!(settings.min_idle, 0);
    }

    #[test]
    fn sizing_values_used_verbatim() {
        let source: PropertySource = [
            (DBCP_INITIAL_SIZE, "2"),
            (DBCP_MAX_IDLE, "-1"),
            (DBCP_MAX_TOTAL, "20"),
            (DBCP_MIN_IDLE, "3"),
        ]
        .into_iter()
        .collect();
        let settings = PoolSettings::from_source(&source).unwrap();
        assert_eq!(
            settings,
            PoolSettings {
                initial_size: 2,
                max_idle: -1,
                max_total: 20,
                min_idle: 3,
            }
        );
    }

    #[test]
    fn each_sizing_key_rejects_non_integers() {
        for key in [DBCP_INITIAL_SIZE, DBCP_MAX_IDLE, DBCP_MAX_TOTAL, DBCP_MIN_IDLE] {
            let source: PropertySource = [(key, "ten")].into_iter().collect();
            let err = PoolSettings::from_source(&source).unwrap_err();
            assert!(
                matches!(&err, AppError::Config(ConfigError::Parse { key: k, .. }) if k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn sqlx_bounds_follow_settings() {
        let unbounded = PoolSettings::default();
        assert_eq!(unbounded.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(unbounded.min_connections(), 0);

        let capped = PoolSettings {
            initial_size: 50,
            max_idle: 2,
            max_total: 4,
            min_idle: 3,
        };
        assert_eq!(capped.max_connections(), 4);
        assert_eq!(capped.min_connections(), 2);
        assert_eq!(capped.warm_up_connections(), 4);

        let no_idle_cap = PoolSettings {
            max_idle: -1,
            min_idle: 8,
            ..capped
        };
        assert_eq!(no_idle_cap.min_connections(), 4);
    }

    #[tokio::test]
    async fn pool_reports_configured_sizing() {
        let pool = build_connection_pool(&sqlite_source(&[(DBCP_MAX_TOTAL, "10")])).unwrap();
        let settings = pool.settings();
        assert_eq!(settings.max_total, 10);
        assert_eq!(settings.min_idle, 0);
        assert_eq!(settings.initial_size, 0);
        assert_eq!(settings.max_idle, 5);
        assert_eq!(pool.driver(), Driver::Sqlite);
        assert_eq!(pool.username(), "sa");
    }

    #[tokio::test]
    async fn parse_error_precedes_driver_lookup() {
        let source: PropertySource = [
            (DB_DRIVER_CLASS, "org.h2.Driver"),
            (DB_URL, "jdbc:h2:mem:test"),
            (DBCP_INITIAL_SIZE, "abc"),
        ]
        .into_iter()
        .collect();
        let err = build_connection_pool(&source).unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::Parse { .. })), "{err}");
    }

    #[tokio::test]
    async fn unknown_driver_class_fails() {
        let source: PropertySource = [
            (DB_DRIVER_CLASS, "org.h2.Driver"),
            (DB_URL, "jdbc:h2:mem:test"),
            (DB_USERNAME, "sa"),
            (DB_PASSWORD, ""),
            (DBCP_MAX_TOTAL, "10"),
        ]
        .into_iter()
        .collect();
        let err = build_connection_pool(&source).unwrap_err();
        assert!(matches!(err, AppError::DriverNotFound(_)), "{err}");
    }

    #[tokio::test]
    async fn independent_builds_yield_distinct_pools() {
        let source = sqlite_source(&[]);
        let first = build_connection_pool(&source).unwrap();
        let second = build_connection_pool(&source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.settings(), second.settings());
    }

    #[tokio::test]
    async fn warm_up_opens_initial_connections() {
        let pool = build_connection_pool(&sqlite_source(&[
            (DBCP_INITIAL_SIZE, "2"),
            (DBCP_MAX_TOTAL, "3"),
        ]))
        .unwrap();
        assert_eq!(pool.warm_up().await.unwrap(), 2);
        assert!(pool.inner().size() >= 2);
        pool.close().await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn memory_database_is_shared_by_all_connections() {
        let pool = build_connection_pool(&sqlite_source(&[(DBCP_MAX_TOTAL, "4")])).unwrap();
        assert!(pool.is_in_memory());

        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(pool.inner().acquire().await.unwrap());
        }
        sqlx::query("CREATE TABLE pool_rows (id INTEGER PRIMARY KEY)")
            .execute(&mut *held[0])
            .await
            .unwrap();
        sqlx::query("INSERT INTO pool_rows (id) VALUES (7)")
            .execute(&mut *held[1])
            .await
            .unwrap();
        for conn in held.iter_mut() {
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pool_rows")
                .fetch_one(&mut **conn)
                .await
                .unwrap();
            assert_eq!(count, 1);
        }
        drop(held);
        pool.close().await;
    }

    #[tokio::test]
    async fn separate_memory_pools_do_not_share_data() {
        let source = sqlite_source(&[(DBCP_MAX_TOTAL, "2")]);
        let first = build_connection_pool(&source).unwrap();
        let second = build_connection_pool(&source).unwrap();
        sqlx::query("CREATE TABLE only_first (id INTEGER)")
            .execute(first.inner())
            .await
            .unwrap();
        assert!(sqlx::query("SELECT * FROM only_first")
            .execute(second.inner())
            .await
            .is_err());
    }
}
