//! Driver resolution: maps a configured driver class to an sqlx backend.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

use crate::error::{AppError, AppResult};

/// Database backends the pool can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    Sqlite,
}

impl Driver {
    /// Resolve a driver class name. Both JDBC class names and short names are accepted.
    pub fn from_class(class: &str) -> AppResult<Self> {
        match class.trim().to_ascii_lowercase().as_str() {
            "org.postgresql.driver" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            "org.sqlite.jdbc" | "sqlite" => Ok(Driver::Sqlite),
            _ => Err(AppError::DriverNotFound(class.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    fn schemes(&self) -> &'static [&'static str] {
        match self {
            Driver::Postgres => &["postgres", "postgresql"],
            Driver::Sqlite => &["sqlite"],
        }
    }

    pub fn accepts(&self, url: &str) -> bool {
        let scheme = url.split(':').next().unwrap_or("");
        self.schemes()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    /// Build the sqlx connection URL: strip a `jdbc:` prefix and embed credentials
    /// for server databases. SQLite has no credentials and ignores them.
    pub fn connection_url(&self, url: &str, username: &str, password: &str) -> AppResult<String> {
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        if !self.accepts(url) {
            return Err(AppError::NoSuitableDriver {
                driver: self.name().to_string(),
                url: redact_url(url),
            });
        }

        match self {
            Driver::Sqlite => Ok(shared_memory_url(url)),
            Driver::Postgres => {
                let mut parsed = Url::parse(url)?;
                if !username.is_empty() {
                    parsed
                        .set_username(username)
                        .map_err(|_| AppError::UrlCredentials(redact_url(url)))?;
                }
                if !password.is_empty() {
                    parsed
                        .set_password(Some(password))
                        .map_err(|_| AppError::UrlCredentials(redact_url(url)))?;
                }
                Ok(parsed.into())
            }
        }
    }
}

static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

/// Whether a SQLite url names an in-memory database.
pub fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Each connection of an `Any` pool parses the url again, so a plain `:memory:` url
/// would give every connection its own database. Name the database once and open it
/// with a shared cache so all connections of one pool see the same data.
fn shared_memory_url(url: &str) -> String {
    let database = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    if database == ":memory:" {
        let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
        return format!(
            "sqlite:file:persistence-{}-{seq}?mode=memory&cache=shared",
            std::process::id()
        );
    }
    if url.contains("mode=memory") && !url.contains("cache=shared") {
        let sep = if url.contains('?') { '&' } else { '?' };
        return format!("{url}{sep}cache=shared");
    }
    url.to_string()
}

/// Replace the userinfo of a url with `***` so it can go into errors and logs.
pub fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end + 3 => {
            format!("{}***@{}", &url[..scheme_end + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
