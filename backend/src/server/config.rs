//! Server settings loaded via OrthoConfig and the assembled server config.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use pantry::outbound::persistence::{DbPool, PoolConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;

/// Settings read from `PANTRY_*` environment variables, configuration files
/// and command-line flags.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PANTRY")]
pub struct ServerSettings {
    /// Interface to listen on.
    pub host: Option<String>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// PostgreSQL connection string. Without it the server runs on fixtures.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub pool_max_size: Option<u32>,
    /// Connections kept warm in the pool.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout_secs: Option<u64>,
}

impl ServerSettings {
    /// Configured host, falling back to all interfaces.
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Configured port, falling back to 8080.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Resolve the listen address.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the host is not an IP address.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let host = self.host();
        let ip: IpAddr = host.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid host {host:?}: {err}"),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port()))
    }

    /// Pool settings for the configured database, if any.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_ref().map(|url| {
            let timeout = self.pool_timeout_secs.unwrap_or(DEFAULT_POOL_TIMEOUT_SECS);
            PoolConfig::new(url.as_str())
                .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
                .with_min_idle(self.pool_min_idle)
                .with_connection_timeout(Duration::from_secs(timeout))
        })
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration bound to `bind_addr` with no database.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool so the Diesel adapters back every
    /// port instead of fixtures.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Settings parsing from the environment.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 6] = [
        "PANTRY_HOST",
        "PANTRY_PORT",
        "PANTRY_DATABASE_URL",
        "PANTRY_POOL_MAX_SIZE",
        "PANTRY_POOL_MIN_IDLE",
        "PANTRY_POOL_TIMEOUT_SECS",
    ];

    fn load() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("pantry")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_without_environment() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();
        assert_eq!(settings.host(), DEFAULT_HOST);
        assert_eq!(settings.port(), DEFAULT_PORT);
        assert!(settings.database_url.is_none());
        assert!(settings.pool_config().is_none());
        assert_eq!(
            settings.bind_addr().expect("bind address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PANTRY_HOST", Some("127.0.0.1".to_owned())),
            ("PANTRY_PORT", Some("9090".to_owned())),
            (
                "PANTRY_DATABASE_URL",
                Some("postgres://pantry@localhost/pantry".to_owned()),
            ),
            ("PANTRY_POOL_MAX_SIZE", Some("4".to_owned())),
            ("PANTRY_POOL_MIN_IDLE", None),
            ("PANTRY_POOL_TIMEOUT_SECS", None),
        ]);

        let settings = load();
        assert_eq!(settings.port(), 9090);
        let pool = settings.pool_config().expect("pool config");
        assert_eq!(pool.database_url(), "postgres://pantry@localhost/pantry");
        assert_eq!(pool.max_size(), 4);
        assert_eq!(
            settings.bind_addr().expect("bind address"),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("socket address")
        );
    }

    #[rstest]
    fn host_names_are_rejected() {
        let settings = ServerSettings {
            host: Some("localhost".to_owned()),
            ..ServerSettings::default()
        };
        assert!(settings.bind_addr().is_err());
    }
}
