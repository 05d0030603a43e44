//! Router construction and session entry point.
//!
//! # Wiring
//! ```text
//! RouterConfig + master/slave factories
//!     → RouterBuilder::build (master required, config validated)
//!     → BackendPair (shared availability flags)
//!     → HealthMonitor (writes the flags, if enabled)
//!     → Router::session (one Session per logical connection)
//! ```

use std::fmt;
use std::sync::Arc;

use crate::backend::{BackendPair, ConnectionFactory, Credentials};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, RouterConfig};
use crate::health::HealthMonitor;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::session::Session;

/// Read/write splitting router over a master and an optional slave.
pub struct Router {
    pair: Arc<BackendPair>,
    monitor: Option<HealthMonitor>,
    config: RouterConfig,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Open a session using the factories' own credentials.
    pub fn session(&self) -> Session {
        Session::new(self.pair.clone(), None)
    }

    /// Open a session whose backend connections use these credentials.
    /// Blank credentials behave like [`Router::session`].
    pub fn session_with_credentials(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Session {
        Session::new(
            self.pair.clone(),
            Some(Credentials::new(username, password)),
        )
    }

    /// Start background health checks. Returns false when health checking
    /// is disabled or already running.
    pub fn start_health_checks(&self, shutdown: &Shutdown) -> bool {
        match &self.monitor {
            Some(monitor) => monitor.start(shutdown),
            None => {
                tracing::debug!("Health checking disabled");
                false
            }
        }
    }

    pub fn pair(&self) -> &Arc<BackendPair> {
        &self.pair
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn health_monitor(&self) -> Option<&HealthMonitor> {
        self.monitor.as_ref()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("pair", &self.pair)
            .field("health_checks", &self.monitor.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct RouterBuilder {
    master: Option<Arc<dyn ConnectionFactory>>,
    slave: Option<Arc<dyn ConnectionFactory>>,
    slave_writable: Option<bool>,
    config: RouterConfig,
}

impl RouterBuilder {
    pub fn master(mut self, factory: Arc<dyn ConnectionFactory>) -> Self {
        self.master = Some(factory);
        self
    }

    pub fn slave(mut self, factory: Arc<dyn ConnectionFactory>) -> Self {
        self.slave = Some(factory);
        self
    }

    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides `slave_writable` from the config.
    pub fn slave_writable(mut self, writable: bool) -> Self {
        self.slave_writable = Some(writable);
        self
    }

    pub fn build(self) -> Result<Router, ConfigError> {
        let master = self.master.ok_or(ConfigError::MissingMaster)?;

        let mut config = self.config;
        if let Some(writable) = self.slave_writable {
            config.slave_writable = writable;
        }
        validate_config(&config).map_err(ConfigError::Validation)?;

        metrics::set_enabled(config.observability.metrics_enabled);

        let has_slave = self.slave.is_some();
        let pair = Arc::new(BackendPair::new(master, self.slave, config.slave_writable));
        let monitor = config
            .health_check
            .enabled
            .then(|| HealthMonitor::for_pair(pair.clone(), config.health_check.clone()));

        tracing::info!(
            has_slave,
            slave_writable = config.slave_writable,
            health_checks = monitor.is_some(),
            "Router built"
        );

        Ok(Router {
            pair,
            monitor,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::NamedFactory;
    use crate::backend::Role;

    #[test]
    fn test_build_requires_master() {
        let err = Router::builder()
            .slave(NamedFactory::arc("slave"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMaster));
    }

    #[test]
    fn test_build_validates_config() {
        let mut config = RouterConfig::default();
        config.health_check.recheck_times = 0;

        let err = Router::builder()
            .master(NamedFactory::arc("master"))
            .config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_slave_writable_override() {
        let router = Router::builder()
            .master(NamedFactory::arc("master"))
            .slave(NamedFactory::arc("slave"))
            .slave_writable(true)
            .build()
            .unwrap();
        assert!(router.config().slave_writable);
        assert!(router.pair().slave().unwrap().is_writable());
    }

    #[tokio::test]
    async fn test_health_checks_disabled_by_default() {
        let router = Router::builder()
            .master(NamedFactory::arc("master"))
            .build()
            .unwrap();
        assert!(router.health_monitor().is_none());
        assert!(!router.start_health_checks(&Shutdown::new()));
    }

    #[tokio::test]
    async fn test_monitor_covers_both_endpoints() {
        let mut config = RouterConfig::default();
        config.health_check.enabled = true;

        let router = Router::builder()
            .master(NamedFactory::arc("master"))
            .slave(NamedFactory::arc("slave"))
            .config(config)
            .build()
            .unwrap();

        let roles: Vec<Role> = router
            .health_monitor()
            .unwrap()
            .targets()
            .iter()
            .map(|target| target.role)
            .collect();
        assert_eq!(roles, vec![Role::Master, Role::Slave]);
    }
}
