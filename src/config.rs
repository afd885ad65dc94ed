use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use dotenvy::Error as DotenvError;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_CONTAINER: &str = "unknown";
const PORT_ENV: &str = "PORT";
const ENVIRONMENT_ENV: &str = "APP_ENV";
const LEGACY_ENVIRONMENT_ENV: &str = "NODE_ENV";
const CONTAINER_ENV: &str = "HOSTNAME";

/// Deployment-supplied identity reported by the welcome endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub environment: String,
    pub container: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            container: DEFAULT_CONTAINER.to_owned(),
        }
    }
}

/// Configuration consumed by the runtime before spinning up Axum.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub identity: ServiceIdentity,
}

impl ServiceConfig {
    /// Loads configuration from `PORT`, `APP_ENV` (or the legacy `NODE_ENV`) and `HOSTNAME`.
    ///
    /// Values from a local `.env` file (parsed via [`dotenvy::dotenv_override`]) override whatever is already set in
    /// the process environment, which makes local development workflows predictable.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_overrides()?;

        let port = resolve_port()?;
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);

        let environment = read_var(ENVIRONMENT_ENV)
            .or_else(|| read_var(LEGACY_ENVIRONMENT_ENV))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());
        let container = read_var(CONTAINER_ENV).unwrap_or_else(|| DEFAULT_CONTAINER.to_owned());

        Ok(Self {
            bind_addr,
            identity: ServiceIdentity {
                environment,
                container,
            },
        })
    }

    /// Returns a builder for programmatic overrides.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

impl Default for ServiceConfig {
    /// Binds to `0.0.0.0:3000` and reports a `development` build on an `unknown` host.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            identity: ServiceIdentity::default(),
        }
    }
}

/// Builder type for [`ServiceConfig`].
#[derive(Default, Clone, Debug)]
pub struct ServiceConfigBuilder {
    bind_addr: Option<SocketAddr>,
    environment: Option<String>,
    container: Option<String>,
}

impl ServiceConfigBuilder {
    /// Sets the address for the embedded Axum listener.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Listens on all interfaces at `port`.
    pub fn port(self, port: u16) -> Self {
        self.bind_addr(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
    }

    /// Sets the deployment environment name (`production`, `staging`, ...).
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the container (host) identifier.
    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();

        ServiceConfig {
            bind_addr: self.bind_addr.unwrap_or(defaults.bind_addr),
            identity: ServiceIdentity {
                environment: self.environment.unwrap_or(defaults.identity.environment),
                container: self.container.unwrap_or(defaults.identity.container),
            },
        }
    }
}

/// Errors that can occur while building [`ServiceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen port: {0:?}")]
    InvalidPort(String),
    #[error("failed to load .env overrides: {0}")]
    Dotenv(#[from] DotenvError),
}

fn load_env_overrides() -> Result<(), ConfigError> {
    match dotenvy::dotenv_override() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}

fn resolve_port() -> Result<u16, ConfigError> {
    match read_var(PORT_ENV) {
        Some(value) => value
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(value)),
        None => Ok(DEFAULT_PORT),
    }
}

// Blank values count as unset, matching how shells and compose files leave them.
fn read_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
