//! dockerlab service crate.
//!
//! A deliberately small Axum service used to practice building and running
//! containers. It answers four JSON endpoints with facts about the running
//! process and turns everything else into structured JSON errors.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod runtime;
pub mod types;

pub use crate::config::{ConfigError, ServiceConfig, ServiceConfigBuilder, ServiceIdentity};
pub use crate::context::ServiceContext;
pub use crate::dispatcher::{app, routes};
pub use crate::error::{ApiError, DockerlabError, Result};
pub use crate::runtime::{DockerlabRuntime, run, serve};
pub use crate::types::{ErrorResponse, HealthStatus, RandomSample, RuntimeInfo, WelcomeInfo};
pub use dockerlab_probe::{
    FixedProbe, MemoryUsage, ProbeError, ProcessProbe, RuntimeIdentity, SharedProbe, SystemProbe,
};
