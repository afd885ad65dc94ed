//! Endpoint handlers. Each one reads the probe once and serializes the result.

use axum::Json;
use axum::extract::OriginalUri;

use crate::context::ServiceContext;
use crate::error::ApiError;
use crate::types::{
    HEALTHY, HealthStatus, RandomSample, RuntimeInfo, SERVICE_VERSION, WELCOME_MESSAGE,
    WelcomeInfo, iso_timestamp,
};

const RANDOM_UPPER_BOUND: u32 = 100;

pub async fn health(ctx: ServiceContext) -> Json<HealthStatus> {
    let probe = ctx.probe();

    Json(HealthStatus {
        status: HEALTHY.to_owned(),
        timestamp: iso_timestamp(probe.now()),
        uptime_seconds: probe.uptime().as_secs_f64(),
    })
}

pub async fn welcome(ctx: ServiceContext) -> Json<WelcomeInfo> {
    let identity = ctx.identity();

    Json(WelcomeInfo {
        message: WELCOME_MESSAGE.to_owned(),
        version: SERVICE_VERSION.to_owned(),
        environment: identity.environment.clone(),
        container: identity.container.clone(),
    })
}

pub async fn runtime_info(ctx: ServiceContext) -> Result<Json<RuntimeInfo>, ApiError> {
    let probe = ctx.probe();
    let runtime = probe.runtime();
    let memory = probe.memory()?;

    Ok(Json(RuntimeInfo {
        runtime_version: runtime.version,
        platform: runtime.platform,
        memory,
        uptime_seconds: probe.uptime().as_secs_f64(),
    }))
}

pub async fn random_sample(ctx: ServiceContext) -> Json<RandomSample> {
    let probe = ctx.probe();

    Json(RandomSample {
        number: probe.random_below(RANDOM_UPPER_BOUND),
        timestamp: iso_timestamp(probe.now()),
    })
}

/// Echoes the request target (path plus query) the client actually sent.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| uri.path().to_owned());

    tracing::debug!(%path, "no route matched");
    ApiError::not_found(path)
}
