use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ServiceIdentity;
use crate::error::ApiError;
use dockerlab_probe::{ProcessProbe, SharedProbe};

/// Request-scoped handle that exposes the process probe plus the deployment identity.
#[derive(Clone, Debug)]
pub struct ServiceContext {
    probe: SharedProbe,
    identity: ServiceIdentity,
}

impl ServiceContext {
    pub fn new(probe: SharedProbe, identity: ServiceIdentity) -> Self {
        Self { probe, identity }
    }

    /// Returns the read-only process facts.
    pub fn probe(&self) -> &dyn ProcessProbe {
        self.probe.as_ref()
    }

    /// Returns the environment name and container id resolved at startup.
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }
}

/// Errors emitted when a handler requests [`ServiceContext`] but extensions were not set up.
#[derive(Debug, Error)]
pub enum ServiceContextRejection {
    #[error("service context missing from request extensions")]
    MissingContext,
}

impl IntoResponse for ServiceContextRejection {
    fn into_response(self) -> Response {
        ApiError::internal(self.to_string()).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ServiceContext
where
    S: Send + Sync,
{
    type Rejection = ServiceContextRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ServiceContext>()
            .cloned()
            .ok_or(ServiceContextRejection::MissingContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use dockerlab_probe::FixedProbe;

    #[tokio::test]
    async fn extracts_context_from_extensions() {
        let context = ServiceContext::new(FixedProbe::default().shared(), ServiceIdentity::default());
        let request = Request::builder()
            .uri("/")
            .extension(context)
            .body(())
            .unwrap();

        let (mut parts, _) = request.into_parts();
        let extracted = ServiceContext::from_request_parts(&mut parts, &())
            .await
            .expect("context");

        assert_eq!(extracted.identity().environment, "development");
    }

    #[tokio::test]
    async fn missing_context_is_an_internal_fault() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let rejection = ServiceContext::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(
            rejection.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
