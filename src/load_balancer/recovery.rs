//! Total-failure recovery hook.
//!
//! Invoked once per request, only after the availability strategy has
//! exhausted every candidate. A handler either produces a substitute response
//! or declines, in which case the exhaustion error propagates unchanged.

use std::fmt;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::config::RecoveryConfig;
use crate::error::BuildError;
use crate::http::request::BufferedRequest;
use crate::load_balancer::endpoint::RecoveryContext;

#[async_trait]
pub trait RecoveryHandler: Send + Sync + fmt::Debug {
    /// `None` declines recovery.
    async fn recover(&self, ctx: &RecoveryContext, request: &BufferedRequest) -> Option<Response<Body>>;
}

/// Always answers with the same configured response.
#[derive(Debug, Clone)]
pub struct StaticRecovery {
    status: StatusCode,
    body: Bytes,
    content_type: HeaderValue,
}

impl StaticRecovery {
    pub fn new(status: StatusCode, body: impl Into<Bytes>, content_type: HeaderValue) -> Self {
        Self {
            status,
            body: body.into(),
            content_type,
        }
    }

    /// `None` when recovery is disabled.
    pub fn from_config(config: &RecoveryConfig) -> Result<Option<Self>, BuildError> {
        if !config.enabled {
            return Ok(None);
        }

        let status = StatusCode::from_u16(config.status).map_err(|e| BuildError::InvalidRecovery(e.to_string()))?;
        let content_type =
            HeaderValue::from_str(&config.content_type).map_err(|e| BuildError::InvalidRecovery(e.to_string()))?;

        Ok(Some(Self::new(status, config.body.clone(), content_type)))
    }

    fn response(&self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, self.content_type.clone());
        response
    }
}

#[async_trait]
impl RecoveryHandler for StaticRecovery {
    async fn recover(&self, ctx: &RecoveryContext, request: &BufferedRequest) -> Option<Response<Body>> {
        tracing::warn!(
            request_id = %request.request_id(),
            tried = ctx.tried_endpoints.len(),
            status = %self.status,
            "Serving static recovery response"
        );
        Some(self.response())
    }
}

/// Adapts a plain function into a [`RecoveryHandler`].
pub struct FnRecovery<F> {
    hook: F,
}

/// Wrap a closure as a recovery handler.
pub fn recovery_fn<F>(hook: F) -> FnRecovery<F>
where
    F: Fn(&RecoveryContext, &BufferedRequest) -> Option<Response<Body>> + Send + Sync,
{
    FnRecovery { hook }
}

impl<F> fmt::Debug for FnRecovery<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRecovery").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> RecoveryHandler for FnRecovery<F>
where
    F: Fn(&RecoveryContext, &BufferedRequest) -> Option<Response<Body>> + Send + Sync,
{
    async fn recover(&self, ctx: &RecoveryContext, request: &BufferedRequest) -> Option<Response<Body>> {
        (self.hook)(ctx, request)
    }
}
