//! Admin gate middleware for tower applications.
//!
//! This module provides [`AdminGateLayer`] for guarding mutating
//! routes behind an authorization policy supplied at startup.

use axum::Json;
use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, Response, StatusCode};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::ErrorBody;

/// Decides whether a request may reach a gated handler.
///
/// The policy is a capability handed to router construction rather
/// than a process-wide flag, so tests and deployments can swap it
/// without touching global state.
pub trait AdminPolicy: Send + Sync + 'static {
    fn is_admin(&self) -> bool;
}

/// A fixed allow/deny policy, the configuration surface the system
/// exposes: one boolean kill switch, no per-user identity.
#[derive(Clone, Debug)]
pub struct StaticPolicy {
    admin: bool,
}

impl StaticPolicy {
    pub fn new(admin: bool) -> Self {
        Self { admin }
    }
}

impl AdminPolicy for StaticPolicy {
    fn is_admin(&self) -> bool {
        self.admin
    }
}

/// A tower middleware rejecting non-admin requests before they reach
/// the inner service.
#[derive(Clone)]
pub struct AdminGate<S> {
    inner: S,
    policy: Arc<dyn AdminPolicy>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AdminGate<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if self.policy.is_admin() {
            return ResponseFuture::Allowed {
                future: self.inner.call(req),
            };
        }

        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            "rejecting non-admin request"
        );

        let response =
            (StatusCode::FORBIDDEN, Json(ErrorBody::no_autorizado())).into_response();
        ResponseFuture::Denied {
            response: Some(response),
        }
    }
}

/// Layer to apply [`AdminGate`] middleware.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tienda::gate::{AdminGateLayer, StaticPolicy};
///
/// let gate = AdminGateLayer::new(Arc::new(StaticPolicy::new(true)));
/// ```
#[derive(Clone)]
pub struct AdminGateLayer {
    policy: Arc<dyn AdminPolicy>,
}

impl AdminGateLayer {
    /// Create a new admin gate layer with the given policy.
    pub fn new(policy: Arc<dyn AdminPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for AdminGateLayer {
    type Service = AdminGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminGate {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

pin_project! {
    /// Response future for [`AdminGate`].
    #[project = ResponseFutureProj]
    pub enum ResponseFuture<F> {
        Allowed { #[pin] future: F },
        Denied { response: Option<Response<Body>> },
    }
}

impl<F, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<Body>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Allowed { future } => future.poll(cx),
            ResponseFutureProj::Denied { response } => Poll::Ready(Ok(response
                .take()
                .expect("ResponseFuture polled after completion"))),
        }
    }
}
