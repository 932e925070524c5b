//! The HTTP application a tunnel serves inbound requests with.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use tower::ServiceExt;

use httpws_core::error::Result;

use crate::tunnel::recorder::ResponseRecorder;

/// Serves one synthetic request into a recorder.
///
/// Implementations must fully populate the recorder before returning and must
/// not assume a real socket behind the request.
#[async_trait]
pub trait HttpHandler: Send + Sync {
    async fn serve(&self, req: Request<Body>, recorder: &mut ResponseRecorder) -> Result<()>;
}

/// Adapts an axum `Router` (any route tree, including state-less ones).
#[derive(Clone)]
pub struct RouterHandler {
    router: Router,
    max_body_bytes: usize,
}

impl RouterHandler {
    pub fn new(router: Router, max_body_bytes: usize) -> Self {
        Self {
            router,
            max_body_bytes,
        }
    }
}

#[async_trait]
impl HttpHandler for RouterHandler {
    async fn serve(&self, req: Request<Body>, recorder: &mut ResponseRecorder) -> Result<()> {
        let response = match self.router.clone().oneshot(req).await {
            Ok(r) => r,
            Err(never) => match never {},
        };
        recorder.record(response, self.max_body_bytes).await
    }
}
