//! In-process HTTP surface for the mock
//!
//! The harness drives the browser through generated Node scripts, so the
//! per-request interception callback runs in JS. That callback carries no
//! logic of its own: it forwards matched requests here and fulfills with
//! whatever this server answers, keeping all pagination math in Rust.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::error::{MockApiError, MockApiResult};
use crate::intercept::{RouteAction, RouteInterceptor};

/// Handle to a running mock API server.
///
/// The harness holds the handle for exactly one test; dropping it stops the
/// server, so a stale mock can never leak into the next test even when the
/// test fails mid-flight.
pub struct MockApiServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockApiServer {
    /// Bind a free localhost port and start serving.
    pub async fn spawn(interceptor: RouteInterceptor) -> MockApiResult<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(MockApiError::ServerBind)?;
        let addr = listener.local_addr().map_err(MockApiError::ServerBind)?;

        let app = router(Arc::new(interceptor));
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Mock API server exited: {e}");
            }
        });

        info!("Mock history API listening on {addr}");
        Ok(Self { addr, task })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Build the router; split out so tests can drive it with `tower::oneshot`.
pub fn router(interceptor: Arc<RouteInterceptor>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(intercept_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(interceptor)
}

async fn intercept_handler(
    State(interceptor): State<Arc<RouteInterceptor>>,
    request: Request,
) -> Response {
    let url = request.uri().to_string();

    match interceptor.handle(&url) {
        Ok(RouteAction::Fulfill { status, content_type, body }) => {
            debug!(%url, "Fulfilling intercepted history request");
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
                [(header::CONTENT_TYPE, content_type)],
                body,
            )
                .into_response()
        }
        Ok(RouteAction::Passthrough) => {
            // Only matched requests should ever be proxied here; refuse the
            // rest instead of fabricating history for them.
            debug!(%url, "Request does not match the mocked endpoint");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!(%url, "Mock handler error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
