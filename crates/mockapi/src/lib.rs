//! Mocked paginated history API for TunService E2E tests
//!
//! Simulates the `/api-v1/history` listing endpoint so pagination tests run
//! against a fixed, known dataset instead of whatever orders the test account
//! happens to have.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      tun-mockapi                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  MockDataset        fixture JSON -> {count, results}         │
//! │  PageRequest        URL -> {offset, limit} (never fails)     │
//! │  slice_page         records[offset .. offset+limit]          │
//! │  PageResponse       {count, next, previous, results}         │
//! │  RouteInterceptor   url -> Fulfill | Passthrough             │
//! │  MockApiServer      axum server the browser glue proxies to  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The interceptor is pure computation over an immutable dataset; the server
//! is the only async piece, and it exists because the harness drives the
//! browser from generated Node scripts and needs an HTTP surface to proxy
//! intercepted requests to.

pub mod dataset;
pub mod error;
pub mod intercept;
pub mod page;
pub mod query;
pub mod server;

pub use dataset::MockDataset;
pub use error::{MockApiError, MockApiResult};
pub use intercept::{RouteAction, RouteInterceptor};
pub use page::{build_response, slice_page, LinkBuilder, PageResponse};
pub use query::{PageRequest, DEFAULT_LIMIT};
pub use server::MockApiServer;
