//! Route interception decision core
//!
//! Matching policy is an injected predicate and passthrough is an ordinary
//! first branch, so the whole decision table is unit-testable without a live
//! browser.

use std::sync::Arc;

use crate::dataset::MockDataset;
use crate::error::MockApiResult;
use crate::page::{build_response, LinkBuilder};
use crate::query::PageRequest;

/// What to do with one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Complete the request with a synthetic response.
    Fulfill {
        status: u16,
        content_type: &'static str,
        body: String,
    },
    /// Let the request continue to the real network untouched.
    Passthrough,
}

type Matcher = dyn Fn(&str) -> bool + Send + Sync;

/// Stateless handler for intercepted history requests.
///
/// Holds nothing mutable across calls: only the read-only dataset, the link
/// template, and the configured default limit.
pub struct RouteInterceptor {
    matcher: Box<Matcher>,
    dataset: Arc<MockDataset>,
    links: LinkBuilder,
    default_limit: usize,
}

impl RouteInterceptor {
    pub fn new(
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        dataset: Arc<MockDataset>,
        links: LinkBuilder,
        default_limit: usize,
    ) -> Self {
        Self {
            matcher: Box::new(matcher),
            dataset,
            links,
            default_limit,
        }
    }

    /// Interceptor matching any URL that contains `endpoint` as a substring,
    /// with `next`/`previous` links built against `base_url`.
    pub fn for_endpoint(
        endpoint: &str,
        base_url: &str,
        dataset: Arc<MockDataset>,
        default_limit: usize,
    ) -> Self {
        let links = LinkBuilder::new(base_url, endpoint);
        let needle = endpoint.to_string();
        Self::new(move |url: &str| url.contains(&needle), dataset, links, default_limit)
    }

    /// Decide how to handle one request URL.
    ///
    /// Non-matching URLs fall through unmodified. That branch comes first:
    /// the route glob the browser registers is wider than the endpoint, and
    /// the mock must not swallow unrelated traffic sharing it.
    pub fn handle(&self, url: &str) -> MockApiResult<RouteAction> {
        if !(self.matcher)(url) {
            return Ok(RouteAction::Passthrough);
        }

        let request = PageRequest::parse(url, self.default_limit);
        let response = build_response(&self.dataset, request, &self.links);

        Ok(RouteAction::Fulfill {
            status: 200,
            content_type: "application/json",
            body: serde_json::to_string(&response)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageResponse;
    use serde_json::json;

    const BASE: &str = "https://tunservice.example";
    const ENDPOINT: &str = "/api-v1/history";

    fn interceptor(total: usize) -> RouteInterceptor {
        let dataset = Arc::new(MockDataset::from_records(
            (0..total).map(|i| json!({"id": i})).collect(),
        ));
        RouteInterceptor::for_endpoint(ENDPOINT, BASE, dataset, 30)
    }

    fn fulfilled_body(action: RouteAction) -> PageResponse {
        match action {
            RouteAction::Fulfill { status, content_type, body } => {
                assert_eq!(status, 200);
                assert_eq!(content_type, "application/json");
                serde_json::from_str(&body).unwrap()
            }
            RouteAction::Passthrough => panic!("expected Fulfill, got Passthrough"),
        }
    }

    #[test]
    fn unrelated_url_passes_through() {
        let action = interceptor(45)
            .handle("https://tunservice.example/api-v1/balance?offset=0")
            .unwrap();
        assert_eq!(action, RouteAction::Passthrough);
    }

    #[test]
    fn matching_url_is_fulfilled_with_json() {
        let resp = fulfilled_body(
            interceptor(45)
                .handle("https://tunservice.example/api-v1/history?offset=30&limit=30")
                .unwrap(),
        );
        assert_eq!(resp.count, 45);
        assert_eq!(resp.results.len(), 15);
    }

    #[test]
    fn identical_requests_produce_identical_bodies() {
        let interceptor = interceptor(45);
        let url = "https://tunservice.example/api-v1/history?offset=0&limit=10";
        let first = interceptor.handle(url).unwrap();
        let second = interceptor.handle(url).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn custom_matcher_controls_the_decision() {
        let dataset = Arc::new(MockDataset::from_records(vec![json!({"id": 0})]));
        let interceptor = RouteInterceptor::new(
            |url: &str| url.ends_with("/history"),
            dataset,
            LinkBuilder::new(BASE, ENDPOINT),
            30,
        );
        assert_eq!(
            interceptor.handle("https://x.example/history?limit=1").unwrap(),
            RouteAction::Passthrough
        );
        assert!(matches!(
            interceptor.handle("https://x.example/history").unwrap(),
            RouteAction::Fulfill { .. }
        ));
    }
}
