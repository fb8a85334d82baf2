//! Page slicing and the pagination envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::MockDataset;
use crate::query::PageRequest;

/// One page of history records plus the offset/limit envelope.
///
/// `count` always carries the dataset total, so callers can learn the full
/// size from any page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

/// Builds `next`/`previous` links against the real API base, so the frontend
/// under test follows URLs shaped exactly like production ones.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: String,
    endpoint: String,
}

impl LinkBuilder {
    pub fn new(base_url: &str, endpoint: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Canonical page link. The backend omits `offset` entirely on the first
    /// page, so `previous` pointing at page one reads `?limit=N` with no
    /// offset parameter. `next` never targets offset 0 and is unaffected.
    fn link(&self, limit: usize, offset: usize) -> String {
        if offset == 0 {
            format!("{}{}?limit={}", self.base, self.endpoint, limit)
        } else {
            format!("{}{}?limit={}&offset={}", self.base, self.endpoint, limit, offset)
        }
    }

    fn next(&self, req: PageRequest, total: usize) -> Option<String> {
        if req.offset + req.limit < total {
            Some(self.link(req.limit, req.offset + req.limit))
        } else {
            None
        }
    }

    fn previous(&self, req: PageRequest) -> Option<String> {
        if req.offset == 0 {
            return None;
        }
        Some(self.link(req.limit, req.offset.saturating_sub(req.limit)))
    }
}

/// Compute which records belong on the requested page.
///
/// An offset at or past the end yields an empty page, and a limit larger
/// than the remainder returns only the remainder. Neither is an error.
pub fn slice_page(records: &[Value], req: PageRequest) -> &[Value] {
    if req.offset >= records.len() {
        return &[];
    }
    let end = records.len().min(req.offset + req.limit);
    &records[req.offset..end]
}

/// Assemble the full pagination envelope for one request.
pub fn build_response(dataset: &MockDataset, req: PageRequest, links: &LinkBuilder) -> PageResponse {
    PageResponse {
        count: dataset.count,
        next: links.next(req, dataset.count),
        previous: links.previous(req),
        results: slice_page(&dataset.results, req).to_vec(),
    }
}
