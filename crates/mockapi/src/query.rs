//! Pagination query parsing

use url::Url;

/// Default page size when the request carries no usable `limit`.
pub const DEFAULT_LIMIT: usize = 30;

/// Pagination window requested by the client, derived per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Index of the first record on the page.
    pub offset: usize,
    /// Maximum records per page, always > 0.
    pub limit: usize,
}

impl PageRequest {
    /// Extract `offset` and `limit` from a request URL.
    ///
    /// Absent, malformed, or non-positive values fall back to `offset=0` and
    /// the supplied default limit. Bad paging input is ignored, never an
    /// error, matching the backend this mock stands in for.
    pub fn parse(url: &str, default_limit: usize) -> Self {
        let mut offset = 0usize;
        let mut limit = default_limit;

        if let Some(parsed) = parse_lenient(url) {
            for (key, value) in parsed.query_pairs() {
                match key.as_ref() {
                    "offset" => {
                        if let Ok(parsed) = value.parse::<usize>() {
                            offset = parsed;
                        }
                    }
                    "limit" => {
                        if let Ok(parsed) = value.parse::<usize>() {
                            if parsed > 0 {
                                limit = parsed;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Self { offset, limit }
    }
}

/// Parse an absolute URL, or resolve a bare request path (the form axum
/// hands the server: `/api-v1/history?limit=30`) against a dummy origin.
fn parse_lenient(url: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(_) => Url::parse("http://mock.invalid/").ok()?.join(url).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const URL: &str = "https://tunservice.example/api-v1/history";

    #[test]
    fn no_query_uses_defaults() {
        let req = PageRequest::parse(URL, DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 0, limit: 30 });
    }

    #[test]
    fn explicit_offset_and_limit() {
        let req = PageRequest::parse(&format!("{URL}?offset=30&limit=10"), DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 30, limit: 10 });
    }

    #[test]
    fn bare_request_path_parses_like_an_absolute_url() {
        let req = PageRequest::parse("/api-v1/history?offset=30&limit=10", DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 30, limit: 10 });
    }

    #[test_case("limit=abc"; "non-numeric limit")]
    #[test_case("limit=0"; "zero limit")]
    #[test_case("limit=-5"; "negative limit")]
    #[test_case("limit="; "empty limit")]
    fn bad_limit_falls_back_to_default(query: &str) {
        let req = PageRequest::parse(&format!("{URL}?{query}&offset=5"), DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 5, limit: 30 });
    }

    #[test_case("offset=abc"; "non-numeric offset")]
    #[test_case("offset=-1"; "negative offset")]
    #[test_case("offset="; "empty offset")]
    fn bad_offset_falls_back_to_zero(query: &str) {
        let req = PageRequest::parse(&format!("{URL}?{query}&limit=10"), DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 0, limit: 10 });
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let req = PageRequest::parse(&format!("{URL}?sort=desc&offset=15&flag"), DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 15, limit: 30 });
    }

    #[test]
    fn fragment_is_not_part_of_the_query() {
        let req = PageRequest::parse(&format!("{URL}?offset=10#limit=99"), DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 10, limit: 30 });
    }

    #[test]
    fn unparseable_input_uses_defaults() {
        let req = PageRequest::parse("not a url at all ?? #", DEFAULT_LIMIT);
        assert_eq!(req, PageRequest { offset: 0, limit: 30 });
    }

    #[test]
    fn custom_default_limit() {
        let req = PageRequest::parse(URL, 15);
        assert_eq!(req.limit, 15);
    }
}
