//! Declarative YAML test specification

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::devices::Viewport;
use crate::error::{E2eError, E2eResult};
use crate::timeouts;

/// A complete test specification parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering (`smoke`, `regression`, `registration`, ...).
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport override; when absent the device preset's viewport is used.
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Mock the paginated history API for the whole test.
    #[serde(default)]
    pub mock_history: Option<MockHistorySpec>,

    /// Steps to execute in order.
    pub steps: Vec<TestStep>,

    /// Whether screenshots taken by this test are compared to baselines.
    #[serde(default)]
    pub visual_regression: bool,

    /// Allowed pixel difference, percent.
    #[serde(default = "default_threshold")]
    pub visual_threshold: f64,

    /// File this spec was loaded from; absent for inline specs.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_threshold() -> f64 {
    0.5
}

/// Configuration of the mocked paginated history API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockHistorySpec {
    /// JSON fixture holding the full dataset (`{count, results}`), relative
    /// to the workspace root.
    pub fixture: PathBuf,

    /// Endpoint substring to intercept.
    #[serde(default = "default_history_endpoint")]
    pub endpoint: String,

    /// Default page size when a request carries no usable `limit`.
    #[serde(default = "default_page_limit")]
    pub limit: usize,
}

fn default_history_endpoint() -> String {
    "/api-v1/history".to_string()
}

fn default_page_limit() -> usize {
    30
}

/// A single step in a test.
///
/// Values in `fill`-like steps may use `${username}`, `${password}`, and
/// `${otp}` placeholders, substituted from the suite configuration so
/// credentials never land in spec files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL relative to the deployment base.
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element.
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field.
    Fill {
        selector: String,
        value: String,
    },

    /// Spread the configured OTP code across individual pin inputs,
    /// one character per field.
    FillOtp {
        selectors: Vec<String>,
    },

    /// Press a key, optionally scoped to an element.
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Check a checkbox (consent boxes on the registration form).
    Check {
        selector: String,
    },

    /// Hover over an element.
    Hover {
        selector: String,
    },

    /// Wait for an element to reach a state.
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for an API response whose URL contains a substring.
    WaitResponse {
        url_contains: String,
        #[serde(default = "default_response_timeout")]
        timeout_ms: u64,
    },

    /// Click a submit control and wait for the matching API response,
    /// re-submitting after a pause when the backend answers HTTP 429.
    ClickExpectResponse {
        selector: String,
        url_contains: String,
        #[serde(default = "default_response_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        retries_on_429: u32,
        #[serde(default)]
        retry_wait_ms: Option<u64>,
    },

    /// Wait a fixed amount of time. For real UI animations only.
    Sleep {
        ms: u64,
    },

    /// Assert something about an element.
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Take a screenshot.
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },
}

fn default_wait_timeout() -> u64 {
    timeouts::ELEMENT_VISIBLE
}

fn default_response_timeout() -> u64 {
    timeouts::RESPONSE_WAIT
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl TestStep {
    /// Short name used in step reports and logs.
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url, .. } => format!("navigate:{url}"),
            TestStep::Click { selector, .. } => format!("click:{selector}"),
            TestStep::Fill { selector, .. } => format!("fill:{selector}"),
            TestStep::FillOtp { .. } => "fill_otp".to_string(),
            TestStep::Press { key, .. } => format!("press:{key}"),
            TestStep::Check { selector } => format!("check:{selector}"),
            TestStep::Hover { selector } => format!("hover:{selector}"),
            TestStep::Wait { selector, .. } => format!("wait:{selector}"),
            TestStep::WaitResponse { url_contains, .. } => format!("wait_response:{url_contains}"),
            TestStep::ClickExpectResponse { selector, .. } => {
                format!("click_expect_response:{selector}")
            }
            TestStep::Sleep { ms } => format!("sleep:{ms}ms"),
            TestStep::Assert { selector, .. } => format!("assert:{selector}"),
            TestStep::Screenshot { name, .. } => format!("screenshot:{name}"),
        }
    }
}

impl TestSpec {
    /// Parse a test spec from a YAML string.
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a test spec from a YAML file.
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content)?;
        spec.source = Some(path.to_path_buf());
        Ok(spec)
    }

    /// Load all test specs from a directory, recursively.
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
