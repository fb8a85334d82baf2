//! TunService E2E test framework
//!
//! A Rust-controlled browser test suite for the TunService deployment:
//! - Drives Playwright via generated Node scripts
//! - Parses declarative YAML test specs
//! - Mocks the paginated history API through request interception
//! - Performs visual regression testing with baseline screenshots
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── run_spec(spec) -> TestResult                         │
//! │    ├── start_mock() -> MockApiServer (tun-mockapi)          │
//! │    └── VisualTester::compare(name) -> VisualDiff            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestSpec (YAML)                                            │
//! │    ├── name, tags, viewport, mock_history                   │
//! │    └── steps: navigate / fill / fill_otp / click / wait /   │
//! │               wait_response / click_expect_response /       │
//! │               assert / screenshot / ...                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlaywrightHandle                                           │
//! │    ├── build_script(steps, mock) -> Node script             │
//! │    │     (page.route glue proxies to the mock server,       │
//! │    │      unroute guaranteed in the finally block)          │
//! │    └── run_script() -> per-step results from markers        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod devices;
pub mod error;
pub mod playwright;
pub mod runner;
pub mod session;
pub mod spec;
pub mod timeouts;
pub mod visual;

pub use config::SuiteConfig;
pub use error::{E2eError, E2eResult};
pub use runner::TestRunner;
pub use spec::{TestSpec, TestStep};
