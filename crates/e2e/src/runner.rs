//! Main test runner orchestrating Playwright, the history mock, and visual
//! regression.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use tun_mockapi::{MockApiServer, MockDataset, RouteInterceptor};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};
use crate::playwright::{MockBinding, PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::session::RegistrationThrottle;
use crate::spec::{MockHistorySpec, TestSpec};
use crate::visual::{SnapshotMode, VisualConfig, VisualTester};

/// Result of running a single test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub visual_diffs: Vec<VisualDiffResult>,
    /// First failure message, if any.
    pub message: Option<String>,
    /// Spec file the test came from.
    pub file_path: Option<String>,
    /// Where failure artifacts were written, when the test failed.
    pub artifacts_dir: Option<String>,
    pub device: String,
    pub browser: String,
    pub viewport: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDiffResult {
    pub name: String,
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_image_path: Option<String>,
}

/// Result of running the whole suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<TestResult>,
}

/// Configuration for the test runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub suite: SuiteConfig,
    pub playwright: PlaywrightConfig,
    pub visual: VisualConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Minimum spacing between registration-tagged tests.
    pub registration_spacing: Duration,
}

pub struct TestRunner {
    suite: SuiteConfig,
    playwright_config: PlaywrightConfig,
    visual_config: VisualConfig,
    specs_dir: PathBuf,
    output_dir: PathBuf,
    throttle: RegistrationThrottle,
}

impl TestRunner {
    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            suite: config.suite,
            playwright_config: config.playwright,
            visual_config: config.visual,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
            throttle: RegistrationThrottle::new(config.registration_spacing),
        }
    }

    /// Run all tests in the specs directory.
    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let specs = TestSpec::load_all(&self.specs_dir)?;
        self.run_specs(&specs).await
    }

    /// Run tests matching a tag.
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let specs: Vec<TestSpec> = TestSpec::load_all(&self.specs_dir)?
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        self.run_specs(&specs).await
    }

    /// Run a specific test by name.
    pub async fn run_test(&mut self, name: &str) -> E2eResult<TestResult> {
        let spec = TestSpec::load_all(&self.specs_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Test not found: {name}")))?;
        self.run_spec(&spec).await
    }

    pub async fn run_specs(&mut self, specs: &[TestSpec]) -> E2eResult<TestSuiteResult> {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        info!("Running {} test(s)...", specs.len());

        for spec in specs {
            match self.run_spec(spec).await {
                Ok(result) => {
                    if result.success {
                        passed += 1;
                        info!("PASS {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        failed += 1;
                        error!(
                            "FAIL {} - {}",
                            result.name,
                            result.message.as_deref().unwrap_or("unknown error")
                        );
                    }
                    results.push(result);
                }
                Err(e) => {
                    failed += 1;
                    error!("FAIL {} - {e}", spec.name);
                    results.push(self.error_result(spec, e.to_string()));
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!("Test results: {passed} passed, {failed} failed ({duration_ms} ms)");

        Ok(TestSuiteResult {
            total: specs.len(),
            passed,
            failed,
            duration_ms,
            started_at,
            results,
        })
    }

    /// Run a single test spec.
    pub async fn run_spec(&mut self, spec: &TestSpec) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running test: {}", spec.name);

        // Back-to-back signups trip the backend's rate limit.
        if spec.has_tag("registration") {
            self.throttle.pace().await;
        }

        let artifacts_dir = self.output_dir.join("failed").join(&spec.name);
        let mut pw_config = self.playwright_config.clone();
        pw_config.artifacts_dir = artifacts_dir.clone();
        if spec.viewport.is_some() {
            pw_config.viewport = spec.viewport;
        }

        let playwright = PlaywrightHandle::new(&self.suite, pw_config)?;

        // The server handle scopes the mock to this one test: it is dropped
        // on every exit path, stopping the server before the next test runs.
        let mock_server = match &spec.mock_history {
            Some(mock_spec) => Some(self.start_mock(mock_spec).await?),
            None => None,
        };
        let binding = match (&spec.mock_history, &mock_server) {
            (Some(mock_spec), Some(server)) => Some(MockBinding {
                endpoint: mock_spec.endpoint.clone(),
                proxy_base: server.base_url(),
            }),
            _ => None,
        };

        let outcome = playwright.run_script(&spec.steps, binding.as_ref()).await?;
        drop(mock_server);

        let mut message = outcome.error.clone();
        if !outcome.success && message.is_none() {
            message = Some("script reported failure without an error message".to_string());
        }

        // Visual regression over the screenshots this spec produced.
        let mut visual_diffs = Vec::new();
        if spec.visual_regression && outcome.success {
            let tester = VisualTester::new(self.visual_config.clone())?;
            let mode = SnapshotMode::Threshold(spec.visual_threshold);

            for name in spec.steps.iter().filter_map(|s| match s {
                crate::spec::TestStep::Screenshot { name, .. } => Some(name.clone()),
                _ => None,
            }) {
                match tester.compare(&name, Some(mode)) {
                    Ok(diff) => {
                        if !diff.matches && message.is_none() {
                            message = Some(format!(
                                "Visual regression in '{name}': {:.2}% pixels differ",
                                diff.diff_percent
                            ));
                        }
                        visual_diffs.push(VisualDiffResult {
                            name,
                            matches: diff.matches,
                            diff_percent: diff.diff_percent,
                            diff_image_path: diff
                                .diff_image_path
                                .map(|p| p.to_string_lossy().to_string()),
                        });
                    }
                    Err(E2eError::BaselineNotFound(_)) => {
                        info!("No baseline for '{name}' - run with --update-baselines to create it");
                    }
                    Err(e) => {
                        if message.is_none() {
                            message = Some(format!("Visual comparison error: {e}"));
                        }
                    }
                }
            }
        }

        let success = message.is_none();
        let viewport = spec
            .viewport
            .unwrap_or_else(|| self.playwright_config.device.viewport());

        Ok(TestResult {
            name: spec.name.clone(),
            success,
            duration_ms: start.elapsed().as_millis() as u64,
            steps: outcome.steps,
            visual_diffs,
            message,
            file_path: spec.source.as_ref().map(|p| p.to_string_lossy().to_string()),
            artifacts_dir: (!success).then(|| artifacts_dir.to_string_lossy().to_string()),
            device: self.playwright_config.device.label().to_string(),
            browser: self.playwright_config.browser.as_str().to_string(),
            viewport: format!("{}x{}", viewport.width, viewport.height),
        })
    }

    /// Load the fixture and bring up the in-process history mock.
    ///
    /// A missing or corrupt fixture fails the test here, at setup, rather
    /// than letting it run against an empty dataset.
    async fn start_mock(&self, mock_spec: &MockHistorySpec) -> E2eResult<MockApiServer> {
        let dataset = Arc::new(MockDataset::load(&mock_spec.fixture)?);
        let interceptor = RouteInterceptor::for_endpoint(
            &mock_spec.endpoint,
            &self.suite.base_url,
            dataset,
            mock_spec.limit,
        );
        let server = MockApiServer::spawn(interceptor).await?;
        self.wait_for_mock_healthy(&server).await?;
        Ok(server)
    }

    async fn wait_for_mock_healthy(&self, server: &MockApiServer) -> E2eResult<()> {
        let health_url = format!("{}/health", server.base_url());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match client.get(&health_url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ if Instant::now() > deadline => {
                    return Err(E2eError::Playwright(format!(
                        "Mock API server at {health_url} never became healthy"
                    )));
                }
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    }

    fn error_result(&self, spec: &TestSpec, message: String) -> TestResult {
        let viewport = spec
            .viewport
            .unwrap_or_else(|| self.playwright_config.device.viewport());
        TestResult {
            name: spec.name.clone(),
            success: false,
            duration_ms: 0,
            steps: vec![],
            visual_diffs: vec![],
            message: Some(message),
            file_path: spec.source.as_ref().map(|p| p.to_string_lossy().to_string()),
            artifacts_dir: None,
            device: self.playwright_config.device.label().to_string(),
            browser: self.playwright_config.browser.as_str().to_string(),
            viewport: format!("{}x{}", viewport.width, viewport.height),
        }
    }

    /// Promote current screenshots to baselines.
    pub fn update_baselines(&self) -> E2eResult<()> {
        VisualTester::new(self.visual_config.clone())?.update_all_baselines()
    }

    /// Write suite results to `test-results.json` in the output directory.
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("test-results.json");
        std::fs::write(&path, serde_json::to_string_pretty(results)?)?;
        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
