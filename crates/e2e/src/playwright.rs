//! Playwright browser automation
//!
//! The whole spec runs as one generated Node script so page state (login
//! session, mock routes) survives across steps. The script prints one
//! `TUNE2E {...}` JSON marker per completed step and a final `done` marker;
//! the runner parses those back into step results.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::config::SuiteConfig;
use crate::devices::{DevicePreset, Viewport};
use crate::error::{E2eError, E2eResult};
use crate::spec::{TestStep, WaitState};
use crate::timeouts;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "firefox" => Browser::Firefox,
            "webkit" => Browser::Webkit,
            _ => Browser::Chromium,
        }
    }
}

/// Configuration for Playwright script generation.
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub screenshot_dir: PathBuf,
    /// Where failure artifacts (screenshot, HTML, URL) land.
    pub artifacts_dir: PathBuf,
    pub device: DevicePreset,
    /// Overrides the device preset's viewport when set.
    pub viewport: Option<Viewport>,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            artifacts_dir: PathBuf::from("test-results/failed"),
            device: DevicePreset::Desktop,
            viewport: None,
            browser: Browser::Chromium,
            headless: true,
        }
    }
}

/// Wiring for the mocked history API: the generated script intercepts
/// matching requests and proxies them to the in-process mock server.
#[derive(Debug, Clone)]
pub struct MockBinding {
    /// Endpoint substring guarded inside the handler.
    pub endpoint: String,
    /// Base URL of the local mock server, e.g. `http://127.0.0.1:49321`.
    pub proxy_base: String,
}

/// Result of executing a single test step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of one full script run.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    pub success: bool,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// One `TUNE2E` marker line emitted by the generated script.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Marker {
    Step { name: String, ms: u64 },
    Done {
        ok: bool,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        step: Option<usize>,
    },
}

pub struct PlaywrightHandle {
    base_url: String,
    credentials: Credentials,
    config: PlaywrightConfig,
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
    otp: String,
}

impl PlaywrightHandle {
    pub fn new(suite: &SuiteConfig, config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(&config.screenshot_dir)?;
        std::fs::create_dir_all(&config.artifacts_dir)?;

        Ok(Self {
            base_url: suite.base_url.clone(),
            credentials: Credentials {
                username: suite.username.clone(),
                password: suite.password.clone(),
                otp: suite.otp_code.clone(),
            },
            config,
        })
    }

    fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Substitute `${username}` / `${password}` / `${otp}` placeholders so
    /// credentials stay out of spec files.
    fn substitute(&self, value: &str) -> String {
        value
            .replace("${username}", &self.credentials.username)
            .replace("${password}", &self.credentials.password)
            .replace("${otp}", &self.credentials.otp)
    }

    /// Build the Node script for a full spec run.
    pub fn build_script(&self, steps: &[TestStep], mock: Option<&MockBinding>) -> String {
        let viewport = self
            .config
            .viewport
            .unwrap_or_else(|| self.config.device.viewport());

        let mut script = format!(
            r#"const {{ chromium, firefox, webkit, devices }} = require('playwright');
const fs = require('fs');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    ...devices[{device}],
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  const baseUrl = {base_url};
  const report = (obj) => console.log('TUNE2E ' + JSON.stringify(obj));
  let stepStart = Date.now();
  let step = 0;
  const mark = (name) => {{
    report({{ event: 'step', name, ms: Date.now() - stepStart }});
    step += 1;
    stepStart = Date.now();
  }};
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            device = js_str(self.config.device.playwright_name()),
            width = viewport.width,
            height = viewport.height,
            base_url = js_str(&self.base_url),
        );

        if let Some(mock) = mock {
            script.push_str(&self.mock_route_js(mock));
        }

        script.push_str("\n  try {\n");

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
            script.push_str(&self.step_to_js(step));
            script.push_str(&format!("    mark({});\n", js_str(&step.name())));
        }

        script.push_str(
            r#"
    report({ event: 'done', ok: true });
  } catch (error) {
    try {
      await page.screenshot({ path: ARTIFACTS + '/failure.png', fullPage: true });
      fs.writeFileSync(ARTIFACTS + '/failure.html', await page.content());
      fs.writeFileSync(ARTIFACTS + '/failure-url.txt', page.url());
    } catch (artifactError) {
      // artifact capture must never replace the original failure
    }
    report({ event: 'done', ok: false, step, error: error.message });
    process.exitCode = 1;
  } finally {
"#,
        );

        if let Some(mock) = mock {
            script.push_str(&format!(
                "    await page.unroute('**' + {} + '**');\n",
                js_str(&mock.endpoint)
            ));
        }

        script.push_str("    await browser.close();\n  }\n})();\n");

        // Artifacts path is referenced from the catch block above.
        let artifacts = js_str(&self.config.artifacts_dir.to_string_lossy());
        format!("const ARTIFACTS = {artifacts};\n{script}")
    }

    /// Request-interception glue. The endpoint guard is the explicit first
    /// branch: anything else sharing the glob falls back to the network.
    /// All pagination logic lives on the Rust side of the proxy.
    fn mock_route_js(&self, mock: &MockBinding) -> String {
        format!(
            r#"
  const mockEndpoint = {endpoint};
  const mockBase = {proxy_base};
  await page.route('**' + mockEndpoint + '**', async (route) => {{
    const url = route.request().url();
    if (!url.includes(mockEndpoint)) {{
      await route.fallback();
      return;
    }}
    const query = url.includes('?') ? url.slice(url.indexOf('?')) : '';
    const proxied = await page.request.get(mockBase + mockEndpoint + query);
    await route.fulfill({{
      status: proxied.status(),
      contentType: 'application/json',
      body: await proxied.text()
    }});
  }});
"#,
            endpoint = js_str(&mock.endpoint),
            proxy_base = js_str(&mock.proxy_base),
        )
    }

    fn step_to_js(&self, step: &TestStep) -> String {
        match step {
            TestStep::Navigate { url, wait_for_selector } => {
                let mut js = format!(
                    "    await page.goto(baseUrl + {}, {{ waitUntil: 'domcontentloaded' }});\n",
                    js_str(url)
                );
                if let Some(selector) = wait_for_selector {
                    js.push_str(&format!(
                        "    await page.waitForSelector({}, {{ timeout: {} }});\n",
                        js_str(selector),
                        timeouts::PAGE_LOAD
                    ));
                }
                js
            }
            TestStep::Click { selector, timeout_ms } => format!(
                "    await page.click({}, {{ timeout: {} }});\n",
                js_str(selector),
                timeout_ms.unwrap_or(timeouts::ELEMENT_VISIBLE)
            ),
            TestStep::Fill { selector, value } => format!(
                "    await page.fill({}, {});\n",
                js_str(selector),
                js_str(&self.substitute(value))
            ),
            TestStep::FillOtp { selectors } => {
                let mut js = String::new();
                for (selector, digit) in selectors.iter().zip(self.credentials.otp.chars()) {
                    js.push_str(&format!(
                        "    await page.fill({}, {});\n",
                        js_str(selector),
                        js_str(&digit.to_string())
                    ));
                }
                js
            }
            TestStep::Press { selector, key } => match selector {
                Some(selector) => format!(
                    "    await page.locator({}).press({});\n",
                    js_str(selector),
                    js_str(key)
                ),
                None => format!("    await page.keyboard.press({});\n", js_str(key)),
            },
            TestStep::Check { selector } => {
                format!("    await page.check({});\n", js_str(selector))
            }
            TestStep::Hover { selector } => {
                format!("    await page.hover({});\n", js_str(selector))
            }
            TestStep::Wait { selector, timeout_ms, state } => {
                let state = match state {
                    WaitState::Visible => "visible",
                    WaitState::Hidden => "hidden",
                    WaitState::Attached => "attached",
                    WaitState::Detached => "detached",
                };
                format!(
                    "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});\n",
                    js_str(selector),
                    state,
                    timeout_ms
                )
            }
            TestStep::WaitResponse { url_contains, timeout_ms } => format!(
                "    await page.waitForResponse(r => r.url().includes({}), {{ timeout: {} }});\n",
                js_str(url_contains),
                timeout_ms
            ),
            TestStep::ClickExpectResponse {
                selector,
                url_contains,
                timeout_ms,
                retries_on_429,
                retry_wait_ms,
            } => {
                let retry_wait = retry_wait_ms.unwrap_or(timeouts::registration::RETRY_AFTER_THROTTLE);
                format!(
                    r#"    {{
      let response = null;
      for (let attempt = 0; attempt <= {retries}; attempt++) {{
        const waiting = page.waitForResponse(r => r.url().includes({url}), {{ timeout: {timeout} }});
        await page.click({selector});
        response = await waiting;
        if (response.status() !== 429 || attempt === {retries}) break;
        await page.waitForTimeout({retry_wait});
      }}
      if (response.status() !== 200) {{
        throw new Error('expected status 200 from ' + {url} + ', got ' + response.status());
      }}
    }}
"#,
                    retries = retries_on_429,
                    url = js_str(url_contains),
                    timeout = timeout_ms,
                    selector = js_str(selector),
                    retry_wait = retry_wait,
                )
            }
            TestStep::Sleep { ms } => format!("    await page.waitForTimeout({ms});\n"),
            TestStep::Assert { selector, visible, text, text_contains, count } => {
                let mut js = String::new();
                if let Some(visible) = visible {
                    let state = if *visible { "visible" } else { "hidden" };
                    js.push_str(&format!(
                        "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});\n",
                        js_str(selector),
                        state,
                        timeouts::ELEMENT_VISIBLE
                    ));
                }
                if let Some(expected) = text {
                    js.push_str(&format!(
                        r#"    {{
      const actual = (await page.locator({sel}).innerText()).trim();
      if (actual !== {expected}) throw new Error('text mismatch for ' + {sel} + ': "' + actual + '"');
    }}
"#,
                        sel = js_str(selector),
                        expected = js_str(expected),
                    ));
                }
                if let Some(fragment) = text_contains {
                    js.push_str(&format!(
                        r#"    {{
      const actual = await page.locator({sel}).innerText();
      if (!actual.includes({fragment})) throw new Error('text of ' + {sel} + ' does not contain ' + {fragment});
    }}
"#,
                        sel = js_str(selector),
                        fragment = js_str(fragment),
                    ));
                }
                if let Some(expected) = count {
                    js.push_str(&format!(
                        r#"    {{
      const n = await page.locator({sel}).count();
      if (n !== {expected}) throw new Error('expected {expected} of ' + {sel} + ', found ' + n);
    }}
"#,
                        sel = js_str(selector),
                        expected = expected,
                    ));
                }
                js
            }
            TestStep::Screenshot { name, selector, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{name}.png"));
                let path = js_str(&path.to_string_lossy());
                match selector {
                    Some(selector) => format!(
                        "    await page.locator({}).screenshot({{ path: {} }});\n",
                        js_str(selector),
                        path
                    ),
                    None => format!(
                        "    await page.screenshot({{ path: {}, fullPage: {} }});\n",
                        path, full_page
                    ),
                }
            }
        }
    }

    /// Path a screenshot step will be written to.
    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.config.screenshot_dir.join(format!("{name}.png"))
    }

    /// Run a full spec script under `node` and parse the step markers.
    pub async fn run_script(&self, steps: &[TestStep], mock: Option<&MockBinding>) -> E2eResult<ScriptOutcome> {
        let script = self.build_script(steps, mock);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("spec.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = self.parse_markers(steps, &stdout)?;

        if outcome.error.is_none() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Playwright script failed without a done marker");
            return Err(E2eError::Playwright(format!(
                "Script crashed:\nstdout: {stdout}\nstderr: {stderr}"
            )));
        }

        Ok(outcome)
    }

    /// Parse `TUNE2E` marker lines into per-step results.
    fn parse_markers(&self, steps: &[TestStep], stdout: &str) -> E2eResult<ScriptOutcome> {
        // Unanchored so browsers logging to stdout cannot hide our markers.
        let marker = Regex::new(r"TUNE2E (\{.*\})").map_err(|e| E2eError::Playwright(e.to_string()))?;

        let mut results = Vec::new();
        let mut success = false;
        let mut error = None;
        let mut failed_step = None;

        for line in stdout.lines() {
            let Some(captures) = marker.captures(line) else {
                continue;
            };
            match serde_json::from_str::<Marker>(&captures[1]) {
                Ok(Marker::Step { name, ms }) => results.push(StepResult {
                    success: true,
                    step_name: name,
                    duration_ms: ms,
                    error: None,
                }),
                Ok(Marker::Done { ok, error: e, step }) => {
                    success = ok;
                    error = e;
                    failed_step = step;
                }
                Err(e) => warn!("Unparseable marker line: {line} ({e})"),
            }
        }

        if let (Some(message), Some(index)) = (&error, failed_step) {
            if let Some(step) = steps.get(index) {
                results.push(StepResult {
                    success: false,
                    step_name: step.name(),
                    duration_ms: 0,
                    error: Some(message.clone()),
                });
            }
        }

        Ok(ScriptOutcome { success, steps: results, error })
    }
}

/// Quote a string as a single-quoted JS literal.
fn js_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> PlaywrightHandle {
        PlaywrightHandle {
            base_url: "https://tunservice.example".to_string(),
            credentials: Credentials {
                username: "qa@test.com".to_string(),
                password: "secret".to_string(),
                otp: "11111".to_string(),
            },
            config: PlaywrightConfig::default(),
        }
    }

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str("a'b\\c"), r"'a\'b\\c'");
        assert_eq!(js_str("line\nbreak"), r"'line\nbreak'");
    }

    #[test]
    fn placeholders_are_substituted() {
        let handle = handle();
        assert_eq!(handle.substitute("${username}:${otp}"), "qa@test.com:11111");
    }

    #[test]
    fn otp_is_spread_across_pin_fields() {
        let handle = handle();
        let js = handle.step_to_js(&TestStep::FillOtp {
            selectors: vec!["#p1".into(), "#p2".into(), "#p3".into()],
        });
        assert!(js.contains("page.fill('#p1', '1')"));
        assert!(js.contains("page.fill('#p3', '1')"));
    }

    #[test]
    fn mock_glue_guards_then_proxies_then_unroutes() {
        let handle = handle();
        let mock = MockBinding {
            endpoint: "/api-v1/history".to_string(),
            proxy_base: "http://127.0.0.1:49321".to_string(),
        };
        let script = handle.build_script(
            &[TestStep::Navigate { url: "/app/history".into(), wait_for_selector: None }],
            Some(&mock),
        );

        // passthrough branch comes before any fulfill
        let guard = script.find("route.fallback()").expect("fallback branch present");
        let fulfill = script.find("route.fulfill").expect("fulfill present");
        assert!(guard < fulfill);

        assert!(script.contains("page.route('**' + mockEndpoint + '**'"));
        assert!(script.contains("http://127.0.0.1:49321"));
        // teardown is in the finally block, after the done marker
        let finally = script.find("} finally {").unwrap();
        let unroute = script.find("page.unroute").unwrap();
        assert!(unroute > finally);
    }

    #[test]
    fn script_without_mock_has_no_route_glue() {
        let handle = handle();
        let script = handle.build_script(
            &[TestStep::Navigate { url: "/".into(), wait_for_selector: None }],
            None,
        );
        assert!(!script.contains("page.route("));
        assert!(!script.contains("page.unroute("));
    }

    #[test]
    fn click_expect_response_retries_on_429() {
        let handle = handle();
        let js = handle.step_to_js(&TestStep::ClickExpectResponse {
            selector: "[data-test-id='otp-submit']".to_string(),
            url_contains: "/api-v1/auth/login-code".to_string(),
            timeout_ms: 5000,
            retries_on_429: 1,
            retry_wait_ms: None,
        });
        assert!(js.contains("attempt <= 1"));
        assert!(js.contains("response.status() !== 429"));
        assert!(js.contains("expected status 200"));
    }

    #[test]
    fn markers_parse_into_step_results() {
        let handle = handle();
        let steps = vec![
            TestStep::Navigate { url: "/".into(), wait_for_selector: None },
            TestStep::Click { selector: "#next".into(), timeout_ms: None },
        ];
        let stdout = concat!(
            "TUNE2E {\"event\":\"step\",\"name\":\"navigate:/\",\"ms\":120}\n",
            "noise from the browser\n",
            "TUNE2E {\"event\":\"done\",\"ok\":false,\"error\":\"boom\",\"step\":1}\n",
        );
        let outcome = handle.parse_markers(&steps, stdout).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.steps.len(), 2);
        assert!(outcome.steps[0].success);
        assert_eq!(outcome.steps[1].error.as_deref(), Some("boom"));
        assert_eq!(outcome.steps[1].step_name, "click:#next");
    }
}
