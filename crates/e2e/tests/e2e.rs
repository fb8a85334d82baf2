//! E2E test harness entry point
//!
//! Runs YAML specs against the configured TunService deployment.
//! Run with: cargo test --package tun-e2e --test e2e -- --help

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tun_e2e::config::SuiteConfig;
use tun_e2e::devices::{DevicePreset, Viewport};
use tun_e2e::playwright::{Browser, PlaywrightConfig};
use tun_e2e::runner::{RunnerConfig, TestSuiteResult};
use tun_e2e::visual::{SnapshotMode, VisualConfig};
use tun_e2e::{E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "tun-e2e")]
#[command(about = "E2E test runner for TunService")]
struct Args {
    /// Path to test specs directory
    #[arg(short, long, default_value = "crates/e2e/specs")]
    specs: PathBuf,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Update visual baselines instead of comparing
    #[arg(long)]
    update_baselines: bool,

    /// Device preset (desktop, mobile, tablet, or an alias)
    #[arg(long, env = "TUN_DEVICE", default_value = "desktop")]
    device: String,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, env = "TUN_BROWSER", default_value = "chromium")]
    browser: String,

    /// Viewport override as WIDTHxHEIGHT, e.g. 1280x720
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Run in headless mode
    #[arg(long, default_value = "true")]
    headless: bool,

    /// Default visual diff threshold (percentage)
    #[arg(long, default_value = "0.5")]
    visual_threshold: f64,

    /// Minimum seconds between registration-tagged tests
    #[arg(long, default_value = "1")]
    registration_spacing_secs: u64,

    /// Output directory for results and artifacts
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.parse().map_err(|_| format!("bad width '{w}'"))?;
    let height = h.parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok(Viewport { width, height })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let suite = SuiteConfig::from_env()?;
    let device = DevicePreset::resolve(&args.device)?;

    let config = RunnerConfig {
        suite,
        playwright: PlaywrightConfig {
            screenshot_dir: args.output.join("screenshots"),
            artifacts_dir: args.output.join("failed"),
            device,
            viewport: args.viewport,
            browser: Browser::parse(&args.browser),
            headless: args.headless,
        },
        visual: VisualConfig {
            baseline_dir: args.output.join("baselines"),
            actual_dir: args.output.join("screenshots"),
            diff_dir: args.output.join("diffs"),
            mode: SnapshotMode::Threshold(args.visual_threshold),
            auto_update: args.update_baselines,
        },
        specs_dir: args.specs,
        output_dir: args.output,
        registration_spacing: Duration::from_secs(args.registration_spacing_secs),
    };

    let mut runner = TestRunner::with_config(config);

    let results = if let Some(name) = args.name {
        let result = runner.run_test(&name).await?;
        TestSuiteResult {
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            duration_ms: result.duration_ms,
            started_at: chrono::Utc::now(),
            results: vec![result],
        }
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    if args.update_baselines {
        runner.update_baselines()?;
    }

    runner.write_results(&results)?;

    Ok(results.failed == 0)
}
