//! Visual regression testing with screenshot comparison

use std::path::{Path, PathBuf};

use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// How strictly a snapshot is compared to its baseline.
///
/// `Strict` is for static marketing pages, `Lenient` tolerates animated or
/// data-driven regions, and `Threshold` pins an explicit percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotMode {
    Strict,
    Lenient,
    Threshold(f64),
}

impl SnapshotMode {
    /// Allowed differing pixels, percent of the full image.
    pub fn threshold_percent(&self) -> f64 {
        match self {
            SnapshotMode::Strict => 0.0,
            SnapshotMode::Lenient => 1.0,
            SnapshotMode::Threshold(t) => *t,
        }
    }

    /// Per-channel color tolerance. Strict mode demands exact pixels;
    /// the others absorb anti-aliasing and compression jitter.
    pub fn pixel_tolerance(&self) -> i32 {
        match self {
            SnapshotMode::Strict => 0,
            _ => 5,
        }
    }
}

/// Result of a visual comparison.
#[derive(Debug, Clone)]
pub struct VisualDiff {
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    pub diff_image_path: Option<PathBuf>,
    pub actual_hash: String,
    pub baseline_hash: String,
}

/// Configuration for visual testing.
#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    pub mode: SnapshotMode,
    /// Copy the actual screenshot into the baseline when one is missing.
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            mode: SnapshotMode::Threshold(0.5),
            auto_update: false,
        }
    }
}

pub struct VisualTester {
    config: VisualConfig,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Compare a screenshot against its baseline.
    ///
    /// `mode` overrides the configured default for one comparison, the way a
    /// spec-level `visual_threshold` does.
    pub fn compare(&self, name: &str, mode: Option<SnapshotMode>) -> E2eResult<VisualDiff> {
        let mode = mode.unwrap_or(self.config.mode);
        let threshold = mode.threshold_percent();

        let actual_path = self.config.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.config.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(E2eError::VisualRegression(format!(
                "Actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.config.auto_update {
                info!("Creating baseline for '{name}' (auto-update enabled)");
                std::fs::copy(&actual_path, &baseline_path)?;
                let hash = hash_file(&actual_path)?;
                return Ok(VisualDiff {
                    matches: true,
                    diff_percent: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image_path: None,
                    actual_hash: hash.clone(),
                    baseline_hash: hash,
                });
            }
            return Err(E2eError::BaselineNotFound(
                baseline_path.to_string_lossy().to_string(),
            ));
        }

        let actual_hash = hash_file(&actual_path)?;
        let baseline_hash = hash_file(&baseline_path)?;

        let actual_img = image::open(&actual_path)?;
        let baseline_img = image::open(&baseline_path)?;

        // Identical files need no pixel walk.
        if actual_hash == baseline_hash {
            debug!("Screenshots for '{name}' match exactly");
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: u64::from(actual_img.width()) * u64::from(actual_img.height()),
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let (actual_w, actual_h) = actual_img.dimensions();
        let (baseline_w, baseline_h) = baseline_img.dimensions();
        if (actual_w, actual_h) != (baseline_w, baseline_h) {
            warn!(
                "Screenshot dimensions differ for '{name}': actual {actual_w}x{actual_h} vs baseline {baseline_w}x{baseline_h}"
            );
        }

        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();

        // Walk the union area: a pixel present in only one image has no
        // counterpart to match and counts as a difference.
        let width = actual_w.max(baseline_w);
        let height = actual_h.max(baseline_h);
        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = u64::from(width) * u64::from(height);
        let tolerance = mode.pixel_tolerance();

        for y in 0..height {
            for x in 0..width {
                let in_overlap =
                    x < actual_w && y < actual_h && x < baseline_w && y < baseline_h;
                if !in_overlap {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                    continue;
                }

                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, baseline_pixel, tolerance) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{name}-diff.png"));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "Visual regression in '{name}': {diff_percent:.2}% pixels differ (threshold: {threshold:.2}%)"
            );
        }

        Ok(VisualDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Promote the actual screenshot to baseline.
    pub fn update_baseline(&self, name: &str) -> E2eResult<()> {
        let actual_path = self.config.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.config.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(E2eError::VisualRegression(format!(
                "Cannot update baseline: actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        std::fs::copy(&actual_path, &baseline_path)?;
        info!("Updated baseline for '{name}'");
        Ok(())
    }

    /// Promote every screenshot in the actual dir.
    pub fn update_all_baselines(&self) -> E2eResult<()> {
        for entry in std::fs::read_dir(&self.config.actual_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    self.update_baseline(&name.to_string_lossy())?;
                }
            }
        }
        Ok(())
    }
}

fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>, tolerance: i32) -> bool {
    let a = a.channels();
    let b = b.channels();
    for i in 0..4 {
        if (i32::from(a[i]) - i32::from(b[i])).abs() > tolerance {
            return true;
        }
    }
    false
}

fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
