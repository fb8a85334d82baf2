//! Device presets for browser emulation
//!
//! The suite runs against three profiles: Desktop Chrome, iPhone 15 Pro Max,
//! and iPad Pro 11. Presets map to Playwright device descriptors in the
//! generated script and to fixed viewports for pixel tests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePreset {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl DevicePreset {
    /// Resolve a user-supplied device name, accepting common aliases.
    pub fn resolve(name: &str) -> E2eResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "desktop" | "pc" | "laptop" => Ok(Self::Desktop),
            "mobile" | "iphone" | "phone" | "smartphone" => Ok(Self::Mobile),
            "tablet" | "ipad" | "pad" => Ok(Self::Tablet),
            other => Err(E2eError::UnknownDevice(other.to_string())),
        }
    }

    /// Playwright device descriptor name (`devices[...]` in the script).
    pub fn playwright_name(&self) -> &'static str {
        match self {
            Self::Desktop => "Desktop Chrome",
            Self::Mobile => "iPhone 15 Pro Max",
            Self::Tablet => "iPad Pro 11",
        }
    }

    /// Fixed viewport used for snapshots, pinned so pixel baselines stay
    /// comparable across Playwright upgrades.
    pub fn viewport(&self) -> Viewport {
        match self {
            Self::Desktop => Viewport { width: 1280, height: 720 },
            Self::Mobile => Viewport { width: 430, height: 739 },
            Self::Tablet => Viewport { width: 834, height: 1194 },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DevicePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.playwright_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("desktop", DevicePreset::Desktop)]
    #[test_case("PC", DevicePreset::Desktop)]
    #[test_case("laptop", DevicePreset::Desktop)]
    #[test_case("iphone", DevicePreset::Mobile)]
    #[test_case("smartphone", DevicePreset::Mobile)]
    #[test_case("iPad", DevicePreset::Tablet)]
    #[test_case("pad", DevicePreset::Tablet)]
    fn aliases_resolve(name: &str, expected: DevicePreset) {
        assert_eq!(DevicePreset::resolve(name).unwrap(), expected);
    }

    #[test]
    fn unknown_device_is_an_error() {
        let err = DevicePreset::resolve("fridge").unwrap_err();
        assert!(err.to_string().contains("fridge"));
    }

    #[test]
    fn viewports_match_the_pinned_profiles() {
        assert_eq!(DevicePreset::Desktop.viewport(), Viewport { width: 1280, height: 720 });
        assert_eq!(DevicePreset::Mobile.viewport(), Viewport { width: 430, height: 739 });
        assert_eq!(DevicePreset::Tablet.viewport(), Viewport { width: 834, height: 1194 });
    }
}
