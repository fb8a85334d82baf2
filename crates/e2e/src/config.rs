//! Suite configuration from the environment

use crate::error::{E2eError, E2eResult};

/// Connection and account settings for the TunService deployment under test.
///
/// The suite runs against a live site, so everything here comes from the
/// environment rather than from spawning a server of our own.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Deployment base URL, no trailing slash.
    pub base_url: String,
    /// Login of the pre-provisioned test account.
    pub username: String,
    pub password: String,
    /// Fixed OTP code accepted by the staging backend.
    pub otp_code: String,
    /// Path of the login form.
    pub login_path: String,
    /// History listing endpoint, used both for response waits and mocking.
    pub history_endpoint: String,
}

impl SuiteConfig {
    /// Read configuration from `TUN_*` environment variables.
    ///
    /// Fails fast naming every missing variable, so a misconfigured CI job
    /// dies with one clear message before any browser is launched.
    pub fn from_env() -> E2eResult<Self> {
        let base_url = std::env::var("TUN_BASE_URL").ok().filter(|v| !v.trim().is_empty());
        let username = std::env::var("TUN_TEST_USERNAME").ok().filter(|v| !v.trim().is_empty());
        let password = std::env::var("TUN_TEST_PASSWORD").ok().filter(|v| !v.trim().is_empty());
        let otp_code = std::env::var("TUN_OTP_CODE").ok().filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push("TUN_BASE_URL");
        }
        if username.is_none() {
            missing.push("TUN_TEST_USERNAME");
        }
        if password.is_none() {
            missing.push("TUN_TEST_PASSWORD");
        }
        if otp_code.is_none() {
            missing.push("TUN_OTP_CODE");
        }

        match (base_url, username, password, otp_code) {
            (Some(base_url), Some(username), Some(password), Some(otp_code)) => Ok(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                username,
                password,
                otp_code,
                login_path: std::env::var("TUN_LOGIN_PATH")
                    .unwrap_or_else(|_| "/app/login".to_string()),
                history_endpoint: std::env::var("TUN_HISTORY_ENDPOINT")
                    .unwrap_or_else(|_| "/api-v1/history".to_string()),
            }),
            _ => Err(E2eError::MissingConfig(missing.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutation is process-wide, so the missing/present cases run
    // inside one test in a fixed order.
    #[test]
    fn from_env_requires_all_variables_then_trims_base_url() {
        for name in ["TUN_BASE_URL", "TUN_TEST_USERNAME", "TUN_TEST_PASSWORD", "TUN_OTP_CODE"] {
            std::env::remove_var(name);
        }

        let err = SuiteConfig::from_env().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TUN_BASE_URL"), "{message}");
        assert!(message.contains("TUN_OTP_CODE"), "{message}");

        std::env::set_var("TUN_BASE_URL", "https://tunservice.example/");
        std::env::set_var("TUN_TEST_USERNAME", "qa@test.com");
        std::env::set_var("TUN_TEST_PASSWORD", "secret");
        std::env::set_var("TUN_OTP_CODE", "11111");

        let config = SuiteConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://tunservice.example");
        assert_eq!(config.login_path, "/app/login");
        assert_eq!(config.history_endpoint, "/api-v1/history");

        for name in ["TUN_BASE_URL", "TUN_TEST_USERNAME", "TUN_TEST_PASSWORD", "TUN_OTP_CODE"] {
            std::env::remove_var(name);
        }
    }
}
