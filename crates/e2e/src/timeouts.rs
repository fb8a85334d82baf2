//! Timeout catalog for generated waits, all values in milliseconds.
//!
//! Grouped by page area so tuning one flow does not silently change another.
//! Prefer element-state waits over fixed sleeps; the `animation` values exist
//! for real UI animations only.

pub const PAGE_LOAD: u64 = 15_000;
pub const ELEMENT_VISIBLE: u64 = 10_000;
pub const NETWORK_IDLE: u64 = 15_000;
pub const RESPONSE_WAIT: u64 = 20_000;

pub mod registration {
    pub const OTP_FIELDS_VISIBLE: u64 = 10_000;
    pub const OTP_SUBMIT_RESPONSE: u64 = 5_000;
    pub const REGISTER_BUTTON_ENABLED: u64 = 8_000;
    /// Backend enforces a cooldown before a code can be re-sent.
    pub const RESEND_OTP_WAIT: u64 = 45_000;
    /// Pause before re-submitting the OTP after an HTTP 429.
    pub const RETRY_AFTER_THROTTLE: u64 = 15_000;
}

pub mod history {
    pub const TABLE_VISIBLE: u64 = 4_000;
    pub const PAGINATION_VISIBLE: u64 = 4_000;
    pub const ROW_VISIBLE: u64 = 8_000;
    pub const EMPTY_STATE_VISIBLE: u64 = 3_000;
    pub const FILE_LINK_VISIBLE: u64 = 25_000;
}

pub mod modal {
    pub const APPEAR: u64 = 8_000;
    pub const CONTENT_VISIBLE: u64 = 8_000;
    pub const CLOSE: u64 = 3_000;
}

pub mod toast {
    pub const APPEAR: u64 = 3_000;
    pub const VISIBLE: u64 = 12_000;
}

pub mod api {
    pub const LOGIN_CODE_RESPONSE: u64 = 20_000;
    pub const AUTH_RESPONSE: u64 = 15_000;
}

pub mod animation {
    pub const SHORT: u64 = 3_500;
    pub const MEDIUM: u64 = 5_000;
    pub const LONG: u64 = 8_000;
}
