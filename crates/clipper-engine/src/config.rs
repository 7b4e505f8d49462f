//! Engine configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                      | Default  |
//! |-------------------------------|----------|
//! | `CLIPPER_REST_DAY`            | `sunday` |
//! | `CLIPPER_BOOKING_WINDOW_DAYS` | `14`     |
//! | `CLIPPER_MAX_ITEM_QUANTITY`   | `999`    |
//! | `CLIPPER_UTC_OFFSET_MINUTES`  | `0`      |
//!
//! Slot times are the shop's wall clock. The UTC offset converts the
//! injected clock to that wall clock before "today" and "now" are compared
//! with a request.

use std::env;

use chrono::{FixedOffset, Offset, Utc, Weekday};
use clipper_core::schedule::WorkWeek;
use clipper_core::{DEFAULT_BOOKING_WINDOW_DAYS, MAX_ITEM_QUANTITY};

const REST_DAY: &str = "CLIPPER_REST_DAY";
const BOOKING_WINDOW_DAYS: &str = "CLIPPER_BOOKING_WINDOW_DAYS";
const MAX_QUANTITY: &str = "CLIPPER_MAX_ITEM_QUANTITY";
const UTC_OFFSET_MINUTES: &str = "CLIPPER_UTC_OFFSET_MINUTES";

/// Longest availability window a client may request.
const MAX_WINDOW_DAYS: u32 = 366;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// The one weekday the shop is closed.
    pub rest_day: Weekday,

    /// Days shown by the default availability window, today included.
    pub booking_window_days: u32,

    /// Upper bound on one order line's quantity.
    pub max_item_quantity: i64,

    /// Offset of the shop's wall clock from UTC.
    pub utc_offset: FixedOffset,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rest_day: Weekday::Sun,
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
            max_item_quantity: MAX_ITEM_QUANTITY,
            utc_offset: Utc.fix(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset keys keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = EngineConfig::default();

        if let Some(value) = lookup(REST_DAY) {
            config.rest_day = WorkWeek::parse_rest_day(&value)
                .ok_or_else(|| ConfigError::invalid(REST_DAY, &value, "expected a weekday name"))?;
        }

        if let Some(value) = lookup(BOOKING_WINDOW_DAYS) {
            let days: u32 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(BOOKING_WINDOW_DAYS, &value, "expected a number"))?;
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(ConfigError::invalid(
                    BOOKING_WINDOW_DAYS,
                    &value,
                    "expected 1 to 366",
                ));
            }
            config.booking_window_days = days;
        }

        if let Some(value) = lookup(MAX_QUANTITY) {
            let max: i64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(MAX_QUANTITY, &value, "expected a number"))?;
            if max < 1 {
                return Err(ConfigError::invalid(MAX_QUANTITY, &value, "must be positive"));
            }
            config.max_item_quantity = max;
        }

        if let Some(value) = lookup(UTC_OFFSET_MINUTES) {
            config.utc_offset = value
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|minutes| minutes.checked_mul(60))
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ConfigError::invalid(UTC_OFFSET_MINUTES, &value, "expected minutes within a day")
                })?;
        }

        Ok(config)
    }

    /// Sets the rest day.
    pub fn rest_day(mut self, day: Weekday) -> Self {
        self.rest_day = day;
        self
    }

    /// Sets the default availability window length.
    pub fn booking_window_days(mut self, days: u32) -> Self {
        self.booking_window_days = days;
        self
    }

    /// Sets the per-line quantity bound.
    pub fn max_item_quantity(mut self, max: i64) -> Self {
        self.max_item_quantity = max;
        self
    }

    /// Sets the shop's offset from UTC.
    pub fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// The working-week policy derived from the rest day.
    pub fn work_week(&self) -> WorkWeek {
        WorkWeek::new(self.rest_day)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
