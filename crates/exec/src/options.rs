//! Retry, delay and paging options for one assertion run.

use serde::Deserialize;

use dbcheck_core::EvalError;
use dbcheck_sql::Paging;

pub const MAX_RETRY_INTERVAL_MS: u64 = 10_000;
pub const MAX_DELAY_MS: u64 = 30_000;
pub const MAX_PAGE_SIZE: u64 = 10_000;

/// Options for one assertion run.
///
/// Plain values passed in by the caller; the defaults match the common
/// "wait up to ~30 seconds for a downstream writer" setup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssertOptions {
    /// Retry mismatches at all.
    pub retry: bool,
    /// Retries after the first attempt.
    pub retry_times: u32,
    /// Minimum spacing between attempt starts.
    pub retry_interval_ms: u64,
    /// Wait before the first attempt. Zero means none.
    pub delay_ms: u64,
    /// Raise `Data records not found` when the last attempt matches no rows.
    pub fail_if_not_found: bool,
    /// Rows the detail query reads.
    pub page_size: u64,
    /// 1-based index of the first row the detail query reads.
    pub start_index: u64,
}

impl Default for AssertOptions {
    fn default() -> Self {
        AssertOptions {
            retry: true,
            retry_times: 10,
            retry_interval_ms: 3000,
            delay_ms: 0,
            fail_if_not_found: true,
            page_size: 100,
            start_index: 1,
        }
    }
}

impl AssertOptions {
    /// Load options from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, EvalError> {
        let options: Self = toml::from_str(content).map_err(|e| {
            EvalError::configuration(format!("failed to parse assertion options: {}", e))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        AssertOptions {
            retry: false,
            ..AssertOptions::default()
        }
    }

    /// Retry `times` times after the first attempt; zero disables retry.
    pub fn retry_times(mut self, times: u32) -> Self {
        self.retry = times > 0;
        self.retry_times = times;
        self
    }

    pub fn retry_interval_ms(mut self, interval: u64) -> Self {
        self.retry_interval_ms = interval;
        self
    }

    pub fn delay_ms(mut self, delay: u64) -> Self {
        self.delay_ms = delay;
        self
    }

    pub fn fail_if_not_found(mut self, fail: bool) -> Self {
        self.fail_if_not_found = fail;
        self
    }

    pub fn page(mut self, start_index: u64, page_size: u64) -> Self {
        self.start_index = start_index;
        self.page_size = page_size;
        self
    }

    /// Attempts the executor makes: `retry_times + 1` with retry, else 1.
    pub fn total_attempts(&self) -> u32 {
        if self.retry {
            self.retry_times.saturating_add(1)
        } else {
            1
        }
    }

    pub fn paging(&self) -> Paging {
        Paging {
            start_index: self.start_index,
            page_size: self.page_size,
        }
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        if self.retry {
            if self.retry_times == 0 {
                return Err(EvalError::configuration(
                    "retry_times must be greater than 0 when retry is enabled",
                ));
            }
            if self.retry_interval_ms == 0 || self.retry_interval_ms > MAX_RETRY_INTERVAL_MS {
                return Err(EvalError::configuration(format!(
                    "retry_interval_ms must be in (0, {}], got {}",
                    MAX_RETRY_INTERVAL_MS, self.retry_interval_ms
                )));
            }
        }
        if self.delay_ms > MAX_DELAY_MS {
            return Err(EvalError::configuration(format!(
                "delay_ms must be at most {}, got {}",
                MAX_DELAY_MS, self.delay_ms
            )));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(EvalError::configuration(format!(
                "page_size must be in [1, {}], got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.start_index == 0 {
            return Err(EvalError::configuration("start_index must be at least 1"));
        }
        Ok(())
    }
}
