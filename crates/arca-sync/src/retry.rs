//! Retry policy: attempt bound and delays between attempts

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry count used when neither the call nor the configuration sets one
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First backoff delay when no fixed delay is configured
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Fallbacks for calls that leave retry options unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryDefaults {
    pub max_retries: u32,
    /// Fixed delay string; `None` selects exponential backoff
    pub retry_delay: Option<String>,
}

impl Default for RetryDefaults {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: None,
        }
    }
}

/// How long to wait before a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    /// Same delay before every retry
    Fixed(Duration),
    /// `base * multiplier^(retry - 1)`
    Exponential { base: Duration, multiplier: u32 },
}

/// Resolved retry policy for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: RetryDelay,
}

impl RetryPolicy {
    /// Resolve per-call options against the defaults
    ///
    /// This is the only place an unset retry count or delay is filled in.
    ///
    /// # Errors
    /// Returns `SyncError::InvalidRetryDelay` if the effective delay string
    /// cannot be parsed
    pub fn resolve(
        max_retries: Option<u32>,
        retry_delay: Option<&str>,
        defaults: &RetryDefaults,
    ) -> Result<Self, SyncError> {
        let max_retries = max_retries.unwrap_or(defaults.max_retries);
        let delay = match retry_delay
            .filter(|s| !s.trim().is_empty())
            .or(defaults.retry_delay.as_deref())
        {
            Some(raw) => RetryDelay::Fixed(parse_duration(raw).map_err(|reason| {
                SyncError::InvalidRetryDelay {
                    input: raw.to_string(),
                    reason,
                }
            })?),
            None => RetryDelay::Exponential {
                base: DEFAULT_BACKOFF_BASE,
                multiplier: 2,
            },
        };
        Ok(Self { max_retries, delay })
    }

    /// Delay before retry number `retry` (1-indexed)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.delay {
            RetryDelay::Fixed(delay) => delay,
            RetryDelay::Exponential { base, multiplier } => {
                let factor = multiplier.saturating_pow(retry.saturating_sub(1));
                base.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: RetryDelay::Exponential {
                base: DEFAULT_BACKOFF_BASE,
                multiplier: 2,
            },
        }
    }
}

/// Parse a duration string
///
/// Accepts plain seconds (`"5"`), single units (`"250ms"`, `"2s"`, `"1m"`,
/// `"1h"`) and compound forms (`"1m30s"`).
///
/// # Errors
/// Returns a description of the problem for anything else
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration format: {s}"));
        }
        let num: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid duration number: {}", &rest[..digits]))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(num),
            "s" => Duration::from_secs(num),
            "m" => Duration::from_secs(num.saturating_mul(60)),
            "h" => Duration::from_secs(num.saturating_mul(3600)),
            "" => return Err(format!("missing unit after {num} in {s}")),
            unit => return Err(format!("unknown duration unit {unit:?} in {s}")),
        };
        total = total.saturating_add(part);
        rest = &rest[unit_len..];
    }
    Ok(total)
}
