//! Engine configuration: storage timeouts, retry counts and backoff.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on a single storage call, in milliseconds.
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

/// Base backoff delay in milliseconds for retry attempts.
pub const RETRY_BACKOFF_BASE_MS: u64 = 200;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 2_000;

/// Multiplier for exponential backoff.
pub const BACKOFF_MULTIPLIER: u64 = 2;

/// Tunable knobs for the progression engine.
///
/// The defaults are safe for an embedded in-process store; a remote table
/// store will typically want a longer timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound on each individual storage call, in milliseconds.
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,

    /// How many times a transient storage failure is retried.
    /// Validation failures are never retried.
    #[serde(default = "default_transient_retries")]
    pub transient_retries: u32,

    /// How many times the whole pipeline is re-run when a versioned store
    /// reports a concurrent-update conflict.
    #[serde(default = "default_conflict_attempts")]
    pub conflict_attempts: u32,
}

fn default_storage_timeout_ms() -> u64 {
    DEFAULT_STORAGE_TIMEOUT_MS
}

fn default_transient_retries() -> u32 {
    1
}

fn default_conflict_attempts() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_timeout_ms: default_storage_timeout_ms(),
            transient_retries: default_transient_retries(),
            conflict_attempts: default_conflict_attempts(),
        }
    }
}

impl EngineConfig {
    /// Storage timeout as a [`Duration`].
    #[must_use]
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

/// Calculate exponential backoff delay for a given attempt number.
///
/// The first attempt uses the base delay; each subsequent attempt doubles
/// it, capped at [`MAX_BACKOFF_MS`].
#[must_use]
pub fn calculate_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let multiplier = BACKOFF_MULTIPLIER.saturating_pow(exponent);
    let delay = RETRY_BACKOFF_BASE_MS.saturating_mul(multiplier);
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}
