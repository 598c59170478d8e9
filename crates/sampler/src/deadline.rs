//! Cooperative wall-clock deadline shared by all chains of one sampling run.

use std::time::{Duration, Instant};

use crate::error::SamplerError;

/// A start instant plus an optional limit.
///
/// Chains call [`Deadline::check`] once per iteration; once the limit has
/// passed every chain returns [`SamplerError::Timeout`] and the run is
/// abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    /// Starts the clock now with the given limit.
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// Starts the clock now with no limit.
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Starts the clock now with a limit of `secs` seconds.
    pub fn after_secs(secs: u64) -> Self {
        Self::new(Some(Duration::from_secs(secs)))
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|l| self.start.elapsed() >= l)
    }

    /// Returns [`SamplerError::Timeout`] once the limit has passed.
    pub fn check(&self) -> Result<(), SamplerError> {
        match self.limit {
            Some(limit) if self.start.elapsed() >= limit => Err(SamplerError::Timeout {
                elapsed_secs: self.start.elapsed().as_secs_f64(),
                limit_secs: limit.as_secs_f64(),
            }),
            _ => Ok(()),
        }
    }
}
