//! Worker pool configuration.

use crate::messages::ActorError;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Size of the worker pool and of the pending queue in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Articles processed at the same time.
    pub workers: usize,
    /// Accepted articles waiting for a free worker. Submissions beyond
    /// this are rejected with [`ActorError::QueueFull`].
    pub max_pending: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl PoolConfig {
    pub fn new(workers: usize, max_pending: usize) -> Self {
        Self {
            workers,
            max_pending,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// - `PIPELINE_WORKERS` (default 4, at least 1)
    /// - `PIPELINE_MAX_PENDING` (default 256)
    pub fn from_env() -> Result<Self, ActorError> {
        let workers = parse_env("PIPELINE_WORKERS")?.unwrap_or(DEFAULT_WORKERS);
        let max_pending = parse_env("PIPELINE_MAX_PENDING")?.unwrap_or(DEFAULT_MAX_PENDING);

        let config = Self::new(workers, max_pending);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ActorError> {
        if self.workers == 0 {
            return Err(ActorError::InvalidConfig(
                "PIPELINE_WORKERS must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env(name: &str) -> Result<Option<usize>, ActorError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ActorError::InvalidConfig(format!("{name}: {e}"))),
        _ => Ok(None),
    }
}
