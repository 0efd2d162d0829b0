//! Cache invalidation after board mutations.
//!
//! Invalidation is the second, non-transactional phase of every mutation: by
//! the time `purge` runs the store write has committed, so a failure here is
//! reported to the caller but never undoes the write.

use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::process::run_command_with_timeout;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidationError {
    #[error("purge command could not run: {message}")]
    Spawn { message: String },

    #[error("purge command timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    #[error("purge command exited with {}: {stderr}", .exit_code.map_or("signal".to_string(), |c| c.to_string()))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{0}")]
    Rejected(String),
}

/// Receives the identifiers of cached renderings made stale by a mutation.
pub trait CacheInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError>;
}

impl<T: CacheInvalidator + ?Sized> CacheInvalidator for Box<T> {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        (**self).purge(resources)
    }
}

impl<T: CacheInvalidator + ?Sized> CacheInvalidator for std::sync::Arc<T> {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        (**self).purge(resources)
    }
}

/// Used when nothing downstream caches board renderings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl CacheInvalidator for NoopInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        debug!(count = resources.len(), "no invalidator configured, skipping purge");
        Ok(())
    }
}

/// Runs an external command with the resource identifiers appended as
/// arguments, e.g. `["curl", "-fsS", "-X", "PURGE"]`.
#[derive(Debug, Clone)]
pub struct CommandInvalidator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandInvalidator {
    /// `None` when `command` is empty.
    pub fn new(command: &[String], timeout: Duration, output_limit_bytes: usize) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
            output_limit_bytes,
        })
    }
}

impl CacheInvalidator for CommandInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        if resources.is_empty() {
            return Ok(());
        }
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(resources);

        let output = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)
            .map_err(|err| InvalidationError::Spawn {
                message: format!("{err:#}"),
            })?;
        if output.timed_out {
            return Err(InvalidationError::TimedOut {
                timeout: self.timeout,
            });
        }
        if !output.status.success() {
            return Err(InvalidationError::Failed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!(program = %self.program, count = resources.len(), "purged cached resources");
        Ok(())
    }
}

/// Calls every inner invalidator in order, even after a failure, and returns
/// the first failure.
#[derive(Default)]
pub struct FanoutInvalidator {
    targets: Vec<Box<dyn CacheInvalidator + Send + Sync>>,
}

impl FanoutInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: impl CacheInvalidator + Send + Sync + 'static) -> Self {
        self.targets.push(Box::new(target));
        self
    }

    pub fn push(&mut self, target: Box<dyn CacheInvalidator + Send + Sync>) {
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl CacheInvalidator for FanoutInvalidator {
    fn purge(&self, resources: &[String]) -> Result<(), InvalidationError> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(err) = target.purge(resources) {
                warn!(error = %err, "cache invalidator failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
