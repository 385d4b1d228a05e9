//! Dispatcher error types

use std::time::Duration;

use medalarm_domain::MedAlarmError;
use thiserror::Error;

use crate::errors::InfraError;

/// Lifecycle errors of the fire dispatcher
#[derive(Debug, Error)]
pub enum DispatcherError {
    #[error("Dispatcher already running")]
    AlreadyRunning,

    #[error("Dispatcher not running")]
    NotRunning,

    /// The wake receiver was already handed to an earlier run.
    #[error("Wake receiver unavailable: {0}")]
    ReceiverUnavailable(String),

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),
}

impl From<DispatcherError> for InfraError {
    fn from(err: DispatcherError) -> Self {
        let domain_err = match err {
            DispatcherError::AlreadyRunning | DispatcherError::NotRunning => {
                MedAlarmError::InvalidInput(err.to_string())
            }
            _ => MedAlarmError::Internal(err.to_string()),
        };
        InfraError(domain_err)
    }
}

impl From<DispatcherError> for MedAlarmError {
    fn from(err: DispatcherError) -> Self {
        InfraError::from(err).into()
    }
}

pub type DispatcherResult<T> = Result<T, DispatcherError>;
