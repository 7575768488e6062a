//! Error types for the fbx-poller crate.

use crate::task::TaskId;

/// Errors raised by the scheduler itself
///
/// Failures of individual poll runs never surface here; they are logged
/// and counted at the task boundary.
#[derive(Debug, thiserror::Error)]
pub enum PollingError {
    /// The scheduler already runs its maximum number of tasks
    #[error("Too many active tasks: {active} (limit {limit})")]
    TooManyTasks {
        /// Tasks currently scheduled
        active: usize,
        /// Configured limit
        limit: usize,
    },

    /// The background task could not be joined cleanly
    #[error("Task {id} did not shut down cleanly: {reason}")]
    TaskJoin {
        /// Task that failed to join
        id: TaskId,
        /// Join error rendered as text
        reason: String,
    },
}

/// Convenience type alias for Results using PollingError.
pub type PollingResult<T> = std::result::Result<T, PollingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polling_error_display() {
        let error = PollingError::TooManyTasks {
            active: 4,
            limit: 4,
        };
        assert_eq!(error.to_string(), "Too many active tasks: 4 (limit 4)");

        let error = PollingError::TaskJoin {
            id: TaskId::new("phone-calls"),
            reason: "task was cancelled".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Task phone-calls did not shut down cleanly: task was cancelled"
        );
    }
}
