//! Poll task abstraction
//!
//! A `PollTask` owns whatever state it needs between runs. The scheduler
//! moves the task into its background loop and drives it with `&mut self`,
//! so that state is never shared with another task and needs no locking.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;

/// Name of a scheduled task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unit of periodic work
///
/// An `Err` from `poll` is logged and counted; the task keeps its
/// schedule either way.
#[async_trait]
pub trait PollTask: Send + 'static {
    /// Error reported by a failed run
    type Error: fmt::Display + Send;

    /// Perform one run
    async fn poll(&mut self) -> Result<(), Self::Error>;
}

/// A `PollTask` built from a closure, see [`poll_fn`]
pub struct PollFn<F> {
    f: F,
}

/// Wrap a closure returning a future as a `PollTask`
///
/// ```rust,ignore
/// let mut runs = 0u32;
/// let task = poll_fn(move || {
///     runs += 1;
///     async move { Ok::<(), String>(()) }
/// });
/// ```
pub fn poll_fn<F, Fut, E>(f: F) -> PollFn<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    PollFn { f }
}

#[async_trait]
impl<F, Fut, E> PollTask for PollFn<F>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Error = E;

    async fn poll(&mut self) -> Result<(), E> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        let id = TaskId::from("phone-state");
        assert_eq!(id.to_string(), "phone-state");
        assert_eq!(id.as_str(), "phone-state");
        assert_eq!(id, TaskId::new(String::from("phone-state")));
    }

    #[tokio::test]
    async fn test_poll_fn_keeps_closure_state() {
        let mut runs = 0u32;
        let mut task = poll_fn(move || {
            runs += 1;
            let current = runs;
            async move {
                if current % 2 == 0 {
                    Err(format!("run {} failed", current))
                } else {
                    Ok(())
                }
            }
        });

        assert!(task.poll().await.is_ok());
        assert_eq!(task.poll().await.unwrap_err(), "run 2 failed");
        assert!(task.poll().await.is_ok());
    }
}
