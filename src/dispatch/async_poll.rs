use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::http::BackendClient;
use crate::endpoints;
use crate::error::ClientError;

/// Delay between two status requests unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Rejection message for a FAILED task without an `error_message`.
pub const TASK_FAILED_FALLBACK: &str = "Task failed";

const STATUS_COMPLETED: &str = "COMPLETED";
const STATUS_FAILED: &str = "FAILED";

/// State of a backend task as reported by one status request.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    /// Any status other than COMPLETED or FAILED (PENDING, PROCESSING...).
    InProgress { status: String, data: Value },
    /// Task finished. Holds the full status payload, extra fields included.
    Completed(Value),
    /// Task failed with the backend's error message or the fallback.
    Failed(String),
}

impl TaskStatus {
    /// Interpret a status payload. A payload without a string `status`
    /// field cannot be classified and is an error.
    pub fn from_value(data: Value) -> Result<Self, ClientError> {
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::SchemaParse("task status response missing 'status'".to_string())
            })?;

        Ok(match status.as_str() {
            STATUS_COMPLETED => Self::Completed(data),
            STATUS_FAILED => Self::Failed(
                data.get("error_message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(TASK_FAILED_FALLBACK)
                    .to_string(),
            ),
            _ => Self::InProgress { status, data },
        })
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}

/// Polls `corr/tasks/{id}/` until the task completes or fails.
///
/// Ticks are strictly sequential: the next request is sent only after the
/// previous one settled and the interval elapsed. A failing request ends the
/// poll immediately; there is no retry.
pub struct TaskPoller {
    client: BackendClient,
    interval: Duration,
}

impl TaskPoller {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Poll until the task is terminal. `on_update` receives the raw status
    /// string and payload of every successful tick, terminal ones included.
    /// Returns the COMPLETED payload.
    pub async fn poll<F>(&self, task_id: &str, on_update: F) -> Result<Value, ClientError>
    where
        F: FnMut(&str, &Value),
    {
        self.poll_with_cancel(task_id, on_update, &CancellationToken::new())
            .await
    }

    /// Like [`TaskPoller::poll`], but stops with [`ClientError::Cancelled`]
    /// once `cancel` fires: before a tick, while its request is in flight, or
    /// during the wait. No `on_update` call happens after cancellation.
    pub async fn poll_with_cancel<F>(
        &self,
        task_id: &str,
        mut on_update: F,
        cancel: &CancellationToken,
    ) -> Result<Value, ClientError>
    where
        F: FnMut(&str, &Value),
    {
        let endpoint = endpoints::task_status(task_id);
        let cancelled = || ClientError::Cancelled {
            task_id: task_id.to_string(),
        };
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled());
            }

            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                res = self.client.get(&endpoint) => res,
            };
            let data = result.inspect_err(|e| {
                tracing::warn!(task_id = task_id, attempt = attempt, "task status request failed: {e}");
            })?;

            let raw_status = data
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            on_update(&raw_status, &data);

            match TaskStatus::from_value(data)? {
                TaskStatus::Completed(data) => {
                    tracing::info!(task_id = task_id, attempt = attempt, "task completed");
                    return Ok(data);
                }
                TaskStatus::Failed(message) => {
                    tracing::warn!(task_id = task_id, attempt = attempt, "task failed: {message}");
                    return Err(ClientError::TaskFailed(message));
                }
                TaskStatus::InProgress { status, .. } => {
                    tracing::debug!(
                        task_id = task_id,
                        attempt = attempt,
                        status = status,
                        "task still in progress"
                    );
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
