//! Per-device command execution.
//!
//! Every device gets exactly one attempt. Failures of any kind are folded into
//! the device's [`ExecutionOutcome`]; nothing here returns an error.

use std::num::NonZeroUsize;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::error::ExecutionError;
use crate::model::{CommandRequest, Device, ExecutionOutcome};
use crate::service::CommandTransport;

/// Dispatches a command to devices through a [`CommandTransport`].
pub struct CommandExecutor<T> {
    transport: T,
    call_timeout: Duration,
    concurrency: NonZeroUsize,
    deadline: Option<Duration>,
}

impl<T: CommandTransport> CommandExecutor<T> {
    /// Build an executor using the timeouts and fan-out from `config`.
    pub const fn new(transport: T, config: &RunnerConfig) -> Self {
        Self {
            transport,
            call_timeout: config.call_timeout,
            concurrency: config.concurrency,
            deadline: config.deadline,
        }
    }

    /// Run `request` on a single device, bounded by the per-call timeout.
    pub async fn execute_one(&self, device: &Device, request: &CommandRequest) -> ExecutionOutcome {
        self.dispatch(device, request, None).await
    }

    /// Run `request` on every device and return outcomes in input order.
    ///
    /// Up to `concurrency` calls are in flight at once; with the default of
    /// one, devices are contacted strictly in order. When a run deadline is
    /// configured, calls still pending at expiry and devices not yet started
    /// are recorded as [`ExecutionError::DeadlineExceeded`].
    pub async fn execute_all(
        &self,
        devices: &[Device],
        request: &CommandRequest,
    ) -> Vec<ExecutionOutcome> {
        let deadline = self.deadline.map(|limit| Instant::now() + limit);

        let mut indexed: Vec<(usize, ExecutionOutcome)> = stream::iter(devices.iter().enumerate())
            .map(|(index, device)| async move {
                (index, self.dispatch(device, request, deadline).await)
            })
            .buffer_unordered(self.concurrency.get())
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn dispatch(
        &self,
        device: &Device,
        request: &CommandRequest,
        deadline: Option<Instant>,
    ) -> ExecutionOutcome {
        let (budget, bounded_by_deadline) = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    warn!(
                        device_id = %device.id,
                        device = %device.display_name,
                        "run deadline elapsed; device not contacted"
                    );
                    return ExecutionOutcome::failed(device, &ExecutionError::DeadlineExceeded);
                }
                if remaining < self.call_timeout {
                    (remaining, true)
                } else {
                    (self.call_timeout, false)
                }
            }
            None => (self.call_timeout, false),
        };

        info!(
            device_id = %device.id,
            device = %device.display_name,
            command = request.path(),
            "executing command"
        );

        let result = match timeout(budget, self.transport.execute(device, request)).await {
            Ok(result) => result,
            Err(_) if bounded_by_deadline => Err(ExecutionError::DeadlineExceeded),
            Err(_) => Err(ExecutionError::Timeout { after: budget }),
        };

        match result {
            Ok(payload) => {
                info!(device_id = %device.id, "command succeeded");
                ExecutionOutcome::succeeded(device, payload)
            }
            Err(err) => {
                warn!(device_id = %device.id, error = %err, "command failed");
                ExecutionOutcome::failed(device, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;
    use crate::model::OutcomeStatus;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Succeeds for every device except those listed as failing or hanging.
    #[derive(Default)]
    struct FakeTransport {
        failing: Vec<&'static str>,
        hanging: Vec<&'static str>,
        delay_ms: Vec<(&'static str, u64)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandTransport for FakeTransport {
        async fn execute(
            &self,
            device: &Device,
            request: &CommandRequest,
        ) -> Result<Value, ExecutionError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(device.id.clone());
            if let Some((_, ms)) = self.delay_ms.iter().find(|(id, _)| *id == device.id) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.hanging.iter().any(|id| *id == device.id) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.iter().any(|id| *id == device.id) {
                return Err(ExecutionError::Transport {
                    detail: "connection reset".into(),
                });
            }
            Ok(json!({"deviceId": device.id, "command": request.path()}))
        }
    }

    fn devices(count: usize) -> Vec<Device> {
        (1..=count)
            .map(|i| Device::new(format!("dev-{i}"), format!("Room {i}"), ["tag"]))
            .collect()
    }

    fn config(timeout_ms: u64, concurrency: usize, deadline_ms: Option<u64>) -> RunnerConfig {
        RunnerConfig {
            call_timeout: Duration::from_millis(timeout_ms),
            concurrency: NonZeroUsize::new(concurrency).expect("non-zero"),
            deadline: deadline_ms.map(Duration::from_millis),
            ..RunnerConfig::default()
        }
    }

    #[tokio::test]
    async fn failure_on_one_device_does_not_stop_the_rest() {
        let transport = FakeTransport {
            failing: vec!["dev-2"],
            ..FakeTransport::default()
        };
        let executor = CommandExecutor::new(transport, &config(1_000, 1, None));
        let request = parse_command("Standby.Deactivate").expect("command");

        let outcomes = executor.execute_all(&devices(4), &request).await;

        let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            [
                OutcomeStatus::Succeeded,
                OutcomeStatus::Failed,
                OutcomeStatus::Succeeded,
                OutcomeStatus::Succeeded
            ]
        );
        let calls = executor.transport.calls.lock().expect("calls lock").clone();
        assert_eq!(calls, ["dev-1", "dev-2", "dev-3", "dev-4"]);
        assert_eq!(
            outcomes[1].error.as_deref(),
            Some("transport error: connection reset")
        );
    }

    #[tokio::test]
    async fn slow_device_times_out() {
        let transport = FakeTransport {
            hanging: vec!["dev-1"],
            ..FakeTransport::default()
        };
        let executor = CommandExecutor::new(transport, &config(50, 1, None));
        let request = parse_command("SystemUnit.Boot").expect("command");

        let outcome = executor.execute_one(&devices(1)[0], &request).await;

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("timed out after 50ms"));
    }

    #[tokio::test]
    async fn concurrent_dispatch_preserves_resolution_order() {
        let transport = FakeTransport {
            delay_ms: vec![("dev-1", 120), ("dev-2", 60)],
            ..FakeTransport::default()
        };
        let executor = CommandExecutor::new(transport, &config(1_000, 3, None));
        let request = parse_command("Audio.Volume.Set Level:50").expect("command");

        let outcomes = executor.execute_all(&devices(3), &request).await;

        let ids: Vec<_> = outcomes.iter().map(|o| o.device_id.as_str()).collect();
        assert_eq!(ids, ["dev-1", "dev-2", "dev-3"]);
        assert!(outcomes.iter().all(ExecutionOutcome::is_success));
    }

    #[tokio::test]
    async fn deadline_marks_unfinished_devices_failed() {
        let transport = FakeTransport {
            hanging: vec!["dev-2"],
            ..FakeTransport::default()
        };
        let executor = CommandExecutor::new(transport, &config(5_000, 1, Some(100)));
        let request = parse_command("SystemUnit.Boot").expect("command");

        let outcomes = executor.execute_all(&devices(3), &request).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        for outcome in &outcomes[1..] {
            assert_eq!(outcome.status, OutcomeStatus::Failed);
            assert_eq!(
                outcome.error.as_deref(),
                Some("run deadline elapsed before the command completed")
            );
        }
        let calls = executor.transport.calls.lock().expect("calls lock").clone();
        assert_eq!(calls, ["dev-1", "dev-2"]);
    }

    #[tokio::test]
    async fn empty_device_list_executes_nothing() {
        let executor = CommandExecutor::new(FakeTransport::default(), &RunnerConfig::default());
        let request = parse_command("SystemUnit.Boot").expect("command");
        assert!(executor.execute_all(&[], &request).await.is_empty());
    }
}
