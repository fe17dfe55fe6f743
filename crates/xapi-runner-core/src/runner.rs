//! Resolve, execute, aggregate: one batch run end to end.

use tracing::info;

use crate::config::RunnerConfig;
use crate::error::XapiResult;
use crate::executor::CommandExecutor;
use crate::model::CommandRequest;
use crate::report::ExecutionReport;
use crate::resolver::DeviceResolver;
use crate::service::{CommandTransport, DeviceDirectory};

/// Batch runner wiring a resolver to an executor.
pub struct BatchRunner<D, T> {
    resolver: DeviceResolver<D>,
    executor: CommandExecutor<T>,
}

impl<D, T> BatchRunner<D, T>
where
    D: DeviceDirectory,
    T: CommandTransport,
{
    /// Build a runner from the two remote collaborators and run settings.
    pub const fn new(directory: D, transport: T, config: &RunnerConfig) -> Self {
        Self {
            resolver: DeviceResolver::new(directory, config.empty_match),
            executor: CommandExecutor::new(transport, config),
        }
    }

    /// Execute `request` on every device tagged `tag`.
    ///
    /// # Errors
    ///
    /// Only resolution failures are returned; per-device failures are part of
    /// the report.
    pub async fn run(&self, tag: &str, request: &CommandRequest) -> XapiResult<ExecutionReport> {
        let devices = self.resolver.resolve(tag).await?;
        let outcomes = self.executor.execute_all(&devices, request).await;
        let report = ExecutionReport::aggregate(outcomes);
        info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "run complete"
        );
        Ok(report)
    }
}
