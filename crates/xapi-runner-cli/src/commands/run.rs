//! Handler for the batch run: resolve, execute, print, and pick an exit code.

use std::sync::Arc;

use xapi_runner_core::{BatchRunner, CommandRequest, RunnerConfig};

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliResult, EXIT_FAILURE, EXIT_SUCCESS};
use crate::output::render_report;
use crate::webex::WebexClient;

pub(crate) async fn handle_run(
    ctx: &AppContext,
    tag: &str,
    request: &CommandRequest,
    config: &RunnerConfig,
    output: OutputFormat,
) -> CliResult<i32> {
    let client = Arc::new(WebexClient::new(ctx, config.call_timeout));
    let runner = BatchRunner::new(Arc::clone(&client), client, config);

    let report = runner.run(tag, request).await?;
    println!("{}", render_report(&report, output)?);

    if report.all_succeeded() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
