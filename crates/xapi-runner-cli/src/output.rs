//! Output renderers for execution reports.

use xapi_runner_core::{ExecutionReport, OutcomeStatus, XapiError, XapiResult};

use crate::cli::OutputFormat;

/// Render `report` in the requested format. The report is only read.
pub(crate) fn render_report(report: &ExecutionReport, format: OutputFormat) -> XapiResult<String> {
    match format {
        OutputFormat::Summary => Ok(render_summary(report)),
        OutputFormat::Detailed => render_detailed(report),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).map_err(|source| XapiError::Format { source })
        }
    }
}

fn render_summary(report: &ExecutionReport) -> String {
    format!(
        "succeeded: {}\nfailed: {}",
        report.succeeded(),
        report.failed()
    )
}

fn render_detailed(report: &ExecutionReport) -> XapiResult<String> {
    let mut lines = Vec::with_capacity(report.outcomes().len() * 2 + 1);
    for outcome in report.outcomes() {
        lines.push(format!(
            "{} ({}): {}",
            outcome.device_name,
            outcome.device_id,
            outcome.status.as_str()
        ));
        match outcome.status {
            OutcomeStatus::Succeeded => {
                if let Some(response) = outcome.response.as_ref().filter(|value| !value.is_null()) {
                    let payload = serde_json::to_string(response)
                        .map_err(|source| XapiError::Format { source })?;
                    lines.push(format!("  response: {payload}"));
                }
            }
            OutcomeStatus::Failed => {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                lines.push(format!("  error: {error}"));
            }
        }
    }
    lines.push(render_summary(report));
    Ok(lines.join("\n"))
}
