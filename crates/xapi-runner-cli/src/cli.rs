//! Argument parsing and run orchestration for the `xapi-runner` binary.

use clap::{Parser, ValueEnum};
use tracing::{Instrument, info_span};
use url::Url;
use uuid::Uuid;
use xapi_runner_core::config::DEFAULT_CALL_TIMEOUT_SECS;
use xapi_runner_core::{RunnerConfig, RunnerSettings, XapiError, parse_command};
use xapi_runner_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

use crate::client::{AccessToken, AppContext, CliResult, build_http_client, parse_url};
use crate::commands::run::handle_run;

const DEFAULT_API_URL: &str = "https://webexapis.com/v1/";
const DEFAULT_CONCURRENCY: usize = 1;

/// Parses CLI arguments, installs logging, and executes the batch run.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.map_or_else(LogFormat::infer, LogFormat::from),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    execute(cli).await
}

async fn execute(cli: Cli) -> i32 {
    let trace_id = Uuid::new_v4().to_string();
    let span = info_span!("run", trace_id = %trace_id, tag = %cli.tag);

    match dispatch(cli, &trace_id).instrument(span).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<i32> {
    let request = parse_command(&cli.command)?;
    let token = AccessToken::resolve(cli.token)?;
    let config = RunnerConfig::from_settings(&RunnerSettings {
        timeout_secs: cli.timeout,
        concurrency: cli.concurrency,
        deadline_secs: cli.deadline,
        allow_empty: cli.allow_empty,
    })
    .map_err(XapiError::from)?;

    let ctx = AppContext {
        client: build_http_client(config.call_timeout, trace_id)?,
        base_url: cli.api_url,
        token,
    };

    handle_run(&ctx, &cli.tag, &request, &config, cli.output).await
}

#[derive(Parser)]
#[command(
    name = "xapi-runner",
    version,
    about = "Run one xAPI command on every Webex device carrying a tag"
)]
struct Cli {
    /// Device tag to match, e.g. `conference-room`.
    #[arg(long)]
    tag: String,
    /// Command path with optional `key:value` arguments, e.g.
    /// `Audio.Volume.Set Level:50`.
    #[arg(long)]
    command: String,
    #[arg(
        long,
        env = "WEBEX_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Webex access token sent as a bearer credential"
    )]
    token: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        value_enum,
        default_value_t = OutputFormat::Summary,
        help = "Select how the run report is printed"
    )]
    output: OutputFormat,
    #[arg(
        long,
        env = "WEBEX_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL,
        help = "Base URL of the Webex REST API"
    )]
    api_url: Url,
    #[arg(
        long,
        env = "WEBEX_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_CALL_TIMEOUT_SECS,
        help = "Per-device call timeout in seconds"
    )]
    timeout: u64,
    #[arg(
        long,
        env = "XAPI_RUNNER_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        help = "Maximum number of devices contacted at once"
    )]
    concurrency: usize,
    #[arg(
        long,
        env = "XAPI_RUNNER_DEADLINE_SECS",
        help = "Bound on the whole execution phase in seconds"
    )]
    deadline: Option<u64>,
    #[arg(long, help = "Treat a tag that matches no devices as an empty success")]
    allow_empty: bool,
    #[arg(
        long,
        env = "XAPI_RUNNER_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level or filter directive; RUST_LOG takes precedence"
    )]
    log_level: String,
    #[arg(
        long,
        env = "XAPI_RUNNER_LOG_FORMAT",
        value_enum,
        help = "Log line format; defaults to pretty in debug builds and JSON otherwise"
    )]
    log_format: Option<LogFormatArg>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Summary,
    Detailed,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CliError, EXIT_FAILURE};
    use clap::CommandFactory;
    use httpmock::prelude::*;
    use xapi_runner_core::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn required_flags_and_defaults() {
        let cli = parse(&[
            "xapi-runner",
            "--tag",
            "conference-room",
            "--command",
            "Audio.Volume.Set Level:50",
            "--api-url",
            DEFAULT_API_URL,
            "--timeout",
            "10",
            "--concurrency",
            "1",
        ]);
        assert_eq!(cli.tag, "conference-room");
        assert_eq!(cli.command, "Audio.Volume.Set Level:50");
        assert_eq!(cli.output, OutputFormat::Summary);
        assert_eq!(cli.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(cli.timeout, DEFAULT_CALL_TIMEOUT_SECS);
        assert_eq!(cli.deadline, None);
        assert!(!cli.allow_empty);
    }

    #[test]
    fn output_flag_accepts_each_format() {
        for (flag, expected) in [
            ("summary", OutputFormat::Summary),
            ("detailed", OutputFormat::Detailed),
            ("json", OutputFormat::Json),
        ] {
            let cli = parse(&[
                "xapi-runner",
                "--tag",
                "lobby",
                "--command",
                "Standby.Activate",
                "--output",
                flag,
            ]);
            assert_eq!(cli.output, expected);
        }
        let cli = parse(&[
            "xapi-runner",
            "--tag",
            "lobby",
            "--command",
            "Standby.Activate",
            "--format",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn every_flag_has_help_text() {
        let command = Cli::command();
        let undocumented: Vec<_> = command
            .get_arguments()
            .filter(|arg| !matches!(arg.get_id().as_str(), "help" | "version"))
            .filter(|arg| arg.get_help().is_none())
            .map(|arg| arg.get_id().to_string())
            .collect();
        assert!(undocumented.is_empty(), "flags without help: {undocumented:?}");
    }

    #[test]
    fn missing_command_is_a_usage_error() {
        assert!(Cli::try_parse_from(["xapi-runner", "--tag", "conference-room"]).is_err());
    }

    #[test]
    fn log_format_maps_onto_telemetry() {
        assert_eq!(LogFormat::from(LogFormatArg::Json), LogFormat::Json);
        assert_eq!(LogFormat::from(LogFormatArg::Pretty), LogFormat::Pretty);
    }

    #[tokio::test]
    async fn malformed_command_fails_before_any_request() {
        let server = MockServer::start_async().await;
        let devices = server.mock(|when, then| {
            when.method(GET).path("/devices");
            then.status(200).json_body(serde_json::json!({"items": []}));
        });

        let base_url = server.base_url();
        let cli = parse(&[
            "xapi-runner",
            "--tag",
            "conference-room",
            "--command",
            "Audio..Volume",
            "--token",
            "secret",
            "--api-url",
            base_url.as_str(),
        ]);
        let err = dispatch(cli, "trace").await.expect_err("malformed command");
        assert!(matches!(
            err,
            CliError::Runner(XapiError::MalformedCommand { .. })
        ));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        devices.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let cli = parse(&[
            "xapi-runner",
            "--tag",
            "conference-room",
            "--command",
            "Standby.Activate",
            "--token",
            "secret",
            "--concurrency",
            "0",
        ]);
        let err = dispatch(cli, "trace").await.expect_err("invalid settings");
        assert!(matches!(
            err,
            CliError::Runner(XapiError::Config(ConfigError::InvalidField {
                field: "concurrency",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn execute_maps_errors_to_exit_code() {
        let cli = parse(&[
            "xapi-runner",
            "--tag",
            "conference-room",
            "--command",
            "   ",
            "--token",
            "secret",
        ]);
        assert_eq!(execute(cli).await, EXIT_FAILURE);
    }
}
