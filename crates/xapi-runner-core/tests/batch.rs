use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use xapi_runner_core::{
    BatchRunner, EmptyMatchPolicy, ExecutionError, OutcomeStatus, RunnerConfig, XapiError,
    parse_command,
};
use xapi_runner_test_support::fixtures::{CONFERENCE_ROOM_TAG, conference_room_devices, device};
use xapi_runner_test_support::mocks::{DeviceScript, ScriptedDirectory, ScriptedTransport};

fn fast_config() -> RunnerConfig {
    RunnerConfig {
        call_timeout: Duration::from_millis(100),
        ..RunnerConfig::default()
    }
}

#[tokio::test]
async fn conference_room_scenario_reports_one_timeout() -> anyhow::Result<()> {
    let request = parse_command("Audio.Volume.Set Level:50")?;
    assert_eq!(request.path(), "Audio.Volume.Set");
    assert_eq!(request.argument("Level"), Some(&json!("50")));
    assert_eq!(request.arguments().len(), 1);

    let transport = Arc::new(ScriptedTransport::new().with("dev-2", DeviceScript::Hang));
    let runner = BatchRunner::new(
        ScriptedDirectory::Devices(conference_room_devices()),
        Arc::clone(&transport),
        &fast_config(),
    );

    let report = runner.run(CONFERENCE_ROOM_TAG, &request).await?;

    assert_eq!(report.total(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.all_succeeded());

    let outcomes = report.outcomes();
    assert_eq!(outcomes[0].device_id, "dev-1");
    assert_eq!(outcomes[0].status, OutcomeStatus::Succeeded);
    assert_eq!(outcomes[1].device_id, "dev-2");
    assert_eq!(outcomes[1].status, OutcomeStatus::Failed);
    assert_eq!(outcomes[1].error.as_deref(), Some("timed out after 100ms"));
    assert_eq!(transport.calls(), ["dev-1", "dev-2"]);
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_isolated_to_its_device() -> anyhow::Result<()> {
    let devices = vec![
        device("dev-1", "Board Room", &["lobby"]),
        device("dev-2", "Huddle", &["lobby"]),
        device("dev-3", "Kiosk", &["lobby"]),
    ];
    let transport = Arc::new(ScriptedTransport::new().with(
        "dev-1",
        DeviceScript::Fail(ExecutionError::Transport {
            detail: "connection refused".into(),
        }),
    ));
    let runner = BatchRunner::new(
        ScriptedDirectory::Devices(devices),
        Arc::clone(&transport),
        &fast_config(),
    );

    let report = runner.run("lobby", &parse_command("Standby.Deactivate")?).await?;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(transport.calls(), ["dev-1", "dev-2", "dev-3"]);
    let ids: Vec<_> = report.outcomes().iter().map(|o| o.device_id.as_str()).collect();
    assert_eq!(ids, ["dev-1", "dev-2", "dev-3"]);
    Ok(())
}

#[tokio::test]
async fn zero_matches_fail_by_default() -> anyhow::Result<()> {
    let transport = Arc::new(ScriptedTransport::new());
    let runner = BatchRunner::new(
        ScriptedDirectory::Devices(conference_room_devices()),
        Arc::clone(&transport),
        &fast_config(),
    );

    let err = runner
        .run("warehouse", &parse_command("SystemUnit.Boot")?)
        .await
        .expect_err("no devices carry the tag");

    assert!(matches!(err, XapiError::NoDevicesFound { tag } if tag == "warehouse"));
    assert!(transport.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_matches_yield_empty_report_when_allowed() -> anyhow::Result<()> {
    let config = RunnerConfig {
        empty_match: EmptyMatchPolicy::Allow,
        ..fast_config()
    };
    let runner = BatchRunner::new(
        ScriptedDirectory::Devices(Vec::new()),
        ScriptedTransport::new(),
        &config,
    );

    let report = runner
        .run("warehouse", &parse_command("SystemUnit.Boot")?)
        .await?;

    assert_eq!(report.total(), 0);
    assert!(report.all_succeeded());
    Ok(())
}

#[tokio::test]
async fn rejected_credentials_contact_no_devices() -> anyhow::Result<()> {
    let transport = Arc::new(ScriptedTransport::new());
    let runner = BatchRunner::new(
        ScriptedDirectory::Unauthorized,
        Arc::clone(&transport),
        &fast_config(),
    );

    let err = runner
        .run(CONFERENCE_ROOM_TAG, &parse_command("SystemUnit.Boot")?)
        .await
        .expect_err("unauthorized");

    assert!(matches!(err, XapiError::Authentication { .. }));
    assert!(transport.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn parallel_runs_keep_resolution_order() -> anyhow::Result<()> {
    let devices: Vec<_> = (1..=6)
        .map(|i| device(&format!("dev-{i}"), &format!("Room {i}"), &["floor"]))
        .collect();
    let transport = ScriptedTransport::new()
        .with("dev-1", DeviceScript::Hang)
        .with("dev-4", DeviceScript::Respond(json!({"result": {"Level": 50}})));
    let config = RunnerConfig {
        concurrency: NonZeroUsize::new(3).expect("non-zero"),
        ..fast_config()
    };
    let runner = BatchRunner::new(ScriptedDirectory::Devices(devices), transport, &config);

    let report = runner
        .run("floor", &parse_command("Audio.Volume.Set Level:50")?)
        .await?;

    let ids: Vec<_> = report.outcomes().iter().map(|o| o.device_id.as_str()).collect();
    assert_eq!(ids, ["dev-1", "dev-2", "dev-3", "dev-4", "dev-5", "dev-6"]);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.outcomes()[3].response,
        Some(json!({"result": {"Level": 50}}))
    );
    Ok(())
}
