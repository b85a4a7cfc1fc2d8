// ABOUTME: Tests for ordered remote command sequence execution.
// ABOUTME: Short-circuiting, ignore-errors tolerance, hidden output, timeouts.

mod support;

use slipway::logs::DeploymentLog;
use slipway::remote::{RemoteCommand, TIMEOUT_EXIT_CODE, execute_and_save};

use support::{MockExecutor, MockOutcome};

/// Test: a failing command aborts the sequence and reports its index.
#[tokio::test]
async fn failure_short_circuits_at_index() {
    let executor = MockExecutor::new().with_rule(
        "second",
        MockOutcome::Fail {
            exit_code: 2,
            output: "boom".to_string(),
        },
    );
    let logs = DeploymentLog::new();

    let commands = [
        RemoteCommand::new("echo first"),
        RemoteCommand::new("echo second"),
        RemoteCommand::new("echo third"),
    ];

    let err = execute_and_save(&executor, &commands, &logs)
        .await
        .expect_err("sequence should fail");

    assert_eq!(err.index, 1);
    assert_eq!(err.exit_code, 2);
    assert_eq!(err.output, "boom");

    // Exactly the first two commands executed.
    assert_eq!(
        executor.executed_commands(),
        vec!["echo first".to_string(), "echo second".to_string()]
    );
}

/// Test: ignore-errors commands never abort the sequence.
#[tokio::test]
async fn ignored_failure_runs_all_commands() {
    let executor = MockExecutor::new().with_rule(
        "second",
        MockOutcome::Fail {
            exit_code: 1,
            output: "ignored".to_string(),
        },
    );
    let logs = DeploymentLog::new();

    let commands = [
        RemoteCommand::new("echo first"),
        RemoteCommand::new("echo second").ignore_errors(),
        RemoteCommand::new("echo third"),
    ];

    execute_and_save(&executor, &commands, &logs)
        .await
        .expect("ignored failure should not abort");

    assert_eq!(executor.executed_commands().len(), 3);
}

/// Test: hidden commands execute and short-circuit, but stay out of the
/// visible log.
#[tokio::test]
async fn hidden_commands_execute_but_stay_hidden() {
    let executor = MockExecutor::new()
        .with_rule("visible", MockOutcome::Success("shown".to_string()))
        .with_rule("secret", MockOutcome::Success("concealed".to_string()));
    let logs = DeploymentLog::new();

    let commands = [
        RemoteCommand::new("echo visible"),
        RemoteCommand::new("echo secret").hidden(),
    ];

    execute_and_save(&executor, &commands, &logs)
        .await
        .expect("sequence should succeed");

    let visible = logs.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].output, "shown");
    // The hidden entry is still part of the ordered record.
    assert_eq!(logs.snapshot().len(), 2);
}

/// Test: a hidden failing command still aborts the sequence.
#[tokio::test]
async fn hidden_failure_still_short_circuits() {
    let executor = MockExecutor::new().with_rule(
        "secret",
        MockOutcome::Fail {
            exit_code: 7,
            output: "hidden boom".to_string(),
        },
    );
    let logs = DeploymentLog::new();

    let commands = [
        RemoteCommand::new("echo secret").hidden(),
        RemoteCommand::new("echo after"),
    ];

    let err = execute_and_save(&executor, &commands, &logs)
        .await
        .expect_err("hidden failure should abort");

    assert_eq!(err.index, 0);
    assert_eq!(err.exit_code, 7);
    assert_eq!(executor.executed_commands().len(), 1);
}

/// Test: a timeout becomes a synthetic non-zero exit with partial output.
#[tokio::test]
async fn timeout_is_synthetic_failure_with_partial_output() {
    let executor = MockExecutor::new().with_rule(
        "slow",
        MockOutcome::Timeout {
            partial: "got this far".to_string(),
        },
    );
    let logs = DeploymentLog::new();

    let commands = [RemoteCommand::new("run slow build")];

    let err = execute_and_save(&executor, &commands, &logs)
        .await
        .expect_err("timeout should fail the sequence");

    assert_eq!(err.exit_code, TIMEOUT_EXIT_CODE);
    assert!(err.output.contains("got this far"));
}

/// Test: a timed-out command marked ignore-errors does not abort.
#[tokio::test]
async fn ignored_timeout_does_not_abort() {
    let executor = MockExecutor::new().with_rule(
        "slow",
        MockOutcome::Timeout {
            partial: String::new(),
        },
    );
    let logs = DeploymentLog::new();

    let commands = [
        RemoteCommand::new("run slow cleanup").ignore_errors(),
        RemoteCommand::new("echo after"),
    ];

    execute_and_save(&executor, &commands, &logs)
        .await
        .expect("ignored timeout should not abort");

    assert_eq!(executor.executed_commands().len(), 2);
}

/// Test: transport-level errors fail the sequence at the current index.
#[tokio::test]
async fn transport_error_fails_sequence() {
    let executor = MockExecutor::new().with_rule(
        "echo",
        MockOutcome::Transport("connection reset".to_string()),
    );
    let logs = DeploymentLog::new();

    let err = execute_and_save(&executor, &[RemoteCommand::new("echo hi")], &logs)
        .await
        .expect_err("transport error should fail");

    assert_eq!(err.index, 0);
    assert!(err.output.contains("connection reset"));
}
