//! Integration tests for the ordering and shape of the relayed stream.
//!
//! Covers:
//! - log lines are forwarded in emission order, terminal output last
//! - exactly one terminal message for every domain outcome
//! - empty-log executions produce a stream of exactly one message
//! - domain exceptions are forwarded unchanged, not conflated

use agent_conduit::{AgentOutput, ExecutionStatus, StreamUpdate};

use super::test_helpers::{request, run_relay, terminal_count, ScriptedAgent};

/// Three log lines and a success payload yield exactly
/// `[Log(a), Log(b), Log(c), Output(Succeeded, {"x":1})]`.
#[tokio::test]
async fn logs_are_relayed_in_order_before_the_terminal_output() {
    let agent = ScriptedAgent {
        lines: vec!["a", "b", "c"],
        outcome: AgentOutput::success(serde_json::json!({ "x": 1 })),
    };

    let (updates, result) = run_relay(agent, request("p-1", "n-1", serde_json::Value::Null)).await;

    assert_eq!(
        updates,
        vec![
            StreamUpdate::Log("a".into()),
            StreamUpdate::Log("b".into()),
            StreamUpdate::Log("c".into()),
            StreamUpdate::Output(AgentOutput::success(serde_json::json!({ "x": 1 }))),
        ]
    );
    assert_eq!(
        result.expect("relay must succeed"),
        ExecutionStatus::Succeeded
    );
}

/// Every domain outcome produces exactly one terminal message, and it is
/// the last message of the stream.
#[tokio::test]
async fn every_domain_outcome_yields_exactly_one_terminal_message() {
    let outcomes = [
        AgentOutput::success(serde_json::json!("done")),
        AgentOutput::failed("bad input"),
        AgentOutput::exception("unexpected state"),
    ];

    for outcome in outcomes {
        let agent = ScriptedAgent {
            lines: vec!["working"],
            outcome: outcome.clone(),
        };

        let (updates, result) =
            run_relay(agent, request("p-1", "n-1", serde_json::Value::Null)).await;

        assert_eq!(
            terminal_count(&updates),
            1,
            "stream must carry exactly one terminal message for {outcome:?}"
        );
        assert_eq!(
            updates.last(),
            Some(&StreamUpdate::Output(outcome.clone())),
            "terminal message must be last"
        );
        assert_eq!(result.expect("relay must succeed"), outcome.status);
    }
}

/// A task that emits zero log lines and succeeds with a null payload
/// yields a stream of exactly one message.
#[tokio::test]
async fn empty_log_execution_yields_only_the_terminal_output() {
    let agent = ScriptedAgent {
        lines: vec![],
        outcome: AgentOutput::success(serde_json::Value::Null),
    };

    let (updates, result) = run_relay(agent, request("p-1", "n-1", serde_json::Value::Null)).await;

    assert_eq!(
        updates,
        vec![StreamUpdate::Output(AgentOutput::success(
            serde_json::Value::Null
        ))]
    );
    assert_eq!(
        result.expect("relay must succeed"),
        ExecutionStatus::Succeeded
    );
}

/// A domain exception constructed by the agent is forwarded unchanged;
/// the bridge must not rewrite it into a failure or success.
#[tokio::test]
async fn domain_exceptions_are_forwarded_unchanged() {
    let agent = ScriptedAgent {
        lines: vec!["dividing"],
        outcome: AgentOutput::exception("division by zero"),
    };

    let (updates, result) = run_relay(agent, request("p-1", "n-1", serde_json::Value::Null)).await;

    let Some(StreamUpdate::Output(output)) = updates.last() else {
        panic!("stream must end with a terminal output, got: {updates:?}");
    };

    assert_eq!(output.status, ExecutionStatus::Exception);
    assert_eq!(output.exception, "division by zero");
    assert!(output.error.is_empty());
    assert_eq!(output.outputs, serde_json::Value::Null);
    assert_eq!(
        result.expect("relay must succeed"),
        ExecutionStatus::Exception
    );
}
