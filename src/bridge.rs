//! Execution bridge: the per-invocation coordinator between a running
//! agent task and the outbound update stream.
//!
//! [`relay`] owns the whole lifecycle of one execution. It launches the
//! agent as an independent task, forwards every log line in emission
//! order, and guarantees that exactly one terminal [`StreamUpdate::Output`]
//! is sent, even when the task faults. The exceptions are cancellation
//! and failure of the outbound stream itself, in which case no terminal
//! message is produced and a distinguished error is returned.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentOutput, ExecutionRequest, ExecutionStatus, LogSink};
use crate::{AppError, Result};

/// One message bound for the transport layer.
///
/// A well-formed stream is zero or more `Log` items followed by exactly
/// one `Output`, which is always the last message.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUpdate {
    /// Progress log line emitted by the running agent.
    Log(String),
    /// Terminal result of the execution.
    Output(AgentOutput),
}

/// Lifecycle state of one bridged execution.
///
/// Transitions are `Idle → Running → {Completed, Failed, Cancelled}`;
/// no transition leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Execution has not started.
    Idle,
    /// Agent task launched; updates are being relayed.
    Running,
    /// The task produced its own terminal output and it was delivered.
    Completed,
    /// A terminal output was synthesized from an internal fault, or the
    /// outbound stream failed.
    Failed,
    /// The caller cancelled before a terminal result existed.
    Cancelled,
}

impl BridgeState {
    /// Whether the lifecycle permits a transition to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: BridgeState) -> bool {
        matches!(
            (self, next),
            (BridgeState::Idle, BridgeState::Running)
                | (
                    BridgeState::Running,
                    BridgeState::Completed | BridgeState::Failed | BridgeState::Cancelled,
                )
        )
    }

    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

fn advance(state: &mut BridgeState, next: BridgeState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal bridge transition {state:?} -> {next:?}"
    );
    *state = next;
}

/// Run one execution to completion, relaying its updates to `updates`.
///
/// Launches `agent.run` as an independently scheduled task with a bounded
/// log channel of `log_capacity` lines, then relays each line to
/// `updates` as it becomes available. The log channel closing (the task
/// drops its [`LogSink`] when it finishes) is the structural signal that
/// no line emitted before the terminal result can still be in flight, so
/// the terminal output is always the last message sent.
///
/// Returns the status of the emitted terminal output. A task fault
/// (error return or panic) is synthesized into a failed output rather
/// than propagated, so the caller still receives a terminal message.
///
/// Cancellation does not force-kill the agent task; the task observes
/// the same token through its [`ExecutionContext`](crate::agent::ExecutionContext)
/// and is expected to stop on its own.
///
/// # Errors
///
/// - [`AppError::Cancelled`] when `cancel` fires before the terminal
///   output is sent; nothing further is emitted on `updates`.
/// - [`AppError::Transport`] when a send on `updates` fails; no further
///   sends are attempted.
pub async fn relay<A: Agent>(
    agent: Arc<A>,
    request: ExecutionRequest,
    log_capacity: usize,
    updates: mpsc::Sender<StreamUpdate>,
    cancel: CancellationToken,
) -> Result<ExecutionStatus> {
    let mut state = BridgeState::Idle;

    let ExecutionRequest {
        pid,
        nid,
        mut ctx,
        inputs,
    } = request;
    ctx.cancel = cancel.clone();

    let (log_tx, mut log_rx) = mpsc::channel(log_capacity.max(1));
    let sink = LogSink::new(log_tx);

    let task = tokio::spawn({
        let agent = Arc::clone(&agent);
        let nid = nid.clone();
        async move { agent.run(ctx, nid, inputs, sink).await }
    });

    advance(&mut state, BridgeState::Running);
    debug!(pid, nid, "agent task launched");

    // Relay log lines until the task drops its sink. The sink lives
    // inside the task, so the channel only closes after every accepted
    // line has been drained; lines cannot be lost or reordered.
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                advance(&mut state, BridgeState::Cancelled);
                info!(pid, nid, "execution cancelled while relaying logs");
                return Err(AppError::Cancelled(format!(
                    "execution of node {nid} cancelled"
                )));
            }

            line = log_rx.recv() => match line {
                Some(text) => {
                    if updates.send(StreamUpdate::Log(text)).await.is_err() {
                        advance(&mut state, BridgeState::Failed);
                        return Err(AppError::Transport(
                            "outbound stream closed while relaying logs".into(),
                        ));
                    }
                }
                None => break,
            }
        }
    }

    // The log channel is exhausted. A well-behaved agent is about to
    // return; a misbehaving one that dropped its sink early is bounded
    // here by the cancellation path.
    let joined = tokio::select! {
        biased;

        () = cancel.cancelled() => {
            advance(&mut state, BridgeState::Cancelled);
            info!(pid, nid, "execution cancelled before a terminal result");
            return Err(AppError::Cancelled(format!(
                "execution of node {nid} cancelled"
            )));
        }

        joined = task => joined,
    };

    let (output, next) = match joined {
        Ok(Ok(output)) => (output, BridgeState::Completed),
        Ok(Err(err)) => {
            let fault = match err {
                AppError::Agent(msg) => msg,
                other => other.to_string(),
            };
            warn!(pid, nid, fault, "agent task reported an internal fault");
            (AgentOutput::failed(fault), BridgeState::Failed)
        }
        Err(join_err) => {
            let fault = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                "agent task aborted before completion".to_owned()
            };
            warn!(pid, nid, fault, "agent task terminated abnormally");
            (AgentOutput::failed(fault), BridgeState::Failed)
        }
    };

    let status = output.status;
    if updates.send(StreamUpdate::Output(output)).await.is_err() {
        advance(&mut state, BridgeState::Failed);
        return Err(AppError::Transport(
            "outbound stream closed before the terminal output".into(),
        ));
    }

    advance(&mut state, next);
    info!(pid, nid, %status, "execution finished");
    Ok(status)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "agent task panicked".to_owned()
    }
}
