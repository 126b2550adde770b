//! Agent capability contract and the per-execution domain model.
//!
//! Implement [`Agent`] to expose user-supplied work to the Conduit
//! workflow engine. One [`ExecutionRequest`] describes one invocation;
//! the agent streams progress through a [`LogSink`] and finishes with a
//! single [`AgentOutput`].

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::codec;
use crate::pb;
use crate::Result;

/// Terminal status of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    /// Default marker; never a terminal value observed by a caller.
    Pending,
    /// The agent produced an output payload.
    Succeeded,
    /// The agent determined the work cannot succeed.
    Failed,
    /// The agent hit an unexpected condition during otherwise-normal
    /// operation. Distinguished from [`Failed`](Self::Failed) by severity,
    /// not by transport handling.
    Exception,
    /// Execution was stopped by the engine.
    Stopped,
    /// Execution was paused by the engine.
    Paused,
}

impl Display for ExecutionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Exception => "EXCEPTION",
            Self::Stopped => "STOPPED",
            Self::Paused => "PAUSED",
        };
        f.write_str(name)
    }
}

impl From<ExecutionStatus> for pb::ExecutionStatus {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Pending => Self::Pending,
            ExecutionStatus::Succeeded => Self::Succeeded,
            ExecutionStatus::Failed => Self::Failed,
            ExecutionStatus::Exception => Self::Exception,
            ExecutionStatus::Stopped => Self::Stopped,
            ExecutionStatus::Paused => Self::Paused,
        }
    }
}

impl From<pb::ExecutionStatus> for ExecutionStatus {
    fn from(status: pb::ExecutionStatus) -> Self {
        match status {
            pb::ExecutionStatus::Pending => Self::Pending,
            pb::ExecutionStatus::Succeeded => Self::Succeeded,
            pb::ExecutionStatus::Failed => Self::Failed,
            pb::ExecutionStatus::Exception => Self::Exception,
            pb::ExecutionStatus::Stopped => Self::Stopped,
            pb::ExecutionStatus::Paused => Self::Paused,
        }
    }
}

/// Terminal result of one execution.
///
/// Exactly one of `outputs`, `error`, and `exception` is populated,
/// consistent with `status`; use the constructors to uphold that.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    /// Terminal execution status.
    pub status: ExecutionStatus,
    /// Output payload; meaningful only when `status` is `Succeeded`.
    pub outputs: serde_json::Value,
    /// Error message; meaningful only when `status` is `Failed`.
    pub error: String,
    /// Exception message; meaningful only when `status` is `Exception`.
    pub exception: String,
}

impl AgentOutput {
    /// Successful output carrying a payload.
    #[must_use]
    pub fn success(outputs: serde_json::Value) -> Self {
        Self {
            status: ExecutionStatus::Succeeded,
            outputs,
            error: String::new(),
            exception: String::new(),
        }
    }

    /// Failed output carrying an error message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            outputs: serde_json::Value::Null,
            error: error.into(),
            exception: String::new(),
        }
    }

    /// Failed output built from any error value.
    #[must_use]
    pub fn failed_err(error: &dyn std::error::Error) -> Self {
        Self::failed(error.to_string())
    }

    /// Exception output carrying an exception message.
    #[must_use]
    pub fn exception(exception: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Exception,
            outputs: serde_json::Value::Null,
            error: String::new(),
            exception: exception.into(),
        }
    }
}

impl From<AgentOutput> for pb::RunOutput {
    fn from(output: AgentOutput) -> Self {
        Self {
            status: pb::ExecutionStatus::from(output.status) as i32,
            outputs: Some(codec::encode_value(output.outputs)),
            error: output.error,
            exception: output.exception,
        }
    }
}

/// Execution context handed to the agent for one invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Workflow process identifier.
    pub pid: String,
    /// Environment variables visible to the agent.
    pub env: HashMap<String, String>,
    /// Workflow variables accumulated by upstream nodes.
    pub vars: HashMap<String, serde_json::Value>,
    /// Cooperative cancellation signal for this invocation. The bridge
    /// does not force-kill a running agent task; observing this token and
    /// stopping promptly is the agent implementation's obligation.
    pub cancel: CancellationToken,
}

impl From<pb::ExecutionContext> for ExecutionContext {
    fn from(ctx: pb::ExecutionContext) -> Self {
        Self {
            pid: ctx.pid,
            env: ctx.env,
            vars: ctx
                .vars
                .into_iter()
                .map(|(key, value)| (key, codec::decode_value(value)))
                .collect(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Immutable description of one invocation, decoded from the wire.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Workflow process identifier.
    pub pid: String,
    /// Node identifier within the workflow.
    pub nid: String,
    /// Execution context; an absent wire context decodes to the empty
    /// default.
    pub ctx: ExecutionContext,
    /// Decoded input payload for the node.
    pub inputs: serde_json::Value,
}

impl From<pb::RunRequest> for ExecutionRequest {
    fn from(req: pb::RunRequest) -> Self {
        Self {
            pid: req.pid,
            nid: req.nid,
            ctx: req.ctx.map(ExecutionContext::from).unwrap_or_default(),
            inputs: req
                .inputs
                .map(codec::decode_value)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Cloneable handle through which a running agent emits progress log
/// lines.
///
/// Lines are relayed to the caller in emission order. Once the execution
/// is no longer being observed (cancellation or transport failure),
/// sends are silently ignored.
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::Sender<String>,
}

impl LogSink {
    pub(crate) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Emit a log line, waiting for channel capacity if necessary.
    pub async fn emit(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into()).await;
    }

    /// Emit a log line without waiting; the line is dropped if the
    /// channel is full.
    pub fn try_emit(&self, line: impl Into<String>) {
        let _ = self.tx.try_send(line.into());
    }
}

/// User-supplied unit of work invoked per execution.
///
/// Implementations are long-lived: one instance serves every invocation
/// for the lifetime of the process, so per-execution state belongs in
/// `run`, not on `self`.
///
/// # Example
///
/// ```rust,ignore
/// use agent_conduit::{Agent, AgentOutput, ExecutionContext, LogSink};
///
/// struct MyAgent;
///
/// #[async_trait::async_trait]
/// impl Agent for MyAgent {
///     async fn run(
///         &self,
///         _ctx: ExecutionContext,
///         nid: String,
///         inputs: serde_json::Value,
///         log: LogSink,
///     ) -> agent_conduit::Result<AgentOutput> {
///         log.emit(format!("node {nid} processing")).await;
///         Ok(AgentOutput::success(inputs))
///     }
/// }
/// ```
#[async_trait]
pub trait Agent: Send + Sync + 'static {
    /// Execute one invocation.
    ///
    /// Domain-level failed or exception outcomes are ordinary
    /// [`AgentOutput`] return values. Reserve `Err` for faults outside
    /// the agent's domain logic; the bridge converts such faults into a
    /// synthesized failed output.
    ///
    /// # Errors
    ///
    /// Returns an error when the agent hits an internal fault it cannot
    /// express as a domain outcome.
    async fn run(
        &self,
        ctx: ExecutionContext,
        nid: String,
        inputs: serde_json::Value,
        log: LogSink,
    ) -> Result<AgentOutput>;

    /// Release agent-held resources outside any execution's lifecycle.
    ///
    /// Invoked from the transport's `Shutdown` RPC. The default
    /// implementation does nothing.
    async fn shutdown(&self) {}
}
