#![forbid(unsafe_code)]

//! # agent-conduit
//!
//! SDK for building remote agents for the Conduit workflow engine.
//!
//! An agent is a long-running, user-supplied unit of work invoked over a
//! gRPC server-streaming boundary. While the work executes, progress log
//! lines are relayed to the engine in emission order; when it finishes,
//! exactly one terminal output (success payload, domain failure, or
//! exception) closes the stream. The execution bridge in [`bridge`]
//! guarantees that shape even when the agent task faults, and respects
//! caller-initiated cancellation throughout.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use agent_conduit::{Agent, AgentOutput, AgentServer, ExecutionContext, LogSink};
//!
//! struct MyAgent;
//!
//! #[async_trait::async_trait]
//! impl Agent for MyAgent {
//!     async fn run(
//!         &self,
//!         _ctx: ExecutionContext,
//!         nid: String,
//!         inputs: serde_json::Value,
//!         log: LogSink,
//!     ) -> agent_conduit::Result<AgentOutput> {
//!         log.emit(format!("node {nid} starting")).await;
//!         Ok(AgentOutput::success(serde_json::json!({ "echo": inputs })))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> agent_conduit::Result<()> {
//!     AgentServer::new(MyAgent).serve().await
//! }
//! ```

pub mod agent;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod errors;
pub mod pb;
pub mod server;

pub use agent::{Agent, AgentOutput, ExecutionContext, ExecutionRequest, ExecutionStatus, LogSink};
pub use bridge::{relay, BridgeState, StreamUpdate};
pub use config::ServerConfig;
pub use errors::{AppError, Result};
pub use server::AgentServer;
