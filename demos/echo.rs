//! Echo demo agent.
//!
//! Streams a few progress lines, then returns the inputs it received.
//!
//! ```bash
//! cargo run --example echo -- --bind 0.0.0.0:50051
//! ```

#![allow(missing_docs)]

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use agent_conduit::{Agent, AgentOutput, AgentServer, ExecutionContext, LogSink, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "echo-agent", about = "Conduit echo demo agent")]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    bind: String,
}

struct EchoAgent;

#[async_trait::async_trait]
impl Agent for EchoAgent {
    async fn run(
        &self,
        ctx: ExecutionContext,
        nid: String,
        inputs: serde_json::Value,
        log: LogSink,
    ) -> agent_conduit::Result<AgentOutput> {
        log.emit(format!("node {nid} starting execution")).await;
        log.emit(format!("process {}", ctx.pid)).await;
        log.emit(format!("received inputs: {inputs}")).await;

        // Simulate a little work.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        log.emit("processing complete").await;

        Ok(AgentOutput::success(serde_json::json!({
            "node_id": nid,
            "echo": inputs,
            "message": "hello from the echo agent",
        })))
    }

    async fn shutdown(&self) {
        info!("echo agent shutting down");
    }
}

#[tokio::main]
async fn main() -> agent_conduit::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config = ServerConfig {
        bind_addr: cli.bind,
        ..ServerConfig::default()
    };

    AgentServer::with_config(EchoAgent, config).serve().await
}
