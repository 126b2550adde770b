//! Calculator demo agent.
//!
//! Demonstrates input validation and the three terminal outcomes: a
//! missing or unknown field is a domain failure, division by zero is a
//! domain exception, and a valid expression succeeds.
//!
//! ```bash
//! cargo run --example calculator -- --bind 0.0.0.0:50052
//! ```

#![allow(missing_docs)]

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use agent_conduit::{Agent, AgentOutput, AgentServer, ExecutionContext, LogSink, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "calculator-agent", about = "Conduit calculator demo agent")]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, default_value = "0.0.0.0:50052")]
    bind: String,
}

struct CalculatorAgent;

#[async_trait::async_trait]
impl Agent for CalculatorAgent {
    async fn run(
        &self,
        _ctx: ExecutionContext,
        _nid: String,
        inputs: serde_json::Value,
        log: LogSink,
    ) -> agent_conduit::Result<AgentOutput> {
        log.emit("calculator agent started").await;

        let Some(op) = inputs.get("operation").and_then(serde_json::Value::as_str) else {
            return Ok(AgentOutput::failed("missing 'operation' field"));
        };
        let Some(a) = inputs.get("a").and_then(serde_json::Value::as_f64) else {
            return Ok(AgentOutput::failed("missing or invalid 'a' field"));
        };
        let Some(b) = inputs.get("b").and_then(serde_json::Value::as_f64) else {
            return Ok(AgentOutput::failed("missing or invalid 'b' field"));
        };

        log.emit(format!("calculating: {a} {op} {b}")).await;

        let result = match op {
            "add" | "+" => a + b,
            "sub" | "-" => a - b,
            "mul" | "*" => a * b,
            "div" | "/" => {
                if b == 0.0 {
                    return Ok(AgentOutput::exception("division by zero"));
                }
                a / b
            }
            other => {
                return Ok(AgentOutput::failed(format!("unknown operation: {other}")));
            }
        };

        log.emit(format!("result: {result}")).await;

        Ok(AgentOutput::success(serde_json::json!({
            "result": result,
            "expression": format!("{a} {op} {b} = {result}"),
        })))
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

    AgentServer::with_config(CalculatorAgent, config)
        .serve()
        .await
}
