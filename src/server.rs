//! gRPC service bootstrap wrapping an [`Agent`] implementation.
//!
//! [`AgentServer`] is the outer shell around the execution bridge: it
//! decodes inbound [`pb::RunRequest`]s, wires the per-invocation
//! channels, spawns the relay, and translates bridge updates into wire
//! messages on the response stream.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::{Agent, ExecutionRequest};
use crate::bridge::{self, StreamUpdate};
use crate::config::ServerConfig;
use crate::pb;
use crate::pb::agent_runtime_server::{AgentRuntime, AgentRuntimeServer};
use crate::AppError;

impl From<StreamUpdate> for pb::RunUpdate {
    fn from(update: StreamUpdate) -> Self {
        let relay = match update {
            StreamUpdate::Log(line) => pb::run_update::Relay::Log(line),
            StreamUpdate::Output(output) => pb::run_update::Relay::Output(output.into()),
        };
        Self { relay: Some(relay) }
    }
}

/// Serves one [`Agent`] implementation as a `conduit.v1.AgentRuntime`
/// gRPC service.
///
/// # Example
///
/// ```rust,ignore
/// AgentServer::new(MyAgent)
///     .serve()
///     .await?;
/// ```
pub struct AgentServer<A: Agent> {
    agent: Arc<A>,
    config: ServerConfig,
}

impl<A: Agent> AgentServer<A> {
    /// Wrap `agent` with the default [`ServerConfig`].
    #[must_use]
    pub fn new(agent: A) -> Self {
        Self::with_config(agent, ServerConfig::default())
    }

    /// Wrap `agent` with an explicit configuration.
    #[must_use]
    pub fn with_config(agent: A, config: ServerConfig) -> Self {
        Self {
            agent: Arc::new(agent),
            config,
        }
    }

    /// Serve on the configured bind address until ctrl-c or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the bind address is invalid and
    /// `AppError::Transport` when the gRPC server fails.
    pub async fn serve(self) -> crate::Result<()> {
        let addr = self.config.socket_addr()?;
        info!(%addr, "agent runtime listening");

        tonic::transport::Server::builder()
            .add_service(self.into_service())
            .serve_with_shutdown(addr, shutdown_signal())
            .await
            .map_err(AppError::from)?;

        info!("agent runtime stopped");
        Ok(())
    }

    /// Serve on the configured bind address until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the bind address is invalid and
    /// `AppError::Transport` when the gRPC server fails.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> crate::Result<()> {
        let addr = self.config.socket_addr()?;
        info!(%addr, "agent runtime listening");

        tonic::transport::Server::builder()
            .add_service(self.into_service())
            .serve_with_shutdown(addr, shutdown)
            .await
            .map_err(AppError::from)?;

        info!("agent runtime stopped");
        Ok(())
    }

    /// Convert into the generated tonic service, for embedding into a
    /// custom server builder.
    #[must_use]
    pub fn into_service(self) -> AgentRuntimeServer<RuntimeService<A>> {
        AgentRuntimeServer::new(RuntimeService {
            agent: self.agent,
            config: self.config,
        })
    }
}

/// Generated-service implementation backing [`AgentServer`].
pub struct RuntimeService<A: Agent> {
    agent: Arc<A>,
    config: ServerConfig,
}

#[tonic::async_trait]
impl<A: Agent> AgentRuntime for RuntimeService<A> {
    type RunStream = ReceiverStream<Result<pb::RunUpdate, Status>>;

    async fn run(
        &self,
        request: Request<pb::RunRequest>,
    ) -> Result<Response<Self::RunStream>, Status> {
        let exec = ExecutionRequest::from(request.into_inner());
        let execution_id = Uuid::new_v4();
        let span = info_span!("run", %execution_id, pid = %exec.pid, nid = %exec.nid);

        let (tx, rx) = mpsc::channel(self.config.update_channel_capacity);
        let (update_tx, mut update_rx) =
            mpsc::channel::<StreamUpdate>(self.config.update_channel_capacity);
        let cancel = CancellationToken::new();

        // Forward bridge updates onto the response stream. A failed send
        // means the client went away, which cancels the execution
        // cooperatively.
        let forward_tx = tx.clone();
        let forward_cancel = cancel.clone();
        tokio::spawn(
            async move {
                while let Some(update) = update_rx.recv().await {
                    if forward_tx
                        .send(Ok(pb::RunUpdate::from(update)))
                        .await
                        .is_err()
                    {
                        forward_cancel.cancel();
                        break;
                    }
                }
            }
            .instrument(span.clone()),
        );

        let agent = Arc::clone(&self.agent);
        let log_capacity = self.config.log_channel_capacity;
        tokio::spawn(
            async move {
                match bridge::relay(agent, exec, log_capacity, update_tx, cancel).await {
                    Ok(status) => info!(%status, "execution stream completed"),
                    Err(err) => {
                        warn!(%err, "execution aborted without a terminal output");
                        let _ = tx.send(Err(Status::from(err))).await;
                    }
                }
            }
            .instrument(span),
        );

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn shutdown(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::Empty>, Status> {
        info!("shutdown requested; forwarding to agent");
        self.agent.shutdown().await;
        Ok(Response::new(pb::Empty {}))
    }
}

/// Resolves on ctrl-c or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}
