//! Plain TCP transport for development and testing.
//!
//! Every accepted socket is checked against the admission registry, asked
//! for its window size and handed to [`run_connection`] on its own task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chat_provider::ChatProvider;
use portfolio_content::Portfolio;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::admission::{AdmissionController, AdmissionGuard};
use crate::chrome::WINDOW_SIZE_QUERY;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::pipeline::StreamPipeline;
use crate::runtime::{run_connection, RuntimeConfig};
use crate::session::{Session, DEFAULT_HEIGHT, DEFAULT_WIDTH};

pub const REJECT_MESSAGE: &str = "Too many sessions from your IP. Please try again later.\n";

/// How long shutdown waits for open sessions before abandoning them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

pub struct Server {
    listener: TcpListener,
    admission: Arc<AdmissionController>,
    portfolio: Arc<Portfolio>,
    pipeline: Option<StreamPipeline>,
    runtime: RuntimeConfig,
}

impl Server {
    pub async fn bind(
        config: &ServerConfig,
        portfolio: Arc<Portfolio>,
        provider: Option<Arc<dyn ChatProvider>>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|error| ServerError::bind(&config.bind, error))?;

        Ok(Self {
            listener,
            admission: Arc::new(AdmissionController::new(config.max_sessions_per_address)),
            portfolio,
            pipeline: provider.map(StreamPipeline::new),
            runtime: RuntimeConfig::new(config.idle_timeout),
        })
    }

    /// Overrides the per-connection loop settings.
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.admission)
    }

    /// Serves until ctrl-c or, on unix, SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            match shutdown_signal().await {
                Ok(signal) => info!(signal, "shutdown requested"),
                Err(error) => warn!(error = %error, "signal handler failed, shutting down"),
            }
            trigger.cancel();
        });
        self.run_until(shutdown).await
    }

    /// Serves until `shutdown` is cancelled, then cancels every open session
    /// and waits for them to restore their terminals.
    pub async fn run_until(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        info!(
            address = %self.local_addr()?,
            max_sessions_per_address = self.admission.max_per_address(),
            "listening"
        );

        let mut connections = JoinSet::new();
        let mut next_id: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        next_id += 1;
                        let Some(guard) = self.admission.try_admit(&peer.to_string()) else {
                            tokio::spawn(reject(socket, peer));
                            continue;
                        };
                        let session = Session::new(
                            format!("{peer}#{next_id}"),
                            Arc::clone(&self.portfolio),
                            self.pipeline.clone(),
                            DEFAULT_WIDTH,
                            DEFAULT_HEIGHT,
                        );
                        connections.spawn(serve(
                            socket,
                            session,
                            guard,
                            self.runtime,
                            shutdown.child_token(),
                        ));
                    }
                    Err(error) => warn!(error = %error, "accept failed"),
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(error) = joined {
                        warn!(error = %error, "connection task failed");
                    }
                }
            }
        }

        info!(open = connections.len(), "draining sessions");
        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(open = connections.len(), "sessions did not finish in time");
            connections.abort_all();
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}

async fn reject(mut socket: TcpStream, peer: SocketAddr) {
    if let Err(error) = socket.write_all(REJECT_MESSAGE.as_bytes()).await {
        debug!(address = %peer, error = %error, "failed to send rejection");
    }
    let _ = socket.shutdown().await;
}

async fn serve(
    mut socket: TcpStream,
    session: Session,
    guard: AdmissionGuard,
    runtime: RuntimeConfig,
    cancel: CancellationToken,
) {
    let session_id = session.id().to_string();
    info!(session_id = %session_id, address = %guard.address(), "session started");

    if let Err(error) = socket.write_all(WINDOW_SIZE_QUERY.as_bytes()).await {
        debug!(session_id = %session_id, error = %error, "client gone before start");
        return;
    }

    let (reader, writer) = socket.into_split();
    match run_connection(session, reader, writer, runtime, cancel).await {
        Ok(()) => info!(session_id = %session_id, "session ended"),
        Err(error) => warn!(session_id = %session_id, error = %error, "session ended with error"),
    }
    drop(guard);
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use tokio::signal::unix::{signal, SignalKind};

    use super::shutdown_signal;

    #[tokio::test]
    async fn sigterm_requests_shutdown() {
        // Installed first so the signal can never take the test process down.
        let _guard = signal(SignalKind::terminate()).expect("install SIGTERM handler");

        let waiting = tokio::spawn(shutdown_signal());
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .expect("run kill");
        assert!(status.success());

        let signal = tokio::time::timeout(Duration::from_secs(5), waiting)
            .await
            .expect("shutdown signal observed")
            .expect("signal task")
            .expect("signal handler");
        assert_eq!(signal, "SIGTERM");
    }
}
