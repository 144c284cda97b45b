//! Network front end.
//!
//! - **telnet**: option negotiation and NAWS parsing
//! - **session**: per-connection animation loop
//!
//! # Architecture
//!
//! ```text
//! Server::run
//! ├── TcpListener accept loop
//! ├── JoinSet of sessions ──► session::run ──► VisitorWatch task
//! └── shutdown: broadcast, grace period, abort stragglers
//! ```
//!
//! The cool-down records live in the shared `RateLimiter` and outlive every
//! session, so the whole service must run as this one process.

pub mod session;
pub mod telnet;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::visitor::{GeoLookup, NotificationSink};

pub use session::SessionContext;

pub struct Server<G, S> {
    config: ServerConfig,
    ctx: Arc<SessionContext<G, S>>,
}

impl<G: GeoLookup, S: NotificationSink> Server<G, S> {
    pub fn new(config: ServerConfig, ctx: SessionContext<G, S>) -> Self {
        Self {
            config,
            ctx: Arc::new(ctx),
        }
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;
        self.serve(listener, shutdown).await
    }

    /// Serve an already bound listener
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "listening");

        let (stop, stop_rx) = watch::channel(false);
        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let _ = stream.set_nodelay(true);
                    sessions.spawn(session::run(stream, peer, self.ctx.clone(), stop_rx.clone()));
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    match joined {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => debug!(error = %e, "session ended with error"),
                        Err(e) => warn!(error = %e, "session task failed"),
                    }
                }
            }
        }

        info!(sessions = sessions.len(), "shutting down");
        let _ = stop.send(true);

        let grace = self.config.shutdown_grace();
        let drained = tokio::time::timeout(grace, async {
            while sessions.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !drained {
            warn!(remaining = sessions.len(), ?grace, "grace period expired, aborting sessions");
            sessions.abort_all();
        }

        info!("stopped");
        Ok(())
    }
}
