//! Accept loop and worker lifecycle.
//!
//! # Responsibilities
//! - Accept clients through the bounded listener
//! - Spawn one worker per connection, registered for draining
//! - Stop accepting on shutdown, drain within the grace period, abort the rest

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::lifecycle::Shutdown;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::proxy::{serve_connection, ConnectionContext, ProxyState};

/// The forwarding proxy server.
pub struct ProxyServer {
    state: Arc<ProxyState>,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl ProxyServer {
    pub fn new(state: Arc<ProxyState>, shutdown_grace: Duration) -> Self {
        Self {
            state,
            tracker: ConnectionTracker::new(),
            shutdown_grace,
        }
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Serve clients until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) -> Result<(), ListenerError> {
        let mut stop = shutdown.subscribe();
        let mut workers = JoinSet::new();

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Proxy server accepting connections");
        }

        loop {
            tokio::select! {
                _ = stop.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_worker(&mut workers, stream, peer, permit),
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                    Err(e) => {
                        // Usually descriptor exhaustion; back off briefly.
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                },
                // Reap finished workers so the set does not grow unbounded.
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection worker panicked");
                        }
                    }
                }
            }
        }

        drop(listener);
        self.drain(workers).await;
        Ok(())
    }

    fn spawn_worker(
        &self,
        workers: &mut JoinSet<()>,
        mut stream: TcpStream,
        peer: SocketAddr,
        permit: ConnectionPermit,
    ) {
        let guard = self.tracker.track();
        let ctx = ConnectionContext {
            id: guard.id(),
            peer,
            state: Arc::clone(&self.state),
        };
        let span = tracing::info_span!("connection", connection_id = %ctx.id, peer = %peer);

        workers.spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                serve_connection(&mut stream, &ctx).await;
            }
            .instrument(span),
        );
    }

    async fn drain(&self, mut workers: JoinSet<()>) {
        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, grace_secs = self.shutdown_grace.as_secs(), "Draining connections");
        }

        if !self.tracker.wait_for_drain(self.shutdown_grace).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Grace period elapsed, aborting remaining connections"
            );
            workers.abort_all();
        }
        while workers.join_next().await.is_some() {}
        tracing::info!("All connections closed");
    }
}
