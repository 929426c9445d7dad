//! Endpoint health monitoring.
//!
//! The command channel keeps a persistent session, so it gets an active
//! fixed-interval monitor: reconnect while down, probe while up. The
//! broadcast channel is event-driven instead — a supervisor drains its
//! connection events and re-initializes only on non-terminal closes.

use absenclaw_core::error::AbsenError;
use absenclaw_core::traits::{BroadcastChannel, CommandChannel};
use absenclaw_core::types::{BroadcastEvent, ConnectionState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawn the fixed-interval monitor for a persistent-session endpoint.
///
/// Each tick runs one reconnect-or-probe cycle. At most one cycle is in
/// flight at a time; a tick that finds one running is skipped.
pub fn spawn_command_monitor(
    channel: Arc<dyn CommandChannel>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Health monitor started for '{}' (every {}s)",
            channel.name(),
            interval.as_secs()
        );
        let in_flight = Arc::new(AtomicBool::new(false));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick fires immediately; the initial connect happens at boot.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if in_flight.swap(true, Ordering::SeqCst) {
                tracing::debug!("{}: probe cycle still in flight, tick skipped", channel.name());
                continue;
            }
            let channel = channel.clone();
            let guard = in_flight.clone();
            tokio::spawn(async move {
                run_cycle(channel.as_ref()).await;
                guard.store(false, Ordering::SeqCst);
            });
        }
    })
}

/// One reconnect-or-probe cycle.
async fn run_cycle(channel: &dyn CommandChannel) {
    match channel.state().await {
        ConnectionState::Ready => match channel.probe().await {
            Ok(()) => tracing::trace!("{}: probe ok", channel.name()),
            Err(AbsenError::Timeout(e)) => {
                // A hung session answers nothing; cycle it.
                tracing::warn!("{}: probe timed out ({e}), forcing reconnect", channel.name());
                channel.disconnect().await;
                if let Err(e) = channel.connect().await {
                    tracing::warn!("{}: reconnect after timeout failed: {e}", channel.name());
                }
            }
            Err(e) => {
                tracing::warn!("{}: probe error (transient): {e}", channel.name());
            }
        },
        _ => {
            tracing::info!("{}: not ready, attempting reconnect", channel.name());
            match channel.connect().await {
                Ok(()) => tracing::info!("{}: reconnected", channel.name()),
                Err(e) => tracing::warn!("{}: reconnect failed: {e}", channel.name()),
            }
        }
    }
}

/// Spawn the passive supervisor for the broadcast channel's event stream.
///
/// Non-terminal closes re-initialize after `reconnect_delay`. A terminal
/// logout or a pairing request suppresses reconnection — the process keeps
/// running in degraded mode on the remaining endpoint.
pub fn spawn_broadcast_supervisor(
    channel: Arc<dyn BroadcastChannel>,
    mut events: mpsc::UnboundedReceiver<BroadcastEvent>,
    reconnect_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BroadcastEvent::Open => {
                    tracing::info!("{}: broadcast channel open", channel.name());
                }
                BroadcastEvent::NeedsPairing => {
                    tracing::error!(
                        "{}: pairing/re-auth required — reconnect suppressed, waiting on operator",
                        channel.name()
                    );
                }
                BroadcastEvent::Closed {
                    reason,
                    logged_out: true,
                } => {
                    tracing::error!(
                        "{}: logged out ({reason}) — reconnect suppressed, running degraded",
                        channel.name()
                    );
                }
                BroadcastEvent::Closed {
                    reason,
                    logged_out: false,
                } => {
                    tracing::warn!(
                        "{}: connection closed ({reason}), re-initializing in {}ms",
                        channel.name(),
                        reconnect_delay.as_millis()
                    );
                    tokio::time::sleep(reconnect_delay).await;
                    if let Err(e) = channel.initialize().await {
                        // A failed re-init emits another Closed event, which
                        // lands back on this queue and retries after the delay.
                        tracing::warn!("{}: re-initialize failed: {e}", channel.name());
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use absenclaw_core::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::RwLock;

    struct FakeCommand {
        state: RwLock<ConnectionState>,
        connects: AtomicUsize,
        probes: AtomicUsize,
        probe_hangs: bool,
    }

    impl FakeCommand {
        fn new(state: ConnectionState, probe_hangs: bool) -> Arc<Self> {
            Arc::new(Self {
                state: RwLock::new(state),
                connects: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
                probe_hangs,
            })
        }
    }

    #[async_trait]
    impl CommandChannel for FakeCommand {
        fn name(&self) -> &str {
            "fake"
        }
        async fn connect(&self) -> Result<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            *self.state.write().await = ConnectionState::Ready;
            Ok(())
        }
        async fn disconnect(&self) {
            *self.state.write().await = ConnectionState::Disconnected;
        }
        async fn state(&self) -> ConnectionState {
            *self.state.read().await
        }
        async fn send(&self, _text: &str) -> Result<()> {
            Ok(())
        }
        async fn probe(&self) -> Result<()> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.probe_hangs {
                futures::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_reconnects_disconnected_channel() {
        let channel = FakeCommand::new(ConnectionState::Disconnected, false);
        let handle = spawn_command_monitor(channel.clone(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert!(channel.connects.load(Ordering::SeqCst) >= 1);
        assert_eq!(channel.state().await, ConnectionState::Ready);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_skips_tick_while_cycle_in_flight() {
        let channel = FakeCommand::new(ConnectionState::Ready, true);
        let handle = spawn_command_monitor(channel.clone(), Duration::from_secs(60));

        // Three intervals elapse while the first probe never returns.
        tokio::time::sleep(Duration::from_secs(185)).await;
        tokio::task::yield_now().await;

        assert_eq!(channel.probes.load(Ordering::SeqCst), 1);
        handle.abort();
    }

    struct FakeBroadcast {
        inits: AtomicUsize,
    }

    #[async_trait]
    impl BroadcastChannel for FakeBroadcast {
        fn name(&self) -> &str {
            "fake-broadcast"
        }
        async fn initialize(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn state(&self) -> ConnectionState {
            ConnectionState::Ready
        }
        async fn send(&self, _group_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }
        async fn close(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_supervisor_reinitializes_on_transient_close_only() {
        let channel = Arc::new(FakeBroadcast {
            inits: AtomicUsize::new(0),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_broadcast_supervisor(channel.clone(), rx, Duration::from_millis(100));

        tx.send(BroadcastEvent::Closed {
            reason: "stream reset".into(),
            logged_out: false,
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(channel.inits.load(Ordering::SeqCst), 1);

        // Terminal logout must not trigger another initialize.
        tx.send(BroadcastEvent::Closed {
            reason: "logged out".into(),
            logged_out: true,
        })
        .unwrap();
        tx.send(BroadcastEvent::NeedsPairing).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(channel.inits.load(Ordering::SeqCst), 1);
        handle.abort();
    }
}
