//! Channel and task-source traits — the seams the dispatch engine works
//! against. Concrete transports live in `absenclaw-channels` and
//! `absenclaw-sheet`; tests inject in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AttendancePayload, ConnectionState};

/// Persistent-session endpoint for terse control tokens (clock markers,
/// per-task announcements). One configured destination.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Establish (or re-establish) the session.
    async fn connect(&self) -> Result<()>;

    /// Drop the session. Never fails.
    async fn disconnect(&self);

    async fn state(&self) -> ConnectionState;

    async fn is_ready(&self) -> bool {
        self.state().await == ConnectionState::Ready
    }

    /// Send a text payload to the configured destination.
    /// Fails fast when the channel is not `Ready`.
    async fn send(&self, text: &str) -> Result<()>;

    /// Lightweight no-op liveness call against the live session.
    async fn probe(&self) -> Result<()>;
}

/// Group-messaging endpoint for human-readable status text.
/// Readiness is event-driven — see `BroadcastEvent`.
#[async_trait]
pub trait BroadcastChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Run the connection setup. Emits `BroadcastEvent`s as a side effect.
    async fn initialize(&self) -> Result<()>;

    async fn state(&self) -> ConnectionState;

    /// Post text to a group. Fails fast when the channel is not open.
    async fn send(&self, group_id: &str, text: &str) -> Result<()>;

    /// Close the connection. Never fails.
    async fn close(&self);
}

/// External provider of today's status messages and timesheet entries.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch(&self) -> Result<AttendancePayload>;
}
