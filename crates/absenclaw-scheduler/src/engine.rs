//! Dispatch engine — orchestrates clock-in and clock-out.
//!
//! One invocation runs its steps strictly in order and never escalates an
//! error; delivery is best-effort, the attendance record is the
//! authoritative side effect. Completion rules differ on purpose:
//! clock-in defers until the sheet confirms a check-in message (a later
//! trigger or the manual path can retry), clock-out closes the day out
//! exactly once no matter what fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use absenclaw_core::config::DispatchConfig;
use absenclaw_core::traits::{BroadcastChannel, CommandChannel, TaskSource};
use absenclaw_core::types::TimesheetEntry;

use crate::attendance::DailyAttendanceState;

/// The dispatch engine. Single owner of the daily attendance state.
pub struct DispatchEngine {
    command: Arc<dyn CommandChannel>,
    broadcast: Arc<dyn BroadcastChannel>,
    source: Arc<dyn TaskSource>,
    group_id: String,
    settings: DispatchConfig,
    state: DailyAttendanceState,
}

impl DispatchEngine {
    pub fn new(
        command: Arc<dyn CommandChannel>,
        broadcast: Arc<dyn BroadcastChannel>,
        source: Arc<dyn TaskSource>,
        group_id: String,
        settings: DispatchConfig,
    ) -> Self {
        Self {
            command,
            broadcast,
            source,
            group_id,
            settings,
            state: DailyAttendanceState::default(),
        }
    }

    pub fn state(&self) -> &DailyAttendanceState {
        &self.state
    }

    /// Clock-in: command token + broadcast status, at most once per date.
    ///
    /// Without a usable check-in message nothing is sent and the flag stays
    /// false — the sheet decides whether today is a working day.
    pub async fn clock_in(&mut self, now: DateTime<FixedOffset>) {
        self.state.reconcile(now);
        if self.state.clock_in_done {
            tracing::debug!("Clock-in already done for {:?}", self.state.date);
            return;
        }

        let payload = match self.source.fetch().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Clock-in deferred: sheet unavailable: {e}");
                return;
            }
        };
        let Some(message) = payload.check_in_text() else {
            tracing::warn!("Clock-in deferred: sheet has no check-in message");
            return;
        };

        tracing::info!("Clock-in due — sending {}", self.settings.clock_in_token);
        if let Err(e) = self.command.send(&self.settings.clock_in_token).await {
            tracing::warn!("Clock-in token not delivered: {e}");
        }
        if let Err(e) = self.broadcast.send(&self.group_id, message).await {
            tracing::warn!("Clock-in status not broadcast: {e}");
        }

        // The flag follows the confirmed message, not the send outcomes.
        self.state.clock_in_done = true;
        tracing::info!("Clock-in recorded for {:?}", self.state.date);
    }

    /// Clock-out: command token, broadcast status, throttled timesheet
    /// announcements. Always completes in one invocation.
    pub async fn clock_out(&mut self, now: DateTime<FixedOffset>) {
        self.state.reconcile(now);
        if self.state.clock_out_done {
            tracing::debug!("Clock-out already done for {:?}", self.state.date);
            return;
        }

        tracing::info!("Clock-out due — sending {}", self.settings.clock_out_token);
        if let Err(e) = self.command.send(&self.settings.clock_out_token).await {
            tracing::warn!("Clock-out token not delivered: {e}");
        }

        let payload = match self.source.fetch().await {
            Ok(p) => p,
            Err(e) => {
                // The day still closes out exactly once.
                tracing::warn!("Sheet unavailable at clock-out ({e}), closing the day anyway");
                self.state.clock_out_done = true;
                return;
            }
        };

        match payload.check_out_text() {
            Some(message) => {
                if let Err(e) = self.broadcast.send(&self.group_id, message).await {
                    tracing::warn!("Clock-out status not broadcast: {e}");
                }
            }
            None => tracing::info!("No check-out message today"),
        }

        self.announce_entries(&payload.entries).await;

        self.state.clock_out_done = true;
        tracing::info!("Clock-out recorded for {:?}", self.state.date);
    }

    /// Announce timesheet entries in source order, one line per entry,
    /// throttled to respect the command channel's flood limits.
    async fn announce_entries(&self, entries: &[TimesheetEntry]) {
        let delay = Duration::from_secs(self.settings.announce_delay_secs.max(1));
        for entry in entries {
            if !entry.is_announceable() {
                tracing::warn!("Skipping malformed timesheet entry (id='{}')", entry.id);
                continue;
            }
            let line = format!(
                "{} {} : {} : {}",
                self.settings.announce_prefix, entry.id, entry.description, entry.hours
            );
            if let Err(e) = self.command.send(&line).await {
                tracing::warn!("Announcement for entry '{}' failed: {e}", entry.id);
            }
            tokio::time::sleep(delay).await;
        }
    }
}
