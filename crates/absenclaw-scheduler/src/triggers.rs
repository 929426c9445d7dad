//! Trigger runner — cron tasks feeding a single-owner dispatch queue.
//!
//! Each trigger sleeps until its next fire time and pushes its action onto
//! an mpsc queue. One dispatcher task owns the engine and drains the queue
//! strictly serially, so two invocations can never overlap the same daily
//! state even when two cron expressions land on the same instant.

use std::str::FromStr;

use chrono::{FixedOffset, Utc};
use tokio::sync::mpsc;

use absenclaw_core::config::ScheduleConfig;

use crate::cron;
use crate::engine::DispatchEngine;

/// The two daily events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAction {
    In,
    Out,
}

impl FromStr for ClockAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clock-in" => Ok(Self::In),
            "clock-out" => Ok(Self::Out),
            other => Err(format!("unknown action '{other}' (use clock-in|clock-out)")),
        }
    }
}

/// One armed cron trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub expression: String,
    pub action: ClockAction,
}

/// Build the trigger set from config: one clock-in expression, any number
/// of clock-out expressions (normal day + early-release day).
pub fn triggers_from_config(schedule: &ScheduleConfig) -> Vec<Trigger> {
    let mut triggers = vec![Trigger {
        expression: schedule.clock_in.clone(),
        action: ClockAction::In,
    }];
    for expression in &schedule.clock_out {
        triggers.push(Trigger {
            expression: expression.clone(),
            action: ClockAction::Out,
        });
    }
    triggers
}

/// Run the scheduler until the process shuts down.
///
/// Takes ownership of the engine — the dispatcher loop is its single
/// owner, which is what serializes invocations.
pub async fn run_scheduler(mut engine: DispatchEngine, triggers: Vec<Trigger>, tz: FixedOffset) {
    let (tx, mut rx) = mpsc::channel::<ClockAction>(8);

    for trigger in triggers {
        let tx = tx.clone();
        tokio::spawn(trigger_loop(trigger, tz, tx));
    }
    drop(tx);

    while let Some(action) = rx.recv().await {
        let now = Utc::now().with_timezone(&tz);
        match action {
            ClockAction::In => engine.clock_in(now).await,
            ClockAction::Out => engine.clock_out(now).await,
        }
    }
}

async fn trigger_loop(trigger: Trigger, tz: FixedOffset, tx: mpsc::Sender<ClockAction>) {
    loop {
        let now = Utc::now().with_timezone(&tz);
        let Some(next) = cron::next_run_from_cron(&trigger.expression, now) else {
            tracing::error!(
                "Invalid cron expression '{}' — {:?} trigger disarmed",
                trigger.expression,
                trigger.action
            );
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!("{:?} trigger armed for {next}", trigger.action);
        tokio::time::sleep(wait).await;

        if tx.send(trigger.action).await.is_err() {
            // Dispatcher gone — shutting down.
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_str() {
        assert_eq!("clock-in".parse::<ClockAction>(), Ok(ClockAction::In));
        assert_eq!("clock-out".parse::<ClockAction>(), Ok(ClockAction::Out));
        assert!("lunch".parse::<ClockAction>().is_err());
    }

    #[test]
    fn test_triggers_from_default_config() {
        let triggers = triggers_from_config(&ScheduleConfig::default());
        assert_eq!(triggers.len(), 3);
        assert_eq!(triggers[0].action, ClockAction::In);
        assert!(
            triggers[1..]
                .iter()
                .all(|t| t.action == ClockAction::Out)
        );
    }
}
