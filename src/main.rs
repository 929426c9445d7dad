//! # Absenclaw — unattended daily attendance bot
//!
//! At fixed local times it clocks in/out against a Telegram bot counterpart
//! and relays the day's status and timesheet entries to a WhatsApp group,
//! driven by a spreadsheet web API. Built to run untouched for weeks:
//! transient network loss, forced reconnects, and date rollover never
//! corrupt whether today's actions already happened.
//!
//! Usage:
//!   absenclaw                         # Run the daily schedule
//!   absenclaw --config ./bot.toml     # Custom config path
//!   absenclaw --once clock-out        # Manual one-shot, then exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use absenclaw_channels::{
    TelegramChannel, WhatsAppChannel, spawn_broadcast_supervisor, spawn_command_monitor,
};
use absenclaw_core::AbsenConfig;
use absenclaw_core::traits::{BroadcastChannel, CommandChannel};
use absenclaw_scheduler::{ClockAction, DispatchEngine, run_scheduler, triggers_from_config};
use absenclaw_scheduler::cron::parse_utc_offset;
use absenclaw_sheet::{SheetClient, SheetLogLayer, spawn_forwarder};

#[derive(Parser)]
#[command(
    name = "absenclaw",
    version,
    about = "⏰ Absenclaw — unattended daily clock-in/clock-out bot"
)]
struct Cli {
    /// Config file path (default: ~/.absenclaw/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Run one action immediately and exit (manual retry path):
    /// clock-in | clock-out
    #[arg(long, value_name = "ACTION")]
    once: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            AbsenConfig::load_from(std::path::Path::new(&path))?
        }
        None => AbsenConfig::load()?,
    };

    // Sheet client first — the remote log layer needs it at subscriber init.
    let sheet = Arc::new(SheetClient::new(&config.sheet));
    let (remote_layer, remote_rx) = if config.sheet.forward_logs {
        let (layer, rx) = SheetLogLayer::new();
        (Some(layer), Some(rx))
    } else {
        (None, None)
    };

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(remote_layer)
        .init();

    let forwarder = remote_rx.map(|rx| spawn_forwarder(sheet.clone(), rx));

    let tz = parse_utc_offset(&config.schedule.timezone).with_context(|| {
        format!(
            "invalid schedule.timezone '{}' (expected e.g. \"+07:00\")",
            config.schedule.timezone
        )
    })?;

    let command: Arc<dyn CommandChannel> = Arc::new(TelegramChannel::new(config.telegram.clone()));
    let (whatsapp, broadcast_events) = WhatsAppChannel::new(config.whatsapp.clone());
    let broadcast: Arc<dyn BroadcastChannel> = Arc::new(whatsapp);

    // Initial connects are best-effort; the monitor and supervisor keep
    // retrying, and sends fail fast until the endpoints come up.
    if let Err(e) = command.connect().await {
        tracing::warn!("Telegram initial connect failed: {e}");
    }
    if let Err(e) = broadcast.initialize().await {
        tracing::warn!("WhatsApp initial connect failed: {e}");
    }

    let mut engine = DispatchEngine::new(
        command.clone(),
        broadcast.clone(),
        sheet.clone(),
        config.whatsapp.group_id.clone(),
        config.dispatch.clone(),
    );

    // Manual one-shot path, then exit.
    if let Some(action) = &cli.once {
        let action: ClockAction = action.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let now = chrono::Utc::now().with_timezone(&tz);
        match action {
            ClockAction::In => engine.clock_in(now).await,
            ClockAction::Out => engine.clock_out(now).await,
        }
        command.disconnect().await;
        broadcast.close().await;
        return Ok(());
    }

    println!("⏰ Absenclaw v{}", env!("CARGO_PKG_VERSION"));
    println!("   🕘 Clock-in:  {}", config.schedule.clock_in);
    println!("   🕔 Clock-out: {}", config.schedule.clock_out.join("  |  "));
    println!("   🌏 Timezone:  {}", config.schedule.timezone);
    println!();

    let monitor = spawn_command_monitor(
        command.clone(),
        Duration::from_secs(config.telegram.probe_interval_secs),
    );
    let supervisor = spawn_broadcast_supervisor(
        broadcast.clone(),
        broadcast_events,
        Duration::from_millis(config.whatsapp.reconnect_delay_ms),
    );

    let triggers = triggers_from_config(&config.schedule);
    let scheduler = tokio::spawn(run_scheduler(engine, triggers, tz));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received — closing endpoints");

    // Outstanding triggers are abandoned, connections closed best-effort.
    scheduler.abort();
    monitor.abort();
    supervisor.abort();
    if let Some(f) = forwarder {
        f.abort();
    }
    command.disconnect().await;
    broadcast.close().await;

    Ok(())
}
