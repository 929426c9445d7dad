//! Remote log shipping as a tracing layer.
//!
//! WARN and ERROR events are copied onto an mpsc queue; a forwarder task
//! drains the queue and POSTs each line to the sheet's postLog endpoint.
//! The layer itself never does I/O, so logging stays non-blocking, and the
//! forwarder logs its own failures at DEBUG only — below the layer's
//! threshold, so a dead endpoint cannot feed back into the queue.

use crate::client::SheetClient;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One captured log line.
#[derive(Debug)]
pub struct LogLine {
    pub level: String,
    pub message: String,
}

/// Tracing layer that mirrors WARN+ events to the remote sink.
pub struct SheetLogLayer {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl SheetLogLayer {
    /// Build the layer plus the receiving end for `spawn_forwarder`.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<S: Subscriber> Layer<S> for SheetLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.message.is_empty() {
            return;
        }

        let _ = self.tx.send(LogLine {
            level: level.to_string(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Drain captured lines into the sheet endpoint.
pub fn spawn_forwarder(
    client: Arc<SheetClient>,
    mut rx: mpsc::UnboundedReceiver<LogLine>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            client.post_log(&line.level, &line.message).await;
        }
    })
}
