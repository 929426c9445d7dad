//! # Absenclaw Channels
//! Messaging endpoint implementations.
//!
//! Two outbound endpoints: the Telegram command channel (persistent
//! session, health-monitored) and the WhatsApp broadcast channel
//! (event-driven readiness).

pub mod health;
pub mod telegram;
pub mod whatsapp;

pub use health::{spawn_broadcast_supervisor, spawn_command_monitor};
pub use telegram::TelegramChannel;
pub use whatsapp::WhatsAppChannel;
