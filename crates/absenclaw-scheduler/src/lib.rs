//! # Absenclaw Scheduler
//!
//! The daily attendance cycle: cron triggers fire in a fixed timezone and
//! feed a single-owner queue; the dispatch engine runs clock-in/clock-out
//! against the two messaging endpoints and the sheet task source.
//!
//! ## Architecture
//! ```text
//! trigger task ("50 7 * * 1-5"  → ClockAction::In)  ─┐
//! trigger task ("0 17 * * 1-5"  → ClockAction::Out) ─┼─ mpsc ─→ dispatcher
//! trigger task ("30 16 * * 5"   → ClockAction::Out) ─┘          (owns engine,
//!                                                                strictly serial)
//! ```

pub mod attendance;
pub mod cron;
pub mod engine;
pub mod triggers;

pub use attendance::DailyAttendanceState;
pub use engine::DispatchEngine;
pub use triggers::{ClockAction, Trigger, run_scheduler, triggers_from_config};
