//! Daily attendance state — which date's actions already happened.
//!
//! In-memory only. A restart legitimately forgets same-day completion;
//! the flags are meaningful only for the stored date, and every engine
//! invocation reconciles against the wall clock before reading them.

use chrono::{DateTime, FixedOffset, NaiveDate};

/// Completion record for the current local date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyAttendanceState {
    pub date: Option<NaiveDate>,
    pub clock_in_done: bool,
    pub clock_out_done: bool,
}

impl DailyAttendanceState {
    /// Reset the record whenever the local date has rolled over.
    /// No flag may ever stay true for a date other than the current one.
    pub fn reconcile(&mut self, now: DateTime<FixedOffset>) {
        let today = now.date_naive();
        if self.date != Some(today) {
            if self.date.is_some() {
                tracing::info!("Daily attendance reset for {today}");
            }
            *self = Self {
                date: Some(today),
                clock_in_done: false,
                clock_out_done: false,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reconcile_adopts_date_on_first_use() {
        let mut state = DailyAttendanceState::default();
        state.reconcile(at(2026, 3, 2, 8));
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2026, 3, 2));
        assert!(!state.clock_in_done);
        assert!(!state.clock_out_done);
    }

    #[test]
    fn test_reconcile_same_date_is_noop() {
        let mut state = DailyAttendanceState::default();
        state.reconcile(at(2026, 3, 2, 8));
        state.clock_in_done = true;
        state.clock_out_done = true;

        state.reconcile(at(2026, 3, 2, 17));
        assert!(state.clock_in_done);
        assert!(state.clock_out_done);
    }

    #[test]
    fn test_reconcile_resets_on_rollover() {
        let mut state = DailyAttendanceState::default();
        state.reconcile(at(2026, 3, 2, 8));
        state.clock_in_done = true;
        state.clock_out_done = true;

        state.reconcile(at(2026, 3, 3, 7));
        assert_eq!(state.date, NaiveDate::from_ymd_opt(2026, 3, 3));
        assert!(!state.clock_in_done);
        assert!(!state.clock_out_done);
    }
}
