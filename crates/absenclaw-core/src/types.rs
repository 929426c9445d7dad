//! Data model shared across crates.

use serde::{Deserialize, Serialize};

/// Connection state of a messaging endpoint.
/// Only `Ready` permits send attempts; sends in any other state fail fast
/// without touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
}

/// Connection events emitted by the broadcast channel.
/// The supervisor observes these passively; nothing outside the channel
/// mutates transport internals.
#[derive(Debug, Clone)]
pub enum BroadcastEvent {
    /// Credentials missing or expired — operator action required.
    NeedsPairing,
    /// Channel is up and accepting sends.
    Open,
    /// Channel went down. `logged_out` marks a terminal auth loss where
    /// automatic reconnection would loop pointlessly.
    Closed { reason: String, logged_out: bool },
}

/// One timesheet line item from the task source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimesheetEntry {
    #[serde(default, alias = "taskId")]
    pub id: String,
    #[serde(default, alias = "task")]
    pub description: String,
    #[serde(default, alias = "hour")]
    pub hours: String,
}

impl TimesheetEntry {
    /// An entry is announced only when all three fields are present.
    pub fn is_announceable(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.hours.trim().is_empty()
    }
}

/// Today's payload from the task source.
/// Entry order is significant — announcements preserve it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendancePayload {
    #[serde(default, alias = "checkInMessage")]
    pub check_in_message: Option<String>,
    #[serde(default, alias = "checkOutMessage")]
    pub check_out_message: Option<String>,
    #[serde(default, alias = "tasks")]
    pub entries: Vec<TimesheetEntry>,
}

impl AttendancePayload {
    /// Non-empty check-in text, if any.
    pub fn check_in_text(&self) -> Option<&str> {
        self.check_in_message
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Non-empty check-out text, if any.
    pub fn check_out_text(&self) -> Option<&str> {
        self.check_out_message
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_announceable() {
        let full = TimesheetEntry {
            id: "T-1".into(),
            description: "refactor".into(),
            hours: "2h".into(),
        };
        assert!(full.is_announceable());

        let missing_hours = TimesheetEntry {
            id: "T-2".into(),
            description: "review".into(),
            hours: "  ".into(),
        };
        assert!(!missing_hours.is_announceable());
        assert!(!TimesheetEntry::default().is_announceable());
    }

    #[test]
    fn test_payload_camel_case_aliases() {
        let json = r#"{
            "checkInMessage": "Present",
            "checkOutMessage": "Done for today",
            "tasks": [{"taskId": "31", "task": "API wiring", "hour": "3h"}]
        }"#;
        let payload: AttendancePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.check_in_text(), Some("Present"));
        assert_eq!(payload.check_out_text(), Some("Done for today"));
        assert_eq!(payload.entries.len(), 1);
        assert_eq!(payload.entries[0].id, "31");
        assert_eq!(payload.entries[0].hours, "3h");
    }

    #[test]
    fn test_blank_message_is_none() {
        let payload = AttendancePayload {
            check_in_message: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(payload.check_in_text(), None);
    }
}
