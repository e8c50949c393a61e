//! Observable events
//!
//! Each event maps to one log line. Successful operations log at INFO,
//! rejections and conflicts at WARN.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Engine configuration loaded from disk
    ConfigLoaded,

    // Schema
    TableValidated,
    TableRejected,
    FieldAdded,
    FieldRemoved,
    TableRenamed,
    TableStatusChanged,

    // Relationships
    RelationshipValidated,
    RelationshipRejected,

    // Locks
    LockAcquired,
    LockConflict,
    LockReleased,
    LockRenewed,
    /// A stale lock was moved to expired
    LockExpired,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TableValidated => "TABLE_VALIDATED",
            Event::TableRejected => "TABLE_REJECTED",
            Event::FieldAdded => "FIELD_ADDED",
            Event::FieldRemoved => "FIELD_REMOVED",
            Event::TableRenamed => "TABLE_RENAMED",
            Event::TableStatusChanged => "TABLE_STATUS_CHANGED",
            Event::RelationshipValidated => "RELATIONSHIP_VALIDATED",
            Event::RelationshipRejected => "RELATIONSHIP_REJECTED",
            Event::LockAcquired => "LOCK_ACQUIRED",
            Event::LockConflict => "LOCK_CONFLICT",
            Event::LockReleased => "LOCK_RELEASED",
            Event::LockRenewed => "LOCK_RENEWED",
            Event::LockExpired => "LOCK_EXPIRED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::TableRejected | Event::RelationshipRejected | Event::LockConflict => {
                Severity::Warn
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 14] = [
        Event::ConfigLoaded,
        Event::TableValidated,
        Event::TableRejected,
        Event::FieldAdded,
        Event::FieldRemoved,
        Event::TableRenamed,
        Event::TableStatusChanged,
        Event::RelationshipValidated,
        Event::RelationshipRejected,
        Event::LockAcquired,
        Event::LockConflict,
        Event::LockReleased,
        Event::LockRenewed,
        Event::LockExpired,
    ];

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_rejections_are_warnings() {
        assert_eq!(Event::LockConflict.severity(), Severity::Warn);
        assert_eq!(Event::TableRejected.severity(), Severity::Warn);
        assert_eq!(Event::LockAcquired.severity(), Severity::Info);
    }
}
