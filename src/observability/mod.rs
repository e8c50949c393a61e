//! Observability for schemagate
//!
//! - Structured JSON logs, one line per event
//! - Atomic counters with a serializable snapshot
//!
//! # Principles
//!
//! 1. Read-only: never changes the outcome of an operation
//! 2. No background threads
//! 3. Deterministic output

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, LOG_LEVEL_ENV};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Logs `event` at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::LockAcquired, &[("table_id", "t")]);
        log_event(Event::LockConflict, &[]);
    }
}
