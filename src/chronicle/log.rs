//! Append-only event log for a single session.

use chrono::Utc;

use super::types::{Event, EventKind};

/// Ordered, append-only sequence of events.
///
/// Sequence numbers start at 1 and are dense: the n-th appended event gets
/// sequence number n. Events are never mutated or removed once appended.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, stamping it with the next sequence number and the
    /// current time. Returns the assigned sequence number.
    pub fn append(&mut self, kind: EventKind) -> u64 {
        let sequence_number = self.events.len() as u64 + 1;
        self.events.push(Event {
            sequence_number,
            timestamp: Utc::now(),
            kind,
        });
        sequence_number
    }

    /// Number of events in the log.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Read-only view of the events in sequence order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consumes the log and returns its events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handoff(n: usize) -> EventKind {
        EventKind::Handoff {
            from_agent: format!("agent_{}", n),
            to_agent: format!("agent_{}", n + 1),
            artifact: "artifact".to_string(),
            artifact_summary: String::new(),
        }
    }

    #[test]
    fn test_sequence_numbers_are_dense() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        for i in 0..10 {
            let seq = log.append(handoff(i));
            assert_eq!(seq, i as u64 + 1);
        }

        assert_eq!(log.len(), 10);
        let sequences: Vec<u64> = log.events().iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequences, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.append(handoff(i));
        }

        let events = log.into_events();
        assert!(events
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }
}
