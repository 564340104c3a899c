//! Input checks for event snapshots.
//!
//! None of these are fatal. Detection still runs over malformed input;
//! the issues are reported so the host can show them next to the conflicts.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::event::TimelineEvent;

/// A problem found in the event set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum EventIssue {
    /// `end_time <= start_time`
    InvertedWindow { event_id: String },
    /// A dependency names an id not present in the set
    DanglingDependency { event_id: String, dependency_id: String },
    /// An event lists itself as a dependency
    SelfDependency { event_id: String },
    /// Two events share an id; only pairs are compared, so both still participate
    DuplicateId { event_id: String },
    /// Declared buffer is negative or too large to schedule; negatives count as zero
    InvalidBuffer { event_id: String, minutes: i64 },
}

impl EventIssue {
    pub fn event_id(&self) -> &str {
        match self {
            Self::InvertedWindow { event_id }
            | Self::DanglingDependency { event_id, .. }
            | Self::SelfDependency { event_id }
            | Self::DuplicateId { event_id }
            | Self::InvalidBuffer { event_id, .. } => event_id,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvertedWindow { event_id } => {
                format!("Event {event_id} ends before or when it starts")
            }
            Self::DanglingDependency {
                event_id,
                dependency_id,
            } => format!("Event {event_id} depends on unknown event {dependency_id}"),
            Self::SelfDependency { event_id } => format!("Event {event_id} depends on itself"),
            Self::DuplicateId { event_id } => format!("Event id {event_id} appears more than once"),
            Self::InvalidBuffer { event_id, minutes } => {
                format!("Event {event_id} has an unusable buffer of {minutes} minutes")
            }
        }
    }
}

/// Report every input issue, in input order.
pub fn validate_events(events: &[TimelineEvent]) -> Vec<EventIssue> {
    let known: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();
    let mut seen = HashSet::with_capacity(events.len());
    let mut issues = Vec::new();

    for event in events {
        if !seen.insert(event.id.as_str()) {
            issues.push(EventIssue::DuplicateId {
                event_id: event.id.clone(),
            });
        }

        if !event.has_valid_window() {
            issues.push(EventIssue::InvertedWindow {
                event_id: event.id.clone(),
            });
        }

        if let Some(minutes) = event.buffer_minutes.filter(|_| !event.has_valid_buffer()) {
            issues.push(EventIssue::InvalidBuffer {
                event_id: event.id.clone(),
                minutes,
            });
        }

        for dependency in &event.dependencies {
            if dependency == &event.id {
                issues.push(EventIssue::SelfDependency {
                    event_id: event.id.clone(),
                });
            } else if !known.contains(dependency.as_str()) {
                issues.push(EventIssue::DanglingDependency {
                    event_id: event.id.clone(),
                    dependency_id: dependency.clone(),
                });
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, start: u32, end: u32) -> TimelineEvent {
        TimelineEvent::new(
            id,
            "t1",
            Utc.with_ymd_and_hms(2026, 6, 20, start, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 6, 20, end, 0, 0).unwrap(),
        )
    }

    #[test]
    fn clean_input_has_no_issues() {
        let events = vec![event("a", 9, 10), event("b", 10, 11).with_dependency("a")];
        assert!(validate_events(&events).is_empty());
    }

    #[test]
    fn reports_each_issue_kind() {
        let events = vec![
            event("a", 11, 10),
            event("b", 9, 10).with_dependency("ghost").with_dependency("b"),
            event("a", 12, 13),
        ];
        let issues = validate_events(&events);
        assert_eq!(
            issues,
            vec![
                EventIssue::InvertedWindow { event_id: "a".into() },
                EventIssue::SelfDependency { event_id: "b".into() },
                EventIssue::DanglingDependency {
                    event_id: "b".into(),
                    dependency_id: "ghost".into(),
                },
                EventIssue::DuplicateId { event_id: "a".into() },
            ]
        );
    }

    #[test]
    fn flags_negative_and_oversized_buffers() {
        let events = vec![
            event("a", 9, 10).with_buffer_minutes(-30),
            event("b", 10, 11).with_buffer_minutes(i64::MAX / 2),
            event("c", 11, 12).with_buffer_minutes(0),
        ];
        assert_eq!(
            validate_events(&events),
            vec![
                EventIssue::InvalidBuffer {
                    event_id: "a".into(),
                    minutes: -30,
                },
                EventIssue::InvalidBuffer {
                    event_id: "b".into(),
                    minutes: i64::MAX / 2,
                },
            ]
        );
    }

    #[test]
    fn issue_message_names_event() {
        let issue = EventIssue::DanglingDependency {
            event_id: "speeches".into(),
            dependency_id: "dinner".into(),
        };
        assert_eq!(issue.event_id(), "speeches");
        assert!(issue.message().contains("dinner"));
    }
}
