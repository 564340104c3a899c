//! Conflict classification over an event set.
//!
//! Every unordered pair of events on the same timeline is checked for:
//! - Time overlap (strict, touching endpoints are fine)
//! - Resource double-booking while the windows overlap
//! - Dependency order (dependent starts before its dependency ends)
//!
//! Output order is fully determined by input order: outer index, inner
//! index ascending, then checks in the order above. The session relies on
//! this for stable ids and snapshots.

use super::types::{Conflict, ConflictId, ConflictKind, ResolutionState, Severity};
use crate::timeline::TimelineEvent;

/// Pure conflict classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect every conflict in `events`.
    ///
    /// Never fails. Inverted windows are evaluated as given and
    /// dependencies on ids outside the set are ignored.
    pub fn detect(&self, events: &[TimelineEvent]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for (i, first) in events.iter().enumerate() {
            for second in &events[i + 1..] {
                if first.timeline_id != second.timeline_id {
                    continue;
                }
                self.check_pair(first, second, &mut conflicts);
            }
        }

        tracing::debug!(
            events = events.len(),
            conflicts = conflicts.len(),
            "conflict detection pass complete"
        );
        conflicts
    }

    fn check_pair(&self, a: &TimelineEvent, b: &TimelineEvent, out: &mut Vec<Conflict>) {
        let overlapping = a.overlaps(b);

        if overlapping {
            out.push(time_overlap(a, b));

            let shared = a.shared_resources(b);
            if !shared.is_empty() {
                out.push(resource_overlap(a, b, shared));
            }
        }

        if a.depends_on(&b.id) && a.start_time < b.end_time {
            out.push(dependency_violation(a, b));
        }
        if b.depends_on(&a.id) && b.start_time < a.end_time {
            out.push(dependency_violation(b, a));
        }
    }
}

fn label(event: &TimelineEvent) -> &str {
    if event.title.is_empty() {
        &event.id
    } else {
        &event.title
    }
}

fn base(kind: ConflictKind, a: &TimelineEvent, b: &TimelineEvent) -> Conflict {
    Conflict {
        id: ConflictId::derive(kind, &a.id, &b.id),
        kind,
        severity: Severity::Warning,
        timeline_id: a.timeline_id.clone(),
        event1_id: a.id.clone(),
        event2_id: b.id.clone(),
        resolvable: false,
        resolution: ResolutionState::Unresolved,
        shared_resources: Vec::new(),
        description: String::new(),
        suggestion: String::new(),
    }
}

fn time_overlap(a: &TimelineEvent, b: &TimelineEvent) -> Conflict {
    let severity = if a.priority.is_critical() || b.priority.is_critical() {
        Severity::Error
    } else {
        Severity::Warning
    };
    let resolvable = a.flexible || b.flexible;
    let suggestion = if resolvable {
        "Shift the flexible event to start after the other one ends".to_string()
    } else {
        "Both events are fixed; reschedule one of them manually".to_string()
    };

    Conflict {
        severity,
        resolvable,
        description: format!("\"{}\" overlaps with \"{}\"", label(a), label(b)),
        suggestion,
        ..base(ConflictKind::TimeOverlap, a, b)
    }
}

fn resource_overlap(a: &TimelineEvent, b: &TimelineEvent, shared: Vec<String>) -> Conflict {
    Conflict {
        severity: Severity::Error,
        resolvable: false,
        description: format!(
            "{} double-booked for \"{}\" and \"{}\"",
            shared.join(", "),
            label(a),
            label(b)
        ),
        suggestion: "Assign a different vendor to one of the events".to_string(),
        shared_resources: shared,
        ..base(ConflictKind::ResourceOverlap, a, b)
    }
}

fn dependency_violation(dependent: &TimelineEvent, dependency: &TimelineEvent) -> Conflict {
    Conflict {
        severity: Severity::Error,
        resolvable: true,
        description: format!(
            "\"{}\" starts before \"{}\" has finished",
            label(dependent),
            label(dependency)
        ),
        suggestion: format!("Move \"{}\" after \"{}\" ends", label(dependent), label(dependency)),
        ..base(ConflictKind::DependencyViolation, dependent, dependency)
    }
}

/// Convenience function to detect conflicts with the default detector
pub fn detect_conflicts(events: &[TimelineEvent]) -> Vec<Conflict> {
    ConflictDetector::new().detect(events)
}
