//! End-to-end scenarios over the public API.

use chrono::{DateTime, TimeZone, Utc};
use wedsync_core::conflict::apply_proposal;
use wedsync_core::{
    detect_conflicts, synthesize_resolutions, ConflictKind, ConflictSession, EventField,
    EventPriority, FieldChange, HostError, ResolutionProposal, Severity, TimelineEvent,
    TimelineHost,
};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 12, hour, minute, 0).unwrap()
}

fn event(id: &str, start: (u32, u32), end: (u32, u32)) -> TimelineEvent {
    TimelineEvent::new(id, "smith-jones", at(start.0, start.1), at(end.0, end.1))
}

#[test]
fn shared_photographer_double_booked() {
    let a = event("A", (10, 0), (11, 0)).with_resource("photographer-1");
    let b = event("B", (10, 30), (11, 30)).with_resource("photographer-1");

    let conflicts = detect_conflicts(&[a, b]);
    assert_eq!(conflicts.len(), 2);

    let time: Vec<_> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::TimeOverlap)
        .collect();
    assert_eq!(time.len(), 1);

    let resource: Vec<_> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::ResourceOverlap)
        .collect();
    assert_eq!(resource.len(), 1);
    assert_eq!(resource[0].severity, Severity::Error);
    assert!(!resource[0].resolvable);
    assert_eq!((resource[0].event1_id.as_str(), resource[0].event2_id.as_str()), ("A", "B"));
}

#[test]
fn dependent_event_shifted_after_buffer() {
    let c = event("C", (9, 0), (10, 0)).with_flexible(true);
    let d = event("D", (9, 30), (10, 0))
        .with_dependency("C")
        .with_buffer_minutes(15);
    let events = vec![c, d];

    let conflicts = detect_conflicts(&events);
    let violations: Vec<_> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::DependencyViolation)
        .collect();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].event1_id, "D");
    assert_eq!(violations[0].event2_id, "C");

    let proposals = synthesize_resolutions(&conflicts, &events);
    let fix = proposals
        .iter()
        .find(|p| p.conflict_id == violations[0].id)
        .unwrap();
    assert_eq!(fix.confidence, 0.95);
    assert_eq!(
        fix.targets,
        vec![
            FieldChange::new("D", EventField::StartTime, at(9, 30), at(10, 15)),
            FieldChange::new("D", EventField::EndTime, at(10, 0), at(10, 45)),
        ]
    );
}

#[test]
fn unrelated_events_have_no_conflicts() {
    let a = event("rehearsal", (9, 0), (10, 0)).with_resource("officiant");
    let b = event("brunch", (11, 0), (12, 0)).with_resource("caterer");
    assert!(detect_conflicts(&[a, b]).is_empty());
}

#[test]
fn critical_event_overlap_is_an_error() {
    let e = event("E", (15, 0), (16, 0))
        .with_priority(EventPriority::Critical)
        .with_resource("venue-hall");
    let f = event("F", (15, 30), (16, 30)).with_resource("dj");

    let conflicts = detect_conflicts(&[e.clone(), f.clone()]);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::TimeOverlap);
    assert_eq!(conflicts[0].severity, Severity::Error);
    assert!(!conflicts[0].resolvable);

    let conflicts = detect_conflicts(&[e, f.with_flexible(true)]);
    assert_eq!(conflicts[0].severity, Severity::Error);
    assert!(conflicts[0].resolvable);
}

#[test]
fn applying_a_proposal_removes_its_conflict() {
    let events = vec![
        event("first-dance", (20, 0), (20, 15)),
        event("cake", (20, 10), (20, 30)).with_flexible(true),
        event("speeches", (19, 45), (20, 20))
            .with_dependency("first-dance")
            .with_buffer_minutes(5),
        event("sparklers", (20, 5), (20, 25))
            .with_flexible(true)
            .with_resource("photographer-1"),
        event("portraits", (20, 0), (20, 30)).with_resource("photographer-1"),
    ];

    let conflicts = detect_conflicts(&events);
    let proposals = synthesize_resolutions(&conflicts, &events);
    assert!(!proposals.is_empty());

    for proposal in &proposals {
        let mut fixed = events.clone();
        assert!(apply_proposal(&mut fixed, proposal).is_empty());
        let after = detect_conflicts(&fixed);
        assert!(
            after.iter().all(|c| c.id != proposal.conflict_id),
            "{} survived its own fix",
            proposal.conflict_id
        );
    }
}

#[test]
fn at_most_one_proposal_per_conflict_and_none_for_resources() {
    let events = vec![
        event("a", (10, 0), (11, 0)).with_flexible(true).with_resource("dj"),
        event("b", (10, 30), (11, 30)).with_flexible(true).with_resource("dj"),
        event("c", (10, 45), (12, 0)).with_dependency("a"),
    ];
    let conflicts = detect_conflicts(&events);
    let proposals = synthesize_resolutions(&conflicts, &events);

    for conflict in &conflicts {
        let count = proposals.iter().filter(|p| p.conflict_id == conflict.id).count();
        match conflict.kind {
            ConflictKind::ResourceOverlap => assert_eq!(count, 0),
            ConflictKind::TimeOverlap | ConflictKind::DependencyViolation => {
                assert_eq!(count, usize::from(conflict.resolvable));
            }
        }
    }
}

/// In-memory event store standing in for the host application.
struct EventStore {
    events: Vec<TimelineEvent>,
    resolved_notices: usize,
}

impl TimelineHost for EventStore {
    fn update_event(&mut self, event_id: &str, change: &FieldChange) -> Result<(), HostError> {
        let event = self
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| HostError::UnknownEvent(event_id.to_string()))?;
        event.apply_change(change);
        Ok(())
    }

    fn conflict_resolved(
        &mut self,
        _conflict_id: &wedsync_core::ConflictId,
        _proposal: Option<&ResolutionProposal>,
    ) -> Result<(), HostError> {
        self.resolved_notices += 1;
        Ok(())
    }
}

#[test]
fn session_round_trip_through_host() {
    let mut store = EventStore {
        events: vec![
            event("ceremony", (14, 0), (15, 0)).with_priority(EventPriority::Critical),
            event("receiving-line", (14, 45), (15, 15))
                .with_flexible(true)
                .with_dependency("ceremony"),
        ],
        resolved_notices: 0,
    };

    let mut session = ConflictSession::new();
    session.redetect(&store.events);
    let before = session.stats();
    assert_eq!(before.total, 2);
    assert_eq!(before.critical, 2);
    assert_eq!(before.auto_resolvable, 2);

    let report = session.auto_resolve_all(&mut store);
    assert!(report.is_clean());
    assert_eq!(report.resolved.len(), 2);
    assert_eq!(store.resolved_notices, 2);
    assert_eq!(session.stats().resolved, 2);

    // Both proposals moved the receiving line; the later one wins.
    let moved = &store.events[1];
    assert_eq!(moved.start_time, at(15, 15));
    assert_eq!(moved.end_time, at(15, 45));

    session.redetect(&store.events);
    assert!(session.conflicts().is_empty());
}
