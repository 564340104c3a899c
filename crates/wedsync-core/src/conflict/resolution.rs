//! Resolution synthesizer.
//!
//! Proposes field-level fixes for resolvable conflicts:
//! - Time overlaps shift the flexible event past the other one plus a buffer
//! - Dependency violations shift the dependent past its dependency plus its buffer
//!
//! Resource overlaps are never proposed. Picking a substitute vendor needs
//! availability data the engine does not have.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{Conflict, ConflictId, ConflictKind};
use crate::config::ResolutionConfig;
use crate::timeline::{EventField, FieldChange, TimelineEvent};

/// How a proposal fixes its conflict.
///
/// Only `AdjustTiming` is produced today; the others are part of the
/// vocabulary shared with hosts that record manual resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    AdjustTiming,
    ReassignResource,
    Merge,
    Split,
    Manual,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdjustTiming => "adjust_timing",
            Self::ReassignResource => "reassign_resource",
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Manual => "manual",
        }
    }
}

/// A scored candidate fix for one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionProposal {
    pub conflict_id: ConflictId,
    pub targets: Vec<FieldChange>,
    pub strategy: ResolutionStrategy,
    /// Certainty in `[0, 1]` that the fix removes the conflict cleanly
    pub confidence: f64,
    /// Minutes the mover is shifted by
    pub estimated_impact_minutes: i64,
    pub description: String,
}

impl ResolutionProposal {
    /// Ids of the events this proposal touches, in target order, deduplicated.
    pub fn target_event_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for target in &self.targets {
            if !ids.contains(&target.event_id.as_str()) {
                ids.push(&target.event_id);
            }
        }
        ids
    }
}

/// Pure resolution synthesizer.
#[derive(Debug, Clone, Default)]
pub struct ResolutionSynthesizer {
    config: ResolutionConfig,
}

impl ResolutionSynthesizer {
    /// Create a synthesizer with the default 15 minute buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: ResolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Propose fixes for every resolvable conflict, in conflict order.
    ///
    /// Conflicts naming events absent from `events` are skipped.
    pub fn synthesize(
        &self,
        conflicts: &[Conflict],
        events: &[TimelineEvent],
    ) -> Vec<ResolutionProposal> {
        let by_id: HashMap<&str, &TimelineEvent> =
            events.iter().map(|e| (e.id.as_str(), e)).collect();

        conflicts
            .iter()
            .filter(|c| c.resolvable)
            .filter_map(|conflict| {
                let first = by_id.get(conflict.event1_id.as_str())?;
                let second = by_id.get(conflict.event2_id.as_str())?;
                self.propose(conflict, first, second)
            })
            .collect()
    }

    /// Propose a fix for one conflict given its two events.
    pub fn propose(
        &self,
        conflict: &Conflict,
        event1: &TimelineEvent,
        event2: &TimelineEvent,
    ) -> Option<ResolutionProposal> {
        match conflict.kind {
            ConflictKind::TimeOverlap => self.propose_time_shift(conflict, event1, event2),
            ConflictKind::DependencyViolation => {
                self.propose_dependency_shift(conflict, event1, event2)
            }
            ConflictKind::ResourceOverlap => None,
        }
    }

    fn propose_time_shift(
        &self,
        conflict: &Conflict,
        event1: &TimelineEvent,
        event2: &TimelineEvent,
    ) -> Option<ResolutionProposal> {
        let (mover, anchor) = match (event1.flexible, event2.flexible) {
            (true, _) => (event1, event2),
            (false, true) => (event2, event1),
            (false, false) => return None,
        };
        let confidence = if event1.flexible && event2.flexible {
            self.config.both_flexible_confidence
        } else {
            self.config.single_flexible_confidence
        };

        let buffer = Duration::try_minutes(self.config.buffer_minutes.max(0));
        shift_proposal(
            conflict,
            mover,
            start_after(anchor.end_time, buffer),
            confidence,
            format!("Move \"{}\" to start after \"{}\"", mover.id, anchor.id),
        )
    }

    fn propose_dependency_shift(
        &self,
        conflict: &Conflict,
        dependent: &TimelineEvent,
        dependency: &TimelineEvent,
    ) -> Option<ResolutionProposal> {
        shift_proposal(
            conflict,
            dependent,
            start_after(dependency.end_time, dependent.buffer_or(self.config.buffer_minutes)),
            self.config.dependency_confidence,
            format!("Move \"{}\" to start after \"{}\" finishes", dependent.id, dependency.id),
        )
    }
}

fn start_after(end: DateTime<Utc>, buffer: Option<Duration>) -> Option<DateTime<Utc>> {
    end.checked_add_signed(buffer?)
}

/// `None` when the shifted window falls outside the representable range.
fn shift_proposal(
    conflict: &Conflict,
    mover: &TimelineEvent,
    new_start: Option<DateTime<Utc>>,
    confidence: f64,
    description: String,
) -> Option<ResolutionProposal> {
    let Some((new_start, new_end)) =
        new_start.and_then(|start| Some((start, start.checked_add_signed(mover.duration())?)))
    else {
        tracing::warn!(
            conflict_id = %conflict.id,
            event_id = %mover.id,
            "shifted window out of range; no proposal"
        );
        return None;
    };
    Some(ResolutionProposal {
        conflict_id: conflict.id.clone(),
        targets: vec![
            FieldChange::new(&mover.id, EventField::StartTime, mover.start_time, new_start),
            FieldChange::new(&mover.id, EventField::EndTime, mover.end_time, new_end),
        ],
        strategy: ResolutionStrategy::AdjustTiming,
        confidence: confidence.clamp(0.0, 1.0),
        estimated_impact_minutes: (new_start - mover.start_time).num_minutes(),
        description,
    })
}

/// Convenience function to synthesize proposals with the default policy
pub fn synthesize_resolutions(
    conflicts: &[Conflict],
    events: &[TimelineEvent],
) -> Vec<ResolutionProposal> {
    ResolutionSynthesizer::new().synthesize(conflicts, events)
}

/// Apply every target of `proposal` to `events`.
///
/// This is a host-side helper; the engine itself never mutates events.
/// Returns the ids of targeted events that were not found.
pub fn apply_proposal(events: &mut [TimelineEvent], proposal: &ResolutionProposal) -> Vec<String> {
    let mut missing = Vec::new();
    for target in &proposal.targets {
        match events.iter_mut().find(|e| e.id == target.event_id) {
            Some(event) => {
                event.apply_change(target);
            }
            None => {
                if !missing.contains(&target.event_id) {
                    missing.push(target.event_id.clone());
                }
            }
        }
    }
    missing
}
