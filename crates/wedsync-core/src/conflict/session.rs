//! Conflict session controller.
//!
//! Holds the conflict list for one timeline view between detection passes:
//! - Re-detects when the host reports a changed event set
//! - Keeps proposals keyed by conflict id
//! - Tracks expanded and resolved state per conflict
//! - Pushes accepted resolutions to the host through [`TimelineHost`]
//!
//! The session never holds event state. Event mutation goes through the
//! host callback only, and resolution is optimistic: a failed callback is
//! reported but the conflict is still marked resolved, leaving the next
//! detection pass to resurface anything that did not land.
//!
//! ## Async hosts
//! Detection is synchronous and cheap, but a host may still run it off the
//! UI thread. Take a ticket with [`ConflictSession::begin_detection`],
//! compute a [`DetectionPass`] anywhere, then [`ConflictSession::commit`]
//! it. Only the most recently issued ticket can commit; older passes are
//! dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::detector::ConflictDetector;
use super::filter::{ConflictFilter, ConflictStats};
use super::resolution::{ResolutionProposal, ResolutionSynthesizer};
use super::types::{Conflict, ConflictId};
use crate::config::{CarryOver, EngineConfig};
use crate::error::{HostError, SessionError};
use crate::timeline::{validate_events, EventIssue, FieldChange, TimelineEvent};

/// Callbacks into the host application.
///
/// This trait abstracts the event store and conflict persistence so the
/// session can run against any backend.
pub trait TimelineHost {
    /// Apply one field change to one event. Called once per proposal target.
    fn update_event(&mut self, event_id: &str, change: &FieldChange) -> Result<(), HostError>;

    /// Record that a conflict was marked resolved. Called once per conflict.
    fn conflict_resolved(
        &mut self,
        conflict_id: &ConflictId,
        proposal: Option<&ResolutionProposal>,
    ) -> Result<(), HostError>;
}

/// Host with no update path. Every event update fails with
/// [`HostError::Unavailable`]; resolution notices are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

impl TimelineHost for DetachedHost {
    fn update_event(&mut self, _event_id: &str, _change: &FieldChange) -> Result<(), HostError> {
        Err(HostError::Unavailable)
    }

    fn conflict_resolved(
        &mut self,
        _conflict_id: &ConflictId,
        _proposal: Option<&ResolutionProposal>,
    ) -> Result<(), HostError> {
        Ok(())
    }
}

/// Ticket for one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetectionTicket(u64);

impl DetectionTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Result of one detection pass, computed without touching the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionPass {
    pub conflicts: Vec<Conflict>,
    pub proposals: Vec<ResolutionProposal>,
    pub issues: Vec<EventIssue>,
    pub event_ids: Vec<String>,
}

impl DetectionPass {
    /// Run classifier, synthesizer, and validation over `events`.
    pub fn compute(events: &[TimelineEvent], synthesizer: &ResolutionSynthesizer) -> Self {
        let conflicts = ConflictDetector::new().detect(events);
        let proposals = synthesizer.synthesize(&conflicts, events);
        Self {
            issues: validate_events(events),
            event_ids: events.iter().map(|e| e.id.clone()).collect(),
            conflicts,
            proposals,
        }
    }
}

/// A callback that failed while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackFailure {
    pub conflict_id: ConflictId,
    /// Set when the failing call was an event update
    pub event_id: Option<String>,
    pub message: String,
}

/// Outcome of a resolve call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub resolved: Vec<ConflictId>,
    /// Event updates the host accepted
    pub applied_changes: usize,
    pub failures: Vec<CallbackFailure>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: ResolutionReport) {
        self.resolved.extend(other.resolved);
        self.applied_changes += other.applied_changes;
        self.failures.extend(other.failures);
    }
}

/// Stateful conflict controller for one timeline view.
#[derive(Debug, Clone, Default)]
pub struct ConflictSession {
    carry_over: CarryOver,
    synthesizer: ResolutionSynthesizer,
    conflicts: Vec<Conflict>,
    proposals: HashMap<ConflictId, ResolutionProposal>,
    issues: Vec<EventIssue>,
    expanded: HashSet<ConflictId>,
    /// Event ids of the last committed pass; `None` before the first pass
    known_events: Option<HashSet<String>>,
    issued: u64,
}

impl ConflictSession {
    /// Create a session with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            carry_over: config.session.carry_over,
            synthesizer: ResolutionSynthesizer::with_config(config.resolution.clone()),
            ..Self::default()
        }
    }

    /// Seed the list from previously persisted conflicts.
    ///
    /// Seeded conflicts carry no proposals until the first re-detect.
    pub fn with_prior(mut self, prior: Vec<Conflict>) -> Self {
        self.conflicts = prior;
        self
    }

    pub fn synthesizer(&self) -> &ResolutionSynthesizer {
        &self.synthesizer
    }

    pub fn carry_over(&self) -> CarryOver {
        self.carry_over
    }

    /// Issue a ticket for a new pass. Any earlier ticket becomes stale.
    pub fn begin_detection(&mut self) -> DetectionTicket {
        self.issued += 1;
        DetectionTicket(self.issued)
    }

    /// Apply a pass if `ticket` is still the latest one issued.
    ///
    /// Returns `false` and leaves state untouched for stale tickets.
    pub fn commit(&mut self, ticket: DetectionTicket, pass: DetectionPass) -> bool {
        if ticket.0 != self.issued {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.issued,
                "discarding stale detection pass"
            );
            return false;
        }

        for issue in &pass.issues {
            tracing::warn!(event_id = issue.event_id(), "{}", issue.message());
        }

        let mut conflicts = pass.conflicts;
        if self.carry_over == CarryOver::Sticky {
            let previous: HashMap<&ConflictId, &Conflict> =
                self.conflicts.iter().map(|c| (&c.id, c)).collect();
            for conflict in &mut conflicts {
                if let Some(prev) = previous.get(&conflict.id) {
                    conflict.resolution = prev.resolution;
                }
            }
        }

        let ids: HashSet<&ConflictId> = conflicts.iter().map(|c| &c.id).collect();
        self.expanded.retain(|id| ids.contains(id));

        self.proposals = pass
            .proposals
            .into_iter()
            .map(|p| (p.conflict_id.clone(), p))
            .collect();
        self.known_events = Some(pass.event_ids.into_iter().collect());
        self.issues = pass.issues;
        self.conflicts = conflicts;

        tracing::debug!(
            ticket = ticket.0,
            conflicts = self.conflicts.len(),
            proposals = self.proposals.len(),
            "committed detection pass"
        );
        true
    }

    /// Replace the conflict list with a fresh pass over `events`.
    pub fn redetect(&mut self, events: &[TimelineEvent]) -> &[Conflict] {
        let ticket = self.begin_detection();
        let pass = DetectionPass::compute(events, &self.synthesizer);
        self.commit(ticket, pass);
        &self.conflicts
    }

    /// Re-apply resolved state from `prior` to matching unresolved ids.
    ///
    /// Returns how many conflicts were updated.
    pub fn reconcile(&mut self, prior: &[Conflict]) -> usize {
        let resolved: HashMap<&ConflictId, DateTime<Utc>> = prior
            .iter()
            .filter_map(|c| c.resolution.resolved_at().map(|at| (&c.id, at)))
            .collect();

        let mut count = 0;
        for conflict in self.conflicts.iter_mut().filter(|c| !c.is_resolved()) {
            if let Some(at) = resolved.get(&conflict.id) {
                conflict.mark_resolved(*at);
                count += 1;
            }
        }
        count
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn get(&self, id: &ConflictId) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| &c.id == id)
    }

    /// Proposals in conflict order.
    pub fn proposals(&self) -> Vec<&ResolutionProposal> {
        self.conflicts
            .iter()
            .filter_map(|c| self.proposals.get(&c.id))
            .collect()
    }

    pub fn proposal_for(&self, id: &ConflictId) -> Option<&ResolutionProposal> {
        self.proposals.get(id)
    }

    /// Input issues found by the last committed pass.
    pub fn issues(&self) -> &[EventIssue] {
        &self.issues
    }

    pub fn filter(&self, filter: &ConflictFilter) -> Vec<&Conflict> {
        filter.apply(&self.conflicts)
    }

    pub fn stats(&self) -> ConflictStats {
        ConflictStats::from_conflicts(&self.conflicts)
    }

    /// Flip the expanded flag. Returns the new state, or `false` for unknown ids.
    pub fn toggle_expanded(&mut self, id: &ConflictId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn is_expanded(&self, id: &ConflictId) -> bool {
        self.expanded.contains(id)
    }

    /// Resolve one conflict now. See [`resolve_at`](Self::resolve_at).
    ///
    /// # Errors
    /// See [`resolve_at`](Self::resolve_at).
    pub fn resolve<H: TimelineHost + ?Sized>(
        &mut self,
        id: &ConflictId,
        proposal: Option<&ResolutionProposal>,
        host: &mut H,
    ) -> Result<ResolutionReport, SessionError> {
        self.resolve_at(id, proposal, host, Utc::now())
    }

    /// Resolve one conflict.
    ///
    /// With a proposal, each target is pushed to the host, then the conflict
    /// is marked resolved. Without one, the conflict is only acknowledged.
    /// Host failures end up in the report, never in the error.
    ///
    /// # Errors
    /// Returns an error if the id is unknown, the conflict is already
    /// resolved, or the proposal belongs to another conflict.
    pub fn resolve_at<H: TimelineHost + ?Sized>(
        &mut self,
        id: &ConflictId,
        proposal: Option<&ResolutionProposal>,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> Result<ResolutionReport, SessionError> {
        let conflict = self
            .get(id)
            .ok_or_else(|| SessionError::UnknownConflict(id.to_string()))?;
        if conflict.is_resolved() {
            return Err(SessionError::AlreadyResolved(id.to_string()));
        }
        if let Some(p) = proposal {
            if &p.conflict_id != id {
                return Err(SessionError::ProposalMismatch {
                    conflict: id.to_string(),
                    proposal: p.conflict_id.to_string(),
                });
            }
        }

        let mut report = ResolutionReport::default();
        if let Some(p) = proposal {
            self.push_targets(id, p, host, &mut report);
        }

        if let Err(e) = host.conflict_resolved(id, proposal) {
            tracing::warn!(conflict_id = %id, error = %e, "host rejected resolution notice");
            report.failures.push(CallbackFailure {
                conflict_id: id.clone(),
                event_id: None,
                message: e.to_string(),
            });
        }

        // Duplicate event ids can repeat a conflict id; the id is resolved as one.
        for conflict in self.conflicts.iter_mut().filter(|c| &c.id == id) {
            conflict.mark_resolved(now);
        }
        report.resolved.push(id.clone());
        tracing::info!(
            conflict_id = %id,
            with_proposal = proposal.is_some(),
            failures = report.failures.len(),
            "conflict resolved"
        );
        Ok(report)
    }

    /// Resolve one conflict with its generated proposal, if any.
    ///
    /// # Errors
    /// See [`resolve_at`](Self::resolve_at).
    pub fn resolve_with_proposal<H: TimelineHost + ?Sized>(
        &mut self,
        id: &ConflictId,
        host: &mut H,
    ) -> Result<ResolutionReport, SessionError> {
        let proposal = self.proposals.get(id).cloned();
        self.resolve(id, proposal.as_ref(), host)
    }

    /// Apply every unresolved, resolvable conflict's proposal now.
    pub fn auto_resolve_all<H: TimelineHost + ?Sized>(&mut self, host: &mut H) -> ResolutionReport {
        self.auto_resolve_all_at(host, Utc::now())
    }

    /// Apply every unresolved, resolvable conflict's proposal.
    ///
    /// Resolvable conflicts without a proposal are skipped.
    pub fn auto_resolve_all_at<H: TimelineHost + ?Sized>(
        &mut self,
        host: &mut H,
        now: DateTime<Utc>,
    ) -> ResolutionReport {
        let mut seen = HashSet::new();
        let selected: Vec<(ConflictId, ResolutionProposal)> = self
            .conflicts
            .iter()
            .filter(|c| c.is_auto_resolvable() && seen.insert(&c.id))
            .filter_map(|c| self.proposals.get(&c.id).map(|p| (c.id.clone(), p.clone())))
            .collect();

        let mut report = ResolutionReport::default();
        for (id, proposal) in selected {
            match self.resolve_at(&id, Some(&proposal), host, now) {
                Ok(r) => report.merge(r),
                // Selected ids are deduplicated and still unresolved here.
                Err(e) => tracing::warn!(conflict_id = %id, error = %e, "auto-resolve skipped"),
            }
        }
        tracing::info!(
            resolved = report.resolved.len(),
            failures = report.failures.len(),
            "auto-resolve pass complete"
        );
        report
    }

    fn push_targets<H: TimelineHost + ?Sized>(
        &self,
        id: &ConflictId,
        proposal: &ResolutionProposal,
        host: &mut H,
        report: &mut ResolutionReport,
    ) {
        for target in &proposal.targets {
            let known = self
                .known_events
                .as_ref()
                .map_or(true, |ids| ids.contains(&target.event_id));

            let result = if known {
                host.update_event(&target.event_id, target)
            } else {
                Err(HostError::UnknownEvent(target.event_id.clone()))
            };

            match result {
                Ok(()) => report.applied_changes += 1,
                Err(e) => {
                    tracing::warn!(
                        conflict_id = %id,
                        event_id = %target.event_id,
                        error = %e,
                        "event update failed; marking resolved anyway"
                    );
                    report.failures.push(CallbackFailure {
                        conflict_id: id.clone(),
                        event_id: Some(target.event_id.clone()),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}
