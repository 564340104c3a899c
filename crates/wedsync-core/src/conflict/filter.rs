//! Projections over a conflict list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::types::{Conflict, ConflictKind, Severity};

/// Filter over the current conflict list. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFilter {
    #[serde(default)]
    pub severities: Option<BTreeSet<Severity>>,
    #[serde(default)]
    pub kinds: Option<BTreeSet<ConflictKind>>,
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub resolvable: Option<bool>,
}

impl ConflictFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severities.get_or_insert_with(BTreeSet::new).insert(severity);
        self
    }

    pub fn with_kind(mut self, kind: ConflictKind) -> Self {
        self.kinds.get_or_insert_with(BTreeSet::new).insert(kind);
        self
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    pub fn resolvable(mut self, resolvable: bool) -> Self {
        self.resolvable = Some(resolvable);
        self
    }

    pub fn matches(&self, conflict: &Conflict) -> bool {
        self.severities
            .as_ref()
            .map_or(true, |s| s.contains(&conflict.severity))
            && self.kinds.as_ref().map_or(true, |k| k.contains(&conflict.kind))
            && self.resolved.map_or(true, |r| conflict.is_resolved() == r)
            && self.resolvable.map_or(true, |r| conflict.resolvable == r)
    }

    /// Matching conflicts in list order.
    pub fn apply<'a>(&self, conflicts: &'a [Conflict]) -> Vec<&'a Conflict> {
        conflicts.iter().filter(|c| self.matches(c)).collect()
    }
}

/// Aggregate counts over a conflict list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictStats {
    pub total: usize,
    pub resolved: usize,
    /// Error-severity conflicts, resolved or not
    pub critical: usize,
    /// Unresolved conflicts that admit an automatic fix
    pub auto_resolvable: usize,
}

impl ConflictStats {
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        conflicts.iter().fold(Self::default(), |mut stats, c| {
            stats.total += 1;
            stats.resolved += usize::from(c.is_resolved());
            stats.critical += usize::from(c.is_critical());
            stats.auto_resolvable += usize::from(c.is_auto_resolvable());
            stats
        })
    }

    pub fn unresolved(&self) -> usize {
        self.total - self.resolved
    }
}
