//! Conflict records produced by a detection pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of structural problem between two events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TimeOverlap,
    ResourceOverlap,
    DependencyViolation,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeOverlap => "time_overlap",
            Self::ResourceOverlap => "resource_overlap",
            Self::DependencyViolation => "dependency_violation",
        }
    }

    pub fn all() -> [Self; 3] {
        [
            Self::TimeOverlap,
            Self::ResourceOverlap,
            Self::DependencyViolation,
        ]
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConflictKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_overlap" | "time" => Ok(Self::TimeOverlap),
            "resource_overlap" | "resource" => Ok(Self::ResourceOverlap),
            "dependency_violation" | "dependency" => Ok(Self::DependencyViolation),
            other => Err(format!("unknown conflict kind: {other}")),
        }
    }
}

/// Severity shown to planners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Deterministic conflict identifier.
///
/// Derived from the kind and both event ids so repeated passes over the
/// same input produce the same ids. Components are joined with `:`, and a
/// `:` or `\` inside an event id is escaped with `\`, so distinct event
/// pairs never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(String);

impl ConflictId {
    pub fn derive(kind: ConflictKind, event1_id: &str, event2_id: &str) -> Self {
        let mut id = String::from(kind.as_str());
        for part in [event1_id, event2_id] {
            id.push(':');
            for ch in part.chars() {
                if matches!(ch, ':' | '\\') {
                    id.push('\\');
                }
                id.push(ch);
            }
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConflictId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ConflictId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Resolution state. `Resolved` is terminal for a given conflict record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolutionState {
    #[default]
    Unresolved,
    Resolved { at: DateTime<Utc> },
}

impl ResolutionState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unresolved => None,
            Self::Resolved { at } => Some(*at),
        }
    }
}

/// A structural problem between exactly two events of one timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: ConflictId,
    pub kind: ConflictKind,
    pub severity: Severity,
    pub timeline_id: String,
    /// For dependency violations, the dependent event
    pub event1_id: String,
    /// For dependency violations, the dependency
    pub event2_id: String,
    pub resolvable: bool,
    #[serde(default)]
    pub resolution: ResolutionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_resources: Vec<String>,
    pub description: String,
    pub suggestion: String,
}

impl Conflict {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_resolved()
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Unresolved and structurally fixable.
    pub fn is_auto_resolvable(&self) -> bool {
        self.resolvable && !self.is_resolved()
    }

    pub fn involves(&self, event_id: &str) -> bool {
        self.event1_id == event_id || self.event2_id == event_id
    }

    pub(crate) fn mark_resolved(&mut self, at: DateTime<Utc>) {
        self.resolution = ResolutionState::Resolved { at };
    }
}
