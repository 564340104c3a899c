//! Timeline event types and utilities.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ValidationError;

/// Priority of a scheduled event.
///
/// Ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl EventPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// A single scheduled activity on a wedding timeline.
///
/// Events are snapshots owned by the host application; the engine reads
/// them and never writes back except through the host callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub timeline_id: String,
    #[serde(default)]
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Vendor or staff ids that cannot be double-booked
    #[serde(default)]
    pub resources: BTreeSet<String>,
    #[serde(default)]
    pub flexible: bool,
    /// Events that must end before this one starts
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// Minimum gap after a dependency ends. Falls back to the configured buffer.
    #[serde(default)]
    pub buffer_minutes: Option<i64>,
    #[serde(default)]
    pub priority: EventPriority,
}

impl TimelineEvent {
    /// Create an event snapshot without checking the window.
    ///
    /// Inverted windows are accepted here; detection evaluates them as
    /// given and [`validate_events`](super::validate_events) flags them.
    pub fn new(
        id: impl Into<String>,
        timeline_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            timeline_id: timeline_id.into(),
            title: String::new(),
            start_time,
            end_time,
            resources: BTreeSet::new(),
            flexible: false,
            dependencies: BTreeSet::new(),
            buffer_minutes: None,
            priority: EventPriority::Normal,
        }
    }

    /// Create an event, rejecting windows where `end_time <= start_time`.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidTimeRange`] for an empty or inverted window.
    pub fn try_new(
        id: impl Into<String>,
        timeline_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if end_time <= start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self::new(id, timeline_id, start_time, end_time))
    }

    /// Duration of the window. Negative for inverted windows.
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    pub fn has_valid_window(&self) -> bool {
        self.end_time > self.start_time
    }

    /// Strict overlap test. Touching endpoints do not overlap, so a
    /// zero-length window never overlaps anything.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Resources assigned to both events, in sorted order.
    pub fn shared_resources(&self, other: &Self) -> Vec<String> {
        self.resources
            .intersection(&other.resources)
            .cloned()
            .collect()
    }

    pub fn depends_on(&self, other_id: &str) -> bool {
        self.dependencies.contains(other_id)
    }

    /// Buffer after a dependency, falling back to `default_minutes`.
    ///
    /// Negative buffers count as zero. Returns `None` when the buffer is too
    /// large to represent as a [`Duration`].
    pub fn buffer_or(&self, default_minutes: i64) -> Option<Duration> {
        Duration::try_minutes(self.buffer_minutes.unwrap_or(default_minutes).max(0))
    }

    /// `false` for a declared buffer that is negative or out of range.
    pub fn has_valid_buffer(&self) -> bool {
        self.buffer_minutes
            .map_or(true, |m| m >= 0 && Duration::try_minutes(m).is_some())
    }

    /// Apply a single field change to this snapshot.
    ///
    /// Returns `false` if the change targets another event.
    pub fn apply_change(&mut self, change: &FieldChange) -> bool {
        if change.event_id != self.id {
            return false;
        }
        match change.field {
            EventField::StartTime => self.start_time = change.new_value,
            EventField::EndTime => self.end_time = change.new_value,
        }
        true
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.insert(resource.into());
        self
    }

    pub fn with_dependency(mut self, event_id: impl Into<String>) -> Self {
        self.dependencies.insert(event_id.into());
        self
    }

    pub fn with_buffer_minutes(mut self, minutes: i64) -> Self {
        self.buffer_minutes = Some(minutes);
        self
    }

    pub fn with_flexible(mut self, flexible: bool) -> Self {
        self.flexible = flexible;
        self
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Event field a resolution may rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    StartTime,
    EndTime,
}

impl EventField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
        }
    }
}

/// One field-level change on one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub event_id: String,
    pub field: EventField,
    pub old_value: DateTime<Utc>,
    pub new_value: DateTime<Utc>,
}

impl FieldChange {
    pub fn new(
        event_id: impl Into<String>,
        field: EventField,
        old_value: DateTime<Utc>,
        new_value: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            field,
            old_value,
            new_value,
        }
    }
}
