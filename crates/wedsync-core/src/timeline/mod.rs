//! Timeline events as seen by the conflict engine.
//!
//! This module provides:
//! - The event snapshot type the host hands to each detection pass
//! - Field-level changes a resolution can request on an event
//! - Non-fatal validation of the event set

mod event;
mod validation;

pub use event::{EventField, EventPriority, FieldChange, TimelineEvent};
pub use validation::{validate_events, EventIssue};
