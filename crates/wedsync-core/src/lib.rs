//! # WedSync Core Library
//!
//! Timeline conflict engine for WedSync wedding plans. The host application
//! owns the events and hands the engine a snapshot whenever they change; the
//! engine reports conflicts, proposes fixes, and calls back into the host to
//! apply the fixes a planner accepts.
//!
//! ## Architecture
//!
//! - **Classifier**: pure pairwise detection of time overlaps, vendor
//!   double-bookings, and dependency-order violations
//! - **Synthesizer**: pure proposals that shift the flexible or dependent
//!   event, each with a confidence score
//! - **Session**: conflict list state, filters, statistics, and resolution
//!   through the [`TimelineHost`] callbacks
//!
//! ## Key Components
//!
//! - [`ConflictDetector`]: Conflict classifier
//! - [`ResolutionSynthesizer`]: Proposal generator
//! - [`ConflictSession`]: Stateful controller
//! - [`EngineConfig`]: Buffer, confidence, and carry-over policy

pub mod config;
pub mod conflict;
pub mod error;
pub mod timeline;

pub use config::{CarryOver, EngineConfig, ResolutionConfig, SessionConfig, DEFAULT_BUFFER_MINUTES};
pub use conflict::{
    detect_conflicts, synthesize_resolutions, Conflict, ConflictDetector, ConflictFilter,
    ConflictId, ConflictKind, ConflictSession, ConflictStats, DetachedHost, ResolutionProposal,
    ResolutionReport, ResolutionState, ResolutionStrategy, ResolutionSynthesizer, Severity,
    TimelineHost,
};
pub use error::{ConfigError, CoreError, HostError, SessionError, ValidationError};
pub use timeline::{validate_events, EventField, EventIssue, EventPriority, FieldChange, TimelineEvent};
