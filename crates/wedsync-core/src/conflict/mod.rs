//! Timeline conflict detection and resolution.
//!
//! This module provides:
//! - Pairwise conflict classification (time, resource, dependency order)
//! - Confidence-scored resolution proposals for fixable conflicts
//! - A session controller that tracks resolution state and talks to the host

mod detector;
mod filter;
mod resolution;
mod session;
mod types;

pub use detector::{detect_conflicts, ConflictDetector};
pub use filter::{ConflictFilter, ConflictStats};
pub use resolution::{
    apply_proposal, synthesize_resolutions, ResolutionProposal, ResolutionStrategy,
    ResolutionSynthesizer,
};
pub use session::{
    CallbackFailure, ConflictSession, DetachedHost, DetectionPass, DetectionTicket,
    ResolutionReport, TimelineHost,
};
pub use types::{Conflict, ConflictId, ConflictKind, ResolutionState, Severity};
