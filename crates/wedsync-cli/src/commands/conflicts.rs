use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use wedsync_core::{
    Conflict, ConflictFilter, ConflictId, ConflictKind, ConflictSession, FieldChange, HostError,
    ResolutionProposal, Severity, TimelineEvent, TimelineHost,
};

use super::load_config;

#[derive(Subcommand)]
pub enum ConflictsAction {
    /// Detect conflicts and print them as JSON
    Detect {
        /// Events file ("-" for stdin)
        file: PathBuf,
        /// Only these kinds (time_overlap, resource_overlap, dependency_violation)
        #[arg(long = "kind")]
        kinds: Vec<ConflictKind>,
        /// Only these severities (warning, error)
        #[arg(long = "severity")]
        severities: Vec<Severity>,
        /// Only unresolved conflicts
        #[arg(long)]
        unresolved: bool,
        /// Only conflicts with an automatic fix
        #[arg(long)]
        resolvable: bool,
    },
    /// Print resolution proposals as JSON
    Propose {
        /// Events file ("-" for stdin)
        file: PathBuf,
    },
    /// Print aggregate conflict counts
    Stats {
        /// Events file ("-" for stdin)
        file: PathBuf,
    },
    /// Report malformed events
    Validate {
        /// Events file ("-" for stdin)
        file: PathBuf,
    },
    /// Apply proposals and print the updated events
    Resolve {
        /// Events file ("-" for stdin)
        file: PathBuf,
        /// Resolve a single conflict instead of every auto-resolvable one
        #[arg(long)]
        id: Option<String>,
        /// Write updated events and conflict state back to the file
        #[arg(long)]
        write: bool,
    },
}

/// Events file contents: a bare event array, or events plus persisted conflicts.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum TimelineInput {
    Events(Vec<TimelineEvent>),
    Snapshot {
        events: Vec<TimelineEvent>,
        #[serde(default)]
        conflicts: Vec<Conflict>,
    },
}

impl TimelineInput {
    fn into_parts(self) -> (Vec<TimelineEvent>, Vec<Conflict>) {
        match self {
            Self::Events(events) => (events, Vec::new()),
            Self::Snapshot { events, conflicts } => (events, conflicts),
        }
    }
}

fn read_input(file: &Path) -> Result<TimelineInput, Box<dyn std::error::Error>> {
    let content = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| format!("cannot read {}: {e}", file.display()))?
    };
    Ok(serde_json::from_str(&content)?)
}

/// Host backed by the events loaded from the input file.
struct FileHost {
    events: Vec<TimelineEvent>,
}

impl TimelineHost for FileHost {
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
        conflict_id: &ConflictId,
        proposal: Option<&ResolutionProposal>,
    ) -> Result<(), HostError> {
        tracing::info!(%conflict_id, applied = proposal.is_some(), "conflict resolved");
        Ok(())
    }
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    report: &'a wedsync_core::ResolutionReport,
    events: &'a [TimelineEvent],
}

pub fn run(action: ConflictsAction, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;

    match action {
        ConflictsAction::Detect {
            file,
            kinds,
            severities,
            unresolved,
            resolvable,
        } => {
            let (events, prior) = read_input(&file)?.into_parts();
            let mut session = ConflictSession::with_config(&config);
            session.redetect(&events);
            session.reconcile(&prior);

            let mut filter = ConflictFilter::new();
            for kind in kinds {
                filter = filter.with_kind(kind);
            }
            for severity in severities {
                filter = filter.with_severity(severity);
            }
            if unresolved {
                filter = filter.resolved(false);
            }
            if resolvable {
                filter = filter.resolvable(true);
            }
            println!("{}", serde_json::to_string_pretty(&session.filter(&filter))?);
        }
        ConflictsAction::Propose { file } => {
            let (events, _) = read_input(&file)?.into_parts();
            let mut session = ConflictSession::with_config(&config);
            session.redetect(&events);
            println!("{}", serde_json::to_string_pretty(&session.proposals())?);
        }
        ConflictsAction::Stats { file } => {
            let (events, prior) = read_input(&file)?.into_parts();
            let mut session = ConflictSession::with_config(&config);
            session.redetect(&events);
            session.reconcile(&prior);
            println!("{}", serde_json::to_string_pretty(&session.stats())?);
        }
        ConflictsAction::Validate { file } => {
            let (events, _) = read_input(&file)?.into_parts();
            let issues = wedsync_core::validate_events(&events);
            println!("{}", serde_json::to_string_pretty(&issues)?);
        }
        ConflictsAction::Resolve { file, id, write } => {
            if write && file.as_os_str() == "-" {
                return Err("--write needs a file path, not stdin".into());
            }
            let (events, prior) = read_input(&file)?.into_parts();
            let mut session = ConflictSession::with_config(&config);
            session.redetect(&events);
            session.reconcile(&prior);

            let mut host = FileHost { events };
            let report = match id {
                Some(id) => session.resolve_with_proposal(&ConflictId::from(id), &mut host)?,
                None => session.auto_resolve_all(&mut host),
            };

            if write {
                let snapshot = TimelineInput::Snapshot {
                    events: host.events.clone(),
                    conflicts: session.conflicts().to_vec(),
                };
                std::fs::write(&file, serde_json::to_string_pretty(&snapshot)?)?;
            }

            let output = ResolveOutput {
                report: &report,
                events: &host.events,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
