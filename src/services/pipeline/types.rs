use crate::types::{Miss, Provenance, ScriptName, Tier};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedHeader {
    /// Identity declared by the source; the header file is named after it.
    pub name: ScriptName,
    pub provenance: Provenance,
    pub header_path: PathBuf,
    pub warning_count: usize,
    #[serde(skip)]
    pub references: BTreeSet<ScriptName>,
}

/// What happened to one selected name.
#[derive(Debug, Clone)]
pub enum ScriptOutcome {
    Generated(GeneratedHeader),
    Missing(Miss),
    ParseFailed { name: ScriptName, reason: String },
    WriteFailed { name: ScriptName, reason: String },
    /// Resolved and parsed, but another source already produced the header for `identity`.
    Duplicate { name: ScriptName, identity: ScriptName },
    /// Not started because the run was cancelled.
    Skipped(ScriptName),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Names selected by the patterns, before dependency discovery.
    pub matched: usize,
    pub generated: Vec<GeneratedHeader>,
    pub misses: Vec<Miss>,
    pub parse_failures: Vec<(ScriptName, String)>,
    pub write_failures: Vec<(ScriptName, String)>,
    /// `(requested name, declared identity)` for sources whose header was already written.
    pub duplicates: Vec<(ScriptName, ScriptName)>,
    pub skipped: usize,
    pub discovery_passes: usize,
    /// Discovery stopped at the pass limit with names still pending.
    pub discovery_capped: bool,
    pub corrupt_containers: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn new(matched: usize) -> Self {
        Self {
            status: RunStatus::Completed,
            matched,
            generated: Vec::new(),
            misses: Vec::new(),
            parse_failures: Vec::new(),
            write_failures: Vec::new(),
            duplicates: Vec::new(),
            skipped: 0,
            discovery_passes: 0,
            discovery_capped: false,
            corrupt_containers: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ScriptOutcome) {
        match outcome {
            ScriptOutcome::Generated(header) => self.generated.push(header),
            ScriptOutcome::Missing(miss) => self.misses.push(miss),
            ScriptOutcome::ParseFailed { name, reason } => self.parse_failures.push((name, reason)),
            ScriptOutcome::WriteFailed { name, reason } => self.write_failures.push((name, reason)),
            ScriptOutcome::Duplicate { name, identity } => self.duplicates.push((name, identity)),
            ScriptOutcome::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    pub fn count_from(&self, tier: Tier) -> usize {
        self.generated
            .iter()
            .filter(|h| h.provenance.tier() == tier)
            .count()
    }

    /// Lines for the missing-source log, sorted by name.
    pub fn missing_lines(&self) -> Vec<String> {
        let mut entries: Vec<(ScriptName, String)> = self
            .misses
            .iter()
            .map(|miss| (miss.name.clone(), miss.describe()))
            .chain(
                self.parse_failures
                    .iter()
                    .map(|(name, reason)| (name.clone(), format!("{name}\tparse: {reason}"))),
            )
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, line)| line).collect()
    }
}
