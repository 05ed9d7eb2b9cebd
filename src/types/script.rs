//! Shared identity and provenance types for the resolution pipeline.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Case-insensitive script identifier.
///
/// Keeps the spelling it was first seen with for display, but compares,
/// hashes and orders on the lower-cased form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptName(String);

impl ScriptName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    /// Display spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for ScriptName {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScriptName {}

impl Hash for ScriptName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for ScriptName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScriptName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for ScriptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScriptName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Resolution tiers, in the fixed order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Loose,
    Archive,
    Decompile,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Loose => "loose",
            Tier::Archive => "archive",
            Tier::Decompile => "decompile",
        };
        f.write_str(label)
    }
}

/// Where a resolved source text came from. Precedence is Loose > Archive > Decompiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    Loose,
    Archive { container_id: String },
    Decompiled,
}

impl Provenance {
    pub fn tier(&self) -> Tier {
        match self {
            Provenance::Loose => Tier::Loose,
            Provenance::Archive { .. } => Tier::Archive,
            Provenance::Decompiled => Tier::Decompile,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Loose => f.write_str("loose"),
            Provenance::Archive { container_id } => write!(f, "archive ({container_id})"),
            Provenance::Decompiled => f.write_str("decompiled"),
        }
    }
}

/// Resolved source text. Immutable once produced by a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub name: ScriptName,
    pub text: String,
    pub provenance: Provenance,
    pub origin_path: String,
}

/// Why a single tier did not produce source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierAttempt {
    pub tier: Tier,
    pub reason: String,
}

/// A name every tier failed on, with the reason each tier gave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Miss {
    pub name: ScriptName,
    pub attempts: Vec<TierAttempt>,
}

impl Miss {
    /// One-line form used in the missing-source log.
    pub fn describe(&self) -> String {
        let reasons: Vec<String> = self
            .attempts
            .iter()
            .map(|a| format!("{}: {}", a.tier, a.reason))
            .collect();
        format!("{}\t{}", self.name, reasons.join("; "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved(SourceRecord),
    Miss(Miss),
}
