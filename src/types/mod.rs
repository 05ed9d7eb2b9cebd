pub mod errors;
pub mod script;

pub use errors::{HeaderError, HeaderResult, ParseError, ParseWarning};
pub use script::{
    Miss, Provenance, ResolutionOutcome, ScriptName, SourceRecord, Tier, TierAttempt,
};
