//! Papyrus source handling: comment scrubbing, declaration parsing and header synthesis.

pub mod model;
pub mod parser;
pub mod scrub;
pub mod synth;

pub use model::{
    DeclarationModel, FunctionSig, Param, PropertyDecl, ScriptFlag, SignatureKind,
    PRIMITIVE_TYPES,
};
pub use parser::{parse, parse_script, ParsedScript};
pub use synth::synthesize;

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
