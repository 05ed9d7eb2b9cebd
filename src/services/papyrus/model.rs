//! Declaration model: the public surface of one script.

use crate::types::ScriptName;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Types every script can use without a header.
pub const PRIMITIVE_TYPES: &[&str] = &["bool", "int", "float", "string", "var"];

/// Script-level flag from the `Scriptname` line.
///
/// Known flags are keywords and print in canonical case; anything else is
/// kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScriptFlag {
    Hidden,
    Conditional,
    Native,
    Const,
    Other(String),
}

impl ScriptFlag {
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "hidden" => Self::Hidden,
            "conditional" => Self::Conditional,
            "native" => Self::Native,
            "const" => Self::Const,
            _ => Self::Other(token.to_string()),
        }
    }
}

impl fmt::Display for ScriptFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => f.write_str("Hidden"),
            Self::Conditional => f.write_str("Conditional"),
            Self::Native => f.write_str("Native"),
            Self::Const => f.write_str("Const"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDecl {
    pub type_name: String,
    pub name: String,
    /// `AutoReadOnly`, or a full property with only a `Get` accessor.
    pub readonly: bool,
    pub default_value: Option<String>,
    /// Flags other than `Auto`/`AutoReadOnly`, verbatim and in source order.
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignatureKind {
    Function,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub type_name: String,
    pub name: String,
    pub default_literal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSig {
    pub kind: SignatureKind,
    pub name: String,
    pub return_type: Option<String>,
    pub params: Vec<Param>,
    pub is_native: bool,
    pub is_global: bool,
    /// Trailing modifiers exactly as written (`native`, `global`, `DebugOnly`, ...).
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationModel {
    pub identity: ScriptName,
    pub parent: Option<ScriptName>,
    pub flags: Vec<ScriptFlag>,
    pub properties: Vec<PropertyDecl>,
    pub functions: Vec<FunctionSig>,
    pub events: Vec<FunctionSig>,
}

impl DeclarationModel {
    pub fn new(identity: ScriptName) -> Self {
        Self {
            identity,
            parent: None,
            flags: Vec::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Add a flag unless an equal one is already present.
    pub fn add_flag(&mut self, flag: ScriptFlag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Non-primitive type names this script mentions, array suffixes stripped.
    pub fn referenced_types(&self) -> BTreeSet<ScriptName> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(parent) = &self.parent {
            names.push(parent.as_str());
        }
        names.extend(self.properties.iter().map(|p| p.type_name.as_str()));
        for sig in self.functions.iter().chain(self.events.iter()) {
            if let Some(ret) = &sig.return_type {
                names.push(ret);
            }
            names.extend(sig.params.iter().map(|p| p.type_name.as_str()));
        }

        names
            .into_iter()
            .map(|t| t.trim_end_matches("[]"))
            .filter(|t| !t.is_empty())
            .filter(|t| !PRIMITIVE_TYPES.contains(&t.to_ascii_lowercase().as_str()))
            .map(ScriptName::new)
            .filter(|n| *n != self.identity)
            .collect()
    }
}
