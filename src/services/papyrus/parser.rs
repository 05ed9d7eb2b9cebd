//! Declaration parser.
//!
//! A small line-driven state machine over scrubbed text. Signatures are
//! accumulated across lines until their parentheses balance, so wrapping a
//! parameter list never loses a declaration. A malformed declaration becomes a
//! [`ParseWarning`] and parsing resumes at the next declaration boundary; only
//! a missing `Scriptname` line fails the whole file.

use super::model::{DeclarationModel, FunctionSig, Param, PropertyDecl, ScriptFlag, SignatureKind};
use super::scrub::scrub;
use crate::types::{ParseError, ParseWarning, ScriptName};
use regex::Regex;
use std::sync::LazyLock;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:[.:][A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid name regex")
});
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:[.:][A-Za-z_][A-Za-z0-9_]*)*(?:\[\])?$")
        .expect("valid type regex")
});

/// A parsed model plus the declarations that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub model: DeclarationModel,
    pub warnings: Vec<ParseWarning>,
}

/// Parse source text into its declaration model, discarding warnings.
pub fn parse(text: &str) -> Result<DeclarationModel, ParseError> {
    parse_script(text).map(|parsed| parsed.model)
}

pub fn parse_script(text: &str) -> Result<ParsedScript, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptySource);
    }

    let scrubbed = scrub(text);
    let mut parser = Parser::default();
    for (line, content) in logical_lines(&scrubbed) {
        parser.feed(line, &content);
    }
    parser.finish()
}

/// Join `\` continuations. Each logical line carries the 1-based number of
/// its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim_end();
        let (body, continues) = match trimmed.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };

        let (start, mut acc) = pending.take().unwrap_or((idx + 1, String::new()));
        if !acc.is_empty() {
            acc.push(' ');
        }
        acc.push_str(body.trim());

        if continues {
            pending = Some((start, acc));
        } else {
            lines.push((start, acc));
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

enum Mode {
    Outside,
    Signature {
        line: usize,
        text: String,
        depth: i32,
    },
    PropertyBlock {
        line: usize,
        decl: PropertyDecl,
        has_get: bool,
        has_set: bool,
    },
}

struct Identity {
    name: ScriptName,
    parent: Option<ScriptName>,
    flags: Vec<ScriptFlag>,
}

struct Parser {
    mode: Mode,
    in_state: bool,
    identity: Option<Identity>,
    properties: Vec<PropertyDecl>,
    functions: Vec<FunctionSig>,
    events: Vec<FunctionSig>,
    warnings: Vec<ParseWarning>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            mode: Mode::Outside,
            in_state: false,
            identity: None,
            properties: Vec::new(),
            functions: Vec::new(),
            events: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl Parser {
    fn feed(&mut self, line: usize, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }

        match std::mem::replace(&mut self.mode, Mode::Outside) {
            Mode::Outside => self.outside(line, content),
            Mode::Signature {
                line: start,
                mut text,
                depth,
            } => {
                if starts_declaration(&head_words(content)) {
                    self.warn(start, "unterminated parameter list");
                    self.outside(line, content);
                    return;
                }
                text.push(' ');
                text.push_str(content);
                let depth = depth + paren_delta(content);
                if depth > 0 {
                    self.mode = Mode::Signature {
                        line: start,
                        text,
                        depth,
                    };
                } else {
                    self.finish_signature(start, &text);
                }
            }
            Mode::PropertyBlock {
                line: start,
                decl,
                mut has_get,
                mut has_set,
            } => {
                let words = head_words(content);
                if word(&words, 0) == "endproperty" {
                    self.push_full_property(decl, has_get, has_set);
                    return;
                }
                match accessor(&words) {
                    Some(Accessor::Get) => has_get = true,
                    Some(Accessor::Set) => has_set = true,
                    None if starts_declaration(&words) => {
                        self.warn(start, format!("property '{}' has no EndProperty", decl.name));
                        self.push_full_property(decl, has_get, has_set);
                        self.outside(line, content);
                        return;
                    }
                    None => {}
                }
                self.mode = Mode::PropertyBlock {
                    line: start,
                    decl,
                    has_get,
                    has_set,
                };
            }
        }
    }

    fn outside(&mut self, line: usize, content: &str) {
        let words = head_words(content);
        match (word(&words, 0), word(&words, 1)) {
            ("scriptname", _) => self.identity_line(line, content),
            ("state", _) | ("auto", "state") => self.in_state = true,
            ("endstate", _) => self.in_state = false,
            ("function", _) | ("event", _) | (_, "function") => {
                let depth = paren_delta(content);
                if depth > 0 {
                    self.mode = Mode::Signature {
                        line,
                        text: content.to_string(),
                        depth,
                    };
                } else {
                    self.finish_signature(line, content);
                }
            }
            (_, "property") => self.property_line(line, content),
            _ => {}
        }
    }

    fn identity_line(&mut self, line: usize, content: &str) {
        let mut tokens = content.split_whitespace().skip(1);
        let Some(name) = tokens.next().filter(|n| NAME_RE.is_match(n)) else {
            self.warn(line, "Scriptname without a valid name");
            return;
        };
        if let Some(existing) = &self.identity {
            let message = format!("second Scriptname '{name}' ignored, keeping '{}'", existing.name);
            self.warn(line, message);
            return;
        }

        let mut identity = Identity {
            name: ScriptName::new(name),
            parent: None,
            flags: Vec::new(),
        };
        while let Some(token) = tokens.next() {
            if token.eq_ignore_ascii_case("extends") {
                match tokens.next().filter(|p| NAME_RE.is_match(p)) {
                    Some(parent) => identity.parent = Some(ScriptName::new(parent)),
                    None => self.warn(line, "extends without a parent name"),
                }
                continue;
            }
            identity.flags.push(ScriptFlag::parse(token));
        }
        self.identity = Some(identity);
    }

    fn property_line(&mut self, line: usize, content: &str) {
        let spaced = content.replace('=', " = ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();

        let type_name = tokens[0];
        if !tokens.get(1).is_some_and(|kw| kw.eq_ignore_ascii_case("property")) {
            self.warn(line, "malformed property declaration");
            return;
        }
        if !TYPE_RE.is_match(type_name) {
            self.warn(line, format!("invalid property type '{type_name}'"));
            return;
        }
        let Some(name) = tokens.get(2).filter(|n| IDENT_RE.is_match(n)) else {
            self.warn(line, "property declaration without a name");
            return;
        };

        let mut rest = &tokens[3..];
        let mut default_value = None;
        if rest.first() == Some(&"=") {
            match rest.get(1) {
                Some(value) if *value != "=" => {
                    default_value = Some(value.to_string());
                    rest = &rest[2..];
                }
                _ => {
                    self.warn(line, format!("property '{name}' has '=' without a value"));
                    return;
                }
            }
        }

        let mut is_auto = false;
        let mut readonly = false;
        let mut flags = Vec::new();
        for token in rest {
            if token.eq_ignore_ascii_case("auto") {
                is_auto = true;
            } else if token.eq_ignore_ascii_case("autoreadonly") {
                is_auto = true;
                readonly = true;
            } else if IDENT_RE.is_match(token) {
                flags.push(token.to_string());
            } else {
                self.warn(line, format!("unexpected '{token}' in property '{name}'"));
                return;
            }
        }

        let decl = PropertyDecl {
            type_name: type_name.to_string(),
            name: name.to_string(),
            readonly,
            default_value,
            flags,
        };

        if is_auto {
            self.properties.push(decl);
        } else {
            self.mode = Mode::PropertyBlock {
                line,
                decl,
                has_get: false,
                has_set: false,
            };
        }
    }

    fn push_full_property(&mut self, mut decl: PropertyDecl, has_get: bool, has_set: bool) {
        decl.readonly = has_get && !has_set;
        self.properties.push(decl);
    }

    fn finish_signature(&mut self, line: usize, text: &str) {
        // Every state function also exists in the empty state.
        if self.in_state {
            return;
        }
        match parse_signature(text) {
            Ok(sig) => match sig.kind {
                SignatureKind::Function => self.functions.push(sig),
                SignatureKind::Event => self.events.push(sig),
            },
            Err(message) => self.warn(line, message),
        }
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.warnings.push(ParseWarning {
            line,
            message: message.into(),
        });
    }

    fn finish(mut self) -> Result<ParsedScript, ParseError> {
        match std::mem::replace(&mut self.mode, Mode::Outside) {
            Mode::Outside => {}
            Mode::Signature { line, .. } => self.warn(line, "unterminated parameter list"),
            Mode::PropertyBlock {
                line,
                decl,
                has_get,
                has_set,
            } => {
                self.warn(line, format!("property '{}' has no EndProperty", decl.name));
                self.push_full_property(decl, has_get, has_set);
            }
        }

        let identity = self.identity.ok_or(ParseError::MissingIdentity)?;
        let mut model = DeclarationModel::new(identity.name);
        model.parent = identity.parent;
        for flag in identity.flags {
            model.add_flag(flag);
        }
        model.properties = self.properties;
        model.functions = self.functions;
        model.events = self.events;

        Ok(ParsedScript {
            model,
            warnings: self.warnings,
        })
    }
}

enum Accessor {
    Get,
    Set,
}

fn accessor(words: &[String]) -> Option<Accessor> {
    let name = match (word(words, 0), word(words, 1)) {
        ("function", name) => name,
        (_, "function") => word(words, 2),
        _ => return None,
    };
    match name {
        "get" => Some(Accessor::Get),
        "set" => Some(Accessor::Set),
        _ => None,
    }
}

/// First three words, lower-cased, split on whitespace and `(`.
fn head_words(content: &str) -> Vec<String> {
    content
        .split(|c: char| c.is_whitespace() || c == '(')
        .filter(|w| !w.is_empty())
        .take(3)
        .map(str::to_ascii_lowercase)
        .collect()
}

fn word(words: &[String], idx: usize) -> &str {
    words.get(idx).map(String::as_str).unwrap_or("")
}

fn starts_declaration(words: &[String]) -> bool {
    matches!(
        (word(words, 0), word(words, 1)),
        ("scriptname", _)
            | ("function", _)
            | ("event", _)
            | ("state", _)
            | ("endstate", _)
            | ("auto", "state")
            | (_, "function")
            | (_, "property")
    )
}

fn paren_delta(content: &str) -> i32 {
    content.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    for (idx, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse one accumulated signature, e.g. `Int Function Foo(Int a, Float b = 1.0) global native`.
fn parse_signature(text: &str) -> Result<FunctionSig, String> {
    let open = text
        .find('(')
        .ok_or_else(|| "missing parameter list".to_string())?;
    let close = matching_paren(text, open).ok_or_else(|| "unbalanced parameter list".to_string())?;

    let head: Vec<&str> = text[..open].split_whitespace().collect();
    let (return_type, keyword, name) = match head.as_slice() {
        [keyword, name] => (None, *keyword, *name),
        [ret, keyword, name] => (Some(*ret), *keyword, *name),
        _ => return Err(format!("unexpected signature '{}'", head.join(" "))),
    };

    let kind = if keyword.eq_ignore_ascii_case("function") {
        SignatureKind::Function
    } else if keyword.eq_ignore_ascii_case("event") {
        SignatureKind::Event
    } else {
        return Err(format!("unexpected '{keyword}' before signature name"));
    };
    if !NAME_RE.is_match(name) {
        return Err(format!("invalid signature name '{name}'"));
    }
    if let Some(ret) = return_type {
        if kind == SignatureKind::Event {
            return Err(format!("event '{name}' declares a return type"));
        }
        if !TYPE_RE.is_match(ret) {
            return Err(format!("invalid return type '{ret}'"));
        }
    }

    let params =
        split_params(&text[open + 1..close]).map_err(|e| format!("{e} in signature '{name}'"))?;

    let mut modifiers = Vec::new();
    for token in text[close + 1..].split_whitespace() {
        if !IDENT_RE.is_match(token) {
            return Err(format!("unexpected '{token}' after parameters of '{name}'"));
        }
        modifiers.push(token.to_string());
    }
    let has = |m: &str| modifiers.iter().any(|t| t.eq_ignore_ascii_case(m));

    Ok(FunctionSig {
        kind,
        name: name.to_string(),
        return_type: return_type.map(str::to_string),
        params,
        is_native: has("native"),
        is_global: has("global"),
        modifiers,
    })
}

/// Split on commas outside any nested `()`/`[]`.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn split_params(inner: &str) -> Result<Vec<Param>, String> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_top_level(inner, ',')
        .into_iter()
        .map(|piece| {
            let (decl, default) = match piece.split_once('=') {
                Some((decl, default)) => (decl, Some(default)),
                None => (piece, None),
            };

            let tokens: Vec<&str> = decl.split_whitespace().collect();
            let (type_name, name) = match tokens.as_slice() {
                [] => return Err("empty parameter".to_string()),
                [_] => return Err(format!("missing parameter name after '{}'", tokens[0])),
                [type_name, name] => (*type_name, *name),
                _ => return Err(format!("unexpected parameter '{}'", tokens.join(" "))),
            };
            if !TYPE_RE.is_match(type_name) {
                return Err(format!("invalid parameter type '{type_name}'"));
            }
            if !IDENT_RE.is_match(name) {
                return Err(format!("invalid parameter name '{name}'"));
            }

            let default_literal = match default {
                Some(raw) => {
                    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                    if collapsed.is_empty() {
                        return Err(format!("parameter '{name}' has '=' without a value"));
                    }
                    Some(collapsed)
                }
                None => None,
            };

            Ok(Param {
                type_name: type_name.to_string(),
                name: name.to_string(),
                default_literal,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod tests;
