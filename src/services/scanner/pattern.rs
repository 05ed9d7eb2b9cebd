//! Selection patterns: expand user patterns into concrete script names.
//!
//! A pattern is either a glob (`*`, `?`) matched against the whole name, or a
//! literal matched on identifier boundaries: `actor` selects `Actor` but not
//! `SomeActorNamedX`. Matching is case-insensitive throughout.

use crate::types::{HeaderError, HeaderResult, ScriptName};
use regex::Regex;
use std::collections::BTreeSet;

/// Script extensions users habitually type into patterns (`*.pex`).
const IGNORED_SUFFIXES: &[&str] = &[".pex", ".psc"];

#[derive(Debug, Clone)]
enum Matcher {
    All,
    Glob(Regex),
    Word(Regex),
}

#[derive(Debug, Clone)]
struct Pattern {
    raw: String,
    matcher: Matcher,
}

impl Pattern {
    fn parse(raw: &str) -> HeaderResult<Self> {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        let stem = IGNORED_SUFFIXES
            .iter()
            .find(|suffix| lower.ends_with(*suffix))
            .map(|suffix| &trimmed[..trimmed.len() - suffix.len()])
            .unwrap_or(trimmed);

        let matcher = if stem.is_empty() || stem.chars().all(|c| c == '*') {
            Matcher::All
        } else if stem.contains(['*', '?']) {
            Matcher::Glob(compile(&glob_to_regex(stem), raw)?)
        } else {
            Matcher::Word(compile(&format!(r"(?i)\b{}\b", regex::escape(stem)), raw)?)
        };

        Ok(Self {
            raw: trimmed.to_string(),
            matcher,
        })
    }

    fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Glob(re) | Matcher::Word(re) => re.is_match(name),
        }
    }
}

fn compile(expr: &str, raw: &str) -> HeaderResult<Regex> {
    Regex::new(expr).map_err(|e| HeaderError::Config(format!("Invalid pattern '{raw}': {e}")))
}

fn glob_to_regex(glob: &str) -> String {
    let mut expr = String::from("(?i)^");
    for c in glob.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    expr
}

/// A parsed selection. An empty set selects everything.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn parse<S: AsRef<str>>(patterns: &[S]) -> HeaderResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.trim().is_empty())
            .map(Pattern::parse)
            .collect::<HeaderResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Parse a comma-separated list such as `actor,potion,da04*`.
    pub fn from_list(list: &str) -> HeaderResult<Self> {
        let parts: Vec<&str> = list.split(',').collect();
        Self::parse(&parts)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(name))
    }

    /// Names from `universe` matching at least one pattern, sorted by case-folded name.
    pub fn select<'a, I>(&self, universe: I) -> Vec<ScriptName>
    where
        I: IntoIterator<Item = &'a ScriptName>,
    {
        let selected: BTreeSet<ScriptName> = universe
            .into_iter()
            .filter(|name| self.matches(name.as_str()))
            .cloned()
            .collect();

        for pattern in &self.patterns {
            let count = selected.iter().filter(|n| pattern.matches(n.as_str())).count();
            if count == 0 {
                log::info!("Pattern '{}' matched 0 scripts", pattern.raw);
            } else {
                log::debug!("Pattern '{}' matched {count} scripts", pattern.raw);
            }
        }

        selected.into_iter().collect()
    }

    pub fn describe(&self) -> String {
        if self.patterns.is_empty() {
            return "all scripts".to_string();
        }
        let raws: Vec<&str> = self.patterns.iter().map(|p| p.raw.as_str()).collect();
        format!("patterns [{}]", raws.join(", "))
    }
}

#[cfg(test)]
#[path = "tests/pattern_tests.rs"]
mod tests;
