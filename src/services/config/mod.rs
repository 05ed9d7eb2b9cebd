pub mod models;

pub use models::*;

use crate::types::{HeaderError, HeaderResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Source-root conventions under the data dir, in probe order.
///
/// Real installs use all of these, `Souce` included.
pub const SOURCE_ROOT_CONVENTIONS: &[&[&str]] = &[
    &["Source", "Scripts"],
    &["Scripts", "Source"],
    &["Scripts", "Souce"],
    &["Scripts"],
];

impl GeneratorConfig {
    /// Load from a JSON file; missing keys use defaults.
    pub fn load(path: &Path) -> HeaderResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HeaderError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            HeaderError::Config(format!("Invalid config {}: {e}", path.display()))
        })
    }

    /// The `Data` directory.
    ///
    /// `base_dir` may point at `Data` itself or at the game folder above it;
    /// quotes left over from a shell are stripped.
    pub fn data_dir(&self) -> PathBuf {
        let raw = self.base_dir.to_string_lossy();
        let cleaned = raw.trim().trim_matches('"').trim_matches('\'');
        let base = PathBuf::from(cleaned);

        let is_data = base
            .file_name()
            .map(|n| n.to_string_lossy().eq_ignore_ascii_case("data"))
            .unwrap_or(false);

        if is_data {
            base
        } else {
            base.join("Data")
        }
    }

    /// Where compiled `.pex` files live.
    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir().join("Scripts")
    }

    /// Loose source roots in probe order: the conventions, then `extra_source_dirs`.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        let data_dir = self.data_dir();
        let mut roots: Vec<PathBuf> = SOURCE_ROOT_CONVENTIONS
            .iter()
            .map(|parts| parts.iter().fold(data_dir.clone(), |acc, p| acc.join(p)))
            .collect();
        roots.extend(self.extra_source_dirs.iter().cloned());
        roots
    }

    /// Effective selection patterns. `pattern_list` overrides `pattern`.
    pub fn patterns(&self) -> Vec<String> {
        let raw: Vec<&str> = match &self.pattern_list {
            Some(list) if !list.trim().is_empty() => list.split(',').collect(),
            _ => vec![self.pattern.as_str()],
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    pub fn decompile_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.decompile_timeout_secs.max(1))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
