use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a generator run can be told.
///
/// Missing JSON keys fall back to [`Default`], so a config file only needs
/// the values it changes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Game install dir or its `Data` folder.
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Single selection pattern. Ignored when `pattern_list` is set.
    pub pattern: String,
    /// Comma-separated selection patterns.
    pub pattern_list: Option<String>,
    pub missing_log: PathBuf,
    pub enable_archives: bool,
    /// Containers to index on top of the ones found in the data dir.
    pub archive_paths: Vec<PathBuf>,
    pub enable_decompile: bool,
    /// Decompiler executable, or a directory containing it.
    pub decompiler_path: Option<PathBuf>,
    pub decompile_timeout_secs: u64,
    /// Source roots probed after the built-in conventions.
    pub extra_source_dirs: Vec<PathBuf>,
    pub follow_dependencies: bool,
    pub max_discovery_passes: usize,
    /// Worker threads; `None` lets rayon decide.
    pub jobs: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("Data"),
            output_dir: PathBuf::from("Headers"),
            pattern: "*".into(),
            pattern_list: None,
            missing_log: PathBuf::from("missing_source.txt"),
            enable_archives: false,
            archive_paths: Vec::new(),
            enable_decompile: false,
            decompiler_path: None,
            decompile_timeout_secs: 30,
            extra_source_dirs: Vec::new(),
            follow_dependencies: false,
            max_discovery_passes: 10,
            jobs: None,
        }
    }
}
