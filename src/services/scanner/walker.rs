//! File system walker for loose scripts and archive containers.
//! Uses `walkdir` for recursive traversal; symlinks are not followed.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::services::archive::ArchiveBackend;
use crate::services::fs_utils::path_utils::{extension_lower, file_stem_string};
use crate::types::ScriptName;
use crate::{COMPILED_EXTENSION, SOURCE_EXTENSION};

/// Loose `.psc` and `.pex` files on disk, keyed by case-folded script name.
///
/// Built once per run. For sources, the first root in probe order wins; inside
/// one root, the first file in sorted walk order wins.
#[derive(Debug, Default)]
pub struct LooseIndex {
    sources: HashMap<String, PathBuf>,
    compiled: HashMap<String, PathBuf>,
    names: BTreeSet<ScriptName>,
}

impl LooseIndex {
    pub fn build(source_roots: &[PathBuf], scripts_dir: &Path) -> Self {
        let mut index = Self::default();

        for root in source_roots {
            if !root.is_dir() {
                log::debug!("Source root not present: {}", root.display());
                continue;
            }
            for path in walk_files_with_extension(root, SOURCE_EXTENSION) {
                index.insert_source(path);
            }
        }

        if scripts_dir.is_dir() {
            for path in walk_files_with_extension(scripts_dir, COMPILED_EXTENSION) {
                index.insert_compiled(path);
            }
        }

        log::info!(
            "Cached {} loose .{} files and {} .{} files",
            index.sources.len(),
            SOURCE_EXTENSION,
            index.compiled.len(),
            COMPILED_EXTENSION
        );
        index
    }

    fn insert_source(&mut self, path: PathBuf) {
        let Some(stem) = file_stem_string(&path) else {
            return;
        };
        let name = ScriptName::new(stem);
        self.sources.entry(name.key()).or_insert(path);
        self.names.insert(name);
    }

    fn insert_compiled(&mut self, path: PathBuf) {
        let Some(stem) = file_stem_string(&path) else {
            return;
        };
        let name = ScriptName::new(stem);
        self.compiled.entry(name.key()).or_insert(path);
        self.names.insert(name);
    }

    pub fn find_source(&self, name: &ScriptName) -> Option<&Path> {
        self.sources.get(&name.key()).map(PathBuf::as_path)
    }

    pub fn find_compiled(&self, name: &ScriptName) -> Option<&Path> {
        self.compiled.get(&name.key()).map(PathBuf::as_path)
    }

    /// Every loose script name, source or compiled.
    pub fn script_names(&self) -> &BTreeSet<ScriptName> {
        &self.names
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }
}

/// Recursively list files under `root` with `extension` (case-insensitive), in sorted order.
pub fn walk_files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| extension_lower(path).as_deref() == Some(extension))
        .collect()
}

/// Containers directly inside `data_dir` the backend can read, plus `extra`.
///
/// Sorted lexically by full path and de-duplicated; that order is the
/// precedence policy when a script is packed in more than one container.
pub fn detect_containers(
    data_dir: &Path,
    extra: &[PathBuf],
    backend: &dyn ArchiveBackend,
) -> Vec<PathBuf> {
    let mut containers: BTreeSet<PathBuf> = BTreeSet::new();

    match std::fs::read_dir(data_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && backend.supports(&path) {
                    containers.insert(path);
                }
            }
        }
        Err(e) => log::warn!("Failed to read data directory {}: {e}", data_dir.display()),
    }

    for path in extra {
        if path.is_file() {
            containers.insert(path.clone());
        } else {
            log::warn!("Archive not found: {}", path.display());
        }
    }

    log::info!("Found {} archive containers", containers.len());
    containers.into_iter().collect()
}

#[cfg(test)]
#[path = "tests/walker_tests.rs"]
mod tests;
