//! Run-scoped archive index.
//!
//! Each container is opened and listed at most once per run. Lookups and
//! extractions after that hit the in-memory maps only.

use super::backend::{ArchiveBackend, ArchiveReader};
use super::types::{ContainerSummary, EntryHandle};
use crate::services::fs_utils::file_utils::decode_source;
use crate::services::fs_utils::path_utils::{normalize_virtual_path, stem_and_extension};
use crate::types::{HeaderError, HeaderResult, ScriptName};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// A container's index. Built once, then read-only.
pub struct ArchiveContainer {
    pub id: String,
    pub file_path: PathBuf,
    entries: HashMap<String, EntryHandle>,
    /// `(stem, extension)` -> normalized path of the winning entry.
    scripts: HashMap<(String, String), String>,
    /// Original stem spelling per winning `(stem, extension)`.
    display_names: HashMap<(String, String), String>,
    reader: Box<dyn ArchiveReader>,
}

impl std::fmt::Debug for ArchiveContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveContainer")
            .field("id", &self.id)
            .field("file_path", &self.file_path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ArchiveContainer {
    /// Open `container_path` through `backend` and index every entry.
    pub fn build(container_path: &Path, backend: &dyn ArchiveBackend) -> HeaderResult<Self> {
        let reader = backend
            .open(container_path)
            .map_err(|reason| HeaderError::CorruptArchive {
                path: container_path.to_path_buf(),
                reason,
            })?;

        let mut raw_entries = reader.entries();
        // Lexical order decides which of two same-stem entries wins.
        raw_entries.sort_by_key(|p| normalize_virtual_path(p));

        let mut entries = HashMap::with_capacity(raw_entries.len());
        let mut scripts = HashMap::new();
        let mut display_names = HashMap::new();

        for virtual_path in raw_entries {
            let normalized = normalize_virtual_path(&virtual_path);
            if let Some(key) = stem_and_extension(&normalized) {
                if !scripts.contains_key(&key) {
                    let display = virtual_path
                        .replace('\\', "/")
                        .rsplit('/')
                        .next()
                        .and_then(|f| f.rsplit_once('.'))
                        .map(|(stem, _)| stem.to_string())
                        .unwrap_or_else(|| key.0.clone());
                    display_names.insert(key.clone(), display);
                    scripts.insert(key, normalized.clone());
                }
            }
            entries
                .entry(normalized.clone())
                .or_insert(EntryHandle {
                    virtual_path,
                    normalized,
                });
        }

        let id = container_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| container_path.display().to_string());

        log::debug!("Indexed {} entries in {}", entries.len(), id);

        Ok(Self {
            id,
            file_path: container_path.to_path_buf(),
            entries,
            scripts,
            display_names,
            reader,
        })
    }

    /// Lookup by virtual path, case- and separator-insensitive.
    pub fn lookup(&self, virtual_path: &str) -> Option<&EntryHandle> {
        self.entries.get(&normalize_virtual_path(virtual_path))
    }

    /// Lookup a script by name and extension (`psc` or `pex`), wherever it sits in the tree.
    pub fn lookup_script(&self, name: &ScriptName, extension: &str) -> Option<&EntryHandle> {
        let key = (name.key(), extension.to_lowercase());
        let normalized = self.scripts.get(&key)?;
        self.entries.get(normalized)
    }

    pub fn extract(&self, handle: &EntryHandle) -> HeaderResult<Vec<u8>> {
        self.reader.read(&handle.virtual_path).map_err(|reason| {
            HeaderError::CorruptArchive {
                path: self.file_path.clone(),
                reason,
            }
        })
    }

    /// Extract and decode a source entry.
    pub fn extract_text(&self, handle: &EntryHandle) -> HeaderResult<String> {
        Ok(decode_source(&self.extract(handle)?))
    }

    /// Script names present with any of `extensions`.
    pub fn script_names(&self, extensions: &[&str]) -> Vec<ScriptName> {
        self.display_names
            .iter()
            .filter(|((_, ext), _)| extensions.contains(&ext.as_str()))
            .map(|(_, display)| ScriptName::new(display.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self, extensions: &[&str]) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            path: self.file_path.to_string_lossy().to_string(),
            entry_count: self.entries.len(),
            script_count: self.script_names(extensions).len(),
        }
    }
}

struct ContainerSlot {
    path: PathBuf,
    built: OnceLock<Result<Arc<ArchiveContainer>, String>>,
}

/// Every known container for one run, in precedence order.
///
/// Containers are sorted lexically by full path; when a script exists in
/// several, the first in that order wins. Builds are lazy and happen at most
/// once per container: concurrent callers block on the same `OnceLock`
/// until the first build finishes, then share the result.
pub struct ArchiveIndex {
    backend: Arc<dyn ArchiveBackend>,
    slots: Vec<ContainerSlot>,
}

impl ArchiveIndex {
    pub fn new(container_paths: Vec<PathBuf>, backend: Arc<dyn ArchiveBackend>) -> Self {
        let unique: BTreeSet<PathBuf> = container_paths.into_iter().collect();
        let slots = unique
            .into_iter()
            .map(|path| ContainerSlot {
                path,
                built: OnceLock::new(),
            })
            .collect();

        Self { backend, slots }
    }

    /// An index with no containers; every lookup misses.
    pub fn empty(backend: Arc<dyn ArchiveBackend>) -> Self {
        Self::new(Vec::new(), backend)
    }

    pub fn container_paths(&self) -> Vec<&Path> {
        self.slots.iter().map(|s| s.path.as_path()).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot_container(&self, slot: &ContainerSlot) -> Option<Arc<ArchiveContainer>> {
        let built = slot.built.get_or_init(|| {
            match ArchiveContainer::build(&slot.path, self.backend.as_ref()) {
                Ok(container) => Ok(Arc::new(container)),
                Err(e) => {
                    log::warn!("Skipping archive: {e}");
                    Err(e.to_string())
                }
            }
        });
        built.as_ref().ok().cloned()
    }

    /// Built containers in precedence order; corrupt ones are skipped.
    pub fn containers(&self) -> Vec<Arc<ArchiveContainer>> {
        self.slots
            .iter()
            .filter_map(|slot| self.slot_container(slot))
            .collect()
    }

    /// Force every container's build. Used to populate the selection universe.
    pub fn build_all(&self) -> usize {
        self.containers().len()
    }

    /// First container (in precedence order) holding `name` with `extension`.
    pub fn find_script(
        &self,
        name: &ScriptName,
        extension: &str,
    ) -> Option<(Arc<ArchiveContainer>, EntryHandle)> {
        self.slots.iter().find_map(|slot| {
            let container = self.slot_container(slot)?;
            let handle = container.lookup_script(name, extension)?.clone();
            Some((container, handle))
        })
    }

    /// All script names across all readable containers.
    pub fn script_names(&self, extensions: &[&str]) -> BTreeSet<ScriptName> {
        self.containers()
            .iter()
            .flat_map(|c| c.script_names(extensions))
            .collect()
    }

    /// Containers whose build failed, with the reason.
    pub fn corrupt_containers(&self) -> Vec<(PathBuf, String)> {
        self.slots
            .iter()
            .filter_map(|slot| match slot.built.get() {
                Some(Err(reason)) => Some((slot.path.clone(), reason.clone())),
                _ => None,
            })
            .collect()
    }
}
