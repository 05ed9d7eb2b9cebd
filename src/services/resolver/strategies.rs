use super::{Decompiler, ResolveStrategy};
use crate::services::archive::ArchiveIndex;
use crate::services::fs_utils::file_utils::read_source_file;
use crate::services::scanner::LooseIndex;
use crate::types::{Provenance, ScriptName, SourceRecord, Tier};
use crate::{COMPILED_EXTENSION, SOURCE_EXTENSION};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Loose `.psc` files under the known source roots.
pub struct LooseStrategy {
    index: Arc<LooseIndex>,
}

impl LooseStrategy {
    pub fn new(index: Arc<LooseIndex>) -> Self {
        Self { index }
    }
}

impl ResolveStrategy for LooseStrategy {
    fn tier(&self) -> Tier {
        Tier::Loose
    }

    fn resolve(&self, name: &ScriptName) -> Result<SourceRecord, String> {
        let path = self
            .index
            .find_source(name)
            .ok_or_else(|| "not found".to_string())?;
        let text = read_source_file(path)?;
        Ok(SourceRecord {
            name: name.clone(),
            text,
            provenance: Provenance::Loose,
            origin_path: path.display().to_string(),
        })
    }
}

/// `.psc` entries inside packed containers, first container in path order wins.
pub struct ArchiveStrategy {
    index: Arc<ArchiveIndex>,
}

impl ArchiveStrategy {
    pub fn new(index: Arc<ArchiveIndex>) -> Self {
        Self { index }
    }
}

impl ResolveStrategy for ArchiveStrategy {
    fn tier(&self) -> Tier {
        Tier::Archive
    }

    fn resolve(&self, name: &ScriptName) -> Result<SourceRecord, String> {
        let (container, handle) = self
            .index
            .find_script(name, SOURCE_EXTENSION)
            .ok_or_else(|| format!("not found in {} containers", self.index.len()))?;
        let text = container.extract_text(&handle).map_err(|e| e.to_string())?;
        Ok(SourceRecord {
            name: name.clone(),
            text,
            provenance: Provenance::Archive {
                container_id: container.id.clone(),
            },
            origin_path: format!("{}:{}", container.file_path.display(), handle.virtual_path),
        })
    }
}

/// Run the external decompiler on the compiled `.pex`.
pub struct DecompileStrategy {
    decompiler: Arc<Decompiler>,
    loose: Arc<LooseIndex>,
    archives: Option<Arc<ArchiveIndex>>,
}

impl DecompileStrategy {
    pub fn new(
        decompiler: Arc<Decompiler>,
        loose: Arc<LooseIndex>,
        archives: Option<Arc<ArchiveIndex>>,
    ) -> Self {
        Self {
            decompiler,
            loose,
            archives,
        }
    }

    fn decompile_packed(&self, name: &ScriptName) -> Option<Result<(String, String), String>> {
        let index = self.archives.as_ref()?;
        let (container, handle) = index.find_script(name, COMPILED_EXTENSION)?;
        let origin = format!("{}:{}", container.file_path.display(), handle.virtual_path);

        let result = container
            .extract(&handle)
            .map_err(|e| e.to_string())
            .and_then(|bytes| self.decompile_bytes(name, &bytes));
        Some(result.map(|text| (text, origin)))
    }

    /// Stage packed bytes as a loose `.pex` in a scratch dir removed on return.
    fn decompile_bytes(&self, name: &ScriptName, bytes: &[u8]) -> Result<String, String> {
        let scratch = tempfile::Builder::new()
            .prefix("papyrus-pex-")
            .tempdir()
            .map_err(|e| format!("Failed to create scratch dir: {e}"))?;
        let pex_path: PathBuf = scratch
            .path()
            .join(format!("{}.{COMPILED_EXTENSION}", name.as_str()));
        fs::write(&pex_path, bytes).map_err(|e| format!("Failed to stage {name}: {e}"))?;

        self.decompiler
            .decompile(&pex_path)
            .map_err(|e| e.to_string())
    }
}

impl ResolveStrategy for DecompileStrategy {
    fn tier(&self) -> Tier {
        Tier::Decompile
    }

    fn resolve(&self, name: &ScriptName) -> Result<SourceRecord, String> {
        let (text, origin_path) = match self.loose.find_compiled(name) {
            Some(pex) => {
                let text = self.decompiler.decompile(pex).map_err(|e| e.to_string())?;
                (text, pex.display().to_string())
            }
            None => self
                .decompile_packed(name)
                .unwrap_or_else(|| Err(format!("no compiled .{COMPILED_EXTENSION} found")))?,
        };

        Ok(SourceRecord {
            name: name.clone(),
            text,
            provenance: Provenance::Decompiled,
            origin_path,
        })
    }
}
