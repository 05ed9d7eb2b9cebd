use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container formats the default backend can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    Zip,
    SevenZ,
    /// Bethesda archive, TES4 layout (`.bsa`).
    Bsa,
}

impl ArchiveFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "zip" => Some(Self::Zip),
            "7z" => Some(Self::SevenZ),
            "bsa" => Some(Self::Bsa),
            _ => None,
        }
    }
}

/// Points at one entry of one container. Only valid for the container that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    /// Path exactly as the container stores it; what the reader needs to extract.
    pub virtual_path: String,
    /// Lower-cased, forward-slash form used as the index key.
    pub normalized: String,
}

/// Summary of a built container, for logging and run reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub path: String,
    pub entry_count: usize,
    pub script_count: usize,
}
