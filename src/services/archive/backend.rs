//! Archive reading collaborator.
//!
//! The index never looks at a container's binary layout itself; it asks a
//! backend to list virtual paths and to hand back bytes for one of them.

use super::types::ArchiveFormat;
use crate::services::fs_utils::path_utils::{normalize_virtual_path, stem_and_extension};
use crate::{COMPILED_EXTENSION, SOURCE_EXTENSION};
use ba2::prelude::*;
use ba2::tes4;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Mutex;

/// An opened container.
pub trait ArchiveReader: Send + Sync {
    /// Every file entry's virtual path, as stored in the container.
    fn entries(&self) -> Vec<String>;

    /// Bytes of the entry at `virtual_path` (as returned by [`entries`](Self::entries)).
    fn read(&self, virtual_path: &str) -> Result<Vec<u8>, String>;
}

/// Opens containers. Implementations must be cheap to share across threads.
pub trait ArchiveBackend: Send + Sync {
    fn supports(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn ArchiveReader>, String>;
}

/// Extension-dispatching backend over the `zip`, `sevenz-rust` and `ba2` crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackend;

impl ArchiveBackend for DefaultBackend {
    fn supports(&self, path: &Path) -> bool {
        ArchiveFormat::from_path(path).is_some()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ArchiveReader>, String> {
        let format = ArchiveFormat::from_path(path)
            .ok_or_else(|| format!("Unsupported archive format: {}", path.display()))?;

        match format {
            ArchiveFormat::Zip => Ok(Box::new(ZipReader::open(path)?)),
            ArchiveFormat::SevenZ => Ok(Box::new(PreloadedReader::open_7z(path)?)),
            ArchiveFormat::Bsa => Ok(Box::new(PreloadedReader::open_bsa(path)?)),
        }
    }
}

struct ZipReader {
    entries: Vec<String>,
    archive: Mutex<zip::ZipArchive<BufReader<fs::File>>>,
}

impl ZipReader {
    fn open(path: &Path) -> Result<Self, String> {
        let file = fs::File::open(path).map_err(|e| format!("Failed to open archive: {e}"))?;
        let archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| format!("Invalid or corrupt ZIP: {e}"))?;

        let entries = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(ToString::to_string)
            .collect();

        Ok(Self {
            entries,
            archive: Mutex::new(archive),
        })
    }
}

impl ArchiveReader for ZipReader {
    fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn read(&self, virtual_path: &str) -> Result<Vec<u8>, String> {
        let mut archive = self
            .archive
            .lock()
            .map_err(|_| "ZIP reader lock poisoned".to_string())?;

        let mut entry = archive.by_name(virtual_path).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("Password") || msg.contains("password") {
                format!("Password required to extract {virtual_path}")
            } else {
                format!("Failed to read entry {virtual_path}: {e}")
            }
        })?;

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| format!("Failed to read entry {virtual_path}: {e}"))?;
        Ok(bytes)
    }
}

/// A container whose script entries were decoded once at open time.
///
/// Used for formats without cheap random access. Only `.psc` and `.pex`
/// payloads are kept; other entries are listed but never decoded.
#[derive(Debug, Default)]
pub(super) struct PreloadedReader {
    entries: Vec<String>,
    payloads: HashMap<String, Vec<u8>>,
}

impl PreloadedReader {
    /// Record one entry. `load` runs only when the entry is a script.
    pub(super) fn add<F, E>(&mut self, virtual_path: String, load: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
    {
        if is_script_entry(&virtual_path) {
            let bytes = load()?;
            self.payloads.insert(virtual_path.clone(), bytes);
        }
        self.entries.push(virtual_path);
        Ok(())
    }

    /// 7z is solid and stream-only, so the whole archive is decoded in one pass.
    fn open_7z(path: &Path) -> Result<Self, String> {
        let mut reader = Self::default();

        sevenz_rust::decompress_with_extract_fn(
            fs::File::open(path).map_err(|e| format!("Failed to open 7z: {e}"))?,
            ".",
            |entry, stream, _| {
                if entry.is_directory() {
                    return Ok(true);
                }
                reader.add(entry.name().to_string(), || -> std::io::Result<Vec<u8>> {
                    let mut bytes = Vec::new();
                    stream.read_to_end(&mut bytes)?;
                    Ok(bytes)
                })?;
                Ok(true)
            },
        )
        .map_err(|e| format!("Invalid or corrupt 7z: {e}"))?;

        Ok(reader)
    }

    /// Bethesda BSA (TES4 layout, Oblivion through Skyrim SE).
    fn open_bsa(path: &Path) -> Result<Self, String> {
        let (archive, meta) =
            tes4::Archive::read(path).map_err(|e| format!("Invalid or corrupt BSA: {e}"))?;
        let options: tes4::FileCompressionOptions = meta.into();
        let mut reader = Self::default();

        for (directory_key, directory) in archive.iter() {
            for (file_key, file) in directory.iter() {
                let virtual_path = format!("{}\\{}", directory_key.name(), file_key.name());
                reader
                    .add(virtual_path.clone(), || -> Result<Vec<u8>, tes4::Error> {
                        if file.is_compressed() {
                            Ok(file.decompress(&options)?.as_bytes().to_vec())
                        } else {
                            Ok(file.as_bytes().to_vec())
                        }
                    })
                    .map_err(|e| format!("Failed to read {virtual_path} from BSA: {e}"))?;
            }
        }

        Ok(reader)
    }
}

impl ArchiveReader for PreloadedReader {
    fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn read(&self, virtual_path: &str) -> Result<Vec<u8>, String> {
        self.payloads
            .get(virtual_path)
            .cloned()
            .ok_or_else(|| format!("Entry not loaded: {virtual_path}"))
    }
}

fn is_script_entry(virtual_path: &str) -> bool {
    stem_and_extension(&normalize_virtual_path(virtual_path))
        .is_some_and(|(_, ext)| ext == SOURCE_EXTENSION || ext == COMPILED_EXTENSION)
}
