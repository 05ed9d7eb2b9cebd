use crate::services::archive::{ArchiveBackend, ArchiveReader};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub fn init_test_logger() {
    INIT.call_once(|| {
        // Initialize logger only once
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Helper: create a minimal valid ZIP.
pub fn create_test_zip(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let zip_path = dir.join(name);
    let file = fs::File::create(&zip_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (entry_name, content) in files {
        writer.start_file(entry_name.to_string(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
    zip_path
}

/// Helper: write an uncompressed TES4 BSA (Skyrim SE layout) with names stored.
///
/// `files` are `(directory, file name, bytes)`; directories use backslashes.
pub fn create_test_bsa(dir: &Path, name: &str, files: &[(&str, &str, &[u8])]) -> PathBuf {
    use ba2::prelude::*;
    use ba2::tes4::{
        Archive, ArchiveFlags, ArchiveKey, ArchiveOptions, ArchiveTypes, Directory, DirectoryKey,
        File, Version,
    };
    use std::collections::BTreeMap;

    let mut grouped: BTreeMap<&str, Vec<(&str, &[u8])>> = BTreeMap::new();
    for &(directory, file_name, bytes) in files {
        grouped.entry(directory).or_default().push((file_name, bytes));
    }

    let archive: Archive = grouped
        .into_iter()
        .map(|(directory_name, entries)| {
            let directory: Directory = entries
                .into_iter()
                .map(|(file_name, bytes)| {
                    (DirectoryKey::from(file_name), File::from_decompressed(bytes))
                })
                .collect();
            (ArchiveKey::from(directory_name), directory)
        })
        .collect();

    let bsa_path = dir.join(name);
    let mut file = fs::File::create(&bsa_path).unwrap();
    let options = ArchiveOptions::builder()
        .version(Version::SSE)
        .types(ArchiveTypes::MISC)
        .flags(ArchiveFlags::DIRECTORY_STRINGS | ArchiveFlags::FILE_STRINGS)
        .build();
    archive.write(&mut file, &options).unwrap();
    bsa_path
}

/// Helper: write a file, creating parents.
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// In-memory backend that counts how often each container is opened.
///
/// Paths listed in `corrupt` fail to open.
#[derive(Default)]
pub struct CountingBackend {
    pub containers: HashMap<PathBuf, Vec<(String, Vec<u8>)>>,
    pub corrupt: Vec<PathBuf>,
    pub opens: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn with_container(mut self, path: &str, files: &[(&str, &str)]) -> Self {
        self.containers.insert(
            PathBuf::from(path),
            files
                .iter()
                .map(|(name, body)| (name.to_string(), body.as_bytes().to_vec()))
                .collect(),
        );
        self
    }

    pub fn with_corrupt(mut self, path: &str) -> Self {
        self.corrupt.push(PathBuf::from(path));
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

struct MemoryReader {
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveReader for MemoryReader {
    fn entries(&self) -> Vec<String> {
        self.files.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read(&self, virtual_path: &str) -> Result<Vec<u8>, String> {
        self.files
            .iter()
            .find(|(name, _)| name == virtual_path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| format!("missing entry {virtual_path}"))
    }
}

impl ArchiveBackend for CountingBackend {
    fn supports(&self, _path: &Path) -> bool {
        true
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ArchiveReader>, String> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.corrupt.iter().any(|p| p == path) {
            return Err("bad header".to_string());
        }
        let files = self
            .containers
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such container {}", path.display()))?;
        Ok(Box::new(MemoryReader { files }))
    }
}

/// Helper: write an executable shell script (a stand-in for external tools).
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    write_file(path, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
    path.to_path_buf()
}

/// A fake decompiler that writes `Scriptname <stem>` plus one function for any `.pex`.
#[cfg(unix)]
pub fn write_fake_decompiler(dir: &Path) -> PathBuf {
    write_script(
        &dir.join("champollion"),
        r#"if [ "$1" = "--help" ]; then echo "Champollion PEX decompiler v1.0.6"; exit 0; fi
stem=$(basename "$1" .pex)
printf 'Scriptname %s\nFunction Decompiled()\nEndFunction\n' "$stem" > "$3/$stem.psc""#,
    )
}
