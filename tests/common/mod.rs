#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
}

pub fn create_zip(path: &Path, files: &[(&str, &str)]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    let file = fs::File::create(path).expect("zip should be created");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in files {
        writer
            .start_file(name.to_string(), options)
            .expect("zip entry should start");
        writer
            .write_all(content.as_bytes())
            .expect("zip entry should be written");
    }
    writer.finish().expect("zip should finish");
    path.to_path_buf()
}

/// Uncompressed Skyrim SE BSA with directory and file names stored.
pub fn create_bsa(path: &Path, directory_name: &str, files: &[(&str, &str)]) -> PathBuf {
    use ba2::prelude::*;
    use ba2::tes4::{
        Archive, ArchiveFlags, ArchiveKey, ArchiveOptions, ArchiveTypes, Directory, DirectoryKey,
        File, Version,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    let directory: Directory = files
        .iter()
        .map(|&(name, content)| {
            (
                DirectoryKey::from(name),
                File::from_decompressed(content.as_bytes()),
            )
        })
        .collect();
    let archive: Archive = [(ArchiveKey::from(directory_name), directory)]
        .into_iter()
        .collect();

    let mut file = fs::File::create(path).expect("bsa should be created");
    let options = ArchiveOptions::builder()
        .version(Version::SSE)
        .types(ArchiveTypes::MISC)
        .flags(ArchiveFlags::DIRECTORY_STRINGS | ArchiveFlags::FILE_STRINGS)
        .build();
    archive
        .write(&mut file, &options)
        .expect("bsa should be written");
    path.to_path_buf()
}
