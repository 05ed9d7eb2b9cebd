use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Write `contents` so that `file_path` is either fully replaced or untouched.
///
/// Bytes go to a uniquely named temp file next to the target, which is then
/// persisted over it. Concurrent writers to one target never share a temp file.
pub fn write_atomic(file_path: &Path, contents: &[u8]) -> Result<(), String> {
    let parent = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| format!("Failed to create parent: {e}"))?;

    let mut temp =
        NamedTempFile::new_in(parent).map_err(|e| format!("Failed to create temp file: {e}"))?;
    temp.write_all(contents)
        .and_then(|_| temp.flush())
        .map_err(|e| format!("Failed to write temp file: {e}"))?;

    // A failed persist drops the temp file; the target keeps its old contents.
    temp.persist(file_path)
        .map(|_| ())
        .map_err(|e| format!("Failed to finalize write: {}", e.error))
}

/// Decode script source bytes.
///
/// UTF-8 (BOM stripped) first; anything else is read as Windows-1252, which is
/// what the game's own tools write.
pub fn decode_source(bytes: &[u8]) -> String {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(content) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(content);
            text.into_owned()
        }
    }
}

/// Read and decode a loose source file.
pub fn read_source_file(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(decode_source(&bytes))
}
