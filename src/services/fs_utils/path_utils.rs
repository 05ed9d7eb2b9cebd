use std::path::Path;

/// Normalize an archive-internal path for case-insensitive lookup.
///
/// `Scripts\Source\Actor.PSC` and `/scripts/source/actor.psc` map to the same key.
pub fn normalize_virtual_path(virtual_path: &str) -> String {
    virtual_path
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_lowercase()
}

/// Split a normalized virtual path into `(stem, extension)`, both lower-case.
pub fn stem_and_extension(normalized: &str) -> Option<(String, String)> {
    let file_name = normalized.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some((stem.to_string(), ext.to_string()))
}

/// Lower-cased extension of a filesystem path, if any.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// File stem of a filesystem path with its original spelling.
pub fn file_stem_string(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}
