pub mod pattern;
pub mod walker;

pub use pattern::PatternSet;
pub use walker::{detect_containers, walk_files_with_extension, LooseIndex};
