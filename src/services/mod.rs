pub mod archive;
pub mod config;
pub mod fs_utils;
pub mod papyrus;
pub mod pipeline;
pub mod resolver;
pub mod scanner;
