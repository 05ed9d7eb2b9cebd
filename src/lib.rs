pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

/// Extension of Papyrus source files and generated headers.
pub const SOURCE_EXTENSION: &str = "psc";

/// Extension of compiled Papyrus scripts.
pub const COMPILED_EXTENSION: &str = "pex";

pub use services::config::GeneratorConfig;
pub use services::pipeline::{run, RunContext, RunSummary};
pub use types::{HeaderError, HeaderResult};
