//! papyrus-headers: generate declaration-only Papyrus headers.

use clap::Parser;
use papyrus_headers::{GeneratorConfig, RunContext};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "papyrus-headers")]
#[command(about = "Generate Papyrus header files from loose, archived or decompiled scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Game install directory or its Data folder
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Where headers are written
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Script name, glob or word to select
    #[arg(long)]
    pattern: Option<String>,

    /// Comma-separated patterns; overrides --pattern
    #[arg(long = "patternlist")]
    pattern_list: Option<String>,

    /// Missing-source log path
    #[arg(long)]
    missing_log: Option<PathBuf>,

    /// Also search packed containers in the data directory
    #[arg(long, alias = "enable-bsa")]
    enable_archives: bool,

    /// Extra container to search (repeatable)
    #[arg(long = "archive")]
    archives: Vec<PathBuf>,

    /// Decompile .pex files when no source is found
    #[arg(long)]
    enable_decompile: bool,

    /// Decompiler executable or the directory containing it
    #[arg(long, alias = "champollion-path")]
    decompiler_path: Option<PathBuf>,

    /// Seconds before a decompiler call is killed
    #[arg(long = "decompile-timeout")]
    decompile_timeout: Option<u64>,

    /// Extra loose source root (repeatable)
    #[arg(long = "source-dir")]
    source_dirs: Vec<PathBuf>,

    /// Also generate headers for types the selected scripts reference
    #[arg(long)]
    follow_dependencies: bool,

    /// Limit on dependency discovery passes
    #[arg(long = "max-passes")]
    max_passes: Option<usize>,

    /// Worker threads
    #[arg(long)]
    jobs: Option<usize>,

    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(base_dir) = self.base_dir {
            config.base_dir = base_dir;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(pattern) = self.pattern {
            config.pattern = pattern;
        }
        if self.pattern_list.is_some() {
            config.pattern_list = self.pattern_list;
        }
        if let Some(missing_log) = self.missing_log {
            config.missing_log = missing_log;
        }
        config.enable_archives |= self.enable_archives;
        config.archive_paths.extend(self.archives);
        config.enable_decompile |= self.enable_decompile;
        if self.decompiler_path.is_some() {
            config.decompiler_path = self.decompiler_path;
        }
        if let Some(secs) = self.decompile_timeout {
            config.decompile_timeout_secs = secs;
        }
        config.extra_source_dirs.extend(self.source_dirs);
        config.follow_dependencies |= self.follow_dependencies;
        if let Some(passes) = self.max_passes {
            config.max_discovery_passes = passes;
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = cli.into_config()?;
    let context = RunContext::prepare(&config)?;
    let summary = context.execute()?;

    log::info!(
        "Done: {} headers in {}",
        summary.generated.len(),
        config.output_dir.display()
    );
    Ok(())
}
