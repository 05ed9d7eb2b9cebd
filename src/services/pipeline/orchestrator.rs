//! Drives one generator run: select, resolve, parse, synthesize, write.

use super::discovery::fixed_point;
use super::types::{GeneratedHeader, RunStatus, RunSummary, ScriptOutcome};
use crate::services::archive::{ArchiveBackend, ArchiveIndex, DefaultBackend};
use crate::services::config::GeneratorConfig;
use crate::services::fs_utils::file_utils::write_atomic;
use crate::services::papyrus::{parse_script, synthesize};
use crate::services::resolver::{Decompiler, SourceResolver};
use crate::services::scanner::{detect_containers, LooseIndex, PatternSet};
use crate::types::{
    HeaderError, HeaderResult, Provenance, ResolutionOutcome, ScriptName, SourceRecord, Tier,
};
use crate::{COMPILED_EXTENSION, SOURCE_EXTENSION};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run-scoped state. Nothing here outlives the run.
pub struct RunContext {
    config: GeneratorConfig,
    loose: Arc<LooseIndex>,
    archives: Option<Arc<ArchiveIndex>>,
    resolver: SourceResolver,
    cancel_flag: Arc<AtomicBool>,
}

/// Run the generator once with the default archive backend.
pub fn run(config: &GeneratorConfig) -> HeaderResult<RunSummary> {
    RunContext::prepare(config)?.execute()
}

impl RunContext {
    pub fn prepare(config: &GeneratorConfig) -> HeaderResult<Self> {
        Self::prepare_with_backend(config, Arc::new(DefaultBackend))
    }

    /// Set up the output dir, indices and tiers. Fails only on configuration problems.
    pub fn prepare_with_backend(
        config: &GeneratorConfig,
        backend: Arc<dyn ArchiveBackend>,
    ) -> HeaderResult<Self> {
        fs::create_dir_all(&config.output_dir).map_err(|e| {
            HeaderError::Config(format!(
                "Failed to create output directory {}: {e}",
                config.output_dir.display()
            ))
        })?;

        let decompiler = if config.enable_decompile {
            let decompiler = Decompiler::locate(
                config.decompiler_path.as_deref(),
                config.decompile_timeout(),
            )?;
            if !decompiler.self_test() {
                log::warn!(
                    "{} did not identify as Champollion; decompiled output may be unusable",
                    decompiler.executable().display()
                );
            }
            Some(Arc::new(decompiler))
        } else {
            None
        };

        let data_dir = config.data_dir();
        log::info!("Data directory: {}", data_dir.display());
        let loose = Arc::new(LooseIndex::build(
            &config.source_roots(),
            &config.scripts_dir(),
        ));

        let archives = if config.enable_archives {
            let containers = detect_containers(&data_dir, &config.archive_paths, backend.as_ref());
            Some(Arc::new(ArchiveIndex::new(containers, backend)))
        } else {
            None
        };

        let resolver = SourceResolver::for_run(loose.clone(), archives.clone(), decompiler);

        Ok(Self {
            config: config.clone(),
            loose,
            archives,
            resolver,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared flag; once set, scripts not yet started are skipped.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    /// Every name any enabled tier could be asked about.
    pub fn universe(&self) -> BTreeSet<ScriptName> {
        let mut names = self.loose.script_names().clone();
        if let Some(archives) = &self.archives {
            names.extend(archives.script_names(&[SOURCE_EXTENSION, COMPILED_EXTENSION]));
        }
        names
    }

    pub fn execute(&self) -> HeaderResult<RunSummary> {
        let patterns = PatternSet::parse(&self.config.patterns())?;
        let universe = self.universe();
        if let Some(archives) = &self.archives {
            for container in archives.containers() {
                let summary = container.summary(&[SOURCE_EXTENSION, COMPILED_EXTENSION]);
                log::debug!(
                    "{} ({}): {} entries, {} scripts",
                    summary.id,
                    summary.path,
                    summary.entry_count,
                    summary.script_count
                );
            }
        }
        let selected = patterns.select(&universe);
        log::info!(
            "Selected {} of {} scripts for {}",
            selected.len(),
            universe.len(),
            patterns.describe()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.unwrap_or(0))
            .build()
            .map_err(|e| HeaderError::Config(format!("Failed to start worker pool: {e}")))?;

        let mut summary = RunSummary::new(selected.len());
        let mut attempted: BTreeSet<ScriptName> = selected.iter().cloned().collect();
        let mut claimed = BTreeSet::new();
        let mut references = BTreeSet::new();

        for outcome in self.process_all(&pool, &selected, &mut claimed) {
            collect_references(&outcome, &mut references);
            summary.record(outcome);
        }

        if self.config.follow_dependencies && !self.is_cancelled() {
            let discovery = fixed_point(
                &mut attempted,
                references,
                self.config.max_discovery_passes,
                |batch| {
                    let batch: Vec<ScriptName> = batch.iter().cloned().collect();
                    let mut found = BTreeSet::new();
                    for outcome in self.process_all(&pool, &batch, &mut claimed) {
                        collect_references(&outcome, &mut found);
                        summary.record(outcome);
                    }
                    found
                },
            );
            summary.discovery_passes = discovery.passes;
            summary.discovery_capped = discovery.capped;
        }

        if let Some(archives) = &self.archives {
            summary.corrupt_containers = archives.corrupt_containers();
        }
        if self.is_cancelled() {
            summary.status = RunStatus::Cancelled;
        }

        if let Err(e) = write_missing_log(&self.config.missing_log, &summary) {
            log::error!("{e}");
        }
        log_summary(&summary);
        Ok(summary)
    }

    /// Render `names` in parallel, drop repeated identities, then write.
    ///
    /// `claimed` holds every identity already written this run. When several
    /// sources declare one identity, the first name in order keeps it.
    fn process_all(
        &self,
        pool: &ThreadPool,
        names: &[ScriptName],
        claimed: &mut BTreeSet<ScriptName>,
    ) -> Vec<ScriptOutcome> {
        let rendered: Vec<Rendered> =
            pool.install(|| names.par_iter().map(|name| self.render(name)).collect());

        let mut outcomes = Vec::with_capacity(rendered.len());
        let mut pending = Vec::new();
        for item in rendered {
            match item {
                Rendered::Done(outcome) => outcomes.push(outcome),
                Rendered::Header(header) => {
                    if claimed.insert(header.identity.clone()) {
                        pending.push(header);
                    } else {
                        log::warn!(
                            "{} also declares Scriptname {}; keeping the first header",
                            header.origin_path,
                            header.identity
                        );
                        outcomes.push(ScriptOutcome::Duplicate {
                            name: header.requested,
                            identity: header.identity,
                        });
                    }
                }
            }
        }

        let written: Vec<ScriptOutcome> =
            pool.install(|| pending.into_par_iter().map(|header| self.write(header)).collect());
        outcomes.extend(written);
        outcomes
    }

    fn render(&self, name: &ScriptName) -> Rendered {
        if self.is_cancelled() {
            return Rendered::Done(ScriptOutcome::Skipped(name.clone()));
        }

        match self.resolver.resolve(name) {
            ResolutionOutcome::Resolved(record) => self.synthesize_record(name, record),
            ResolutionOutcome::Miss(miss) => {
                log::warn!("No source for {}", miss.describe().replace('\t', ": "));
                Rendered::Done(ScriptOutcome::Missing(miss))
            }
        }
    }

    fn synthesize_record(&self, requested: &ScriptName, record: SourceRecord) -> Rendered {
        let parsed = match parse_script(&record.text) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::error!("Failed to parse {} ({}): {e}", record.name, record.origin_path);
                return Rendered::Done(ScriptOutcome::ParseFailed {
                    name: record.name,
                    reason: e.to_string(),
                });
            }
        };

        for warning in &parsed.warnings {
            log::warn!("{} ({}): {warning}", record.name, record.origin_path);
        }
        if parsed.model.identity != record.name {
            log::warn!(
                "{} declares Scriptname {}; header named after the declaration",
                record.origin_path,
                parsed.model.identity
            );
        }

        Rendered::Header(PendingHeader {
            requested: requested.clone(),
            identity: parsed.model.identity.clone(),
            text: synthesize(&parsed.model),
            references: parsed.model.referenced_types(),
            provenance: record.provenance,
            origin_path: record.origin_path,
            warning_count: parsed.warnings.len(),
        })
    }

    fn write(&self, header: PendingHeader) -> ScriptOutcome {
        let header_path = header_path_for(&self.config.output_dir, &header.identity);
        if let Err(e) = write_atomic(&header_path, header.text.as_bytes()) {
            log::error!("Failed to write header for {}: {e}", header.identity);
            return ScriptOutcome::WriteFailed {
                name: header.identity,
                reason: e,
            };
        }
        log::debug!("Wrote {} from {}", header_path.display(), header.provenance);

        ScriptOutcome::Generated(GeneratedHeader {
            name: header.identity,
            provenance: header.provenance,
            header_path,
            warning_count: header.warning_count,
            references: header.references,
        })
    }
}

/// A synthesized header waiting for its identity to be claimed.
struct PendingHeader {
    requested: ScriptName,
    identity: ScriptName,
    text: String,
    references: BTreeSet<ScriptName>,
    provenance: Provenance,
    origin_path: String,
    warning_count: usize,
}

enum Rendered {
    Header(PendingHeader),
    Done(ScriptOutcome),
}

/// Header location for a declared identity.
///
/// Namespaced identities (`Foo:Bar`) map to subdirectories, the layout the
/// compiler resolves imports from.
pub fn header_path_for(output_dir: &Path, identity: &ScriptName) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    let mut segments = identity.as_str().split(':').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.{SOURCE_EXTENSION}"));
        }
    }
    path
}

fn collect_references(outcome: &ScriptOutcome, into: &mut BTreeSet<ScriptName>) {
    if let ScriptOutcome::Generated(header) = outcome {
        into.extend(header.references.iter().cloned());
    }
}

/// Rewrite the missing-source log, or remove a stale one when nothing is missing.
pub fn write_missing_log(path: &Path, summary: &RunSummary) -> HeaderResult<()> {
    let lines = summary.missing_lines();
    if lines.is_empty() {
        if path.exists() {
            fs::remove_file(path)?;
        }
        return Ok(());
    }

    let mut content = lines.join("\n");
    content.push('\n');
    write_atomic(path, content.as_bytes()).map_err(|e| {
        HeaderError::Io(std::io::Error::other(format!(
            "Failed to write missing-source log {}: {e}",
            path.display()
        )))
    })?;
    log::info!("{} entries written to {}", lines.len(), path.display());
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    log::info!(
        "Generated {} headers ({} loose, {} archive, {} decompiled) from {} selected",
        summary.generated.len(),
        summary.count_from(Tier::Loose),
        summary.count_from(Tier::Archive),
        summary.count_from(Tier::Decompile),
        summary.matched
    );
    if summary.discovery_passes > 0 {
        log::info!("Dependency discovery ran {} passes", summary.discovery_passes);
    }
    if !summary.misses.is_empty() || !summary.parse_failures.is_empty() {
        log::warn!(
            "{} scripts without source, {} failed to parse",
            summary.misses.len(),
            summary.parse_failures.len()
        );
    }
    if !summary.duplicates.is_empty() {
        log::warn!(
            "{} sources repeated an identity that already had a header",
            summary.duplicates.len()
        );
    }
    if !summary.write_failures.is_empty() {
        log::error!("{} headers could not be written", summary.write_failures.len());
    }
    for (path, reason) in &summary.corrupt_containers {
        log::warn!("Skipped corrupt archive {}: {reason}", path.display());
    }
    if summary.is_cancelled() {
        log::warn!("Run cancelled; {} scripts skipped", summary.skipped);
    }
}
