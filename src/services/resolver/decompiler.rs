//! External decompiler (Champollion) discovery and invocation.

use crate::services::fs_utils::file_utils::decode_source;
use crate::services::fs_utils::path_utils::file_stem_string;
use crate::services::scanner::walk_files_with_extension;
use crate::types::{HeaderError, HeaderResult};
use crate::SOURCE_EXTENSION;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Conventional install locations, probed in order when no override is given.
pub const DECOMPILER_CANDIDATES: &[&str] = &[
    "./Champollion.exe",
    "./champollion",
    r"C:\Program Files\Champollion\Champollion.exe",
    r"C:\Program Files (x86)\Champollion\Champollion.exe",
];

/// File names looked for when the override is a directory.
const EXECUTABLE_NAMES: &[&str] = &["Champollion.exe", "champollion"];

const HELP_BANNER: &str = "Champollion PEX decompiler";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct Decompiler {
    executable: PathBuf,
    timeout: Duration,
}

impl Decompiler {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Find the decompiler from an optional user override or the conventional locations.
    pub fn locate(override_path: Option<&Path>, timeout: Duration) -> HeaderResult<Self> {
        let candidates: Vec<PathBuf> = DECOMPILER_CANDIDATES.iter().map(PathBuf::from).collect();
        Self::locate_in(override_path, &candidates, timeout)
    }

    pub fn locate_in(
        override_path: Option<&Path>,
        candidates: &[PathBuf],
        timeout: Duration,
    ) -> HeaderResult<Self> {
        if let Some(path) = override_path {
            if path.is_file() {
                return Ok(Self::new(path, timeout));
            }
            if path.is_dir() {
                if let Some(exe) = EXECUTABLE_NAMES
                    .iter()
                    .map(|name| path.join(name))
                    .find(|candidate| candidate.is_file())
                {
                    return Ok(Self::new(exe, timeout));
                }
            }
            return Err(HeaderError::Config(format!(
                "Decompiler not found at {}",
                path.display()
            )));
        }

        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .map(|exe| {
                log::info!("Using decompiler {}", exe.display());
                Self::new(exe.clone(), timeout)
            })
            .ok_or_else(|| {
                HeaderError::Config(
                    "Decompiler not found in any conventional location; set decompiler_path"
                        .to_string(),
                )
            })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run `--help` and check for the Champollion banner.
    pub fn self_test(&self) -> bool {
        let child = Command::new(&self.executable)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Failed to start {}: {e}", self.executable.display());
                return false;
            }
        };

        // Drain stdout while waiting so a long help text cannot fill the pipe.
        let reader = child.stdout.take().map(|mut stdout| {
            std::thread::spawn(move || {
                let mut output = String::new();
                let _ = stdout.read_to_string(&mut output);
                output
            })
        });

        if let Err(e) = self.wait(&mut child) {
            log::warn!("Decompiler self-test failed: {e}");
            return false;
        }

        let output = reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        output.contains(HELP_BANNER)
    }

    /// Decompile one `.pex` and return the produced source text.
    ///
    /// Output goes to a fresh temporary directory that is removed before this
    /// returns, on every path. A zero exit code is not trusted on its own: the
    /// expected `<stem>.psc` must exist.
    pub fn decompile(&self, pex: &Path) -> HeaderResult<String> {
        let stem = file_stem_string(pex).ok_or_else(|| {
            HeaderError::DecompileFailure(format!("Invalid artifact path {}", pex.display()))
        })?;

        let out_dir = tempfile::Builder::new()
            .prefix("papyrus-decompile-")
            .tempdir()
            .map_err(|e| HeaderError::DecompileFailure(format!("Failed to create temp dir: {e}")))?;

        log::debug!("Decompiling {}", pex.display());
        let mut child = Command::new(&self.executable)
            .arg(pex)
            .arg("--psc")
            .arg(out_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                HeaderError::DecompileFailure(format!(
                    "Failed to start {}: {e}",
                    self.executable.display()
                ))
            })?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(HeaderError::DecompileFailure(format!(
                "{} exited with {status} for {stem}",
                self.executable.display()
            )));
        }

        let output = walk_files_with_extension(out_dir.path(), SOURCE_EXTENSION)
            .into_iter()
            .find(|path| {
                file_stem_string(path).is_some_and(|s| s.eq_ignore_ascii_case(&stem))
            })
            .ok_or_else(|| {
                HeaderError::DecompileFailure(format!(
                    "Decompiler exited cleanly but produced no {stem}.{SOURCE_EXTENSION}"
                ))
            })?;

        let bytes = fs::read(&output).map_err(|e| {
            HeaderError::DecompileFailure(format!("Failed to read {}: {e}", output.display()))
        })?;
        Ok(decode_source(&bytes))
    }

    /// Wait for the child, killing it once the timeout expires.
    fn wait(&self, child: &mut Child) -> HeaderResult<ExitStatus> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(HeaderError::DecompileFailure(format!(
                        "Timed out after {}s",
                        self.timeout.as_secs_f32()
                    )));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(HeaderError::DecompileFailure(format!(
                        "Failed to wait for decompiler: {e}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/decompiler_tests.rs"]
mod tests;
