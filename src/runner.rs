//! Wrapped binary execution.
//!
//! The runner resolves the binary, writes the override file, runs the binary with the caller's
//! arguments and removes the override file again, whatever the outcome.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Resolver;
use crate::error::Result;
use crate::loader::{self, EmptyPolicy};
use crate::override_file::{self, OVERRIDE_FILENAME, OverrideDocument};

pub const DEFAULT_BINARY: &str = "terraform";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("terraform binary not found ({binary}): {message}")]
    BinaryNotFound { binary: String, message: String },

    #[error("could not write override file {}: {source}", path.display())]
    WriteOverride {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to execute {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settings for one wrapped invocation.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub binary: String,
    pub work_dir: PathBuf,
    pub override_filename: String,
    pub keep_override: bool,
    pub empty_policy: EmptyPolicy,
}

impl RunSettings {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            work_dir: work_dir.into(),
            override_filename: OVERRIDE_FILENAME.to_string(),
            keep_override: false,
            empty_policy: EmptyPolicy::default(),
        }
    }

    pub fn override_path(&self) -> PathBuf {
        self.work_dir.join(&self.override_filename)
    }
}

/// Runs the wrapped binary to completion.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        program: &Path,
        args: &[String],
        work_dir: &Path,
    ) -> io::Result<ExitStatus>;
}

/// Spawns a child process sharing this process's stdin, stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl Executor for ProcessExecutor {
    async fn execute(
        &self,
        program: &Path,
        args: &[String],
        work_dir: &Path,
    ) -> io::Result<ExitStatus> {
        tokio::process::Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
    }
}

/// Removes the override file when dropped, unless asked to keep it.
#[derive(Debug)]
pub struct OverrideGuard {
    path: PathBuf,
    keep: bool,
}

impl OverrideGuard {
    pub fn new(path: PathBuf, keep: bool) -> Self {
        Self { path, keep }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(path = %self.path.display(), "keeping override file");
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "override file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not remove proxy override file")
            }
        }
    }
}

pub struct Runner<E = ProcessExecutor> {
    settings: RunSettings,
    executor: E,
}

impl Runner<ProcessExecutor> {
    pub fn new(settings: RunSettings) -> Self {
        Self::with_executor(settings, ProcessExecutor)
    }
}

impl<E: Executor> Runner<E> {
    pub fn with_executor(settings: RunSettings, executor: E) -> Self {
        Self { settings, executor }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Looks the binary up on `PATH` (or checks it directly when given as a path).
    pub fn resolve_binary(&self) -> std::result::Result<PathBuf, RunError> {
        which::which(&self.settings.binary).map_err(|e| RunError::BinaryNotFound {
            binary: self.settings.binary.clone(),
            message: e.to_string(),
        })
    }

    /// Loads the working directory and builds its override document.
    pub fn build_override(&self, resolver: &Resolver) -> Result<OverrideDocument> {
        let documents = loader::load_documents(&self.settings.work_dir, self.settings.empty_policy)?;
        let targets = resolver.targets();

        Ok(override_file::synthesize(&documents, &targets, |name| {
            resolver.proxy_for(name).to_string()
        }))
    }

    /// Writes `document`; the returned guard owns the file's cleanup.
    pub fn write_override(&self, document: &OverrideDocument) -> Result<OverrideGuard> {
        let path = self.settings.override_path();
        let guard = OverrideGuard::new(path.clone(), self.settings.keep_override);

        std::fs::write(&path, document.to_hcl())
            .map_err(|source| RunError::WriteOverride { path, source })?;

        tracing::info!(
            path = %guard.path().display(),
            blocks = document.len(),
            "override file written"
        );
        Ok(guard)
    }

    /// Runs the binary with `args` and returns its exit status.
    ///
    /// Errors are only returned for failures before the binary ran or when it could not be
    /// started; a non-zero exit is reported through the status.
    pub async fn run(&self, resolver: &Resolver, args: &[String]) -> Result<ExitStatus> {
        let binary = self.resolve_binary()?;
        self.run_resolved(&binary, resolver, args).await
    }

    /// [`Runner::run`] with a binary already found by [`Runner::resolve_binary`].
    pub async fn run_resolved(
        &self,
        binary: &Path,
        resolver: &Resolver,
        args: &[String],
    ) -> Result<ExitStatus> {
        let document = self.build_override(resolver)?;
        let _guard = self.write_override(&document)?;

        tracing::debug!(binary = %binary.display(), ?args, "running wrapped binary");
        let status = self
            .executor
            .execute(binary, args, &self.settings.work_dir)
            .await
            .map_err(|source| RunError::Spawn {
                binary: binary.to_path_buf(),
                source,
            })?;

        if !status.success() {
            tracing::debug!(%status, "wrapped binary failed");
        }
        Ok(status)
    }
}

/// Low byte of `code`; a failure whose low byte is zero still exits 1.
fn code_byte(code: i32) -> u8 {
    match (code & 0xff) as u8 {
        0 if code != 0 => 1,
        byte => byte,
    }
}

/// Exit code mirroring `status`: the child's own code, `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return code_byte(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (128 + signal).min(255) as u8;
        }
    }

    1
}
