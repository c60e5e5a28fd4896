use std::path::PathBuf;

use futures::future::BoxFuture;
use porter_common::ModuleId;
use porter_error::CompileError;
use tokio::process::Command;
use tracing::debug;

/// A package main entry to compile in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecompileJob {
  pub id: ModuleId,
  pub dest: PathBuf,
  /// Directory the package is installed in.
  pub path: PathBuf,
  pub source_root: String,
  /// Persist through the checksum cache.
  pub cache: bool,
}

impl PrecompileJob {
  pub fn identity(&self) -> &str {
    self.id.package_identity()
  }
}

pub trait JobRunner: Send + Sync + 'static {
  fn run<'a>(&'a self, job: &'a PrecompileJob) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Runs every job in a fresh process:
/// `<program> compile-module --id <id> --dest <dest> --paths <path> --source-root <root>`,
/// followed by `--cache` for cached builds.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
  program: PathBuf,
}

impl ProcessRunner {
  pub fn new(program: PathBuf) -> Self {
    Self { program }
  }

  pub fn command(&self, job: &PrecompileJob) -> Command {
    let mut command = Command::new(&self.program);
    command
      .arg("compile-module")
      .arg("--id")
      .arg(job.id.as_str())
      .arg("--dest")
      .arg(&job.dest)
      .arg("--paths")
      .arg(&job.path)
      .arg("--source-root")
      .arg(&job.source_root)
      .kill_on_drop(true);
    if job.cache {
      command.arg("--cache");
    }
    command
  }
}

impl JobRunner for ProcessRunner {
  fn run<'a>(&'a self, job: &'a PrecompileJob) -> BoxFuture<'a, anyhow::Result<()>> {
    Box::pin(async move {
      let status = self.command(job).status().await?;
      debug!("Worker for `{}` exited with {status}", job.id);
      if status.success() {
        Ok(())
      } else {
        Err(CompileError::WorkerFailure { id: job.id.to_string(), code: status.code() }.into())
      }
    })
  }
}
