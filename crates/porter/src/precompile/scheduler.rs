use std::{path::PathBuf, sync::Arc};

use dashmap::DashSet;
use porter_common::ModuleId;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use super::runner::{JobRunner, PrecompileJob};

/// Compiles package main entries in the background, one job at a time.
///
/// Jobs are deduplicated by `name/version` for as long as they are queued or running. The queue
/// lives as long as the scheduler and is drained by a single task spawned on construction, so a
/// scheduler must be created inside a tokio runtime.
pub struct PrecompileScheduler {
  dest: PathBuf,
  source_root: String,
  cache: bool,
  in_flight: Arc<DashSet<String>>,
  sender: mpsc::UnboundedSender<PrecompileJob>,
  pending: Arc<watch::Sender<usize>>,
}

impl PrecompileScheduler {
  /// Jobs write to `dest`, through the checksum cache when `cache` is set.
  pub fn new(runner: impl JobRunner, dest: PathBuf, source_root: String, cache: bool) -> Self {
    let (sender, receiver) = mpsc::unbounded_channel();
    let in_flight = Arc::new(DashSet::new());
    let (pending, _) = watch::channel(0);
    let pending = Arc::new(pending);

    tokio::spawn(drain(runner, receiver, Arc::clone(&in_flight), Arc::clone(&pending)));

    Self { dest, source_root, cache, in_flight, sender, pending }
  }

  /// Queues `id` unless it is not the main entry of its package or the package is already
  /// queued. Returns whether a job was queued.
  ///
  /// The main entry check comes first, so a skipped module never holds its package identity.
  pub fn precompile(&self, id: &ModuleId, main: &str, path: PathBuf) -> bool {
    if ModuleId::new(id.name(), id.version(), main).as_ref() != Some(id) {
      debug!("Skipping precompile of `{id}`, main entry is `{main}`");
      return false;
    }

    let identity = id.package_identity().to_string();
    if !self.in_flight.insert(identity.clone()) {
      return false;
    }

    let job = PrecompileJob {
      id: id.clone(),
      dest: self.dest.clone(),
      path,
      source_root: self.source_root.clone(),
      cache: self.cache,
    };
    self.pending.send_modify(|count| *count += 1);
    if self.sender.send(job).is_err() {
      error!("Precompile queue is closed, dropping `{id}`");
      self.in_flight.remove(&identity);
      self.pending.send_modify(|count| *count -= 1);
      return false;
    }
    true
  }

  pub fn is_in_flight(&self, identity: &str) -> bool {
    self.in_flight.contains(identity)
  }

  /// Jobs queued or running.
  pub fn pending(&self) -> usize {
    *self.pending.borrow()
  }

  /// Resolves once every queued job has finished.
  pub async fn idle(&self) {
    let mut receiver = self.pending.subscribe();
    // The sender lives in `self`, the wait can only end with the count reaching zero.
    let _ = receiver.wait_for(|count| *count == 0).await;
  }
}

async fn drain(
  runner: impl JobRunner,
  mut receiver: mpsc::UnboundedReceiver<PrecompileJob>,
  in_flight: Arc<DashSet<String>>,
  pending: Arc<watch::Sender<usize>>,
) {
  while let Some(job) = receiver.recv().await {
    match runner.run(&job).await {
      Ok(()) => info!("Precompiled `{}`", job.id),
      Err(err) => error!("Failed to precompile `{}`: {err:#}", job.id),
    }
    in_flight.remove(job.identity());
    pending.send_modify(|count| *count -= 1);
  }
}
