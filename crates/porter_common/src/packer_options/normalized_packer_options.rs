use std::path::PathBuf;

#[allow(clippy::struct_excessive_bools)] // Using raw booleans is more clear in this case
#[derive(Debug, Clone)]
pub struct NormalizedPackerOptions {
  // --- Input
  pub root: PathBuf,
  /// Absolute search paths for first-party source files.
  pub paths: Vec<PathBuf>,
  pub match_pattern: Option<String>,

  // --- Output
  /// Absolute output destination.
  pub dest: PathBuf,
  pub source_root: String,
  pub include_modules: bool,
  pub cache: bool,

  // --- Background precompilation
  pub precompile: bool,
  pub worker: Option<PathBuf>,
}

impl NormalizedPackerOptions {
  /// Search path to use when an operation is not told which one.
  pub fn primary_path(&self) -> PathBuf {
    self.paths.first().cloned().unwrap_or_else(|| self.root.clone())
  }
}
