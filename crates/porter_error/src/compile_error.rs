use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
  /// A required option is missing or malformed.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Every truncation of the route failed to locate the package.
  #[error("unable to resolve dependency `{name}` (route: {route})")]
  UnresolvedDependency { name: String, route: String },

  #[error("source of `{id}` not found at {}", path.display())]
  SourceNotFound { id: String, path: PathBuf },

  /// Parser diagnostics, surfaced verbatim.
  #[error("failed to parse `{id}`: {message}")]
  ParseFailure { id: String, message: String },

  #[error("worker for `{id}` exited with {}", exit_reason(*code))]
  WorkerFailure { id: String, code: Option<i32> },
}

fn exit_reason(code: Option<i32>) -> String {
  code.map_or_else(|| "a signal".to_string(), |code| format!("code {code}"))
}
