pub mod normalized_packer_options;

use std::path::PathBuf;

pub const DEFAULT_SEARCH_PATH: &str = "components";
pub const DEFAULT_DEST: &str = "public";

#[derive(Default, Debug, Clone)]
pub struct PackerOptions {
  // --- Input
  pub root: Option<PathBuf>,
  pub paths: Option<Vec<PathBuf>>,
  pub match_pattern: Option<String>,

  // --- Output
  pub dest: Option<PathBuf>,
  pub source_root: Option<String>,
  pub include_modules: Option<bool>,
  pub cache: Option<bool>,

  // --- Background precompilation
  pub precompile: Option<bool>,
  pub worker: Option<PathBuf>,
}
