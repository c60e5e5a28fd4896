use std::path::Path;

use anyhow::Context;
use porter_fs::FileSystem;

pub fn load_source(fs: &dyn FileSystem, path: &Path) -> anyhow::Result<String> {
  fs.read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
