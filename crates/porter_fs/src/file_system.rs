use std::{
  io,
  path::{Path, PathBuf},
};

/// Every disk access of the packer goes through this trait.
pub trait FileSystem: Send + Sync {
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  /// Writes `content`, replacing the file if it exists. Parent directories must exist.
  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

  fn exists(&self, path: &Path) -> bool;

  fn is_file(&self, path: &Path) -> bool;

  fn create_dir_all(&self, path: &Path) -> io::Result<()>;

  fn remove_file(&self, path: &Path) -> io::Result<()>;

  fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

  /// Paths of the direct children of `path`, sorted.
  fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}
