use std::{
  ffi::{OsStr, OsString},
  path::{Path, PathBuf},
};

use porter_fs::{FileSystem, OsFileSystem};
use porter_utils::xxhash::{strip_checksum_suffix, xxhash_hex};
use tracing::debug;

const DEFAULT_EXTENSION: &str = "js";

/// Compiled artifacts stored under `<dest>/<file stem>-<checksum>.<ext>`, next to an optional
/// `<artifact>.map`, where the checksum is taken from the source the artifact was compiled from.
///
/// Files are addressed by their path relative to `dest`, extension included, e.g.
/// `vue/2.6.0/dist/vue.runtime.common.js`. Every write drops the other variants of the same file.
/// Two builds sharing one destination are not safe against each other.
#[derive(Debug)]
pub struct ContentAddressedCache<F: FileSystem = OsFileSystem> {
  dest: PathBuf,
  fs: F,
}

impl<F: FileSystem> ContentAddressedCache<F> {
  pub fn new(dest: PathBuf, fs: F) -> Self {
    Self { dest, fs }
  }

  pub fn dest(&self) -> &Path {
    &self.dest
  }

  /// Where the artifact of `file` compiled from `source` lives.
  pub fn artifact_path(&self, file: &str, source: &str) -> PathBuf {
    let (stem, ext) = split_extension(file);
    let checksum = xxhash_hex(source.as_bytes());
    self.dest.join(format!("{stem}-{checksum}.{ext}"))
  }

  pub fn read(&self, file: &str, source: &str) -> anyhow::Result<Option<String>> {
    let path = self.artifact_path(file, source);
    if !self.fs.is_file(&path) {
      return Ok(None);
    }
    Ok(Some(self.fs.read_to_string(&path)?))
  }

  /// Replaces whatever variant of `file` is stored with the one compiled from `source`.
  pub fn write(
    &self,
    file: &str,
    source: &str,
    content: &str,
    map: Option<&str>,
  ) -> anyhow::Result<PathBuf> {
    self.remove(file)?;

    let path = self.artifact_path(file, source);
    if let Some(parent) = path.parent() {
      self.fs.create_dir_all(parent)?;
    }
    self.fs.write(&path, content.as_bytes())?;
    if let Some(map) = map {
      self.fs.write(&map_path(&path), map.as_bytes())?;
    }

    debug!("Cached `{file}` at {}", path.display());
    Ok(path)
  }

  /// Deletes every variant of `file`, checksummed or not, along with their maps.
  pub fn remove(&self, file: &str) -> anyhow::Result<()> {
    let (stem, ext) = split_extension(file);
    let target = self.dest.join(format!("{stem}.{ext}"));
    let (Some(dir), Some(file_name)) = (target.parent(), target.file_name().and_then(OsStr::to_str))
    else {
      return Ok(());
    };
    if !self.fs.exists(dir) {
      return Ok(());
    }

    let map_name = format!("{file_name}.map");
    for entry in self.fs.read_dir(dir)? {
      let Some(name) = entry.file_name().and_then(OsStr::to_str) else {
        continue;
      };
      let stripped = strip_checksum_suffix(name);
      if (stripped == file_name || stripped == map_name) && self.fs.is_file(&entry) {
        self.fs.remove_file(&entry)?;
      }
    }
    Ok(())
  }

  pub fn remove_all(&self) -> anyhow::Result<()> {
    if self.fs.exists(&self.dest) {
      self.fs.remove_dir_all(&self.dest)?;
    }
    Ok(())
  }

  /// Writes `content` at the literal `file` path, without checksum.
  pub fn write_file(&self, file: &str, content: &str) -> anyhow::Result<PathBuf> {
    let path = self.dest.join(file);
    if let Some(parent) = path.parent() {
      self.fs.create_dir_all(parent)?;
    }
    self.fs.write(&path, content.as_bytes())?;
    Ok(path)
  }
}

pub fn map_path(path: &Path) -> PathBuf {
  let mut map = OsString::from(path.as_os_str());
  map.push(".map");
  PathBuf::from(map)
}

/// `app/1.0.0/theme.css` -> (`app/1.0.0/theme`, `css`). Files without extension are scripts.
fn split_extension(file: &str) -> (&str, &str) {
  let file_start = file.rfind('/').map_or(0, |index| index + 1);
  match file[file_start..].rfind('.') {
    Some(dot) if dot > 0 => (&file[..file_start + dot], &file[file_start + dot + 1..]),
    _ => (file, DEFAULT_EXTENSION),
  }
}
