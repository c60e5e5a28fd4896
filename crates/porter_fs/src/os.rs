use std::{
  fs, io,
  path::{Path, PathBuf},
};

use crate::FileSystem;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    fs::write(path, content)
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn is_file(&self, path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file())
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn remove_file(&self, path: &Path) -> io::Result<()> {
    fs::remove_file(path)
  }

  fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::remove_dir_all(path)
  }

  fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(path)?
      .map(|entry| entry.map(|entry| entry.path()))
      .collect::<io::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
  }
}

#[test]
fn test_os_file_system() {
  let dir = tempfile::tempdir().unwrap();
  let fs = OsFileSystem;
  let nested = dir.path().join("a/b");
  fs.create_dir_all(&nested).unwrap();
  fs.write(&nested.join("z.js"), b"z").unwrap();
  fs.write(&nested.join("y.js"), b"y").unwrap();

  assert!(fs.is_file(&nested.join("z.js")));
  assert!(!fs.is_file(&nested));
  assert_eq!(fs.read_to_string(&nested.join("y.js")).unwrap(), "y");
  assert_eq!(fs.read_dir(&nested).unwrap(), vec![nested.join("y.js"), nested.join("z.js")]);

  fs.remove_file(&nested.join("y.js")).unwrap();
  assert!(!fs.exists(&nested.join("y.js")));
  fs.remove_dir_all(&dir.path().join("a")).unwrap();
  assert!(!fs.exists(&nested));
}
