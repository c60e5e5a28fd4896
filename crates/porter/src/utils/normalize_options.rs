use std::path::{Path, PathBuf};

use anyhow::Context;
use porter_common::{NormalizedPackerOptions, PackerOptions, DEFAULT_DEST, DEFAULT_SEARCH_PATH};
use sugar_path::SugarPath;

pub fn normalize_options(raw_options: PackerOptions) -> anyhow::Result<NormalizedPackerOptions> {
  let root = match raw_options.root {
    Some(root) => root,
    None => std::env::current_dir().context("Failed to get current dir")?,
  };

  let paths = raw_options
    .paths
    .filter(|paths| !paths.is_empty())
    .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_SEARCH_PATH)])
    .iter()
    .map(|path| absolutize(&root, path))
    .collect();

  let dest = absolutize(&root, raw_options.dest.as_deref().unwrap_or(Path::new(DEFAULT_DEST)));

  let precompile = raw_options.precompile.unwrap_or(false);
  let worker =
    raw_options.worker.or_else(|| precompile.then(std::env::current_exe).and_then(Result::ok));

  Ok(NormalizedPackerOptions {
    root,
    paths,
    match_pattern: raw_options.match_pattern,
    dest,
    source_root: raw_options.source_root.unwrap_or_else(|| "/".to_string()),
    include_modules: raw_options.include_modules.unwrap_or(true),
    cache: raw_options.cache.unwrap_or(false),
    precompile,
    worker,
  })
}

fn absolutize(root: &Path, path: &Path) -> PathBuf {
  root.join(path).normalize()
}

#[test]
fn test_normalize_options() {
  let options = normalize_options(PackerOptions {
    root: Some(PathBuf::from("/proj")),
    dest: Some(PathBuf::from("./dist")),
    ..PackerOptions::default()
  })
  .unwrap();

  assert_eq!(options.paths, [PathBuf::from("/proj/components")]);
  assert_eq!(options.dest, PathBuf::from("/proj/dist"));
  assert_eq!(options.source_root, "/");
  assert!(options.include_modules);
  assert!(!options.cache);
  assert!(!options.precompile);
  assert!(options.worker.is_none());

  let options = normalize_options(PackerOptions {
    root: Some(PathBuf::from("/proj")),
    paths: Some(vec![PathBuf::from("/elsewhere/app"), PathBuf::from("lib/../views")]),
    worker: Some(PathBuf::from("/usr/bin/porter")),
    ..PackerOptions::default()
  })
  .unwrap();

  assert_eq!(options.paths, [PathBuf::from("/elsewhere/app"), PathBuf::from("/proj/views")]);
  assert_eq!(options.dest, PathBuf::from("/proj/public"));
  assert_eq!(options.worker, Some(PathBuf::from("/usr/bin/porter")));
}
