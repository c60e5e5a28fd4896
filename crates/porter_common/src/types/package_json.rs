use std::path::{Path, PathBuf};

use anyhow::Context;
use porter_utils::collections::FxIndexMap;
use serde::Deserialize;

/// The subset of `package.json` the packer cares about.
#[derive(Debug, Clone)]
pub struct PackageJson {
  /// Directory containing the manifest.
  pub dir: PathBuf,
  pub name: String,
  pub version: String,
  pub main: String,
  /// Declared dependency name -> version range, in declaration order.
  pub dependencies: FxIndexMap<String, String>,
}

#[derive(Deserialize)]
struct RawPackageJson {
  name: Option<String>,
  version: Option<String>,
  main: Option<String>,
  #[serde(default)]
  dependencies: FxIndexMap<String, String>,
}

impl PackageJson {
  pub const DEFAULT_MAIN: &'static str = "index.js";

  /// Parses the manifest text found in `dir`. Missing name or version fall back to the
  /// directory name and `0.0.0`.
  pub fn from_json(dir: &Path, text: &str) -> anyhow::Result<Self> {
    let raw: RawPackageJson = serde_json::from_str(text)
      .with_context(|| format!("Invalid package.json in {}", dir.display()))?;

    let name = raw.name.unwrap_or_else(|| {
      dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    });

    Ok(Self {
      dir: dir.to_path_buf(),
      name,
      version: raw.version.unwrap_or_else(|| "0.0.0".to_string()),
      main: raw
        .main
        .filter(|main| !main.is_empty())
        .unwrap_or_else(|| Self::DEFAULT_MAIN.to_string()),
      dependencies: raw.dependencies,
    })
  }

  /// `<name>/<version>`
  pub fn identity(&self) -> String {
    format!("{}/{}", self.name, self.version)
  }
}

#[test]
fn test_from_json() {
  let pkg = PackageJson::from_json(
    Path::new("/proj"),
    r#"{ "name": "demo", "version": "1.0.0", "dependencies": { "yen": "^1.2", "chart": "~2.0" } }"#,
  )
  .unwrap();
  assert_eq!(pkg.identity(), "demo/1.0.0");
  assert_eq!(pkg.main, "index.js");
  assert_eq!(pkg.dependencies.keys().collect::<Vec<_>>(), ["yen", "chart"]);

  let unnamed = PackageJson::from_json(Path::new("/proj/node_modules/yen"), "{}").unwrap();
  assert_eq!(unnamed.name, "yen");
  assert_eq!(unnamed.version, "0.0.0");

  assert!(PackageJson::from_json(Path::new("/proj"), "{").is_err());
}
