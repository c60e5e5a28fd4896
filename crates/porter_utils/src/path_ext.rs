use std::path::Path;

use sugar_path::SugarPath;

/// Code extensions a logical module path may omit.
pub const CODE_EXTENSIONS: [&str; 4] = ["js", "mjs", "cjs", "jsx"];

pub trait PathExt {
  /// The path joined with `/` regardless of the platform separator.
  fn to_slash_string(&self) -> String;

  /// The normalized slash path with a trailing code extension dropped, used as the entry part of
  /// module ids.
  fn to_entry_string(&self) -> String;
}

impl PathExt for Path {
  fn to_slash_string(&self) -> String {
    self.to_slash_lossy().into_owned()
  }

  fn to_entry_string(&self) -> String {
    let slash = self.normalize().to_slash_string();
    strip_code_extension(&slash).to_string()
  }
}

pub fn strip_code_extension(path: &str) -> &str {
  match path.rsplit_once('.') {
    Some((stem, ext))
      if !stem.is_empty() && !stem.ends_with('/') && CODE_EXTENSIONS.contains(&ext) =>
    {
      stem
    }
    _ => path,
  }
}

#[test]
fn test_to_entry_string() {
  assert_eq!(Path::new("lib").join("index.js").to_entry_string(), "lib/index");
  assert_eq!(Path::new("./index.mjs").to_entry_string(), "index");
  assert_eq!(Path::new("lib/./a/../b.js").to_entry_string(), "lib/b");
  assert_eq!(Path::new("data.json").to_entry_string(), "data.json");
  assert_eq!(Path::new("lib/.eslintrc").to_entry_string(), "lib/.eslintrc");
  assert_eq!(Path::new("dist/vue.runtime.common.js").to_entry_string(), "dist/vue.runtime.common");
  assert_eq!(strip_code_extension("v1.2/index.js"), "v1.2/index");
  assert_eq!(strip_code_extension("v1.2/index"), "v1.2/index");
}
