use std::fmt;

use arcstr::ArcStr;
use porter_utils::path_ext::strip_code_extension;

/// `ModuleId` addresses one bundle-able unit as `<name>/<version>/<entry>`.
/// - The entry is the module path relative to its package root, code extension stripped.
/// - Scoped package names keep their slash, e.g. `@ali/foo/1.0.0/index`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  /// Returns `None` when a part is empty, or when `name` does not read back as a package name.
  pub fn new(name: &str, version: &str, entry: &str) -> Option<Self> {
    let entry = strip_code_extension(entry.trim_start_matches("./"));
    let id = arcstr::format!("{name}/{version}/{entry}");
    let parts = split_module_id(&id)?;
    (parts == (name, version, entry)).then_some(Self(id))
  }

  /// Returns `None` unless `value` carries a name, a version and a non-empty entry.
  pub fn parse(value: &str) -> Option<Self> {
    let (name, version, entry) = split_module_id(value)?;
    Self::new(name, version, entry)
  }

  pub fn name(&self) -> &str {
    self.parts().0
  }

  pub fn version(&self) -> &str {
    self.parts().1
  }

  pub fn entry(&self) -> &str {
    self.parts().2
  }

  /// `<name>/<version>`, the identity shared by every module of one installed package.
  pub fn package_identity(&self) -> &str {
    let (name, version, _) = self.parts();
    &self.0[..name.len() + 1 + version.len()]
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  fn parts(&self) -> (&str, &str, &str) {
    // Every constructor goes through `split_module_id`.
    split_module_id(&self.0).unwrap_or((self.0.as_str(), "", ""))
  }
}

fn split_module_id(value: &str) -> Option<(&str, &str, &str)> {
  let (name, rest) = split_package_specifier(value);
  let (version, entry) = rest?.split_once('/')?;
  (!name.is_empty() && !version.is_empty() && !entry.is_empty()).then_some((name, version, entry))
}

/// Splits `lodash/fp/map` into `("lodash", Some("fp/map"))`, keeping npm scopes together.
pub fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
  let name_len = if specifier.starts_with('@') {
    specifier.match_indices('/').nth(1).map(|(index, _)| index)
  } else {
    specifier.find('/')
  };

  match name_len {
    Some(index) => (&specifier[..index], Some(&specifier[index + 1..])),
    None => (specifier, None),
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl fmt::Display for ModuleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[test]
fn test_module_id() {
  let id = ModuleId::new("yen", "1.2.4", "./index.js").unwrap();
  assert_eq!(id.as_str(), "yen/1.2.4/index");
  assert_eq!(id.name(), "yen");
  assert_eq!(id.version(), "1.2.4");
  assert_eq!(id.entry(), "index");
  assert_eq!(id.package_identity(), "yen/1.2.4");

  let scoped = ModuleId::parse("@ali/foo/0.1.0/lib/bar.js").unwrap();
  assert_eq!(scoped.as_str(), "@ali/foo/0.1.0/lib/bar");
  assert_eq!(scoped.name(), "@ali/foo");
  assert_eq!(scoped.entry(), "lib/bar");
  assert_eq!(scoped.package_identity(), "@ali/foo/0.1.0");

  assert!(ModuleId::parse("yen/1.2.4").is_none());
  assert!(ModuleId::parse("yen").is_none());
  assert!(ModuleId::parse("@ali/foo/0.1.0").is_none());
  assert!(ModuleId::parse("yen//index").is_none());
}

#[test]
fn test_module_id_rejects_empty_parts() {
  assert!(ModuleId::new("yen", "", "index").is_none());
  assert!(ModuleId::new("yen", "1.2.4", "./").is_none());
  assert!(ModuleId::new("yen", "1.2.4", ".js").is_some());
  assert!(ModuleId::new("", "1.2.4", "index").is_none());
  assert!(ModuleId::new("lodash/fp", "4.17.21", "map").is_none());
  assert_eq!(
    ModuleId::new("vue", "2.6.0", "dist/vue.runtime.common.js").unwrap().entry(),
    "dist/vue.runtime.common"
  );
}

#[test]
fn test_split_package_specifier() {
  assert_eq!(split_package_specifier("yen"), ("yen", None));
  assert_eq!(split_package_specifier("lodash/fp/map"), ("lodash", Some("fp/map")));
  assert_eq!(split_package_specifier("@ali/foo"), ("@ali/foo", None));
  assert_eq!(split_package_specifier("@ali/foo/lib/bar"), ("@ali/foo", Some("lib/bar")));
}
