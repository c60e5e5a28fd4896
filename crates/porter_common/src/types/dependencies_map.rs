use std::path::PathBuf;

use porter_utils::collections::FxIndexMap;
use serde::{Deserialize, Serialize};

/// A resolved package install: where it lives and what it installed underneath itself.
///
/// `dir` never leaves the process, the rest is serialized as part of the runtime payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
  pub version: String,
  #[serde(skip)]
  pub dir: PathBuf,
  pub main: String,
  #[serde(default)]
  pub dependencies: DependenciesMap,
}

impl PackageNode {
  pub fn new(version: impl Into<String>, dir: impl Into<PathBuf>, main: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      dir: dir.into(),
      main: main.into(),
      dependencies: DependenciesMap::default(),
    }
  }

  #[must_use]
  pub fn with_dependencies(mut self, dependencies: DependenciesMap) -> Self {
    self.dependencies = dependencies;
    self
  }
}

/// Package name -> resolved install. At most one entry per name on each level, the same name
/// may recur deeper with a different version when it could not be hoisted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependenciesMap(FxIndexMap<String, PackageNode>);

impl DependenciesMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&PackageNode> {
    self.0.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  /// Returns the previous node stored under `name`, if any.
  pub fn insert(&mut self, name: impl Into<String>, node: PackageNode) -> Option<PackageNode> {
    self.0.insert(name.into(), node)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageNode)> {
    self.0.iter().map(|(name, node)| (name.as_str(), node))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Walks `route` as nested lookups: `self[r0].dependencies[r1]...`.
  pub fn lookup(&self, route: &[String]) -> Option<&PackageNode> {
    let (first, rest) = route.split_first()?;
    rest.iter().try_fold(self.get(first)?, |node, name| node.dependencies.get(name))
  }
}

impl<S: Into<String>> FromIterator<(S, PackageNode)> for DependenciesMap {
  fn from_iter<T: IntoIterator<Item = (S, PackageNode)>>(iter: T) -> Self {
    Self(iter.into_iter().map(|(name, node)| (name.into(), node)).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn route(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
  }

  #[test]
  fn lookup_walks_nested_levels() {
    let map = DependenciesMap::from_iter([(
      "a",
      PackageNode::new("1.0.0", "/proj/node_modules/a", "index.js").with_dependencies(
        DependenciesMap::from_iter([(
          "b",
          PackageNode::new("2.0.0", "/proj/node_modules/a/node_modules/b", "lib/b.js"),
        )]),
      ),
    )]);

    assert_eq!(map.lookup(&route(&["a"])).map(|node| node.version.as_str()), Some("1.0.0"));
    assert_eq!(map.lookup(&route(&["a", "b"])).map(|node| node.version.as_str()), Some("2.0.0"));
    assert!(map.lookup(&route(&["b"])).is_none());
    assert!(map.lookup(&route(&[])).is_none());
  }

  #[test]
  fn serializes_without_install_dirs() {
    let map = DependenciesMap::from_iter([(
      "yen",
      PackageNode::new("1.2.4", "/proj/node_modules/yen", "index.js"),
    )]);
    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "yen": { "version": "1.2.4", "main": "index.js", "dependencies": {} } })
    );
  }
}
