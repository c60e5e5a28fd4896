use std::{
  ffi::OsString,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context;
use dashmap::DashMap;
use tracing::{debug, warn};

use porter_common::{DependenciesMap, PackageJson, PackageNode};
use porter_fs::{FileSystem, OsFileSystem};
use porter_utils::{
  collections::{FxHashMap, FxHashSet, FxIndexMap},
  path_ext::CODE_EXTENSIONS,
};

const NODE_MODULES: &str = "node_modules";

#[derive(Debug)]
pub struct Resolver<F: FileSystem = OsFileSystem> {
  root: PathBuf,
  fs: F,
  package_json_cache: DashMap<PathBuf, Arc<PackageJson>>,
}

/// The root manifest together with the tree of everything it installs.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
  pub package: Arc<PackageJson>,
  pub dependencies: DependenciesMap,
}

impl<F: FileSystem> Resolver<F> {
  pub fn new(root: PathBuf, fs: F) -> Self {
    Self { root, fs, package_json_cache: DashMap::default() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn fs(&self) -> &F {
    &self.fs
  }

  /// Loads the manifest in `dir`, parsed at most once per resolver.
  pub fn package_json(&self, dir: &Path) -> anyhow::Result<Arc<PackageJson>> {
    if let Some(cached) = self.package_json_cache.get(dir) {
      return Ok(Arc::clone(cached.value()));
    }

    let manifest = dir.join("package.json");
    let text = self
      .fs
      .read_to_string(&manifest)
      .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let package_json = Arc::new(PackageJson::from_json(dir, &text)?);
    self.package_json_cache.insert(dir.to_path_buf(), Arc::clone(&package_json));
    Ok(package_json)
  }

  /// Builds the `DependenciesMap` of the project root.
  ///
  /// Every declared dependency is looked up the way Node does, in the nearest `node_modules`
  /// walking up from the requesting package. The package is then recorded on the level of the
  /// directory owning that `node_modules`, so a hoisted install shows up exactly once, at the
  /// shallowest level that shares it.
  pub fn resolve_project(&self) -> anyhow::Result<ResolvedProject> {
    let package = self.package_json(&self.root)?;
    let mut placements = Placements::default();
    self.place_dependencies(&package, &mut placements)?;
    let dependencies = placements.build(&self.root);
    Ok(ResolvedProject { package, dependencies })
  }

  fn place_dependencies(
    &self,
    requester: &PackageJson,
    placements: &mut Placements,
  ) -> anyhow::Result<()> {
    for name in requester.dependencies.keys() {
      let Some((owner, install_dir)) = self.locate_package(&requester.dir, name) else {
        warn!("Dependency `{name}` of `{}` is not installed, skipping", requester.identity());
        continue;
      };

      if !placements.visited.insert(install_dir.clone()) {
        continue;
      }

      let installed = self.package_json(&install_dir)?;
      debug!("Placed `{}` under {}", installed.identity(), owner.display());
      placements.levels.entry(owner).or_default().insert(name.clone(), Arc::clone(&installed));
      self.place_dependencies(&installed, placements)?;
    }

    Ok(())
  }

  /// Returns `(owner, install_dir)` where `install_dir == owner/node_modules/<name>`.
  fn locate_package(&self, from: &Path, name: &str) -> Option<(PathBuf, PathBuf)> {
    for dir in from.ancestors() {
      if dir.file_name().is_some_and(|file_name| file_name == NODE_MODULES) {
        continue;
      }

      let candidate = dir.join(NODE_MODULES).join(name);
      if self.fs.is_file(&candidate.join("package.json")) {
        return Some((dir.to_path_buf(), candidate));
      }

      if dir == self.root {
        break;
      }
    }

    None
  }

  /// Finds the file a logical module path refers to.
  ///
  /// Tried in order: `base` itself when it already carries a code extension, `base` with each
  /// code extension appended, then `base/index.js`.
  pub fn resolve_file(&self, base: &Path) -> Option<PathBuf> {
    let has_code_extension = base
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext));
    if has_code_extension && self.fs.is_file(base) {
      return Some(base.to_path_buf());
    }

    CODE_EXTENSIONS
      .iter()
      .map(|ext| {
        let mut path = OsString::from(base.as_os_str());
        path.push(".");
        path.push(ext);
        PathBuf::from(path)
      })
      .chain(std::iter::once(base.join("index.js")))
      .find(|candidate| self.fs.is_file(candidate))
  }
}

#[derive(Default)]
struct Placements {
  /// Owner directory -> packages installed in its `node_modules`.
  levels: FxHashMap<PathBuf, FxIndexMap<String, Arc<PackageJson>>>,
  visited: FxHashSet<PathBuf>,
}

impl Placements {
  fn build(&self, owner: &Path) -> DependenciesMap {
    let Some(level) = self.levels.get(owner) else {
      return DependenciesMap::default();
    };

    level
      .iter()
      .map(|(name, package)| {
        let node = PackageNode::new(&package.version, &package.dir, &package.main)
          .with_dependencies(self.build(&package.dir));
        (name.as_str(), node)
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  fn write_package(dir: &Path, name: &str, version: &str, dependencies: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    let dependencies = dependencies
      .iter()
      .map(|(name, range)| format!("\"{name}\": \"{range}\""))
      .collect::<Vec<_>>()
      .join(", ");
    fs::write(
      dir.join("package.json"),
      format!(
        r#"{{ "name": "{name}", "version": "{version}", "dependencies": {{ {dependencies} }} }}"#
      ),
    )
    .unwrap();
  }

  #[test]
  fn hoisted_and_nested_placement() {
    let root = tempfile::tempdir().unwrap();
    let root = root.path();
    write_package(root, "app", "1.0.0", &[("a", "^1.0.0"), ("c", "^1.0.0")]);
    write_package(&root.join("node_modules/a"), "a", "1.0.0", &[("b", "^2.0.0"), ("c", "^2.0.0")]);
    // `b` is hoisted to the root, the conflicting `c@2` stays nested under `a`.
    write_package(&root.join("node_modules/b"), "b", "2.1.0", &[]);
    write_package(&root.join("node_modules/c"), "c", "1.3.0", &[]);
    write_package(&root.join("node_modules/a/node_modules/c"), "c", "2.0.0", &[]);

    let resolver = Resolver::new(root.to_path_buf(), OsFileSystem);
    let project = resolver.resolve_project().unwrap();
    let map = &project.dependencies;

    assert_eq!(project.package.identity(), "app/1.0.0");
    assert_eq!(map.iter().map(|(name, _)| name).collect::<Vec<_>>(), ["a", "b", "c"]);
    assert_eq!(map.get("c").unwrap().version, "1.3.0");
    assert_eq!(map.get("b").unwrap().dir, root.join("node_modules/b"));

    let a = map.get("a").unwrap();
    assert_eq!(a.dependencies.len(), 1);
    assert_eq!(a.dependencies.get("c").unwrap().version, "2.0.0");
    assert!(!a.dependencies.contains("b"));
  }

  #[test]
  fn missing_dependency_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    write_package(root.path(), "app", "1.0.0", &[("ghost", "*")]);

    let resolver = Resolver::new(root.path().to_path_buf(), OsFileSystem);
    assert!(resolver.resolve_project().unwrap().dependencies.is_empty());
  }

  #[test]
  fn resolve_file_candidates() {
    let root = tempfile::tempdir().unwrap();
    let root = root.path();
    fs::create_dir_all(root.join("lib/util")).unwrap();
    fs::write(root.join("lib/a.js"), "").unwrap();
    fs::write(root.join("lib/util/index.js"), "").unwrap();
    fs::write(root.join("lib/b.mjs"), "").unwrap();

    let resolver = Resolver::new(root.to_path_buf(), OsFileSystem);
    assert_eq!(resolver.resolve_file(&root.join("lib/a")), Some(root.join("lib/a.js")));
    assert_eq!(resolver.resolve_file(&root.join("lib/a.js")), Some(root.join("lib/a.js")));
    assert_eq!(resolver.resolve_file(&root.join("lib/b")), Some(root.join("lib/b.mjs")));
    assert_eq!(resolver.resolve_file(&root.join("lib/util")), Some(root.join("lib/util/index.js")));
    assert_eq!(resolver.resolve_file(&root.join("lib/missing")), None);
  }
}
