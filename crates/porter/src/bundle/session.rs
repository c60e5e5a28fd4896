use std::path::{Path, PathBuf};

use porter_common::{split_package_specifier, DependenciesMap, ModuleId, Route};
use porter_ecmascript::EcmaCompiler;
use porter_error::CompileError;
use porter_resolver::{find_package, Resolver};
use porter_utils::path_ext::PathExt;
use sugar_path::SugarPath;
use tracing::debug;

use super::unit::{BundleUnit, ModuleDefinition};
use crate::utils::load_source::load_source;

/// Pseudo imports handled by loader plugins rather than by the module graph.
const VIRTUAL_ASSET_EXTENSIONS: [&str; 6] = [".css", ".less", ".html", ".htm", ".tpl", ".svg"];

fn is_virtual_asset(specifier: &str) -> bool {
  specifier.contains('!') || VIRTUAL_ASSET_EXTENSIONS.iter().any(|ext| specifier.ends_with(ext))
}

fn is_relative(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

/// The package a module belongs to and the directory its entries are looked up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageScope {
  pub name: String,
  pub version: String,
  pub dir: PathBuf,
}

impl PackageScope {
  pub fn new(name: impl Into<String>, version: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
    Self { name: name.into(), version: version.into(), dir: dir.into() }
  }

  pub fn module_id(&self, entry: &str) -> Result<ModuleId, CompileError> {
    ModuleId::new(&self.name, &self.version, entry).ok_or_else(|| {
      let (name, version) = (&self.name, &self.version);
      CompileError::Configuration(format!("`{name}/{version}/{entry}` is not a valid module id"))
    })
  }
}

/// A module read from disk, not yet wrapped.
#[derive(Debug)]
pub struct LoadedModule {
  pub id: ModuleId,
  /// Path relative to the scope directory, code extension stripped.
  pub entry: String,
  pub source: String,
  pub dependencies: Vec<String>,
}

/// State of one top-level bundle invocation, shared by all of its recursive steps.
pub struct BundleSession<'a> {
  resolver: &'a Resolver,
  /// Only set when external packages are bundled too.
  dependencies: Option<&'a DependenciesMap>,
  route: Route,
  required: DependenciesMap,
  unit: BundleUnit,
}

impl<'a> BundleSession<'a> {
  pub fn new(resolver: &'a Resolver, dependencies: Option<&'a DependenciesMap>) -> Self {
    Self {
      resolver,
      dependencies,
      route: Route::new(),
      required: DependenciesMap::new(),
      unit: BundleUnit::default(),
    }
  }

  /// Starts package lookups below `route` instead of at the top level.
  #[must_use]
  pub fn with_route(mut self, route: Route) -> Self {
    self.route = route;
    self
  }

  pub fn unit(&self) -> &BundleUnit {
    &self.unit
  }

  pub fn required(&self) -> &DependenciesMap {
    &self.required
  }

  pub fn finish(self) -> (BundleUnit, DependenciesMap) {
    (self.unit, self.required)
  }

  /// Reads `entry` of `scope` and lists what it requires, virtual assets excluded.
  pub fn load(&self, scope: &PackageScope, entry: &str) -> anyhow::Result<LoadedModule> {
    let (entry, file) = self.locate(scope, entry)?;
    let id = scope.module_id(&entry)?;
    let source = load_source(self.resolver.fs(), &file)?;
    let dependencies = scan_dependencies(&id, &source)?;
    Ok(LoadedModule { id, entry, source, dependencies })
  }

  /// Adds `entry` and everything it requires to the bundle.
  ///
  /// `source` and `dependencies` skip reading and scanning when given. Appending an id that is
  /// already part of the bundle does nothing. Returns the id `entry` resolved to.
  pub fn append(
    &mut self,
    scope: &PackageScope,
    entry: &str,
    source: Option<String>,
    dependencies: Option<Vec<String>>,
  ) -> anyhow::Result<ModuleId> {
    let (entry, file) = match source {
      Some(_) => (Path::new(entry).to_entry_string(), None),
      None => {
        let (entry, file) = self.locate(scope, entry)?;
        (entry, Some(file))
      }
    };

    let id = scope.module_id(&entry)?;
    if !self.unit.include(&id) {
      return Ok(id);
    }

    let source = match (source, file) {
      (Some(source), _) => source,
      (None, Some(file)) => load_source(self.resolver.fs(), &file)?,
      (None, None) => {
        let path = scope.dir.join(&entry);
        return Err(CompileError::SourceNotFound { id: id.to_string(), path }.into());
      }
    };

    let dependencies = match dependencies {
      Some(dependencies) => dependencies.into_iter().filter(|it| !is_virtual_asset(it)).collect(),
      None => scan_dependencies(&id, &source)?,
    };

    self.satisfy(scope, &entry, &dependencies)?;
    self.unit.push(ModuleDefinition::new(id.clone(), &dependencies, &source));
    Ok(id)
  }

  /// Appends every dependency of the module at `entry`, before the module itself is pushed.
  fn satisfy(
    &mut self,
    scope: &PackageScope,
    entry: &str,
    dependencies: &[String],
  ) -> anyhow::Result<()> {
    for specifier in dependencies {
      if is_relative(specifier) {
        let sibling = Path::new(entry).parent().unwrap_or(Path::new("")).join(specifier);
        self.append(scope, &sibling.normalize().to_slash_string(), None, None)?;
      } else if self.resolver.resolve_file(&scope.dir.join(specifier)).is_some() {
        self.append(scope, specifier, None, None)?;
      } else if let Some(map) = self.dependencies {
        self.append_package(specifier, map)?;
      } else {
        debug!("Leaving `{specifier}` required by `{entry}` of {} to the runtime", scope.name);
      }
    }
    Ok(())
  }

  fn append_package(&mut self, specifier: &str, map: &'a DependenciesMap) -> anyhow::Result<()> {
    let (name, subpath) = split_package_specifier(specifier);
    self.route.push(name);
    let result = self.append_resolved_package(subpath, map);
    self.route.pop();
    result
  }

  fn append_resolved_package(
    &mut self,
    subpath: Option<&str>,
    map: &'a DependenciesMap,
  ) -> anyhow::Result<()> {
    let node = find_package(self.route.as_slice(), map, Some(&mut self.required))?;
    let name = self.route.as_slice().last().map(String::as_str).unwrap_or_default();
    let scope = PackageScope::new(name, &node.version, &node.dir);
    self.append(&scope, subpath.unwrap_or(&node.main), None, None)?;
    Ok(())
  }

  /// Returns the entry normalized against the file it resolved to.
  fn locate(&self, scope: &PackageScope, entry: &str) -> Result<(String, PathBuf), CompileError> {
    let base = scope.dir.join(entry);
    let Some(file) = self.resolver.resolve_file(&base) else {
      let id = scope.module_id(&Path::new(entry).to_entry_string())?;
      return Err(CompileError::SourceNotFound { id: id.to_string(), path: base });
    };

    let entry = match file.strip_prefix(&scope.dir) {
      Ok(relative) => relative.to_entry_string(),
      Err(_) => Path::new(entry).to_entry_string(),
    };
    Ok((entry, file))
  }
}

fn scan_dependencies(id: &ModuleId, source: &str) -> Result<Vec<String>, CompileError> {
  let mut dependencies = EcmaCompiler::scan_requires(id, source)?;
  dependencies.retain(|specifier| !is_virtual_asset(specifier));
  Ok(dependencies)
}
