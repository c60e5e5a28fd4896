use std::{
  ffi::OsStr,
  path::{Path, PathBuf},
  sync::Arc,
};

use glob::Pattern;
use porter_common::{
  AssetKind, DependenciesMap, ModuleId, NormalizedPackerOptions, OutputAsset, PackerOptions,
};
use porter_ecmascript::EcmaCompiler;
use porter_error::{BuildResult, CompileError};
use porter_fs::{FileSystem, OsFileSystem};
use porter_resolver::{ResolvedProject, Resolver};
use porter_utils::{
  collections::{FxHashMap, FxHashSet},
  path_ext::{PathExt, CODE_EXTENSIONS},
};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
  bundle::{BundleSession, ModuleDefinition, PackageScope},
  cache::ContentAddressedCache,
  precompile::{JobRunner, PrecompileScheduler, ProcessRunner},
  types::{bundle_output::BundleOutput, SharedOptions, SharedResolver},
  utils::normalize_options::normalize_options,
};

/// The bootstrap loader prepended to full components.
pub const LOADER: &str = include_str!("runtime/loader.js");
const LOADER_FILE: &str = "loader.js";

pub struct Packer {
  pub(crate) fs: OsFileSystem,
  pub(crate) options: SharedOptions,
  pub(crate) resolver: SharedResolver,
  pub(crate) cache: ContentAddressedCache,
  pub(crate) scheduler: Option<PrecompileScheduler>,
}

impl Packer {
  /// With `precompile` enabled this spawns the background queue, so it has to be called from
  /// within a tokio runtime.
  pub fn new(options: PackerOptions) -> BuildResult<Self> {
    let options = normalize_options(options)?;
    let runner = options.worker.clone().map(ProcessRunner::new);
    Ok(Self::with_options(options, runner))
  }

  /// Like [`Packer::new`], background jobs go to `runner` instead of a worker process.
  pub fn with_runner(options: PackerOptions, runner: impl JobRunner) -> BuildResult<Self> {
    Ok(Self::with_options(normalize_options(options)?, Some(runner)))
  }

  fn with_options(options: NormalizedPackerOptions, runner: Option<impl JobRunner>) -> Self {
    let resolver: SharedResolver = Resolver::new(options.root.clone(), OsFileSystem).into();
    let cache = ContentAddressedCache::new(options.dest.clone(), OsFileSystem);

    let scheduler = match runner {
      Some(runner) if options.precompile => {
        let (dest, source_root) = (options.dest.clone(), options.source_root.clone());
        Some(PrecompileScheduler::new(runner, dest, source_root, options.cache))
      }
      None if options.precompile => {
        warn!("No worker program available, background precompilation is disabled");
        None
      }
      _ => None,
    };

    Packer { fs: OsFileSystem, options: Arc::new(options), resolver, cache, scheduler }
  }

  pub fn options(&self) -> &NormalizedPackerOptions {
    &self.options
  }

  pub fn resolver(&self) -> &Resolver {
    &self.resolver
  }

  pub fn cache(&self) -> &ContentAddressedCache {
    &self.cache
  }

  pub fn scheduler(&self) -> Option<&PrecompileScheduler> {
    self.scheduler.as_ref()
  }

  pub fn resolve_project(&self) -> BuildResult<ResolvedProject> {
    Ok(self.resolver.resolve_project()?)
  }

  /// Bundles the package module `id` found in `path`. Its own package dependencies are bundled
  /// along when `dependencies` is given.
  pub fn compile_module(
    &self,
    id: &ModuleId,
    path: &Path,
    dependencies: Option<&DependenciesMap>,
  ) -> BuildResult<OutputAsset> {
    Ok(self.bundle_module(id, path, dependencies)?)
  }

  /// Bundles an application entry of the primary search path.
  ///
  /// With `dependencies` the result is self-contained and boots itself, without it only the
  /// single file is wrapped.
  pub fn compile_component(
    &self,
    entry: &str,
    dependencies: Option<&DependenciesMap>,
  ) -> BuildResult<OutputAsset> {
    Ok(self.bundle_component(&self.options.primary_path(), entry, dependencies)?)
  }

  /// Compiles every installed package, then every source file of every search path.
  pub fn compile_all(&self) -> BuildResult<BundleOutput> {
    Ok(self.bundle_all()?)
  }

  fn bundle_module(
    &self,
    id: &ModuleId,
    path: &Path,
    dependencies: Option<&DependenciesMap>,
  ) -> anyhow::Result<OutputAsset> {
    let scope = PackageScope::new(id.name(), id.version(), path);
    let mut session = BundleSession::new(&self.resolver, dependencies);
    if dependencies.is_some() {
      session = session.with_route(std::iter::once(id.name()).collect());
    }
    session.append(&scope, id.entry(), None, None)?;

    let (unit, _) = session.finish();
    self.emit(AssetKind::Module, id, &unit.join())
  }

  fn bundle_component(
    &self,
    path: &Path,
    entry: &str,
    dependencies: Option<&DependenciesMap>,
  ) -> anyhow::Result<OutputAsset> {
    let scope = self.root_scope(path)?;
    let Some(dependencies) = dependencies else {
      return self.bundle_plain(&scope, entry);
    };

    let embed = self.options.include_modules;
    let mut session = BundleSession::new(&self.resolver, embed.then_some(dependencies));
    let id = session.append(&scope, entry, None, None)?;
    let (unit, required) = session.finish();

    // Embedded packages only need what was reached, the rest is fetched by the runtime.
    let runtime_dependencies = if embed { &required } else { dependencies };
    let payload = serde_json::json!({
      "name": scope.name,
      "version": scope.version,
      "dependencies": runtime_dependencies,
    });

    let mut joiner = unit.joiner();
    joiner.prepend_source(LOADER);
    joiner.append_source(format!("porter.config({payload});"));
    joiner.append_source(format!("porter[\"import\"]({});", serde_json::Value::from(id.as_str())));

    if !embed {
      self.precompile_dependencies(dependencies);
    }

    self.emit(AssetKind::Component, &id, &joiner.join())
  }

  fn bundle_plain(&self, scope: &PackageScope, entry: &str) -> anyhow::Result<OutputAsset> {
    let module = BundleSession::new(&self.resolver, None).load(scope, entry)?;
    let definition = ModuleDefinition::new(module.id, &module.dependencies, &module.source);
    self.emit(AssetKind::Plain, &definition.id, &definition.code)
  }

  fn bundle_all(&self) -> anyhow::Result<BundleOutput> {
    let Some(pattern) = self.options.match_pattern.as_deref() else {
      return Err(CompileError::Configuration("missing match pattern".to_string()).into());
    };
    let pattern = Pattern::new(pattern).map_err(|err| {
      CompileError::Configuration(format!("invalid match pattern `{pattern}`: {err}"))
    })?;

    let project = self.resolver.resolve_project()?;
    let mut output = BundleOutput::default();

    let mut done = FxHashMap::default();
    self.compile_packages(&project.dependencies, &mut done, &mut output.assets)?;

    for path in &self.options.paths {
      let scope = self.root_scope(path)?;
      let mut matched = 0usize;

      for file in self.collect_sources(path)? {
        let entry = file.strip_prefix(path).unwrap_or(&file).to_slash_string();
        let asset = if pattern.matches(&entry) {
          matched += 1;
          self.bundle_component(path, &entry, Some(&project.dependencies))?
        } else {
          self.bundle_plain(&scope, &entry)?
        };
        output.assets.push(asset);
      }

      if matched == 0 {
        warn!("No entries match `{pattern}` in {}", path.display());
        output.warnings.push(anyhow::anyhow!("No entries match `{pattern}` in {}", path.display()));
      }
    }

    self.cache.write_file(LOADER_FILE, LOADER)?;
    output.assets.push(OutputAsset {
      kind: AssetKind::Loader,
      filename: LOADER_FILE.to_string(),
      content: LOADER.to_string(),
    });

    Ok(output)
  }

  /// Compiles each installed `name/version` once, parents before what they install.
  fn compile_packages(
    &self,
    dependencies: &DependenciesMap,
    done: &mut FxHashMap<String, FxHashSet<String>>,
    assets: &mut Vec<OutputAsset>,
  ) -> anyhow::Result<()> {
    for (name, node) in dependencies.iter() {
      if !done.entry(name.to_string()).or_default().insert(node.version.clone()) {
        continue;
      }
      let id = package_main(name, &node.version, &node.main)?;
      assets.push(self.bundle_module(&id, &node.dir, None)?);
      self.compile_packages(&node.dependencies, done, assets)?;
    }
    Ok(())
  }

  fn precompile_dependencies(&self, dependencies: &DependenciesMap) {
    let Some(scheduler) = &self.scheduler else {
      return;
    };
    for (name, node) in dependencies.iter() {
      match package_main(name, &node.version, &node.main) {
        Ok(id) => {
          scheduler.precompile(&id, &node.main, node.dir.clone());
        }
        Err(err) => warn!("Skipping precompile of `{name}`: {err}"),
      }
    }
  }

  /// The project package, looked up in `path`.
  fn root_scope(&self, path: &Path) -> anyhow::Result<PackageScope> {
    let package = self.resolver.package_json(&self.options.root)?;
    Ok(PackageScope::new(&package.name, &package.version, path))
  }

  /// Code files under `path`, sorted, installed packages excluded.
  fn collect_sources(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !self.fs.exists(path) {
      return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.file_name() != "node_modules");
    for entry in walker {
      let entry = entry?;
      let is_code = entry
        .path()
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext));
      if !entry.file_type().is_dir() && is_code {
        files.push(entry.into_path());
      }
    }
    Ok(files)
  }

  /// Generates and persists `code` as the artifact of `id`, through the cache when enabled.
  fn emit(&self, kind: AssetKind, id: &ModuleId, code: &str) -> anyhow::Result<OutputAsset> {
    let file = format!("{id}.js");
    let path = if self.options.cache {
      self.cache.artifact_path(&file, code)
    } else {
      self.cache.dest().join(&file)
    };
    let filename = path.strip_prefix(self.cache.dest()).unwrap_or(&path).to_slash_string();

    if self.options.cache {
      if let Some(content) = self.cache.read(&file, code)? {
        debug!("Reusing cached `{id}`");
        return Ok(OutputAsset { kind, filename, content });
      }
    }

    let ret = EcmaCompiler::generate(id, code, &self.options.source_root)?;
    let file_name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
    let content = EcmaCompiler::link_source_map(&ret.code, file_name);

    if self.options.cache {
      self.cache.write(&file, code, &content, Some(&ret.map))?;
    } else {
      self.cache.write_file(&filename, &content)?;
      self.cache.write_file(&format!("{filename}.map"), &ret.map)?;
    }

    info!("Compiled `{id}` into {filename}");
    Ok(OutputAsset { kind, filename, content })
  }
}

fn package_main(name: &str, version: &str, main: &str) -> Result<ModuleId, CompileError> {
  ModuleId::new(name, version, main).ok_or_else(|| {
    CompileError::Configuration(format!(
      "package `{name}` has no usable version or main entry (`{version}`, `{main}`)"
    ))
  })
}
