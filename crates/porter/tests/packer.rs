use std::{
  fs,
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use porter::{
  AssetKind, CompileError, JobRunner, ModuleId, Packer, PackerOptions, PrecompileJob,
};
use serde_json::{json, Value};
use tempfile::TempDir;

fn write(root: &Path, file: &str, content: &str) {
  let path = root.join(file);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

/// `demo` requires `yen`, which requires `heredoc`. Both packages are hoisted to the root.
fn fixture() -> TempDir {
  let root = tempfile::tempdir().unwrap();
  let root_path = root.path();
  write(
    root_path,
    "package.json",
    r#"{ "name": "demo", "version": "1.0.0", "dependencies": { "yen": "^1.2.4" } }"#,
  );
  write(
    root_path,
    "node_modules/yen/package.json",
    r#"{ "name": "yen", "version": "1.2.4", "dependencies": { "heredoc": "^1.3.1" } }"#,
  );
  write(
    root_path,
    "node_modules/yen/index.js",
    "var heredoc = require('heredoc');\nmodule.exports = {};",
  );
  write(
    root_path,
    "node_modules/heredoc/package.json",
    r#"{ "name": "heredoc", "version": "1.3.1" }"#,
  );
  write(root_path, "node_modules/heredoc/index.js", "module.exports = function heredoc() {};");
  write(root_path, "components/home.js", "var $ = require('yen');\nvar util = require('./util');");
  write(root_path, "components/util.js", "module.exports = {};");
  root
}

fn options(root: &Path) -> PackerOptions {
  PackerOptions { root: Some(root.to_path_buf()), ..PackerOptions::default() }
}

fn position(content: &str, id: &str) -> usize {
  content.find(&format!("define(\"{id}\"")).unwrap_or_else(|| panic!("`{id}` is not bundled"))
}

fn runtime_config(content: &str) -> Value {
  let start = content.find("porter.config(").unwrap() + "porter.config(".len();
  let end = content[start..].find(");").unwrap();
  serde_json::from_str(&content[start..start + end]).unwrap()
}

fn file_names(dir: &Path, prefix: &str) -> Vec<String> {
  let mut names = fs::read_dir(dir)
    .unwrap()
    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
    .filter(|name| name.starts_with(prefix))
    .collect::<Vec<_>>();
  names.sort();
  names
}

#[test]
fn component_embeds_reached_packages() {
  let root = fixture();
  let packer = Packer::new(options(root.path())).unwrap();
  let project = packer.resolve_project().unwrap();

  let asset = packer.compile_component("home.js", Some(&project.dependencies)).unwrap();
  let content = &asset.content;

  assert_eq!(asset.kind, AssetKind::Component);
  assert_eq!(asset.filename, "demo/1.0.0/home.js");
  assert!(content.starts_with("(function("));
  assert!(content.contains(".porter="));
  assert!(position(content, "heredoc/1.3.1/index") < position(content, "yen/1.2.4/index"));
  assert!(position(content, "yen/1.2.4/index") < position(content, "demo/1.0.0/util"));
  assert!(position(content, "demo/1.0.0/util") < position(content, "demo/1.0.0/home"));
  assert!(content.contains("porter[\"import\"](\"demo/1.0.0/home\")"));
  assert!(content.ends_with("\n//# sourceMappingURL=home.js.map"));

  // Only `yen` was required from the top level, `heredoc` was reached through it.
  assert_eq!(
    runtime_config(content),
    json!({
      "name": "demo",
      "version": "1.0.0",
      "dependencies": {
        "yen": { "version": "1.2.4", "main": "index.js", "dependencies": {} },
        "heredoc": { "version": "1.3.1", "main": "index.js", "dependencies": {} }
      }
    })
  );

  let dest = root.path().join("public/demo/1.0.0");
  assert_eq!(fs::read_to_string(dest.join("home.js")).unwrap(), *content);
  let map = fs::read_to_string(dest.join("home.js.map")).unwrap();
  let map: Value = serde_json::from_str(&map).unwrap();
  assert_eq!(map["sources"], json!(["/demo/1.0.0/home.js"]));
}

#[test]
fn required_map_holds_exactly_the_reached_package() {
  let root = tempfile::tempdir().unwrap();
  write(
    root.path(),
    "package.json",
    r#"{ "name": "demo", "version": "1.0.0", "dependencies": { "yen": "^1.2.4" } }"#,
  );
  write(root.path(), "node_modules/yen/package.json", r#"{ "name": "yen", "version": "1.2.4" }"#);
  write(root.path(), "node_modules/yen/index.js", "module.exports = 'yen';");
  write(root.path(), "components/home.js", "var yen = require('yen');");

  let packer = Packer::new(options(root.path())).unwrap();
  let project = packer.resolve_project().unwrap();
  assert_eq!(project.dependencies.iter().count(), 1);

  let content = packer.compile_component("home.js", Some(&project.dependencies)).unwrap().content;
  assert!(position(&content, "yen/1.2.4/index") < position(&content, "demo/1.0.0/home"));
  assert_eq!(
    runtime_config(&content)["dependencies"],
    json!({ "yen": { "version": "1.2.4", "main": "index.js", "dependencies": {} } })
  );
}

#[derive(Clone, Default)]
struct RecordingRunner(Arc<Mutex<Vec<PrecompileJob>>>);

impl JobRunner for RecordingRunner {
  fn run<'a>(&'a self, job: &'a PrecompileJob) -> BoxFuture<'a, anyhow::Result<()>> {
    Box::pin(async move {
      self.0.lock().unwrap().push(job.clone());
      Ok(())
    })
  }
}

#[tokio::test]
async fn excluded_packages_are_precompiled() {
  let root = fixture();
  let runner = RecordingRunner::default();
  let packer = Packer::with_runner(
    PackerOptions { include_modules: Some(false), precompile: Some(true), ..options(root.path()) },
    runner.clone(),
  )
  .unwrap();
  let project = packer.resolve_project().unwrap();

  let content = packer.compile_component("home.js", Some(&project.dependencies)).unwrap().content;
  assert!(!content.contains("define(\"yen/1.2.4/index\""));
  let dependencies = serde_json::to_value(&project.dependencies).unwrap();
  assert_eq!(runtime_config(&content)["dependencies"], dependencies);

  let scheduler = packer.scheduler().unwrap();
  scheduler.idle().await;

  let jobs = runner.0.lock().unwrap();
  let ids = jobs.iter().map(|job| job.id.as_str()).collect::<Vec<_>>();
  assert_eq!(ids, ["yen/1.2.4/index", "heredoc/1.3.1/index"]);
  assert_eq!(jobs[0].path, root.path().join("node_modules/yen"));
  assert_eq!(jobs[0].dest, root.path().join("public"));
  assert!(!jobs[0].cache);
}

/// Compiles the job the way the `compile-module` worker does, without spawning a process.
struct InProcessRunner;

impl JobRunner for InProcessRunner {
  fn run<'a>(&'a self, job: &'a PrecompileJob) -> BoxFuture<'a, anyhow::Result<()>> {
    Box::pin(async move {
      let packer = Packer::new(PackerOptions {
        root: Some(job.path.clone()),
        paths: Some(vec![job.path.clone()]),
        dest: Some(job.dest.clone()),
        source_root: Some(job.source_root.clone()),
        cache: Some(job.cache),
        ..PackerOptions::default()
      })
      .map_err(|err| anyhow::anyhow!("{err}"))?;
      packer.compile_module(&job.id, &job.path, None).map_err(|err| anyhow::anyhow!("{err}"))?;
      Ok(())
    })
  }
}

#[tokio::test]
async fn precompiled_packages_warm_the_cache() {
  let root = fixture();
  let packer = Packer::with_runner(
    PackerOptions {
      include_modules: Some(false),
      precompile: Some(true),
      cache: Some(true),
      ..options(root.path())
    },
    InProcessRunner,
  )
  .unwrap();
  let project = packer.resolve_project().unwrap();

  packer.compile_component("home.js", Some(&project.dependencies)).unwrap();
  packer.scheduler().unwrap().idle().await;

  let dir = root.path().join("public/yen/1.2.4");
  let precompiled = file_names(&dir, "index");
  assert_eq!(precompiled.len(), 2);
  assert!(precompiled[0].starts_with("index-") && precompiled[0].ends_with(".js"));
  assert_eq!(precompiled[1], format!("{}.map", precompiled[0]));

  // The next build reads the precompiled artifact back instead of compiling again.
  fs::write(dir.join(&precompiled[0]), "/* precompiled */").unwrap();
  let yen = root.path().join("node_modules/yen");
  let id = ModuleId::new("yen", "1.2.4", "index").unwrap();
  let asset = packer.compile_module(&id, &yen, None).unwrap();
  assert_eq!(asset.filename, format!("yen/1.2.4/{}", precompiled[0]));
  assert_eq!(asset.content, "/* precompiled */");
}

#[test]
fn component_without_dependencies_is_plain() {
  let root = fixture();
  let packer = Packer::new(options(root.path())).unwrap();

  let asset = packer.compile_component("home", None).unwrap();
  assert_eq!(asset.kind, AssetKind::Plain);
  assert!(asset.content.starts_with("define(\"demo/1.0.0/home\",[\"yen\",\"./util\"],function("));
  assert!(!asset.content.contains("porter.config"));
  assert!(!asset.content.contains("demo/1.0.0/util\""));
}

#[test]
fn output_is_minified() {
  let root = fixture();
  write(
    root.path(),
    "components/about.js",
    "// about page\nfunction render(title) {\n  return '<h1>' + title + '</h1>';\n}",
  );
  let packer = Packer::new(options(root.path())).unwrap();

  let content = packer.compile_component("about.js", None).unwrap().content;
  assert!(!content.contains("about page"));
  assert!(!content.contains("title"));
  assert!(!content.contains("\n  "));
  assert!(content.contains("\"<h1>\"+"));
}

#[test]
fn module_bundles_its_own_dependencies() {
  let root = fixture();
  let packer = Packer::new(options(root.path())).unwrap();
  let project = packer.resolve_project().unwrap();
  let yen = root.path().join("node_modules/yen");
  let id = ModuleId::new("yen", "1.2.4", "index").unwrap();

  let alone = packer.compile_module(&id, &yen, None).unwrap();
  assert!(!alone.content.contains("heredoc/1.3.1/index"));

  let bundled = packer.compile_module(&id, &yen, Some(&project.dependencies)).unwrap();
  assert_eq!(bundled.filename, "yen/1.2.4/index.js");
  let content = &bundled.content;
  assert!(position(content, "heredoc/1.3.1/index") < position(content, "yen/1.2.4/index"));
}

#[test]
fn dotted_entries_keep_their_extension() {
  let root = fixture();
  let vue = root.path().join("node_modules/vue");
  write(&vue, "dist/vue.runtime.common.js", "module.exports = 'vue';");
  let packer = Packer::new(PackerOptions { cache: Some(true), ..options(root.path()) }).unwrap();

  let id = ModuleId::new("vue", "2.6.0", "dist/vue.runtime.common.js").unwrap();
  let asset = packer.compile_module(&id, &vue, None).unwrap();

  let file_name = asset.filename.rsplit('/').next().unwrap();
  assert!(asset.filename.starts_with("vue/2.6.0/dist/vue.runtime.common-"));
  assert!(file_name.ends_with(".js"));
  assert!(asset.content.ends_with(&format!("//# sourceMappingURL={file_name}.map")));

  let dist = root.path().join("public/vue/2.6.0/dist");
  assert_eq!(file_names(&dist, "vue"), [file_name.to_string(), format!("{file_name}.map")]);
}

#[test]
fn compile_all_walks_packages_and_search_paths() {
  let root = fixture();
  write(root.path(), "views/about.js", "module.exports = 'about';");
  let packer = Packer::new(PackerOptions {
    paths: Some(vec![
      PathBuf::from("components"),
      PathBuf::from("views"),
      PathBuf::from("missing"),
    ]),
    match_pattern: Some("home.js".to_string()),
    ..options(root.path())
  })
  .unwrap();

  let output = packer.compile_all().unwrap();
  let assets = output
    .assets
    .iter()
    .map(|asset| (asset.kind, asset.filename.as_str()))
    .collect::<Vec<_>>();
  assert_eq!(
    assets,
    [
      (AssetKind::Module, "yen/1.2.4/index.js"),
      (AssetKind::Module, "heredoc/1.3.1/index.js"),
      (AssetKind::Component, "demo/1.0.0/home.js"),
      (AssetKind::Plain, "demo/1.0.0/util.js"),
      (AssetKind::Plain, "demo/1.0.0/about.js"),
      (AssetKind::Loader, "loader.js"),
    ]
  );

  // `views` and `missing` have nothing matching, neither stops the build.
  assert_eq!(output.warnings.len(), 2);
  assert!(output.warnings[0].to_string().contains("views"));
  assert!(root.path().join("public/loader.js").is_file());
  assert!(root.path().join("public/demo/1.0.0/about.js.map").is_file());
}

#[test]
fn compile_all_requires_a_match_pattern() {
  let root = fixture();
  let packer = Packer::new(options(root.path())).unwrap();

  let err = packer.compile_all().unwrap_err();
  assert!(matches!(err.compile_error(), Some(CompileError::Configuration(_))));
  assert!(!root.path().join("public").exists());
}

#[test]
fn packages_without_a_version_are_rejected() {
  let root = fixture();
  write(
    root.path(),
    "node_modules/heredoc/package.json",
    r#"{ "name": "heredoc", "version": "" }"#,
  );
  let packer = Packer::new(PackerOptions {
    match_pattern: Some("home.js".to_string()),
    ..options(root.path())
  })
  .unwrap();

  let err = packer.compile_all().unwrap_err();
  assert!(matches!(
    err.compile_error(),
    Some(CompileError::Configuration(message)) if message.contains("heredoc")
  ));
}

#[test]
fn cached_artifacts_are_reused_and_replaced() {
  let root = fixture();
  let packer = Packer::new(PackerOptions { cache: Some(true), ..options(root.path()) }).unwrap();
  let project = packer.resolve_project().unwrap();
  let dest = root.path().join("public/demo/1.0.0");

  let first = packer.compile_component("home.js", Some(&project.dependencies)).unwrap();
  assert!(first.filename.starts_with("demo/1.0.0/home-"));
  let first_name = first.filename.rsplit('/').next().unwrap();
  assert!(first.content.ends_with(&format!("{first_name}.map")));

  let again = packer.compile_component("home.js", Some(&project.dependencies)).unwrap();
  assert_eq!(again.filename, first.filename);
  assert_eq!(again.content, first.content);
  assert_eq!(file_names(&dest, "home-").len(), 2);

  write(root.path(), "components/util.js", "module.exports = { changed: true };");
  let changed = packer.compile_component("home.js", Some(&project.dependencies)).unwrap();
  assert_ne!(changed.filename, first.filename);

  let file_name = changed.filename.rsplit('/').next().unwrap().to_string();
  assert_eq!(file_names(&dest, "home-"), [file_name.clone(), format!("{file_name}.map")]);
}

#[test]
fn bundling_fails_fast() {
  let root = fixture();
  write(root.path(), "components/broken.js", "require('ghost');");
  let packer = Packer::new(options(root.path())).unwrap();
  let project = packer.resolve_project().unwrap();

  let err = packer.compile_component("broken.js", Some(&project.dependencies)).unwrap_err();
  assert!(matches!(
    err.compile_error(),
    Some(CompileError::UnresolvedDependency { name, .. }) if name == "ghost"
  ));

  let err = packer.compile_component("nowhere.js", Some(&project.dependencies)).unwrap_err();
  assert!(matches!(err.compile_error(), Some(CompileError::SourceNotFound { .. })));

  assert!(!root.path().join("public/demo/1.0.0/broken.js").exists());
}
