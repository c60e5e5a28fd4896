use std::path::PathBuf;

use oxc_allocator::Allocator;
use oxc_ast_visit::Visit;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType;
use porter_error::CompileError;

use crate::require_scanner::RequireScanner;

/// Minified code ready to be written to disk along with its v3 source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenReturn {
  pub code: String,
  pub map: String,
}

pub struct EcmaCompiler;

impl EcmaCompiler {
  /// Parses `source` as CommonJS. Diagnostics are reported verbatim.
  fn parse<'a>(
    allocator: &'a Allocator,
    id: &str,
    source: &'a str,
  ) -> Result<ParserReturn<'a>, CompileError> {
    let ret = Parser::new(allocator, source, SourceType::cjs()).parse();
    if ret.errors.is_empty() && !ret.panicked {
      Ok(ret)
    } else {
      let message = ret.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
      Err(CompileError::ParseFailure { id: id.to_string(), message })
    }
  }

  /// Distinct `require` specifiers of `source`, in the order they first appear.
  pub fn scan_requires(id: &str, source: &str) -> Result<Vec<String>, CompileError> {
    let allocator = Allocator::default();
    let ret = Self::parse(&allocator, id, source)?;
    let mut scanner = RequireScanner::default();
    scanner.visit_program(&ret.program);
    Ok(scanner.into_specifiers())
  }

  /// Wraps a module as a named definition the bootstrap loader understands.
  pub fn wrap_definition(id: &str, dependencies: &[String], source: &str) -> String {
    let id = serde_json::Value::from(id);
    let dependencies = serde_json::Value::from(dependencies.to_vec());
    format!("define({id}, {dependencies}, function(require, exports, module) {{\n{source}\n}})")
  }

  /// Minifies the aggregate and emits it with a source map whose single source is
  /// `<source_root><id>.js`.
  ///
  /// The `sourceMappingURL` comment is left to whoever decides the file name, see
  /// [`EcmaCompiler::link_source_map`].
  pub fn generate(id: &str, code: &str, source_root: &str) -> Result<CodegenReturn, CompileError> {
    let allocator = Allocator::default();
    let mut program = Self::parse(&allocator, id, code)?.program;

    // Only local names are mangled, statements are kept as written.
    let ret = Minifier::new(MinifierOptions { compress: None, ..MinifierOptions::default() })
      .minify(&allocator, &mut program);

    let source = if source_root.ends_with('/') {
      format!("{source_root}{id}.js")
    } else {
      format!("{source_root}/{id}.js")
    };

    let ret = Codegen::new()
      .with_options(CodegenOptions {
        source_map_path: Some(PathBuf::from(source)),
        ..CodegenOptions::minify()
      })
      .with_scoping(ret.scoping)
      .build(&program);

    let map = ret.map.map(|map| map.to_json_string()).unwrap_or_default();
    Ok(CodegenReturn { code: ret.code, map })
  }

  pub fn link_source_map(code: &str, file_name: &str) -> String {
    format!("{}\n//# sourceMappingURL={file_name}.map", code.trim_end())
  }
}

#[test]
fn test_scan_requires() {
  let source = r"
    const a = require('./a');
    const yen = require('yen');
    function lazy() { return require('./a') + require('heredoc!./tpl.html'); }
    require(dynamic);
    require('x', 'y');
  ";
  let specifiers = EcmaCompiler::scan_requires("demo/1.0.0/index", source).unwrap();
  assert_eq!(specifiers, ["./a", "yen", "heredoc!./tpl.html"]);
}

#[test]
fn test_parse_failure_is_verbatim() {
  let err = EcmaCompiler::scan_requires("demo/1.0.0/broken", "const = ;").unwrap_err();
  match err {
    CompileError::ParseFailure { id, message } => {
      assert_eq!(id, "demo/1.0.0/broken");
      assert!(!message.is_empty());
    }
    other => panic!("unexpected error {other:?}"),
  }
}

#[test]
fn test_wrap_definition() {
  let code =
    EcmaCompiler::wrap_definition("demo/1.0.0/index", &["yen".to_string()], "module.exports = 1");
  assert_eq!(
    code,
    concat!(
      "define(\"demo/1.0.0/index\", [\"yen\"], function(require, exports, module) {\n",
      "module.exports = 1\n})"
    )
  );
  assert!(EcmaCompiler::scan_requires("demo/1.0.0/index", &code).is_ok());
}

#[test]
fn test_generate() {
  let source =
    "var config  =  { answer: 42 }; // the answer\nfunction twice(value) {\n  return value * 2;\n}";
  let ret = EcmaCompiler::generate("demo/1.0.0/index", source, "/").unwrap();
  assert!(!ret.code.contains("the answer"));
  assert!(!ret.code.contains("  "));
  assert!(!ret.code.contains("value"));
  assert!(ret.code.contains("{answer:42}"));
  assert!(ret.code.len() < source.len());

  let linked = EcmaCompiler::link_source_map(&ret.code, "index-0123.js");
  assert!(linked.ends_with("\n//# sourceMappingURL=index-0123.js.map"));
  assert_eq!(linked.matches("sourceMappingURL").count(), 1);

  let map: serde_json::Value = serde_json::from_str(&ret.map).unwrap();
  assert_eq!(map["version"], 3);
  assert_eq!(map["sources"][0], "/demo/1.0.0/index.js");
  assert!(!map["mappings"].as_str().unwrap().is_empty());

  let ret =
    EcmaCompiler::generate("demo/1.0.0/index", "var a = 1;", "https://cdn.example.com").unwrap();
  let map: serde_json::Value = serde_json::from_str(&ret.map).unwrap();
  assert_eq!(map["sources"][0], "https://cdn.example.com/demo/1.0.0/index.js");

  assert!(matches!(
    EcmaCompiler::generate("demo/1.0.0/index", "var = ;", "/"),
    Err(CompileError::ParseFailure { .. })
  ));
}
