use porter_common::{ModuleId, SourceJoiner};
use porter_ecmascript::EcmaCompiler;
use porter_utils::collections::FxHashSet;

/// One module wrapped as a `define(...)` call.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
  pub id: ModuleId,
  pub code: String,
}

impl ModuleDefinition {
  pub fn new(id: ModuleId, dependencies: &[String], source: &str) -> Self {
    let code = EcmaCompiler::wrap_definition(&id, dependencies, source);
    Self { id, code }
  }
}

/// The aggregate being assembled by one bundle invocation.
///
/// A module is marked included as soon as it is discovered, its definition is pushed only after
/// every dependency of it has been pushed. Definitions therefore come out dependencies first.
#[derive(Debug, Default)]
pub struct BundleUnit {
  included: FxHashSet<ModuleId>,
  definitions: Vec<ModuleDefinition>,
}

impl BundleUnit {
  pub fn contains(&self, id: &ModuleId) -> bool {
    self.included.contains(id)
  }

  /// Returns `false` if `id` was already included.
  pub(crate) fn include(&mut self, id: &ModuleId) -> bool {
    self.included.insert(id.clone())
  }

  pub(crate) fn push(&mut self, definition: ModuleDefinition) {
    self.definitions.push(definition);
  }

  pub fn definitions(&self) -> &[ModuleDefinition] {
    &self.definitions
  }

  /// Ids in emission order.
  pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
    self.definitions.iter().map(|definition| &definition.id)
  }

  pub fn len(&self) -> usize {
    self.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.definitions.is_empty()
  }

  pub fn joiner(&self) -> SourceJoiner<'_> {
    let mut joiner = SourceJoiner::default();
    self.definitions.iter().for_each(|definition| joiner.append_source(definition.code.as_str()));
    joiner
  }

  pub fn join(&self) -> String {
    self.joiner().join()
  }
}
