use oxc_ast::ast::CallExpression;
use oxc_ast_visit::{walk, Visit};
use porter_utils::collections::FxIndexSet;

/// Collects the specifiers of `require('...')` calls in source order.
#[derive(Default)]
pub struct RequireScanner {
  specifiers: FxIndexSet<String>,
}

impl RequireScanner {
  pub fn into_specifiers(self) -> Vec<String> {
    self.specifiers.into_iter().collect()
  }
}

impl<'a> Visit<'a> for RequireScanner {
  fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
    if let Some(literal) = it.common_js_require() {
      self.specifiers.insert(literal.value.as_str().to_string());
    }
    walk::walk_call_expression(self, it);
  }
}
