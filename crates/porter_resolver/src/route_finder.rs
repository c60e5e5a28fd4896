use porter_common::{DependenciesMap, PackageNode};
use porter_error::CompileError;
use tracing::debug;

/// Locates the package `route` points at, accounting for hoisting.
///
/// The full route is tried first as nested lookups. Whenever that fails the second-to-last
/// segment is dropped, which looks the last name up one level higher, until a single segment
/// remains. For `[a, b, c]` the attempts are `a > b > c`, `a > c` and `c`.
///
/// On success a deep copy of the top level package the matching route starts with is stored in
/// `required`, so the map handed to the runtime never aliases the live tree.
pub fn find_package<'map>(
  route: &[String],
  dependencies: &'map DependenciesMap,
  required: Option<&mut DependenciesMap>,
) -> Result<&'map PackageNode, CompileError> {
  let mut attempt = route.to_vec();

  while !attempt.is_empty() {
    if let Some(node) = dependencies.lookup(&attempt) {
      debug!("Resolved `{}` as {} ({})", route.join(" > "), attempt.join(" > "), node.version);
      if let Some(required) = required {
        let top = &attempt[0];
        if let Some(top_node) = dependencies.get(top) {
          required.insert(top.clone(), top_node.clone());
        }
      }
      return Ok(node);
    }

    if attempt.len() < 2 {
      break;
    }
    attempt.remove(attempt.len() - 2);
  }

  Err(CompileError::UnresolvedDependency {
    name: route.last().cloned().unwrap_or_default(),
    route: route.join(" > "),
  })
}
