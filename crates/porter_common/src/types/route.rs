use std::fmt;

/// The stack of package names walked while resolving a nested dependency.
///
/// Pushed before descending into a package, popped once every module of it has been appended.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Route(Vec<String>);

impl Route {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, name: impl Into<String>) {
    self.0.push(name.into());
  }

  pub fn pop(&mut self) -> Option<String> {
    self.0.pop()
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<S: Into<String>> FromIterator<S> for Route {
  fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join(" > "))
  }
}
