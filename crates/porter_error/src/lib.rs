mod compile_error;

use std::ops::{Deref, DerefMut};

pub use crate::compile_error::CompileError;

#[derive(Debug)]
pub struct BuildError(pub Vec<anyhow::Error>);

impl BuildError {
  /// Returns the first typed failure carried by this error, if any.
  pub fn compile_error(&self) -> Option<&CompileError> {
    self.0.iter().find_map(|error| error.downcast_ref::<CompileError>())
  }
}

impl Deref for BuildError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl std::fmt::Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (index, error) in self.0.iter().enumerate() {
      if index > 0 {
        writeln!(f)?;
      }
      write!(f, "{error:#}")?;
    }
    Ok(())
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<CompileError> for BuildError {
  fn from(error: CompileError) -> Self {
    Self(vec![error.into()])
  }
}

impl From<Vec<anyhow::Error>> for BuildError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

#[test]
fn test_compile_error_lookup() {
  let error = BuildError::from(vec![
    anyhow::anyhow!("unrelated"),
    CompileError::Configuration("missing match pattern".to_string()).into(),
  ]);
  assert!(matches!(error.compile_error(), Some(CompileError::Configuration(_))));
  assert_eq!(error.to_string(), "unrelated\nconfiguration error: missing match pattern");
}
