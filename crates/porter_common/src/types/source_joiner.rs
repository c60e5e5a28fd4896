use super::source::Source;

/// Concatenates sources with a `\n` between each, prepended sources first.
#[derive(Default)]
pub struct SourceJoiner<'source> {
  inner: Vec<Box<dyn Source + Send + 'source>>,
  prepend_source: Vec<Box<dyn Source + Send + 'source>>,
}

impl<'source> SourceJoiner<'source> {
  pub fn append_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.inner.push(Box::new(source));
  }

  pub fn prepend_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.prepend_source.push(Box::new(source));
  }

  pub fn join(&self) -> String {
    let sources = self.prepend_source.iter().chain(self.inner.iter());
    let separators = (self.prepend_source.len() + self.inner.len()).saturating_sub(1);
    let size_hint =
      sources.clone().map(|source| source.content().len()).sum::<usize>() + separators;

    let mut ret_source = String::with_capacity(size_hint);
    for (index, source) in sources.enumerate() {
      if index > 0 {
        ret_source.push('\n');
      }
      ret_source.push_str(source.content());
    }

    ret_source
  }
}

#[test]
fn test_join() {
  assert_eq!(SourceJoiner::default().join(), "");

  let mut joiner = SourceJoiner::default();
  joiner.append_source("b");
  joiner.append_source("c".to_string());
  joiner.prepend_source("a");
  assert_eq!(joiner.join(), "a\nb\nc");
}
