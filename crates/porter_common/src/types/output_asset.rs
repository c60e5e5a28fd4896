#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
  /// An installed package bundled on its own.
  Module,
  /// A self-contained application entry with the bootstrap loader.
  Component,
  /// A single wrapped file.
  Plain,
  Loader,
}

impl AssetKind {
  pub fn as_str(self) -> &'static str {
    match self {
      AssetKind::Module => "module",
      AssetKind::Component => "component",
      AssetKind::Plain => "plain",
      AssetKind::Loader => "loader",
    }
  }
}

#[derive(Debug, Clone)]
pub struct OutputAsset {
  pub kind: AssetKind,
  /// Path relative to the destination directory.
  pub filename: String,
  pub content: String,
}
