use std::path::PathBuf;

use clap::Args;

#[derive(Args)]
pub struct InputArgs {
  /// Project root containing `package.json`, defaults to the current directory.
  #[clap(long)]
  pub root: Option<PathBuf>,

  #[clap(long, action = clap::ArgAction::Append)]
  pub paths: Option<Vec<PathBuf>>,
}

#[derive(Args)]
pub struct OutputArgs {
  #[clap(long, short = 'd')]
  pub dest: Option<PathBuf>,

  #[clap(long)]
  pub source_root: Option<String>,

  /// Reuse and replace artifacts keyed by the checksum of their source.
  #[clap(long)]
  pub cache: bool,
}

#[derive(Args, Default)]
pub struct ComponentArgs {
  /// Leave installed packages out of components, the runtime fetches them separately.
  #[clap(long)]
  pub exclude_modules: bool,

  /// Compile left out packages in the background.
  #[clap(long)]
  pub precompile: bool,

  /// Program run for background jobs, defaults to this executable.
  #[clap(long)]
  pub worker: Option<PathBuf>,
}

#[derive(Args)]
pub struct EnhanceArgs {
  #[clap(long, short = 's', global = true)]
  pub silent: bool,
}
