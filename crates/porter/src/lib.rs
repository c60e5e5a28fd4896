mod bundle;
mod cache;
mod packer;
mod precompile;
mod types;
mod utils;

pub use crate::{
  bundle::{BundleSession, BundleUnit, LoadedModule, ModuleDefinition, PackageScope},
  cache::ContentAddressedCache,
  packer::Packer,
  precompile::{JobRunner, PrecompileJob, PrecompileScheduler, ProcessRunner},
  types::bundle_output::BundleOutput,
};
pub use porter_common::*;
pub use porter_error::{BuildError, BuildResult, CompileError};
pub use porter_resolver::ResolvedProject;
