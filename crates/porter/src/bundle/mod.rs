mod session;
mod unit;

pub use self::{
  session::{BundleSession, LoadedModule, PackageScope},
  unit::{BundleUnit, ModuleDefinition},
};
