// Resolution of the installed package tree and of module files within a package.

mod resolver;
mod route_finder;

pub use crate::{
  resolver::{ResolvedProject, Resolver},
  route_finder::find_package,
};
