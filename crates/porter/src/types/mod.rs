pub mod bundle_output;

use std::sync::Arc;

use porter_common::NormalizedPackerOptions;
use porter_fs::OsFileSystem;
use porter_resolver::Resolver;

pub type SharedResolver = Arc<Resolver<OsFileSystem>>;
pub type SharedOptions = Arc<NormalizedPackerOptions>;
