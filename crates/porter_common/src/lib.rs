mod packer_options;
mod types;

pub use crate::{
  packer_options::{
    normalized_packer_options::NormalizedPackerOptions, PackerOptions, DEFAULT_DEST,
    DEFAULT_SEARCH_PATH,
  },
  types::{
    dependencies_map::{DependenciesMap, PackageNode},
    module_id::{split_package_specifier, ModuleId},
    output_asset::{AssetKind, OutputAsset},
    package_json::PackageJson,
    route::Route,
    source::Source,
    source_joiner::SourceJoiner,
  },
};
