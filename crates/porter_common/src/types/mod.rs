pub mod dependencies_map;
pub mod module_id;
pub mod output_asset;
pub mod package_json;
pub mod route;
pub mod source;
pub mod source_joiner;
