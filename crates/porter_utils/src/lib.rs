pub mod collections;
pub mod path_ext;
pub mod xxhash;
