// Cache module for memoizing expensive results on the local filesystem.
// Stores fetched county geometry and the derived adjacency list between runs.

pub mod paths;
pub mod store;

pub use paths::{COUNTIES_FILENAME, NEIGHBORS_FILENAME, default_cache_dir, map_path};
pub use store::{DiskCache, OnCorruption};
