// Cache path utilities.
// Resolves the cache directory and the fixed file names of each cached dataset.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Cached county geometries, one multipolygon per county index.
pub const COUNTIES_FILENAME: &str = "counties.json";

/// Cached adjacency list derived from the county geometries.
pub const NEIGHBORS_FILENAME: &str = "neighbors.json";

/// Rendered map uploaded by a posting run.
pub const MAP_FILENAME: &str = "map.png";

/// Get the platform cache directory (~/.cache/californias on Linux).
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "californias").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path the map image is rendered to before upload.
pub fn map_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(MAP_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path() {
        let dir = Path::new("/tmp/californias");
        assert!(map_path(dir).ends_with("californias/map.png"));
    }

    #[test]
    fn test_default_cache_dir_is_namespaced() {
        if let Some(dir) = default_cache_dir() {
            assert!(dir.to_string_lossy().contains("californias"));
        }
    }
}
