// A single bot run.
// Loads cached geometry, partitions the counties, renders the map, and prints or posts it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use geo::MultiPolygon;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Triangular};
use tracing::{debug, info, warn};

use crate::cache::{COUNTIES_FILENAME, DiskCache, NEIGHBORS_FILENAME, map_path};
use crate::config::{BotConfig, MapConfig};
use crate::counties::{COUNTIES, COUNTY_COUNT, NominatimClient};
use crate::error::{BotError, Result};
use crate::mastodon::{Media, MastodonClient};
use crate::region::{AdjacencyGraph, Partition, compute_neighbors, partition};
use crate::render::{Palette, holiday_colors, image_description, post_text, project, render_map};

/// Per-invocation options from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Render and print instead of posting.
    pub dry_run: bool,
    /// Seed for every random choice in the run.
    pub seed: Option<u64>,
    /// Force the region count instead of sampling it.
    pub regions: Option<usize>,
    /// Where a dry run writes the image.
    pub output: PathBuf,
}

/// A rendered map ready to print or post.
#[derive(Debug, Clone)]
pub struct MapPost {
    pub text: String,
    pub description: String,
    pub image_path: PathBuf,
    pub partition: Partition,
}

/// Sample a region count in `[1, max]`, skewed towards small counts.
///
/// Draws from a triangular distribution on `[2, max + 1]` with mode 2 and
/// rounds down, so 2 is the most likely count and `max` the least.
pub fn choose_region_count<R: Rng>(max: usize, rng: &mut R) -> usize {
    if max <= 2 {
        return max.max(1);
    }

    let upper = max as f64 + 1.0;
    match Triangular::new(2.0, upper, 2.0) {
        Ok(dist) => (dist.sample(rng).floor() as usize).clamp(1, max),
        Err(_) => max,
    }
}

/// Fetch (or load) county geometry and its adjacency list through the cache.
pub async fn load_geometry(
    config: &BotConfig,
    cache: &DiskCache,
) -> Result<(Vec<MultiPolygon<f64>>, AdjacencyGraph)> {
    let shapes: Vec<MultiPolygon<f64>> = cache
        .get_or_fetch(COUNTIES_FILENAME, || async move {
            let client = NominatimClient::new(
                &config.geodata.endpoint,
                Duration::from_millis(config.geodata.request_interval_ms),
            )?;
            client.fetch_counties(&COUNTIES).await
        })
        .await?;

    if shapes.len() != COUNTY_COUNT {
        return Err(BotError::CacheCorrupt {
            path: cache.path_for(COUNTIES_FILENAME),
            reason: format!("expected {} counties, found {}", COUNTY_COUNT, shapes.len()),
        });
    }

    let neighbors = cache.get_or_compute(NEIGHBORS_FILENAME, || {
        Ok(compute_neighbors(&shapes, config.map.adjacency_epsilon))
    })?;

    if !neighbors.is_connected(COUNTY_COUNT) {
        warn!(
            edges = neighbors.edge_count(),
            "county adjacency graph is disconnected; partitioning may stall"
        );
    }

    Ok((shapes, neighbors))
}

/// Partition, colour, and render one map to `image_path`.
pub fn make_map<R: Rng>(
    shapes: &[MultiPolygon<f64>],
    neighbors: &AdjacencyGraph,
    n_regions: usize,
    palette: &Palette,
    map: &MapConfig,
    image_path: &Path,
    rng: &mut R,
) -> Result<MapPost> {
    let n_regions = n_regions.min(shapes.len()).min(palette.len());
    let partition = partition(n_regions, neighbors, shapes.len(), rng)?;
    info!(regions = partition.len(), sizes = ?partition.sizes(), "partitioned counties");

    let colors = palette.sample(partition.len(), rng);
    let fills: Vec<_> = partition
        .assignments(shapes.len())
        .into_iter()
        .map(|region| region.and_then(|r| colors.get(r).copied()))
        .collect();

    render_map(image_path, &project(shapes), &fills, map.width, map.height)?;

    Ok(MapPost {
        text: post_text(partition.len()),
        description: image_description(partition.len(), palette.keywords.as_deref()),
        image_path: image_path.to_path_buf(),
        partition,
    })
}

/// Run the bot once.
pub async fn run(config: &BotConfig, options: &RunOptions) -> Result<()> {
    // Fail on missing credentials before any network or rendering work.
    let credentials = if options.dry_run {
        None
    } else {
        Some(config.posting_credentials()?)
    };

    let mut rng = match options.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let palette = holiday_colors(Local::now().date_naive());
    if let Some(keywords) = &palette.keywords {
        info!(?keywords, colors = palette.len(), "using holiday palette");
    }

    if palette.is_empty() {
        return Err(BotError::InvalidRegionCount { requested: 0 });
    }
    let max_regions = COUNTY_COUNT.min(palette.len());
    let n_regions = match options.regions {
        Some(n) => n,
        None => choose_region_count(max_regions, &mut rng),
    };

    let cache = DiskCache::new(config.cache_dir(), config.corruption_policy());
    let (shapes, neighbors) = load_geometry(config, &cache).await?;

    let image_path = if options.dry_run {
        options.output.clone()
    } else {
        map_path(cache.dir())
    };
    let post = make_map(
        &shapes,
        &neighbors,
        n_regions,
        &palette,
        &config.map,
        &image_path,
        &mut rng,
    )?;
    for (i, region) in post.partition.regions().iter().enumerate() {
        let counties: Vec<_> = region.iter().filter_map(|&c| COUNTIES.get(c)).collect();
        debug!(region = i, ?counties, "region members");
    }

    match credentials {
        None => {
            println!("Text: {:?}", post.text);
            println!("Image description: {:?}", post.description);
            println!("Map saved to {}", post.image_path.display());
        }
        Some(credentials) => {
            let mut client = MastodonClient::new(&credentials.server)?;
            client
                .log_in(
                    &credentials.client,
                    &credentials.username,
                    &credentials.password,
                )
                .await?;

            let media = Media {
                buf: fs::read(&post.image_path)?,
                mime_type: "image/png".to_string(),
                description: post.description.clone(),
            };
            client.make_post(&post.text, &[media]).await?;
        }
    }

    Ok(())
}
