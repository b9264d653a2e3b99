// Random contiguous partitioning.
// Grows regions from random seeds one adjacent county at a time until every county is assigned.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::index;
use serde::Serialize;
use tracing::debug;

use crate::error::{BotError, Result};

use super::adjacency::AdjacencyGraph;

/// An assignment of every county to exactly one connected region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    regions: Vec<BTreeSet<usize>>,
}

impl Partition {
    pub fn regions(&self) -> &[BTreeSet<usize>] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Region index for each county `0..county_count`, positionally aligned.
    pub fn assignments(&self, county_count: usize) -> Vec<Option<usize>> {
        let mut out = vec![None; county_count];
        for (region, members) in self.regions.iter().enumerate() {
            for &county in members {
                if let Some(slot) = out.get_mut(county) {
                    *slot = Some(region);
                }
            }
        }
        out
    }

    /// Sizes of each region, in region order.
    pub fn sizes(&self) -> Vec<usize> {
        self.regions.iter().map(BTreeSet::len).collect()
    }
}

/// Partition counties `0..county_count` into `n` connected regions.
///
/// `n` is clamped to `county_count`. Seeds are drawn uniformly without
/// replacement, then [`grow_from_seeds`] does the rest.
pub fn partition<R: Rng>(
    n: usize,
    adjacency: &AdjacencyGraph,
    county_count: usize,
    rng: &mut R,
) -> Result<Partition> {
    if county_count == 0 {
        return Ok(Partition {
            regions: Vec::new(),
        });
    }
    if n == 0 {
        return Err(BotError::InvalidRegionCount { requested: n });
    }

    let n = n.min(county_count);
    let seeds = index::sample(rng, county_count, n).into_vec();
    grow_from_seeds(&seeds, adjacency, county_count, rng)
}

/// Grow one region per seed until all counties are assigned.
///
/// Each step picks a region uniformly at random, gathers the unassigned
/// counties adjacent to it (its frontier), and moves one of them, chosen
/// uniformly, into the region. A region with an empty frontier can never
/// grow again, since its members are fixed and the unassigned set only
/// shrinks; once every region is in that state while counties remain, the
/// call fails with `PartitionStalled` rather than looping forever.
pub fn grow_from_seeds<R: Rng>(
    seeds: &[usize],
    adjacency: &AdjacencyGraph,
    county_count: usize,
    rng: &mut R,
) -> Result<Partition> {
    if seeds.is_empty() {
        return Err(BotError::InvalidRegionCount { requested: 0 });
    }

    let mut unassigned: BTreeSet<usize> = (0..county_count).collect();
    let mut regions = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        if !unassigned.remove(&seed) {
            return Err(BotError::InvalidSeed {
                index: seed,
                county_count,
            });
        }
        regions.push(BTreeSet::from([seed]));
    }

    let mut blocked = vec![false; regions.len()];
    let mut blocked_count = 0;
    let mut retries = 0usize;

    while !unassigned.is_empty() {
        let which = rng.gen_range(0..regions.len());

        let frontier: Vec<usize> = regions[which]
            .iter()
            .flat_map(|&county| adjacency.neighbors(county))
            .filter(|county| unassigned.contains(county))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if frontier.is_empty() {
            retries += 1;
            if !blocked[which] {
                blocked[which] = true;
                blocked_count += 1;
                if blocked_count == regions.len() {
                    return Err(BotError::PartitionStalled {
                        unassigned: unassigned.len(),
                    });
                }
            }
            continue;
        }

        let county = frontier[rng.gen_range(0..frontier.len())];
        unassigned.remove(&county);
        regions[which].insert(county);
    }

    let partition = Partition { regions };
    debug!(
        regions = partition.len(),
        retries,
        sizes = ?partition.sizes(),
        "partitioned counties"
    );
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const COUNT: usize = 58;

    /// 58 nodes on a 10-wide grid with 4-neighborhoods, standing in for the counties.
    fn grid_graph() -> AdjacencyGraph {
        let width = 10;
        let mut edges = Vec::new();
        for i in 0..COUNT {
            if (i + 1) % width != 0 && i + 1 < COUNT {
                edges.push((i, i + 1));
            }
            if i + width < COUNT {
                edges.push((i, i + width));
            }
        }
        AdjacencyGraph::from_edges(edges)
    }

    fn path_graph() -> AdjacencyGraph {
        AdjacencyGraph::from_edges([(0, 1), (1, 2), (2, 3), (3, 4)])
    }

    fn assert_valid(partition: &Partition, graph: &AdjacencyGraph, n: usize, count: usize) {
        assert_eq!(partition.len(), n);

        let mut seen = BTreeSet::new();
        for region in partition.regions() {
            assert!(!region.is_empty());
            assert!(graph.is_connected_subset(region), "disconnected {:?}", region);
            for &county in region {
                assert!(seen.insert(county), "county {} assigned twice", county);
            }
        }
        assert_eq!(seen, (0..count).collect());
    }

    #[test]
    fn test_every_region_count_is_valid() {
        let graph = grid_graph();
        assert!(graph.is_connected(COUNT));

        for n in 1..=COUNT {
            for seed in 0..3 {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let result = partition(n, &graph, COUNT, &mut rng).unwrap();
                assert_valid(&result, &graph, n, COUNT);
            }
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let graph = grid_graph();

        let first = partition(9, &graph, COUNT, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let second = partition(9, &graph, COUNT, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_seeded_growth_is_pinned() {
        let graph = grid_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = grow_from_seeds(&[0, 27, 57], &graph, COUNT, &mut rng).unwrap();

        let expected: Vec<BTreeSet<usize>> = vec![
            BTreeSet::from([
                0, 1, 2, 10, 11, 12, 20, 21, 22, 23, 30, 31, 33, 34, 40, 43, 50, 51,
            ]),
            BTreeSet::from([6, 7, 8, 9, 16, 17, 18, 19, 27, 28, 29, 39, 48, 49]),
            BTreeSet::from([
                3, 4, 5, 13, 14, 15, 24, 25, 26, 32, 35, 36, 37, 38, 41, 42, 44, 45, 46, 47, 52,
                53, 54, 55, 56, 57,
            ]),
        ];
        assert_eq!(result.regions(), expected.as_slice());
        assert_eq!(result.sizes(), vec![18, 14, 26]);
    }

    #[test]
    fn test_path_graph_splits_into_subpaths() {
        let graph = path_graph();

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = grow_from_seeds(&[0, 4], &graph, 5, &mut rng).unwrap();
            assert_valid(&result, &graph, 2, 5);

            let left = &result.regions()[0];
            let right = &result.regions()[1];
            let cut = left.len();
            assert!((1..=4).contains(&cut));
            assert_eq!(*left, (0..cut).collect());
            assert_eq!(*right, (cut..5).collect());
        }
    }

    #[test]
    fn test_region_count_boundaries() {
        let graph = grid_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let singletons = partition(COUNT, &graph, COUNT, &mut rng).unwrap();
        assert!(singletons.regions().iter().all(|r| r.len() == 1));

        let whole = partition(1, &graph, COUNT, &mut rng).unwrap();
        assert_eq!(whole.sizes(), vec![COUNT]);

        let clamped = partition(COUNT + 10, &graph, COUNT, &mut rng).unwrap();
        assert_eq!(clamped.len(), COUNT);
    }

    #[test]
    fn test_zero_regions_rejected() {
        let graph = path_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(matches!(
            partition(0, &graph, 5, &mut rng),
            Err(BotError::InvalidRegionCount { requested: 0 })
        ));
        assert!(partition(0, &graph, 0, &mut rng).unwrap().regions().is_empty());
    }

    #[test]
    fn test_invalid_seeds_rejected() {
        let graph = path_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(matches!(
            grow_from_seeds(&[1, 1], &graph, 5, &mut rng),
            Err(BotError::InvalidSeed { index: 1, .. })
        ));
        assert!(matches!(
            grow_from_seeds(&[7], &graph, 5, &mut rng),
            Err(BotError::InvalidSeed { index: 7, .. })
        ));
    }

    #[test]
    fn test_unreachable_counties_stall_instead_of_hanging() {
        // Two components: {0, 1} and {2, 3}.
        let graph = AdjacencyGraph::from_edges([(0, 1), (2, 3)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let result = grow_from_seeds(&[0, 1], &graph, 4, &mut rng);
        assert!(matches!(
            result,
            Err(BotError::PartitionStalled { unassigned: 2 })
        ));

        // A seed in each component finishes normally.
        let result = grow_from_seeds(&[0, 3], &graph, 4, &mut rng).unwrap();
        assert_valid(&result, &graph, 2, 4);
    }

    #[test]
    fn test_county_without_entry_has_no_neighbors() {
        // County 2 never appears in the adjacency list.
        let graph = AdjacencyGraph::from_edges([(0, 1)]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let result = grow_from_seeds(&[0, 2], &graph, 3, &mut rng).unwrap();
        assert_eq!(result.regions()[1], BTreeSet::from([2]));

        assert!(matches!(
            grow_from_seeds(&[0], &graph, 3, &mut rng),
            Err(BotError::PartitionStalled { unassigned: 1 })
        ));
    }

    #[test]
    fn test_assignments_align_with_counties() {
        let graph = path_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let result = grow_from_seeds(&[0, 4], &graph, 5, &mut rng).unwrap();
        let assignments = result.assignments(5);

        assert_eq!(assignments.len(), 5);
        assert_eq!(assignments[0], Some(0));
        assert_eq!(assignments[4], Some(1));
        for (region, members) in result.regions().iter().enumerate() {
            for &county in members {
                assert_eq!(assignments[county], Some(region));
            }
        }
    }
}
