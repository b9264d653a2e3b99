// County adjacency graph.
// Builds the symmetric neighbor relation from pairwise boundary distances.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use geo::{EuclideanDistance, MultiPolygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Two counties closer than this are neighbors.
///
/// Measured in the units of the input geometry, which must be EPSG:4326
/// longitude/latitude degrees as returned by Nominatim. 0.001° is roughly
/// 90-110 m at California's latitudes, enough to absorb slivers between
/// boundaries digitized separately. Projected input needs a different value.
pub const ADJACENCY_EPSILON: f64 = 0.001;

/// Symmetric adjacency list keyed by county index.
///
/// A county with no entry has no neighbors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjacencyGraph {
    neighbors: BTreeMap<usize, BTreeSet<usize>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from undirected edges. Self-loops are dropped.
    pub fn from_edges<I: IntoIterator<Item = (usize, usize)>>(edges: I) -> Self {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    /// Record `a` and `b` as neighbors of each other.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.neighbors.entry(a).or_default().insert(b);
        self.neighbors.entry(b).or_default().insert(a);
    }

    /// Neighbors of `county`, in ascending order.
    pub fn neighbors(&self, county: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors
            .get(&county)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Whether `members` induces a connected subgraph.
    ///
    /// The empty set counts as connected.
    pub fn is_connected_subset(&self, members: &BTreeSet<usize>) -> bool {
        let Some(&start) = members.first() else {
            return true;
        };

        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(county) = queue.pop_front() {
            for next in self.neighbors(county) {
                if members.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        seen.len() == members.len()
    }

    /// Whether counties `0..county_count` form one connected component.
    pub fn is_connected(&self, county_count: usize) -> bool {
        self.is_connected_subset(&(0..county_count).collect())
    }
}

/// Smallest distance between any part of `a` and any part of `b`.
///
/// Empty shapes are infinitely far from everything.
pub fn shape_distance(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    a.iter()
        .flat_map(|pa| b.iter().map(move |pb| pa.euclidean_distance(pb)))
        .fold(f64::INFINITY, f64::min)
}

/// Compute which shapes are neighbors: every pair closer than `epsilon`.
pub fn compute_neighbors(shapes: &[MultiPolygon<f64>], epsilon: f64) -> AdjacencyGraph {
    let pairs = (0..shapes.len()).flat_map(|i| (0..i).map(move |j| (i, j)));
    let graph = AdjacencyGraph::from_edges(
        pairs.filter(|&(i, j)| shape_distance(&shapes[i], &shapes[j]) < epsilon),
    );

    debug!(
        shapes = shapes.len(),
        edges = graph.edge_count(),
        "computed adjacency"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord};

    fn has_edge(graph: &AdjacencyGraph, a: usize, b: usize) -> bool {
        graph.neighbors(a).any(|n| n == b)
    }

    /// Axis-aligned square with its lower-left corner at (x, y).
    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        let rect = Rect::new(coord! { x: x, y: y }, coord! { x: x + size, y: y + size });
        MultiPolygon::new(vec![rect.to_polygon()])
    }

    #[test]
    fn test_touching_shapes_are_neighbors() {
        let shapes = vec![
            square(0.0, 0.0, 1.0),
            square(1.0, 0.0, 1.0),
            square(3.0, 0.0, 1.0),
        ];

        let graph = compute_neighbors(&shapes, ADJACENCY_EPSILON);

        assert!(has_edge(&graph, 0, 1));
        assert!(has_edge(&graph, 1, 0));
        assert!(!has_edge(&graph, 1, 2));
        assert_eq!(graph.neighbors(2).count(), 0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_epsilon_threshold() {
        let shapes = vec![
            square(0.0, 0.0, 1.0),
            square(1.0005, 0.0, 1.0),
            square(-1.002, 0.0, 1.0),
        ];

        let graph = compute_neighbors(&shapes, ADJACENCY_EPSILON);

        assert!(has_edge(&graph, 0, 1));
        assert!(!has_edge(&graph, 0, 2));
    }

    #[test]
    fn test_grid_is_symmetric_without_self_loops() {
        let mut shapes = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                shapes.push(square(col as f64, row as f64, 1.0));
            }
        }

        let graph = compute_neighbors(&shapes, ADJACENCY_EPSILON);

        for i in 0..shapes.len() {
            assert!(!has_edge(&graph, i, i));
            for j in graph.neighbors(i) {
                assert!(has_edge(&graph, j, i), "{} -> {} not mirrored", i, j);
            }
        }
        // Centre square touches every other square, corners included.
        assert_eq!(graph.neighbors(4).count(), 8);
        assert!(graph.is_connected(shapes.len()));
    }

    #[test]
    fn test_multipolygon_distance_uses_closest_part() {
        let island = square(10.0, 10.0, 1.0);
        let mut mainland = square(0.0, 0.0, 1.0);
        mainland.0.extend(square(9.0, 10.0, 1.0).0);

        assert_eq!(shape_distance(&mainland, &island), 0.0);
        assert_eq!(
            shape_distance(&MultiPolygon::new(Vec::new()), &island),
            f64::INFINITY
        );
    }

    #[test]
    fn test_connected_subset() {
        let graph = AdjacencyGraph::from_edges([(0, 1), (1, 2), (2, 3), (3, 3)]);

        assert!(!has_edge(&graph, 3, 3));
        assert!(graph.is_connected_subset(&BTreeSet::from([0, 1, 2])));
        assert!(!graph.is_connected_subset(&BTreeSet::from([0, 2])));
        assert!(graph.is_connected_subset(&BTreeSet::new()));
        assert!(!graph.is_connected(5));
    }

    #[test]
    fn test_serde_roundtrip_preserves_graph() {
        let graph = AdjacencyGraph::from_edges([(0, 1), (1, 2), (5, 0)]);

        let json = serde_json::to_string(&graph).unwrap();
        let back: AdjacencyGraph = serde_json::from_str(&json).unwrap();

        assert_eq!(back, graph);
    }
}
