// Region module.
// Adjacency graph construction and random contiguous partitioning of counties.

pub mod adjacency;
pub mod partition;

pub use adjacency::{ADJACENCY_EPSILON, AdjacencyGraph, compute_neighbors};
pub use partition::{Partition, partition};
