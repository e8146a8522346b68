//! Greedy seed clustering
//!
//! Each unprocessed point, in input order, seeds a cluster. One pass over the
//! remaining unprocessed points adds every point sharing at least two
//! entities with the seed itself (not with the growing cluster). Membership is
//! therefore non-transitive and depends on input order.

use sigwatch_core::DataPoint;

/// Entities a point must share with the seed to join its cluster
pub const MIN_SHARED_ENTITIES: usize = 2;

/// Cluster points, keeping clusters of at least `min_size` points
pub fn cluster_points(points: &[DataPoint], min_size: usize) -> Vec<Vec<DataPoint>> {
    let mut processed = vec![false; points.len()];
    let mut clusters = Vec::new();

    for (i, seed) in points.iter().enumerate() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let mut cluster = vec![seed.clone()];
        for (j, candidate) in points.iter().enumerate().skip(i + 1) {
            if processed[j] {
                continue;
            }
            if seed.shared_entities(candidate) >= MIN_SHARED_ENTITIES {
                processed[j] = true;
                cluster.push(candidate.clone());
            }
        }

        if cluster.len() >= min_size {
            clusters.push(cluster);
        }
    }

    clusters
}
