//! Common graph generators.
//!
//! All generators produce symmetric neighbor lists by construction, so no
//! matrix validation pass is needed. `random_connected` is seeded: the same
//! seed always yields the same graph.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::Topology;

/// Path graph 0 - 1 - ... - (n-1).
#[must_use]
pub fn path(n: usize) -> Topology {
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n.saturating_sub(1) {
        neighbors[i].push(i + 1);
        neighbors[i + 1].push(i);
    }
    Topology::from_neighbor_lists(neighbors)
}

/// Ring graph: a path with the ends joined. Requires `n >= 3` to produce a
/// proper cycle; smaller inputs degrade to [`path`].
#[must_use]
pub fn ring(n: usize) -> Topology {
    if n < 3 {
        return path(n);
    }
    let neighbors = (0..n)
        .map(|i| {
            let mut nbrs = vec![(i + n - 1) % n, (i + 1) % n];
            nbrs.sort_unstable();
            nbrs
        })
        .collect();
    Topology::from_neighbor_lists(neighbors)
}

/// Complete graph: every pair of distinct nodes is adjacent.
#[must_use]
pub fn complete(n: usize) -> Topology {
    let neighbors = (0..n)
        .map(|i| (0..n).filter(|&j| j != i).collect())
        .collect();
    Topology::from_neighbor_lists(neighbors)
}

/// Random connected graph.
///
/// Starts from a random spanning tree (each node past the first attaches to
/// a uniformly chosen earlier node), then adds each remaining pair as an
/// edge with probability `extra_edge_probability`.
#[must_use]
pub fn random_connected(n: usize, extra_edge_probability: f64, seed: u64) -> Topology {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut edges = vec![vec![false; n]; n];

    for i in 1..n {
        let parent = rng.gen_range(0..i);
        edges[i][parent] = true;
        edges[parent][i] = true;
    }
    if extra_edge_probability > 0.0 {
        for i in 0..n {
            for j in (i + 1)..n {
                if !edges[i][j] && rng.gen_bool(extra_edge_probability.min(1.0)) {
                    edges[i][j] = true;
                    edges[j][i] = true;
                }
            }
        }
    }

    let neighbors = (0..n)
        .map(|i| (0..n).filter(|&j| edges[i][j]).collect())
        .collect();
    Topology::from_neighbor_lists(neighbors)
}
