//! Validated adjacency matrices.

use std::collections::VecDeque;

use thiserror::Error;

/// Errors raised while validating an adjacency matrix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A row's length does not match the node count.
    #[error("matrix is not square: row {row} has {found} entries, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A diagonal entry is non-zero.
    #[error("node {node} lists itself as a neighbor")]
    SelfLoop { node: usize },

    /// The matrix is not symmetric.
    #[error("edge {a}->{b} has no mirror {b}->{a}")]
    NotSymmetric { a: usize, b: usize },
}

/// A fixed undirected communication graph.
///
/// Stores the neighbor list of every node, derived once from the input
/// matrix. Neighbor lists are sorted, so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topology {
    neighbors: Vec<Vec<usize>>,
}

impl Topology {
    /// Build a topology from a square, symmetric 0/1 matrix.
    ///
    /// Any non-zero entry counts as an edge. Connectivity is *not* checked
    /// here; see [`Topology::is_connected`].
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Result<Self, TopologyError> {
        let n = matrix.len();
        for (row, entries) in matrix.iter().enumerate() {
            if entries.len() != n {
                return Err(TopologyError::NotSquare {
                    row,
                    expected: n,
                    found: entries.len(),
                });
            }
        }
        for (i, entries) in matrix.iter().enumerate() {
            if entries[i] != 0 {
                return Err(TopologyError::SelfLoop { node: i });
            }
            for (j, &connected) in entries.iter().enumerate() {
                if connected != 0 && matrix[j][i] == 0 {
                    return Err(TopologyError::NotSymmetric { a: i, b: j });
                }
            }
        }

        let neighbors = matrix
            .iter()
            .map(|entries| {
                entries
                    .iter()
                    .enumerate()
                    .filter(|(_, &connected)| connected != 0)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        Ok(Self { neighbors })
    }

    /// Build directly from pre-validated neighbor lists.
    ///
    /// Used by the generators in this crate, which construct symmetric
    /// lists by design.
    pub(crate) fn from_neighbor_lists(neighbors: Vec<Vec<usize>>) -> Self {
        Self { neighbors }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbors of `node`, sorted ascending.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }

    /// Degree of `node`.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors[node].len()
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Whether an undirected edge exists between `a` and `b`.
    #[must_use]
    pub fn contains_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Reconstruct the 0/1 matrix form (for display and export).
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        let n = self.node_count();
        let mut matrix = vec![vec![0u8; n]; n];
        for (i, nbrs) in self.neighbors.iter().enumerate() {
            for &j in nbrs {
                matrix[i][j] = 1;
            }
        }
        matrix
    }

    /// Whether every node can reach every other node.
    ///
    /// Graphs with zero or one node are trivially connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n <= 1 {
            return true;
        }
        self.bfs_distances(0).iter().all(|d| d.is_some())
    }

    /// Longest shortest path in the graph.
    ///
    /// Returns `None` for disconnected graphs, `Some(0)` for a single node.
    #[must_use]
    pub fn diameter(&self) -> Option<usize> {
        let n = self.node_count();
        if n == 0 {
            return None;
        }
        let mut diameter = 0;
        for start in 0..n {
            let distances = self.bfs_distances(start);
            for d in distances {
                diameter = diameter.max(d?);
            }
        }
        Some(diameter)
    }

    /// BFS distances from `start`; `None` for unreachable nodes.
    fn bfs_distances(&self, start: usize) -> Vec<Option<usize>> {
        let n = self.node_count();
        let mut distances = vec![None; n];
        let mut queue = VecDeque::new();
        distances[start] = Some(0);
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            let next = distances[node].unwrap_or(0) + 1;
            for &nbr in &self.neighbors[node] {
                if distances[nbr].is_none() {
                    distances[nbr] = Some(next);
                    queue.push_back(nbr);
                }
            }
        }
        distances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_matrix(n: usize) -> Vec<Vec<u8>> {
        let mut matrix = vec![vec![0u8; n]; n];
        for i in 0..n.saturating_sub(1) {
            matrix[i][i + 1] = 1;
            matrix[i + 1][i] = 1;
        }
        matrix
    }

    #[test]
    fn accepts_valid_path_matrix() {
        let topo = Topology::from_matrix(&path_matrix(5)).unwrap();
        assert_eq!(topo.node_count(), 5);
        assert_eq!(topo.edge_count(), 4);
        assert_eq!(topo.neighbors(0), &[1]);
        assert_eq!(topo.neighbors(2), &[1, 3]);
        assert!(topo.contains_edge(3, 4));
        assert!(!topo.contains_edge(0, 4));
    }

    #[test]
    fn rejects_non_square() {
        let matrix = vec![vec![0, 1], vec![1, 0, 0]];
        assert_eq!(
            Topology::from_matrix(&matrix),
            Err(TopologyError::NotSquare {
                row: 1,
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn rejects_self_loop() {
        let matrix = vec![vec![1, 0], vec![0, 0]];
        assert_eq!(
            Topology::from_matrix(&matrix),
            Err(TopologyError::SelfLoop { node: 0 })
        );
    }

    #[test]
    fn rejects_asymmetric() {
        let matrix = vec![vec![0, 1], vec![0, 0]];
        assert_eq!(
            Topology::from_matrix(&matrix),
            Err(TopologyError::NotSymmetric { a: 0, b: 1 })
        );
    }

    #[test]
    fn detects_disconnection() {
        // Two components: {0,1} and {2,3}
        let matrix = vec![
            vec![0, 1, 0, 0],
            vec![1, 0, 0, 0],
            vec![0, 0, 0, 1],
            vec![0, 0, 1, 0],
        ];
        let topo = Topology::from_matrix(&matrix).unwrap();
        assert!(!topo.is_connected());
        assert_eq!(topo.diameter(), None);
    }

    #[test]
    fn matrix_roundtrip() {
        let matrix = path_matrix(4);
        let topo = Topology::from_matrix(&matrix).unwrap();
        assert_eq!(topo.to_matrix(), matrix);
    }

    #[test]
    fn single_node_is_connected() {
        let topo = Topology::from_matrix(&[vec![0]]).unwrap();
        assert!(topo.is_connected());
        assert_eq!(topo.diameter(), Some(0));
        assert_eq!(topo.degree(0), 0);
    }
}
