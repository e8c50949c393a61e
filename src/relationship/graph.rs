//! Directed table graph for circular-dependency detection
//!
//! Nodes are table identities, edges are relationships collapsed to their
//! ordered table pair. Several relationships between the same pair count
//! once for reachability but are tracked by multiplicity so that removing
//! one of them keeps the edge alive.
//!
//! A proposed edge A→B closes a cycle iff A is reachable from B.
//! Each query is an iterative depth-first search: O(V+E).

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use super::types::Relationship;

/// Reachability structure over table-to-table edges
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    /// source -> (target -> number of relationships)
    adjacency: HashMap<Uuid, BTreeMap<Uuid, usize>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from a set of relationships
    pub fn from_relationships<'a>(relationships: impl IntoIterator<Item = &'a Relationship>) -> Self {
        Self::from_edges(relationships.into_iter().map(Relationship::edge))
    }

    /// Builds the graph from raw (source, target) pairs
    pub fn from_edges(edges: impl IntoIterator<Item = (Uuid, Uuid)>) -> Self {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.insert_edge(from, to);
        }
        graph
    }

    /// Adds one relationship's worth of edge
    pub fn insert_edge(&mut self, from: Uuid, to: Uuid) {
        *self.adjacency.entry(from).or_default().entry(to).or_insert(0) += 1;
    }

    /// Removes one relationship's worth of edge.
    ///
    /// Returns false if no such edge was present.
    pub fn remove_edge(&mut self, from: Uuid, to: Uuid) -> bool {
        let Some(targets) = self.adjacency.get_mut(&from) else {
            return false;
        };
        let Some(count) = targets.get_mut(&to) else {
            return false;
        };

        *count -= 1;
        if *count == 0 {
            targets.remove(&to);
        }
        if targets.is_empty() {
            self.adjacency.remove(&from);
        }
        true
    }

    /// True if at least one relationship connects `from` to `to` directly
    pub fn has_edge(&self, from: Uuid, to: Uuid) -> bool {
        self.adjacency
            .get(&from)
            .is_some_and(|targets| targets.contains_key(&to))
    }

    /// Number of distinct structural edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum()
    }

    /// True if `to` can be reached from `from` along existing edges.
    ///
    /// A node reaches itself.
    pub fn reaches(&self, from: Uuid, to: Uuid) -> bool {
        self.path(from, to).is_some()
    }

    /// Would adding `from → to` close a cycle?
    pub fn would_create_cycle(&self, from: Uuid, to: Uuid) -> bool {
        self.reaches(to, from)
    }

    /// One path from `from` to `to` (inclusive), if any.
    ///
    /// Neighbors are visited in identity order so the result is stable.
    pub fn path(&self, from: Uuid, to: Uuid) -> Option<Vec<Uuid>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: HashMap<Uuid, Uuid> = HashMap::new();
        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut stack = vec![from];
        visited.insert(from);

        while let Some(node) = stack.pop() {
            let Some(targets) = self.adjacency.get(&node) else {
                continue;
            };
            for &next in targets.keys().rev() {
                if !visited.insert(next) {
                    continue;
                }
                parent.insert(next, node);
                if next == to {
                    return Some(unwind(&parent, from, to));
                }
                stack.push(next);
            }
        }

        None
    }

    /// The cycle `from → to` would close, starting and ending at `from`
    pub fn cycle_through(&self, from: Uuid, to: Uuid) -> Option<Vec<Uuid>> {
        let mut cycle = vec![from];
        cycle.extend(self.path(to, from)?);
        Some(cycle)
    }
}

fn unwind(parent: &HashMap<Uuid, Uuid>, from: Uuid, to: Uuid) -> Vec<Uuid> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        match parent.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_empty_graph_has_no_cycles() {
        let t = ids(2);
        let graph = RelationshipGraph::new();
        assert!(!graph.would_create_cycle(t[0], t[1]));
        assert!(graph.reaches(t[0], t[0]));
    }

    #[test]
    fn test_two_cycle_detected() {
        let t = ids(2);
        let graph = RelationshipGraph::from_edges([(t[0], t[1])]);
        assert!(graph.would_create_cycle(t[1], t[0]));
        assert!(!graph.would_create_cycle(t[0], t[1]));
    }

    #[test]
    fn test_transitive_cycle_detected() {
        let t = ids(4);
        let (a, b, c, d) = (t[0], t[1], t[2], t[3]);
        let graph = RelationshipGraph::from_edges([(a, b), (b, c)]);

        assert!(graph.would_create_cycle(c, a));
        assert!(!graph.would_create_cycle(c, d));
        assert_eq!(graph.cycle_through(c, a), Some(vec![c, a, b, c]));
    }

    #[test]
    fn test_self_edge_is_a_cycle() {
        let t = ids(1);
        assert!(RelationshipGraph::new().would_create_cycle(t[0], t[0]));
    }

    #[test]
    fn test_parallel_edges_counted_once_structurally() {
        let t = ids(2);
        let mut graph = RelationshipGraph::from_edges([(t[0], t[1]), (t[0], t[1])]);
        assert_eq!(graph.edge_count(), 1);

        assert!(graph.remove_edge(t[0], t[1]));
        assert!(graph.has_edge(t[0], t[1]));

        assert!(graph.remove_edge(t[0], t[1]));
        assert!(!graph.has_edge(t[0], t[1]));
        assert!(!graph.remove_edge(t[0], t[1]));
    }

    #[test]
    fn test_incremental_matches_rebuild() {
        let t = ids(5);
        let edges = [(t[0], t[1]), (t[1], t[2]), (t[2], t[3]), (t[3], t[4])];

        let mut incremental = RelationshipGraph::new();
        for (from, to) in edges {
            incremental.insert_edge(from, to);
        }
        incremental.remove_edge(t[2], t[3]);

        let rebuilt = RelationshipGraph::from_edges([edges[0], edges[1], edges[3]]);

        for &x in &t {
            for &y in &t {
                assert_eq!(incremental.would_create_cycle(x, y), rebuilt.would_create_cycle(x, y));
            }
        }
    }

    #[test]
    fn test_path_on_diamond() {
        let t = ids(4);
        let graph = RelationshipGraph::from_edges([(t[0], t[1]), (t[0], t[2]), (t[1], t[3]), (t[2], t[3])]);
        let path = graph.path(t[0], t[3]).unwrap();
        assert_eq!(path.first(), Some(&t[0]));
        assert_eq!(path.last(), Some(&t[3]));
        assert_eq!(path.len(), 3);
        assert!(graph.path(t[3], t[0]).is_none());
    }
}
