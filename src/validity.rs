//! Constraints a candidate partition must satisfy before it can be accepted.

use std::collections::{BTreeSet, VecDeque};

use anyhow::Result;

use crate::partition::Partition;

/// A single validity predicate.
pub enum Constraint {
    /// Every non-empty district induces a connected subgraph.
    Contiguous,
    /// Same predicate as [`Constraint::Contiguous`], but when the partition
    /// differs from its parent by exactly one node the check is local to the
    /// flipped node's neighborhood. Falls back to the full check otherwise.
    SingleFlipContiguous,
    /// Every district of the root assignment still has at least one node.
    NoVanishingDistricts,
    /// A user-supplied predicate. An `Err` aborts the chain step.
    Custom(Box<dyn Fn(&Partition) -> Result<bool>>),
}

impl Constraint {
    pub fn check(&self, partition: &Partition) -> Result<bool> {
        match self {
            Self::Contiguous => Ok(contiguous(partition)),
            Self::SingleFlipContiguous => Ok(single_flip_contiguous(partition)),
            Self::NoVanishingDistricts => Ok(no_vanishing_districts(partition)),
            Self::Custom(predicate) => predicate(partition),
        }
    }
}

/// An ordered conjunction of constraints.
pub struct Validator {
    constraints: Vec<Constraint>,
}

impl Validator {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self { constraints }
    }

    /// Accepts every partition.
    pub fn empty() -> Self {
        Self { constraints: Vec::new() }
    }

    /// Short-circuit AND over the constraints, in order. The first failing
    /// constraint stops the scan; a predicate error propagates.
    pub fn is_valid(&self, partition: &Partition) -> Result<bool> {
        for constraint in &self.constraints {
            if !constraint.check(partition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// BFS over one district's induced subgraph, starting anywhere inside it.
fn district_is_connected(partition: &Partition, district: u32, nodes: &BTreeSet<usize>) -> bool {
    let Some(&start) = nodes.iter().next() else { return true };

    let mut visited = vec![false; partition.graph().node_count()];
    visited[start] = true;
    let mut seen = 1;
    let mut queue = VecDeque::from([start]);
    while let Some(u) = queue.pop_front() {
        for v in partition.graph().neighbors(u) {
            if !visited[v] && partition.assignment(v) == district {
                visited[v] = true;
                seen += 1;
                queue.push_back(v);
            }
        }
    }
    seen == nodes.len()
}

fn contiguous(partition: &Partition) -> bool {
    partition.parts().iter().all(|(&district, nodes)| district_is_connected(partition, district, nodes))
}

/// Local contiguity check for a partition one flip away from its parent.
///
/// The flip is already applied, so the flipped node sits in its new district
/// and has left the old one. The new district stays connected iff the node
/// touches it (or is its only member); the old district stays connected iff
/// the node's former same-district neighbors remain mutually reachable.
fn single_flip_contiguous(partition: &Partition) -> bool {
    if !partition.is_single_flip() {
        return contiguous(partition);
    }
    let (node, prev) = partition.prior()[0];
    let district = partition.assignment(node);

    if !partition.graph().neighbors(node).any(|v| partition.assignment(v) == district)
        && partition.parts()[&district].len() > 1
    {
        return false;
    }

    let neighbors = partition.graph().neighbors(node)
        .filter(|&v| partition.assignment(v) == prev)
        .collect::<Vec<_>>();
    if neighbors.len() <= 1 {
        return true;
    }

    // BFS within the old district from one former neighbor; the flipped node
    // is already outside it, so no node needs to be forbidden.
    let mut visited = vec![false; partition.graph().node_count()];
    visited[neighbors[0]] = true;
    let mut queue = VecDeque::from([neighbors[0]]);
    while let Some(u) = queue.pop_front() {
        for v in partition.graph().neighbors(u) {
            if !visited[v] && partition.assignment(v) == prev {
                visited[v] = true;
                queue.push_back(v);
            }
        }
    }
    neighbors.iter().all(|&v| visited[v])
}

fn no_vanishing_districts(partition: &Partition) -> bool {
    partition.parts().values().all(|nodes| !nodes.is_empty())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, rc::Rc};

    use super::*;
    use crate::{
        graph::{Graph, WeightMatrix},
        partition::{Flip, updaters::Updaters},
    };

    // 2x3 grid:
    //   0 - 1 - 2
    //   |   |   |
    //   3 - 4 - 5
    fn grid_graph() -> Graph {
        Graph::new(
            6,
            &[(0, 1), (1, 2), (3, 4), (4, 5), (0, 3), (1, 4), (2, 5)],
            WeightMatrix::empty(6),
            HashMap::new(),
            HashMap::new(),
        )
    }

    fn partition(assignment: Vec<u32>) -> Partition {
        Partition::new(grid_graph(), assignment, Updaters::new()).unwrap()
    }

    #[test]
    fn contiguous_accepts_connected_districts() {
        let validator = Validator::new(vec![Constraint::Contiguous]);
        assert!(validator.is_valid(&partition(vec![1, 1, 2, 1, 2, 2])).unwrap());
    }

    #[test]
    fn contiguous_rejects_split_districts() {
        let validator = Validator::new(vec![Constraint::Contiguous]);
        // District 1 is the two opposite corners.
        assert!(!validator.is_valid(&partition(vec![1, 2, 2, 2, 2, 1])).unwrap());
    }

    #[test]
    fn single_flip_check_agrees_with_full_check() {
        let validator = Validator::new(vec![Constraint::SingleFlipContiguous]);
        let full = Validator::new(vec![Constraint::Contiguous]);
        let parent = Rc::new(partition(vec![1, 1, 2, 1, 2, 2]));

        // Node 1 leaving district 1 disconnects nothing; both accept.
        let child = Partition::merge(&parent, Flip::single(1, 2)).unwrap();
        assert!(validator.is_valid(&child).unwrap());
        assert!(full.is_valid(&child).unwrap());

        // Node 0 leaving district 1 strands nodes 1 and 3 from each other.
        let child = Partition::merge(&parent, Flip::single(0, 2)).unwrap();
        assert!(!validator.is_valid(&child).unwrap());
        assert!(!full.is_valid(&child).unwrap());
    }

    #[test]
    fn single_flip_requires_adjacency_to_the_new_district() {
        let validator = Validator::new(vec![Constraint::SingleFlipContiguous]);
        let parent = Rc::new(partition(vec![1, 1, 1, 1, 1, 2]));

        // Node 0 is nowhere near district 2.
        let child = Partition::merge(&parent, Flip::single(0, 2)).unwrap();
        assert!(!validator.is_valid(&child).unwrap());
    }

    #[test]
    fn vanishing_districts_are_rejected() {
        let validator = Validator::new(vec![Constraint::NoVanishingDistricts]);
        let parent = Rc::new(partition(vec![1, 1, 1, 1, 1, 2]));
        assert!(validator.is_valid(&parent).unwrap());

        let child = Partition::merge(&parent, Flip::single(5, 1)).unwrap();
        assert!(!validator.is_valid(&child).unwrap());
    }

    #[test]
    fn custom_predicates_short_circuit() {
        let validator = Validator::new(vec![
            Constraint::Custom(Box::new(|_| Ok(false))),
            Constraint::Custom(Box::new(|_| panic!("unreachable"))),
        ]);
        assert!(!validator.is_valid(&partition(vec![1, 1, 1, 1, 1, 2])).unwrap());
    }

    #[test]
    fn custom_predicate_errors_propagate() {
        let validator = Validator::new(vec![Constraint::Custom(Box::new(|_| {
            anyhow::bail!("broken predicate")
        }))]);
        assert!(validator.is_valid(&partition(vec![1, 1, 1, 1, 1, 2])).is_err());
    }
}
