//! Random single-flip proposal over the cut edges of the current partition.

use anyhow::{Result, ensure};
use rand::{Rng, RngCore};

use crate::partition::{Flip, Partition, updaters::CUT_EDGES};

/// Pick a uniform random cut edge, then a uniform random endpoint of it, and
/// propose flipping that endpoint into the other endpoint's district.
///
/// Requires a `cut_edges` updater in the partition's registry. A partition
/// with no cut edges (a single effective district) is an error: no flip can
/// be proposed from it.
pub fn propose_random_flip(partition: &Partition, rng: &mut dyn RngCore) -> Result<Flip> {
    let cut_edges = partition.value(CUT_EDGES)?;
    let cut_edges = cut_edges.as_edges()?;
    ensure!(!cut_edges.is_empty(), "cannot propose a flip: partition has no cut edges");

    let index = rng.random_range(0..cut_edges.len());
    let edge = *cut_edges.iter().nth(index).unwrap();
    let (u, v) = partition.graph().endpoints(edge);

    let (node, district) = if rng.random_bool(0.5) {
        (u, partition.assignment(v))
    } else {
        (v, partition.assignment(u))
    };
    Ok(Flip::single(node, district))
}
