use std::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use anyhow::Result;

use crate::partition::{
    Partition,
    updaters::{BOUNDARY_NODE, BOUNDARY_PERIM, StatValue},
};

fn is_boundary(partition: &Partition, node: usize) -> bool {
    partition.graph().node_flag(BOUNDARY_NODE, node).unwrap_or(false)
}

fn boundary_perim(partition: &Partition, node: usize) -> f64 {
    partition.graph().node_weights().get_as_f64(BOUNDARY_PERIM, node).unwrap()
}

/// Nodes flagged as lying on the map's outer boundary. Pass-through of graph
/// data, independent of the assignment, so a derived partition shares the
/// parent's cached value.
pub(super) fn boundary_nodes(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        return parent.value(name);
    }

    let nodes = (0..partition.graph().node_count())
        .filter(|&node| is_boundary(partition, node))
        .collect::<BTreeSet<_>>();
    Ok(Rc::new(StatValue::Nodes(nodes)))
}

/// Per district, the sum of `boundary_perim` over its boundary nodes.
/// Incremental over the flipped boundary nodes only.
pub(super) fn exterior_boundaries(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut totals = parent_value.as_per_district()?.clone();
        for &(node, prev) in partition.prior() {
            if !is_boundary(partition, node) { continue }
            let perim = boundary_perim(partition, node);
            *totals.entry(prev).or_insert(0.0) -= perim;
            *totals.entry(partition.assignment(node)).or_insert(0.0) += perim;
        }
        return Ok(Rc::new(StatValue::PerDistrict(totals)));
    }

    let mut totals: BTreeMap<u32, f64> =
        partition.district_ids().iter().map(|&district| (district, 0.0)).collect();
    for node in 0..partition.graph().node_count() {
        if !is_boundary(partition, node) { continue }
        *totals.entry(partition.assignment(node)).or_insert(0.0) += boundary_perim(partition, node);
    }
    Ok(Rc::new(StatValue::PerDistrict(totals)))
}

/// Per district, the set of its boundary nodes.
pub(super) fn exterior_boundaries_as_set(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut sets = parent_value.as_nodes_by_district()?.clone();
        for &(node, prev) in partition.prior() {
            if !is_boundary(partition, node) { continue }
            sets.entry(prev).or_default().remove(&node);
            sets.entry(partition.assignment(node)).or_default().insert(node);
        }
        return Ok(Rc::new(StatValue::NodesByDistrict(sets)));
    }

    let mut sets: BTreeMap<u32, BTreeSet<usize>> =
        partition.district_ids().iter().map(|&district| (district, BTreeSet::new())).collect();
    for node in 0..partition.graph().node_count() {
        if !is_boundary(partition, node) { continue }
        sets.entry(partition.assignment(node)).or_default().insert(node);
    }
    Ok(Rc::new(StatValue::NodesByDistrict(sets)))
}
