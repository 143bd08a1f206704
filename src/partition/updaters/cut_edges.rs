use std::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use anyhow::Result;

use crate::partition::{
    Partition,
    updaters::{EXTERIOR_BOUNDARIES, INTERIOR_BOUNDARIES, SHARED_PERIM, StatValue, affected_edges},
};

fn edge_is_cut(partition: &Partition, edge: usize) -> bool {
    let (u, v) = partition.graph().endpoints(edge);
    partition.assignment(u) != partition.assignment(v)
}

fn shared_perim(partition: &Partition, edge: usize) -> f64 {
    partition.graph().edge_weight(SHARED_PERIM, edge).unwrap()
}

/// Edges whose endpoints lie in different districts.
///
/// From scratch this is one scan over all edges; on a derived partition only
/// edges incident to flipped nodes are rechecked against the parent's set.
pub(super) fn cut_edges(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut edges = parent_value.as_edges()?.clone();
        for edge in affected_edges(partition) {
            if edge_is_cut(partition, edge) {
                edges.insert(edge);
            } else {
                edges.remove(&edge);
            }
        }
        return Ok(Rc::new(StatValue::Edges(edges)));
    }

    let edges = (0..partition.graph().edge_count())
        .filter(|&edge| edge_is_cut(partition, edge))
        .collect::<BTreeSet<_>>();
    Ok(Rc::new(StatValue::Edges(edges)))
}

/// Per district, the cut edges with at least one endpoint in that district.
pub(super) fn cut_edges_by_part(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut sets = parent_value.as_edges_by_district()?.clone();
        for edge in affected_edges(partition) {
            let (u, v) = partition.graph().endpoints(edge);
            if parent.assignment(u) != parent.assignment(v) {
                sets.entry(parent.assignment(u)).or_default().remove(&edge);
                sets.entry(parent.assignment(v)).or_default().remove(&edge);
            }
            if edge_is_cut(partition, edge) {
                sets.entry(partition.assignment(u)).or_default().insert(edge);
                sets.entry(partition.assignment(v)).or_default().insert(edge);
            }
        }
        return Ok(Rc::new(StatValue::EdgesByDistrict(sets)));
    }

    let mut sets: BTreeMap<u32, BTreeSet<usize>> =
        partition.district_ids().iter().map(|&district| (district, BTreeSet::new())).collect();
    for edge in 0..partition.graph().edge_count() {
        if !edge_is_cut(partition, edge) { continue }
        let (u, v) = partition.graph().endpoints(edge);
        sets.entry(partition.assignment(u)).or_default().insert(edge);
        sets.entry(partition.assignment(v)).or_default().insert(edge);
    }
    Ok(Rc::new(StatValue::EdgesByDistrict(sets)))
}

/// Per district, the sum of `shared_perim` over cut edges touching it.
pub(super) fn interior_boundaries(partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut totals = parent_value.as_per_district()?.clone();
        for edge in affected_edges(partition) {
            let (u, v) = partition.graph().endpoints(edge);
            let perim = shared_perim(partition, edge);
            if parent.assignment(u) != parent.assignment(v) {
                *totals.entry(parent.assignment(u)).or_insert(0.0) -= perim;
                *totals.entry(parent.assignment(v)).or_insert(0.0) -= perim;
            }
            if edge_is_cut(partition, edge) {
                *totals.entry(partition.assignment(u)).or_insert(0.0) += perim;
                *totals.entry(partition.assignment(v)).or_insert(0.0) += perim;
            }
        }
        return Ok(Rc::new(StatValue::PerDistrict(totals)));
    }

    let mut totals: BTreeMap<u32, f64> =
        partition.district_ids().iter().map(|&district| (district, 0.0)).collect();
    for edge in 0..partition.graph().edge_count() {
        if !edge_is_cut(partition, edge) { continue }
        let (u, v) = partition.graph().endpoints(edge);
        let perim = shared_perim(partition, edge);
        *totals.entry(partition.assignment(u)).or_insert(0.0) += perim;
        *totals.entry(partition.assignment(v)).or_insert(0.0) += perim;
    }
    Ok(Rc::new(StatValue::PerDistrict(totals)))
}

/// Per district, exterior plus interior boundary length. Reads the two
/// registered boundary updaters, which are themselves incremental.
pub(super) fn perimeters(partition: &Partition) -> Result<Rc<StatValue>> {
    let exterior = partition.value(EXTERIOR_BOUNDARIES)?;
    let interior = partition.value(INTERIOR_BOUNDARIES)?;
    let exterior = exterior.as_per_district()?;
    let interior = interior.as_per_district()?;

    let totals = partition.district_ids().iter()
        .map(|&district| {
            let ext = exterior.get(&district).copied().unwrap_or(0.0);
            let int = interior.get(&district).copied().unwrap_or(0.0);
            (district, ext + int)
        })
        .collect::<BTreeMap<_, _>>();
    Ok(Rc::new(StatValue::PerDistrict(totals)))
}
