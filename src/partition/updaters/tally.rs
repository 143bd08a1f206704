use std::{collections::BTreeMap, rc::Rc};

use anyhow::Result;

use crate::partition::{Partition, updaters::StatValue};

/// Sum of the requested node series for one node. Series presence is checked
/// when the updater is registered.
fn node_total(partition: &Partition, columns: &[String], node: usize) -> f64 {
    columns.iter()
        .map(|column| partition.graph().node_weights().get_as_f64(column, node).unwrap())
        .sum()
}

/// Per-district sum of one or more node series.
///
/// On a derived partition, only districts touched by the flip are adjusted
/// (parent value minus departures plus arrivals); every other district is
/// copied unchanged from the parent's cached value.
pub(super) fn tally(partition: &Partition, name: &str, columns: &[String]) -> Result<Rc<StatValue>> {
    if let Some(parent) = partition.parent() {
        let parent_value = parent.value(name)?;
        let mut totals = parent_value.as_per_district()?.clone();
        for &(node, prev) in partition.prior() {
            let moved = node_total(partition, columns, node);
            *totals.entry(prev).or_insert(0.0) -= moved;
            *totals.entry(partition.assignment(node)).or_insert(0.0) += moved;
        }
        return Ok(Rc::new(StatValue::PerDistrict(totals)));
    }

    let mut totals: BTreeMap<u32, f64> =
        partition.district_ids().iter().map(|&district| (district, 0.0)).collect();
    for node in 0..partition.graph().node_count() {
        *totals.entry(partition.assignment(node)).or_insert(0.0) +=
            node_total(partition, columns, node);
    }
    Ok(Rc::new(StatValue::PerDistrict(totals)))
}
