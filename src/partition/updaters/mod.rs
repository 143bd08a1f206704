mod boundary;
mod cut_edges;
mod election;
mod tally;

use std::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use anyhow::{Result, bail, ensure};

use crate::{graph::Graph, partition::Partition};

pub use election::Election;

/// Conventional registry keys for the geometric statistics.
pub const BOUNDARY_NODES: &str = "boundary_nodes";
pub const CUT_EDGES: &str = "cut_edges";
pub const CUT_EDGES_BY_PART: &str = "cut_edges_by_part";
pub const INTERIOR_BOUNDARIES: &str = "interior_boundaries";
pub const EXTERIOR_BOUNDARIES: &str = "exterior_boundaries";
pub const EXTERIOR_BOUNDARIES_AS_A_SET: &str = "exterior_boundaries_as_a_set";
pub const PERIMETERS: &str = "perimeters";

/// Node flag marking nodes on the map's outer boundary.
pub(crate) const BOUNDARY_NODE: &str = "boundary_node";
/// Node series holding each boundary node's outer boundary length.
pub(crate) const BOUNDARY_PERIM: &str = "boundary_perim";
/// Edge series holding the boundary length shared by the two endpoints.
pub(crate) const SHARED_PERIM: &str = "shared_perim";

/// Registry of named updaters attached to a partition.
pub type Updaters = BTreeMap<String, Updater>;

/// The result of evaluating one updater on one partition.
#[derive(Clone, Debug, PartialEq)]
pub enum StatValue {
    /// One f64 per district.
    PerDistrict(BTreeMap<u32, f64>),
    /// A set of node ids.
    Nodes(BTreeSet<usize>),
    /// A set of node ids per district.
    NodesByDistrict(BTreeMap<u32, BTreeSet<usize>>),
    /// A set of edge ids.
    Edges(BTreeSet<usize>),
    /// A set of edge ids per district.
    EdgesByDistrict(BTreeMap<u32, BTreeSet<usize>>),
}

impl StatValue {
    pub fn as_per_district(&self) -> Result<&BTreeMap<u32, f64>> {
        match self {
            Self::PerDistrict(values) => Ok(values),
            _ => bail!("statistic is not a per-district value"),
        }
    }

    pub fn as_nodes(&self) -> Result<&BTreeSet<usize>> {
        match self {
            Self::Nodes(nodes) => Ok(nodes),
            _ => bail!("statistic is not a node set"),
        }
    }

    pub fn as_nodes_by_district(&self) -> Result<&BTreeMap<u32, BTreeSet<usize>>> {
        match self {
            Self::NodesByDistrict(sets) => Ok(sets),
            _ => bail!("statistic is not a per-district node set"),
        }
    }

    pub fn as_edges(&self) -> Result<&BTreeSet<usize>> {
        match self {
            Self::Edges(edges) => Ok(edges),
            _ => bail!("statistic is not an edge set"),
        }
    }

    pub fn as_edges_by_district(&self) -> Result<&BTreeMap<u32, BTreeSet<usize>>> {
        match self {
            Self::EdgesByDistrict(sets) => Ok(sets),
            _ => bail!("statistic is not a per-district edge set"),
        }
    }
}

/// A named statistic computed per partition, either from scratch or
/// incrementally from the parent's cached value for the same registry key.
/// Incremental results always equal the from-scratch computation.
#[derive(Clone, Debug)]
pub enum Updater {
    /// Per-district sum of one or more node series.
    Tally { columns: Vec<String> },
    /// Nodes flagged as lying on the map's outer boundary (assignment independent).
    BoundaryNodes,
    /// Edges whose endpoints lie in different districts.
    CutEdges,
    /// Per district, the cut edges with at least one endpoint in that district.
    CutEdgesByPart,
    /// Per district, the sum of `shared_perim` over cut edges touching it.
    InteriorBoundaries,
    /// Per district, the sum of `boundary_perim` over its boundary nodes.
    ExteriorBoundaries,
    /// Per district, the set of its boundary nodes.
    ExteriorBoundariesAsSet,
    /// Per district, exterior plus interior boundary length.
    Perimeters,
    /// Per-district sum across all of an election's vote columns.
    ElectionTotals { columns: Vec<String> },
    /// Per district, one column's tally divided by the election total
    /// (`NaN` when the district's total is zero).
    Proportion { column: String, columns: Vec<String> },
}

impl Updater {
    /// Tally of a single node series.
    pub fn tally(column: impl Into<String>) -> Self {
        Self::Tally { columns: vec![column.into()] }
    }

    /// Tally summed across several node series.
    pub fn tally_multi(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Tally { columns: columns.into_iter().map(Into::into).collect() }
    }

    /// Check that the graph and registry satisfy this updater's requirements.
    pub(crate) fn validate(&self, graph: &Graph, name: &str, updaters: &Updaters) -> Result<()> {
        match self {
            Self::Tally { columns } | Self::ElectionTotals { columns } => {
                for (i, column) in columns.iter().enumerate() {
                    ensure!(
                        graph.node_weights().contains(column),
                        "updater '{name}' references missing node series '{column}'"
                    );
                    ensure!(
                        !columns[..i].contains(column),
                        "updater '{name}' lists column '{column}' twice"
                    );
                }
            }
            Self::BoundaryNodes | Self::ExteriorBoundariesAsSet => {
                ensure!(
                    graph.has_flag(BOUNDARY_NODE),
                    "updater '{name}' requires the '{BOUNDARY_NODE}' node flag"
                );
            }
            Self::ExteriorBoundaries => {
                ensure!(
                    graph.has_flag(BOUNDARY_NODE),
                    "updater '{name}' requires the '{BOUNDARY_NODE}' node flag"
                );
                ensure!(
                    graph.node_weights().contains(BOUNDARY_PERIM),
                    "updater '{name}' requires the '{BOUNDARY_PERIM}' node series"
                );
            }
            Self::CutEdges | Self::CutEdgesByPart => {}
            Self::InteriorBoundaries => {
                ensure!(
                    graph.has_edge_series(SHARED_PERIM),
                    "updater '{name}' requires the '{SHARED_PERIM}' edge series"
                );
            }
            Self::Perimeters => {
                ensure!(
                    matches!(updaters.get(EXTERIOR_BOUNDARIES), Some(Self::ExteriorBoundaries)),
                    "updater '{name}' requires an '{EXTERIOR_BOUNDARIES}' updater"
                );
                ensure!(
                    matches!(updaters.get(INTERIOR_BOUNDARIES), Some(Self::InteriorBoundaries)),
                    "updater '{name}' requires an '{INTERIOR_BOUNDARIES}' updater"
                );
            }
            Self::Proportion { column, columns } => {
                ensure!(
                    columns.contains(column),
                    "updater '{name}' column '{column}' is not among its election columns"
                );
                for (i, column) in columns.iter().enumerate() {
                    ensure!(
                        matches!(updaters.get(column.as_str()), Some(Self::Tally { .. })),
                        "updater '{name}' requires a tally registered under '{column}'"
                    );
                    // A repeated column would be double-counted in the denominator.
                    ensure!(
                        !columns[..i].contains(column),
                        "updater '{name}' lists column '{column}' twice"
                    );
                }
            }
        }
        Ok(())
    }

    /// Evaluate this updater for a partition. `name` is the registry key,
    /// used to look up the parent's cached value for incremental updates.
    pub(crate) fn compute(&self, partition: &Partition, name: &str) -> Result<Rc<StatValue>> {
        match self {
            Self::Tally { columns } | Self::ElectionTotals { columns } => {
                tally::tally(partition, name, columns)
            }
            Self::BoundaryNodes => boundary::boundary_nodes(partition, name),
            Self::CutEdges => cut_edges::cut_edges(partition, name),
            Self::CutEdgesByPart => cut_edges::cut_edges_by_part(partition, name),
            Self::InteriorBoundaries => cut_edges::interior_boundaries(partition, name),
            Self::ExteriorBoundaries => boundary::exterior_boundaries(partition, name),
            Self::ExteriorBoundariesAsSet => boundary::exterior_boundaries_as_set(partition, name),
            Self::Perimeters => cut_edges::perimeters(partition),
            Self::Proportion { column, columns } => election::proportion(partition, column, columns),
        }
    }
}

/// The standard set of boundary-geometry updaters under their conventional keys.
pub fn geometry_updaters() -> Updaters {
    Updaters::from([
        (BOUNDARY_NODES.to_string(), Updater::BoundaryNodes),
        (CUT_EDGES.to_string(), Updater::CutEdges),
        (CUT_EDGES_BY_PART.to_string(), Updater::CutEdgesByPart),
        (INTERIOR_BOUNDARIES.to_string(), Updater::InteriorBoundaries),
        (EXTERIOR_BOUNDARIES.to_string(), Updater::ExteriorBoundaries),
        (EXTERIOR_BOUNDARIES_AS_A_SET.to_string(), Updater::ExteriorBoundariesAsSet),
        (PERIMETERS.to_string(), Updater::Perimeters),
    ])
}

/// Edge ids incident to any flipped node; only these can change cut status.
pub(super) fn affected_edges(partition: &Partition) -> BTreeSet<usize> {
    partition
        .prior()
        .iter()
        .flat_map(|&(node, _)| partition.graph().incident(node).map(|(_, edge)| edge))
        .collect()
}
