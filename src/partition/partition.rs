use std::{
    cell::{OnceCell, RefCell},
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
    sync::Arc,
};

use ahash::AHashMap;
use anyhow::{Result, bail, ensure};
use smallvec::SmallVec;

use crate::{
    graph::Graph,
    partition::updaters::{StatValue, Updaters},
};

/// A small diff reassigning a handful of nodes to new districts.
///
/// A flip defines a child partition relative to a parent; a valid flip never
/// reassigns a node to the district it is already in.
#[derive(Clone, Debug, Default)]
pub struct Flip {
    moves: SmallVec<[(usize, u32); 4]>,
}

impl Flip {
    /// An empty flip.
    pub fn new() -> Self { Self::default() }

    /// A flip moving a single node to a new district.
    pub fn single(node: usize, district: u32) -> Self {
        let mut flip = Self::new();
        flip.set(node, district);
        flip
    }

    /// Record a move, replacing any earlier move of the same node.
    pub fn set(&mut self, node: usize, district: u32) {
        match self.moves.iter_mut().find(|(u, _)| *u == node) {
            Some(entry) => entry.1 = district,
            None => self.moves.push((node, district)),
        }
    }

    /// The new district of a flipped node, or `None` if the node is not in the flip.
    pub fn get(&self, node: usize) -> Option<u32> {
        self.moves.iter().find(|(u, _)| *u == node).map(|&(_, d)| d)
    }

    /// Number of nodes moved by this flip.
    #[inline] pub fn len(&self) -> usize { self.moves.len() }

    /// Whether the flip moves no nodes.
    #[inline] pub fn is_empty(&self) -> bool { self.moves.is_empty() }

    /// Iterator over (node, new district) moves.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.moves.iter().copied()
    }
}

impl FromIterator<(usize, u32)> for Flip {
    fn from_iter<I: IntoIterator<Item = (usize, u32)>>(iter: I) -> Self {
        let mut flip = Self::new();
        for (node, district) in iter { flip.set(node, district) }
        flip
    }
}

/// A partition of a graph into districts, with lazily cached statistics.
///
/// A partition is immutable after construction: a root partition is built from
/// a graph and a complete assignment, and every later partition is derived from
/// a parent by [`Partition::merge`] with a [`Flip`]. Reading a named statistic
/// evaluates its updater at most once per partition and memoizes the result;
/// updaters on a derived partition may start from the parent's cached value,
/// but the result always equals a from-scratch computation.
#[derive(Debug)]
pub struct Partition {
    graph: Arc<Graph>,
    assignment: Vec<u32>,
    district_ids: Arc<Vec<u32>>, // sorted ids of the root assignment
    updaters: Arc<Updaters>,
    parent: RefCell<Option<Rc<Partition>>>,
    flip: Flip,
    prior: SmallVec<[(usize, u32); 4]>, // parent-side district of each flipped node
    parts: OnceCell<BTreeMap<u32, BTreeSet<usize>>>,
    cache: RefCell<AHashMap<String, Rc<StatValue>>>,
}

impl Partition {
    /// Construct a root partition from a graph, a complete node assignment,
    /// and a registry of named updaters.
    pub fn new(graph: impl Into<Arc<Graph>>, assignment: Vec<u32>, updaters: Updaters) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        ensure!(
            assignment.len() == graph.node_count(),
            "assignment covers {} nodes but the graph has {}",
            assignment.len(),
            graph.node_count()
        );

        let mut district_ids = assignment.clone();
        district_ids.sort_unstable();
        district_ids.dedup();

        let updaters = Arc::new(updaters);
        for (name, updater) in updaters.iter() {
            updater.validate(&graph, name, &updaters)?;
        }

        Ok(Self {
            graph,
            assignment,
            district_ids: Arc::new(district_ids),
            updaters,
            parent: RefCell::new(None),
            flip: Flip::new(),
            prior: SmallVec::new(),
            parts: OnceCell::new(),
            cache: RefCell::new(AHashMap::new()),
        })
    }

    /// Derive a child partition whose assignment equals the parent's with the
    /// flip's nodes remapped. The flip must be non-empty, reference only nodes
    /// of the graph, target only district ids present in the root assignment,
    /// and actually move every node it names.
    pub fn merge(parent: &Rc<Self>, flip: Flip) -> Result<Self> {
        ensure!(!flip.is_empty(), "a flip must reassign at least one node");

        let mut assignment = parent.assignment.clone();
        let mut prior = SmallVec::new();
        for (node, district) in flip.iter() {
            ensure!(node < assignment.len(), "flip references node {node} outside the graph");
            ensure!(
                parent.district_ids.binary_search(&district).is_ok(),
                "flip targets district {district}, which is not in the plan"
            );
            ensure!(
                assignment[node] != district,
                "flip reassigns node {node} to its current district {district}"
            );
            prior.push((node, assignment[node]));
            assignment[node] = district;
        }

        Ok(Self {
            graph: parent.graph.clone(),
            assignment,
            district_ids: parent.district_ids.clone(),
            updaters: parent.updaters.clone(),
            parent: RefCell::new(Some(parent.clone())),
            flip,
            prior,
            parts: OnceCell::new(),
            cache: RefCell::new(AHashMap::new()),
        })
    }

    /// Get a reference to the underlying graph.
    #[inline] pub fn graph(&self) -> &Arc<Graph> { &self.graph }

    /// Get the district assignment of a given node.
    #[inline] pub fn assignment(&self, node: usize) -> u32 { self.assignment[node] }

    /// Get the complete node-indexed assignment vector.
    #[inline] pub fn assignments(&self) -> &[u32] { &self.assignment }

    /// District ids of the root assignment (sorted). Stable across the chain.
    #[inline] pub fn district_ids(&self) -> &[u32] { &self.district_ids }

    /// Get the registered updaters.
    #[inline] pub fn updaters(&self) -> &Updaters { &self.updaters }

    /// The flip that derived this partition from its parent (empty for a root).
    #[inline] pub fn flip(&self) -> &Flip { &self.flip }

    /// Parent-side district of each flipped node, in flip order.
    #[inline] pub(crate) fn prior(&self) -> &[(usize, u32)] { &self.prior }

    /// Get the parent partition, if still attached.
    pub fn parent(&self) -> Option<Rc<Partition>> { self.parent.borrow().clone() }

    /// Whether this partition differs from its parent by exactly one node.
    #[inline] pub fn is_single_flip(&self) -> bool { self.prior.len() == 1 }

    /// District id -> member node set, derived lazily from the assignment.
    /// Keys are exactly the root assignment's district ids; a district with no
    /// remaining members keeps an empty entry.
    pub fn parts(&self) -> &BTreeMap<u32, BTreeSet<usize>> {
        self.parts.get_or_init(|| {
            let mut parts: BTreeMap<u32, BTreeSet<usize>> =
                self.district_ids.iter().map(|&district| (district, BTreeSet::new())).collect();
            for (node, &district) in self.assignment.iter().enumerate() {
                debug_assert!(parts.contains_key(&district), "assignment references unknown district");
                parts.entry(district).or_default().insert(node);
            }
            parts
        })
    }

    /// Evaluate a named statistic, memoizing the result for this partition.
    /// Repeated reads return the cached value.
    pub fn value(&self, name: &str) -> Result<Rc<StatValue>> {
        if let Some(value) = self.cache.borrow().get(name) {
            return Ok(value.clone());
        }

        let updater = match self.updaters.get(name) {
            Some(updater) => updater.clone(),
            None => bail!("no updater registered under '{name}'"),
        };

        // Not held across compute: updaters may recursively read other statistics.
        let value = updater.compute(self, name)?;
        self.cache.borrow_mut().insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Evaluate every registered updater, then drop the parent link.
    ///
    /// After this call the partition is self-contained: all statistics are
    /// cached, so chains of accepted partitions do not retain their history.
    pub fn materialize(&self) -> Result<()> {
        let names = self.updaters.keys().cloned().collect::<Vec<_>>();
        for name in names { self.value(&name)?; }
        self.parts();
        self.parent.borrow_mut().take();
        Ok(())
    }
}
