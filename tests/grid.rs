//! End-to-end checks on a 3x3 grid graph.
//!
//! Node layout:
//!   0 1 2
//!   3 4 5
//!   6 7 8

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    rc::Rc,
};

use anyhow::Result;

use chainmander::{
    Constraint, Election, Flip, Graph, MarkovChain, Partition, Validator, WeightMatrix,
    always_accept, geometry_updaters, propose_random_flip,
    updaters::{
        CUT_EDGES, EXTERIOR_BOUNDARIES, EXTERIOR_BOUNDARIES_AS_A_SET, INTERIOR_BOUNDARIES,
        PERIMETERS, Updaters,
    },
};

const GRID_EDGES: [(u32, u32); 12] = [
    (0, 1), (1, 2), (3, 4), (4, 5), (6, 7), (7, 8),
    (0, 3), (1, 4), (2, 5), (3, 6), (4, 7), (5, 8),
];

/// Every node except the center sits on the outer boundary.
fn grid_graph(boundary_perim: f64) -> Graph {
    let is_boundary = (0..9).map(|node| node != 4).collect::<Vec<_>>();
    let perims = is_boundary.iter()
        .map(|&boundary| if boundary { boundary_perim } else { 0.0 })
        .collect::<Vec<_>>();
    Graph::new(
        9,
        &GRID_EDGES,
        WeightMatrix::new(
            9,
            HashMap::from([("pop".to_string(), vec![1; 9])]),
            HashMap::from([("boundary_perim".to_string(), perims)]),
        ),
        HashMap::from([("boundary_node".to_string(), is_boundary)]),
        HashMap::from([("shared_perim".to_string(), vec![1.0; 12])]),
    )
}

/// Left-leaning district 1 around the top-left corner, district 2 elsewhere.
fn corner_assignment() -> Vec<u32> {
    vec![1, 1, 2, 1, 1, 2, 2, 2, 2]
}

#[test]
fn cut_edges_on_the_corner_assignment() -> Result<()> {
    let partition = Partition::new(grid_graph(1.0), corner_assignment(), geometry_updaters())?;

    let cut = partition.value(CUT_EDGES)?;
    let endpoints = cut.as_edges()?.iter()
        .map(|&edge| partition.graph().endpoints(edge))
        .collect::<BTreeSet<_>>();
    assert_eq!(endpoints, BTreeSet::from([(1, 2), (4, 5), (3, 6), (4, 7)]));
    Ok(())
}

#[test]
fn perimeters_split_into_exterior_and_interior() -> Result<()> {
    let partition = Partition::new(grid_graph(1.0), corner_assignment(), geometry_updaters())?;

    let perimeters = partition.value(PERIMETERS)?;
    let perimeters = perimeters.as_per_district()?;
    assert_eq!(perimeters, &BTreeMap::from([(1, 7.0), (2, 9.0)]));
    Ok(())
}

#[test]
fn perimeters_are_the_sum_of_their_components() -> Result<()> {
    let parent = Rc::new(Partition::new(grid_graph(2.0), corner_assignment(), geometry_updaters())?);
    let child = Partition::merge(&parent, Flip::from_iter([(4, 2), (2, 1), (5, 1)]))?;

    for partition in [&*parent, &child] {
        let perimeters = partition.value(PERIMETERS)?;
        let exterior = partition.value(EXTERIOR_BOUNDARIES)?;
        let interior = partition.value(INTERIOR_BOUNDARIES)?;
        let exterior = exterior.as_per_district()?;
        let interior = interior.as_per_district()?;
        for (district, &perimeter) in perimeters.as_per_district()? {
            assert_eq!(perimeter, exterior[district] + interior[district]);
        }
    }
    Ok(())
}

#[test]
fn weighted_exterior_boundaries_track_flips() -> Result<()> {
    let parent = Rc::new(Partition::new(
        grid_graph(2.0),
        corner_assignment(),
        geometry_updaters(),
    )?);

    let exterior = parent.value(EXTERIOR_BOUNDARIES)?;
    assert_eq!(exterior.as_per_district()?, &BTreeMap::from([(1, 6.0), (2, 10.0)]));

    // Swap the center out of district 1 and fold the right column's top into it.
    let child = Partition::merge(&parent, Flip::from_iter([(4, 2), (2, 1), (5, 1)]))?;
    let exterior = child.value(EXTERIOR_BOUNDARIES)?;
    assert_eq!(exterior.as_per_district()?, &BTreeMap::from([(1, 10.0), (2, 6.0)]));

    let sets = child.value(EXTERIOR_BOUNDARIES_AS_A_SET)?;
    let sets = sets.as_nodes_by_district()?;
    assert_eq!(sets[&1], BTreeSet::from([0, 1, 2, 3, 5]));
    assert_eq!(sets[&2], BTreeSet::from([6, 7, 8]));
    Ok(())
}

#[test]
fn incremental_cut_edges_match_scratch_after_a_multi_node_flip() -> Result<()> {
    let parent = Rc::new(Partition::new(grid_graph(1.0), corner_assignment(), geometry_updaters())?);
    let child = Partition::merge(&parent, Flip::from_iter([(4, 2), (2, 1), (5, 1)]))?;

    let scratch = Partition::new(grid_graph(1.0), child.assignments().to_vec(), geometry_updaters())?;
    assert_eq!(child.value(CUT_EDGES)?.as_edges()?, scratch.value(CUT_EDGES)?.as_edges()?);

    let endpoints = child.value(CUT_EDGES)?.as_edges()?.iter()
        .map(|&edge| child.graph().endpoints(edge))
        .collect::<BTreeSet<_>>();
    assert_eq!(endpoints, BTreeSet::from([(3, 4), (4, 5), (1, 4), (3, 6), (5, 8)]));
    Ok(())
}

#[test]
fn election_shares_sum_to_one_per_district() -> Result<()> {
    let graph = Graph::new(
        9,
        &GRID_EDGES,
        WeightMatrix::new(
            9,
            HashMap::from([
                ("d".to_string(), vec![3, 1, 4, 1, 5, 9, 2, 6, 5]),
                ("r".to_string(), vec![2, 7, 1, 8, 2, 8, 1, 8, 2]),
            ]),
            HashMap::new(),
        ),
        HashMap::new(),
        HashMap::new(),
    );
    let election = Election::new("senate", ["d", "r"]);
    let partition = Partition::new(graph, corner_assignment(), election.updaters())?;

    let d_share = partition.value("d%")?;
    let d_share = d_share.as_per_district()?;
    let r_share = partition.value("r%")?;
    let r_share = r_share.as_per_district()?;

    // Share keys cover exactly the districts of the partition.
    let districts = partition.parts().keys().copied().collect::<Vec<_>>();
    assert_eq!(d_share.keys().copied().collect::<Vec<_>>(), districts);

    for district in districts {
        let sum = d_share[&district] + r_share[&district];
        assert!((sum - 1.0).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn election_shares_are_nan_without_votes() -> Result<()> {
    let graph = Graph::new(
        9,
        &GRID_EDGES,
        WeightMatrix::new(
            9,
            HashMap::from([("d".to_string(), vec![0; 9]), ("r".to_string(), vec![0; 9])]),
            HashMap::new(),
        ),
        HashMap::new(),
        HashMap::new(),
    );
    let election = Election::new("senate", ["d", "r"]);
    let partition = Partition::new(graph, corner_assignment(), election.updaters())?;

    let shares = partition.value("d%")?;
    assert!(shares.as_per_district()?.values().all(|share| share.is_nan()));
    Ok(())
}

#[test]
fn a_short_chain_yields_only_valid_partitions() -> Result<()> {
    let mut updaters = Updaters::new();
    updaters.extend(geometry_updaters());
    updaters.extend(Election::new("senate", ["pop"]).updaters());
    let initial = Partition::new(grid_graph(1.0), corner_assignment(), updaters)?;

    let chain = MarkovChain::with_seed(
        Box::new(|partition, rng| propose_random_flip(partition, rng)),
        Validator::new(vec![
            Constraint::SingleFlipContiguous,
            Constraint::NoVanishingDistricts,
        ]),
        always_accept(),
        initial,
        10,
        1729,
    );

    let full = Validator::new(vec![Constraint::Contiguous, Constraint::NoVanishingDistricts]);
    let states = chain.collect::<Result<Vec<_>>>()?;
    assert_eq!(states.len(), 10);
    for state in &states {
        assert!(full.is_valid(state)?);
        // Both districts keep all nine people between them.
        let pops = state.value("pop")?;
        let total: f64 = pops.as_per_district()?.values().sum();
        assert_eq!(total, 9.0);
    }
    Ok(())
}
