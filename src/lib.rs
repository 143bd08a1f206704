#![doc = "Chainmander public API"]
mod chain;
mod graph;
mod partition;
mod proposal;
mod validity;

#[doc(inline)]
pub use graph::{Graph, WeightMatrix, WeightType};

#[doc(inline)]
pub use partition::{Flip, Partition};

pub use partition::updaters;

#[doc(inline)]
pub use partition::updaters::{Election, StatValue, Updater, Updaters, geometry_updaters};

#[doc(inline)]
pub use validity::{Constraint, Validator};

#[doc(inline)]
pub use proposal::propose_random_flip;

#[doc(inline)]
pub use chain::{AcceptFn, MarkovChain, ProposalFn, always_accept};
