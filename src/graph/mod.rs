mod graph;
mod weights;

pub use graph::Graph;
pub use weights::{WeightMatrix, WeightType};
