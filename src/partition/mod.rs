mod partition;
pub mod updaters;

pub use partition::{Flip, Partition};
