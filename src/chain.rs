//! Markov chain driver: propose, merge, validate, accept, repeat.

use std::rc::Rc;

use anyhow::Result;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    partition::{Flip, Partition},
    validity::Validator,
};

/// Produces a candidate flip from the current partition.
pub type ProposalFn = Box<dyn FnMut(&Partition, &mut dyn RngCore) -> Result<Flip>>;

/// Decides whether to move to a valid candidate, given `(candidate, current)`.
pub type AcceptFn = Box<dyn FnMut(&Partition, &Partition) -> bool>;

/// Accepts every valid candidate.
pub fn always_accept() -> AcceptFn {
    Box::new(|_, _| true)
}

/// An iterator over the states of a single-flip Markov chain.
///
/// Each pull runs one step: propose a flip, merge it onto the current
/// partition, validate, then consult the acceptance function. A rejected
/// candidate still consumes a step and yields the unchanged current
/// partition, so the chain produces exactly `total_steps` items. An accepted
/// candidate is materialized (detached from its parent) before it becomes
/// current, so chain memory does not grow with the number of steps.
///
/// Any error along the way is yielded as `Err`; by convention that ends the
/// run.
pub struct MarkovChain {
    proposal: ProposalFn,
    validator: Validator,
    accept: AcceptFn,
    current: Rc<Partition>,
    rng: StdRng,
    step: usize,
    total_steps: usize,
}

impl MarkovChain {
    /// A chain seeded from the operating system's entropy source.
    pub fn new(
        proposal: ProposalFn,
        validator: Validator,
        accept: AcceptFn,
        initial: Partition,
        total_steps: usize,
    ) -> Self {
        Self::with_rng(proposal, validator, accept, initial, total_steps, StdRng::from_os_rng())
    }

    /// A deterministic chain for reproducible runs.
    pub fn with_seed(
        proposal: ProposalFn,
        validator: Validator,
        accept: AcceptFn,
        initial: Partition,
        total_steps: usize,
        seed: u64,
    ) -> Self {
        Self::with_rng(proposal, validator, accept, initial, total_steps, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        proposal: ProposalFn,
        validator: Validator,
        accept: AcceptFn,
        initial: Partition,
        total_steps: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            proposal,
            validator,
            accept,
            current: Rc::new(initial),
            rng,
            step: 0,
            total_steps,
        }
    }

    /// The partition the chain currently sits on.
    #[inline]
    pub fn current(&self) -> &Rc<Partition> {
        &self.current
    }

    fn advance(&mut self) -> Result<Rc<Partition>> {
        let flip = (self.proposal)(&self.current, &mut self.rng)?;
        let candidate = Partition::merge(&self.current, flip)?;

        if !self.validator.is_valid(&candidate)? {
            return Ok(Rc::clone(&self.current));
        }
        if !(self.accept)(&candidate, &self.current) {
            return Ok(Rc::clone(&self.current));
        }

        candidate.materialize()?;
        self.current = Rc::new(candidate);
        Ok(Rc::clone(&self.current))
    }
}

impl Iterator for MarkovChain {
    type Item = Result<Rc<Partition>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.total_steps {
            return None;
        }
        self.step += 1;
        Some(self.advance())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_steps - self.step;
        (remaining, Some(remaining))
    }
}
