use crate::{Continous, Error, Result, Transition};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

pub trait Weighted<S> {
    fn s(&self) -> S;

    fn p(&self) -> Continous;
}

impl Weighted<Transition> for Transition {
    fn s(&self) -> Transition {
        self.clone()
    }

    fn p(&self) -> Continous {
        self.probability
    }
}

/// Draws an index with probability proportional to its weight.
pub fn pick_index<I>(rng: &mut StdRng, weights: I) -> Result<usize>
where
    I: IntoIterator<Item = Continous>,
{
    let dist = WeightedIndex::new(weights).map_err(|e| Error::InvalidDistribution {
        reason: e.to_string(),
    })?;

    Ok(dist.sample(rng))
}

pub fn pick_next<T, S>(rng: &mut StdRng, ts: &[T]) -> Result<S>
where
    T: Weighted<S>,
{
    let i = pick_index(rng, ts.iter().map(|item| item.p()))?;
    Ok(ts[i].s())
}
