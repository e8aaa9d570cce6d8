//! Per-state rows of per-action estimates, created on first write.

use super::policy::argmax_all;
use ndarray::Array1;
use rand::prelude::*;
use rl_envs::Discrete;
use std::collections::BTreeMap;

/// Sparse map from state to a fixed-length row indexed by action.
///
/// A state that was never written to reads as a row of zeros and is not
/// stored. Rows are kept in state order so that walking the table draws
/// random numbers in the same order on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTable<S, T> {
    n_a: usize,
    rows: BTreeMap<S, Array1<T>>,
}

/// Action values Q(s, a).
pub type QTable<S> = ActionTable<S, f64>;

/// Visit counts N(s, a).
pub type VisitTable<S> = ActionTable<S, u64>;

/// Cumulative importance weights C(s, a).
pub type WeightTable<S> = ActionTable<S, f64>;

impl<S: Ord + Clone, T: Clone + Default> ActionTable<S, T> {
    pub fn new(n_a: usize) -> Self {
        Self {
            n_a,
            rows: BTreeMap::new(),
        }
    }

    pub fn n_a(&self) -> usize {
        self.n_a
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, s: &S) -> bool {
        self.rows.contains_key(s)
    }

    pub fn get(&self, s: &S, a: Discrete) -> T {
        self.rows
            .get(s)
            .map_or_else(T::default, |row| row[a].clone())
    }

    /// The stored row, or zeros.
    pub fn row(&self, s: &S) -> Array1<T> {
        self.rows
            .get(s)
            .cloned()
            .unwrap_or_else(|| Array1::from_elem(self.n_a, T::default()))
    }

    pub fn row_mut(&mut self, s: &S) -> &mut Array1<T> {
        let n_a = self.n_a;
        self.rows
            .entry(s.clone())
            .or_insert_with(|| Array1::from_elem(n_a, T::default()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &Array1<T>)> {
        self.rows.iter()
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.rows.keys()
    }
}

impl<S: Ord + Clone> ActionTable<S, f64> {
    pub fn max(&self, s: &S) -> f64 {
        self.rows
            .get(s)
            .map_or(0., |row| row.fold(f64::NEG_INFINITY, |m, &q| m.max(q)))
    }

    pub fn greedy_actions(&self, s: &S) -> Vec<Discrete> {
        argmax_all(self.row(s).view())
    }

    /// One of the maximising actions, chosen uniformly.
    pub fn greedy_action(&self, s: &S, rng: &mut StdRng) -> Discrete {
        *self
            .greedy_actions(s)
            .choose(rng)
            .unwrap_or(&0)
    }

    /// V(s) = max_a Q(s, a) for every stored state.
    pub fn state_values(&self) -> BTreeMap<S, f64> {
        self.states().map(|s| (s.clone(), self.max(s))).collect()
    }

    pub fn greedy_policy(&self, rng: &mut StdRng) -> BTreeMap<S, Discrete> {
        self.states()
            .map(|s| (s.clone(), self.greedy_action(s, rng)))
            .collect()
    }

    /// The lowest-numbered maximising action.
    pub fn first_greedy_action(&self, s: &S) -> Discrete {
        self.greedy_actions(s).first().copied().unwrap_or(0)
    }

    /// Deterministic greedy policy, ties going to the lowest action.
    pub fn first_greedy_policy(&self) -> BTreeMap<S, Discrete> {
        self.states()
            .map(|s| (s.clone(), self.first_greedy_action(s)))
            .collect()
    }
}

impl<S: Ord + Clone> ActionTable<S, u64> {
    /// Bumps N(s, a) and returns the new count.
    pub fn increment(&mut self, s: &S, a: Discrete) -> u64 {
        let n = &mut self.row_mut(s)[a];
        *n += 1;
        *n
    }

    /// N(s), the visits summed over actions.
    pub fn total(&self, s: &S) -> u64 {
        self.rows.get(s).map_or(0, |row| row.sum())
    }
}
