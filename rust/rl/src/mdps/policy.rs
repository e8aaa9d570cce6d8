use crate::Result;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rl_envs::{pick_index, Discrete, Mdp};

/// Every action attaining the row maximum.
pub fn argmax_all(row: ArrayView1<f64>) -> Vec<Discrete> {
    let max = row.fold(f64::NEG_INFINITY, |m, &q| m.max(q));
    row.iter().positions(|&q| q == max).collect()
}

/// epsilon / |A| on every action plus (1 - epsilon) shared by the greedy
/// actions.
pub fn epsilon_greedy_probs(row: ArrayView1<f64>, epsilon: f64) -> Array1<f64> {
    let n_a = row.len();
    let greedy = argmax_all(row);
    let mut probs = Array1::from_elem(n_a, epsilon / n_a as f64);
    for &a in &greedy {
        probs[a] += (1. - epsilon) / greedy.len() as f64;
    }

    probs
}

pub fn sample_action(probs: ArrayView1<f64>, rng: &mut StdRng) -> Result<Discrete> {
    Ok(pick_index(rng, probs.iter().copied())?)
}

/// pi(a | s) for model states `0..n_s`.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularPolicy {
    probs: Array2<f64>,
}

impl TabularPolicy {
    pub fn new(probs: Array2<f64>) -> Self {
        Self { probs }
    }

    /// Uniform over the legal actions of each state. A state without legal
    /// actions gets an all-zero row.
    pub fn uniform<M: Mdp + ?Sized>(mdp: &M) -> Self {
        let mut probs = Array2::zeros((mdp.n_s(), mdp.n_a()));
        for (s, mut row) in probs.outer_iter_mut().enumerate() {
            let legal = (0..mdp.n_a())
                .filter(|&a| mdp.is_legal(s, a))
                .collect::<Vec<_>>();
            for &a in &legal {
                row[a] = 1. / legal.len() as f64;
            }
        }

        Self { probs }
    }

    pub fn deterministic(n_a: usize, actions: &[Option<Discrete>]) -> Self {
        let mut probs = Array2::zeros((actions.len(), n_a));
        for (s, a) in actions.iter().enumerate() {
            if let Some(a) = *a {
                probs[[s, a]] = 1.;
            }
        }

        Self { probs }
    }

    pub fn n_s(&self) -> usize {
        self.probs.nrows()
    }

    pub fn n_a(&self) -> usize {
        self.probs.ncols()
    }

    pub fn prob(&self, s: Discrete, a: Discrete) -> f64 {
        self.probs[[s, a]]
    }

    pub fn row(&self, s: Discrete) -> ArrayView1<f64> {
        self.probs.row(s)
    }

    /// The action taken with certainty, if there is one.
    pub fn deterministic_action(&self, s: Discrete) -> Option<Discrete> {
        self.row(s).iter().position(|&p| p == 1.)
    }
}
