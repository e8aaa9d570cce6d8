use super::{ControlOutcome, EpisodeStats};
use crate::cancel::is_cancelled;
use crate::mdps::policy::{epsilon_greedy_probs, sample_action};
use crate::mdps::schedules::{behavior_epsilon, glie_epsilon};
use crate::mdps::value_table::{QTable, VisitTable, WeightTable};
use crate::mdps::Policy;
use crate::{CancelToken, Error, McControlConfig, PredictionConfig, Result, VisitRule};
use rand::prelude::*;
use rl_envs::{Continous, Discrete, EpisodeEvent, MdpSimulator};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Plays one episode, asking `choose` for the action at every step
/// (`t` counts steps from 0). Stops at the first terminal transition or
/// after `max_steps`.
pub(crate) fn run_episode<E, F>(
    env: &mut E,
    rng: &mut StdRng,
    start: Option<E::State>,
    max_steps: Option<usize>,
    mut choose: F,
) -> Result<Vec<EpisodeEvent<E::State>>>
where
    E: MdpSimulator,
    F: FnMut(&E::State, usize, &mut StdRng) -> Result<Discrete>,
{
    let mut s = env.reset(rng, start)?;
    let mut episode = vec![];

    for t in 0.. {
        if max_steps.is_some_and(|max| t >= max) {
            break;
        }

        let a = choose(&s, t, rng)?;
        let step = env.step(rng, a)?;
        episode.push(EpisodeEvent {
            s,
            a,
            r: step.reward,
        });
        if step.terminated {
            break;
        }
        s = step.observation;
    }

    Ok(episode)
}

/// G_t of the first occurrence of every (s, a) in the episode, in the
/// order of the table keys.
pub fn first_visit_returns<S: Ord + Clone>(
    episode: &[EpisodeEvent<S>],
    gamma: Continous,
) -> Vec<(S, Discrete, Continous)> {
    let mut returns = BTreeMap::new();
    let mut g = 0.;
    for e in episode.iter().rev() {
        g = e.r + gamma * g;
        returns.insert((e.s.clone(), e.a), g);
    }

    returns.into_iter().map(|((s, a), g)| (s, a, g)).collect()
}

/// Q <- Q + (G - Q) / N with N the number of first-visit returns seen.
fn running_mean_update<S: Ord + Clone>(
    q: &mut QTable<S>,
    visits: &mut VisitTable<S>,
    episode: &[EpisodeEvent<S>],
    gamma: Continous,
) {
    for (s, a, g) in first_visit_returns(episode, gamma) {
        let n = visits.increment(&s, a);
        let q_sa = &mut q.row_mut(&s)[a];
        *q_sa += (g - *q_sa) / n as f64;
    }
}

/// Shared episode bookkeeping of the control loops.
struct Progress<'a> {
    method: &'static str,
    n_episodes: usize,
    log_every: usize,
    cancel: &'a Option<CancelToken>,
    stats: Vec<EpisodeStats>,
}

impl<'a> Progress<'a> {
    fn new(
        method: &'static str,
        n_episodes: usize,
        log_every: usize,
        cancel: &'a Option<CancelToken>,
    ) -> Self {
        Self {
            method,
            n_episodes,
            log_every,
            cancel,
            stats: Vec::with_capacity(n_episodes.min(1 << 20)),
        }
    }

    fn cancelled(&self) -> bool {
        let cancelled = is_cancelled(self.cancel);
        if cancelled {
            warn!(
                method = self.method,
                episodes = self.stats.len(),
                "cancelled, returning partial estimates"
            );
        }

        cancelled
    }

    fn record<S>(&mut self, episode: &[EpisodeEvent<S>]) {
        self.stats.push(EpisodeStats::of(episode));
        let done = self.stats.len();
        if self.log_every > 0 && done % self.log_every == 0 {
            debug!(method = self.method, episodes = done, of = self.n_episodes, "progress");
        }
    }

    fn finish<S: Ord + Clone>(
        self,
        q: QTable<S>,
        visits: VisitTable<S>,
        weights: Option<WeightTable<S>>,
        policy: BTreeMap<S, Discrete>,
        cancelled: bool,
    ) -> ControlOutcome<S> {
        info!(
            method = self.method,
            episodes = self.stats.len(),
            states = q.len(),
            "control finished"
        );

        ControlOutcome {
            policy,
            v: q.state_values(),
            q,
            visits,
            weights,
            stats: self.stats,
            cancelled,
        }
    }
}

/// First-visit Monte Carlo control with exploring starts, Sutton & Barto
/// 2018 section 5.3.
///
/// Each episode starts from `state_space_sample` with a random first
/// action; later actions are greedy with random tie-breaking. A greedy
/// policy can cycle forever on environments with non-terminating loops,
/// so set `max_episode_steps` there.
pub fn mc_exploring_starts<E: MdpSimulator>(
    env: &mut E,
    config: &McControlConfig,
    rng: &mut StdRng,
) -> Result<ControlOutcome<E::State>> {
    config.validate()?;

    let mut q = QTable::new(env.n_a());
    let mut visits = VisitTable::new(env.n_a());
    let mut progress = Progress::new(
        "mc_exploring_starts",
        config.n_episodes,
        config.log_every,
        &config.cancel,
    );

    let mut cancelled = false;
    for _ in 0..config.n_episodes {
        if progress.cancelled() {
            cancelled = true;
            break;
        }

        let start = env.state_space_sample(rng);
        let first = env.action_space_sample(rng);
        let episode = run_episode(env, rng, Some(start), config.max_episode_steps, |s, t, rng| {
            Ok(if t == 0 { first } else { q.greedy_action(s, rng) })
        })?;

        running_mean_update(&mut q, &mut visits, &episode, config.gamma);
        progress.record(&episode);
    }

    let policy = q.greedy_policy(rng);
    Ok(progress.finish(q, visits, None, policy, cancelled))
}

/// On-policy first-visit Monte Carlo control with a GLIE epsilon-greedy
/// policy, epsilon(s) = n0 / (n0 + N(s)). Episodes that can loop need
/// `max_episode_steps` as epsilon decays.
pub fn mc_on_policy<E: MdpSimulator>(
    env: &mut E,
    config: &McControlConfig,
    rng: &mut StdRng,
) -> Result<ControlOutcome<E::State>> {
    config.validate()?;

    let mut q = QTable::new(env.n_a());
    let mut visits = VisitTable::new(env.n_a());
    let mut progress = Progress::new(
        "mc_on_policy",
        config.n_episodes,
        config.log_every,
        &config.cancel,
    );

    let mut cancelled = false;
    for _ in 0..config.n_episodes {
        if progress.cancelled() {
            cancelled = true;
            break;
        }

        let episode = run_episode(env, rng, None, config.max_episode_steps, |s, _, rng| {
            let epsilon = glie_epsilon(config.n0, visits.total(s));
            sample_action(epsilon_greedy_probs(q.row(s).view(), epsilon).view(), rng)
        })?;

        running_mean_update(&mut q, &mut visits, &episode, config.gamma);
        progress.record(&episode);
    }

    let policy = q.greedy_policy(rng);
    Ok(progress.finish(q, visits, None, policy, cancelled))
}

/// A step taken by the behavior policy, with the probability it had.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorStep<S> {
    pub s: S,
    pub a: Discrete,
    pub r: Continous,
    pub prob: f64,
}

/// Backward pass of weighted importance sampling over one episode.
///
/// Per step: G <- r + gamma G, C(s, a) += W, Q(s, a) += W / C(s, a)
/// (G - Q(s, a)). The target policy takes the lowest maximising action, so
/// the pass ends at the first step whose action is not that action under
/// the updated Q; otherwise W <- W / b(a | s). Returns the number of steps
/// that updated Q.
pub fn weighted_importance_update<S: Ord + Clone>(
    q: &mut QTable<S>,
    weights: &mut WeightTable<S>,
    steps: &[BehaviorStep<S>],
    gamma: Continous,
) -> usize {
    let mut g = 0.;
    let mut w = 1.;
    let mut updated = 0;

    for step in steps.iter().rev() {
        g = step.r + gamma * g;

        let c = &mut weights.row_mut(&step.s)[step.a];
        *c += w;
        let c = *c;

        let q_sa = &mut q.row_mut(&step.s)[step.a];
        *q_sa += w / c * (g - *q_sa);
        updated += 1;

        if q.first_greedy_action(&step.s) != step.a {
            break;
        }
        w /= step.prob;
    }

    updated
}

/// Off-policy every-visit Monte Carlo control with weighted importance
/// sampling, Sutton & Barto 2018 section 5.7.
///
/// The behavior policy is epsilon-greedy on the current Q with
/// epsilon(e) = sqrt(c / (c + e)); episodes start from
/// `state_space_sample`.
pub fn mc_off_policy_wis<E: MdpSimulator>(
    env: &mut E,
    config: &McControlConfig,
    rng: &mut StdRng,
) -> Result<ControlOutcome<E::State>> {
    config.validate()?;

    let mut q = QTable::new(env.n_a());
    let mut weights = WeightTable::new(env.n_a());
    let mut visits = VisitTable::new(env.n_a());
    let mut progress = Progress::new(
        "mc_off_policy_wis",
        config.n_episodes,
        config.log_every,
        &config.cancel,
    );

    let mut cancelled = false;
    for e in 0..config.n_episodes {
        if progress.cancelled() {
            cancelled = true;
            break;
        }

        let epsilon = behavior_epsilon(config.behavior_c, e);
        let start = env.state_space_sample(rng);
        let mut probs = vec![];
        let episode = run_episode(env, rng, Some(start), config.max_episode_steps, |s, _, rng| {
            let b = epsilon_greedy_probs(q.row(s).view(), epsilon);
            let a = sample_action(b.view(), rng)?;
            probs.push(b[a]);
            Ok(a)
        })?;

        let steps = episode
            .iter()
            .zip(probs)
            .map(|(e, prob)| BehaviorStep {
                s: e.s.clone(),
                a: e.a,
                r: e.r,
                prob,
            })
            .collect::<Vec<_>>();

        // Every visited state gets a row, updated or not.
        for step in &steps {
            q.row_mut(&step.s);
            weights.row_mut(&step.s);
        }
        let updated = weighted_importance_update(&mut q, &mut weights, &steps, config.gamma);
        for step in steps.iter().rev().take(updated) {
            visits.increment(&step.s, step.a);
        }
        progress.record(&episode);
    }

    let policy = q.first_greedy_policy();
    Ok(progress.finish(q, visits, Some(weights), policy, cancelled))
}

/// State values estimated by Monte Carlo prediction.
#[derive(Debug, Clone)]
pub struct Prediction<S> {
    pub v: BTreeMap<S, f64>,
    /// Returns averaged into each estimate.
    pub visits: BTreeMap<S, u64>,
    pub stats: Vec<EpisodeStats>,
    pub cancelled: bool,
}

impl<S: Ord + Clone> Prediction<S> {
    fn new() -> Self {
        Self {
            v: BTreeMap::new(),
            visits: BTreeMap::new(),
            stats: vec![],
            cancelled: false,
        }
    }

    /// Folds the returns of one episode into the running means.
    fn update(&mut self, episode: &[EpisodeEvent<S>], gamma: Continous, visit: VisitRule) {
        let mut returns = Vec::with_capacity(episode.len());
        let mut g = 0.;
        for (t, e) in episode.iter().enumerate().rev() {
            g = e.r + gamma * g;
            let first = visit == VisitRule::EveryVisit || !episode[..t].iter().any(|x| x.s == e.s);
            if first {
                returns.push((e.s.clone(), g));
            }
        }

        for (s, g) in returns {
            let n = self.visits.entry(s.clone()).or_insert(0);
            *n += 1;
            let n = *n;
            let v = self.v.entry(s).or_insert(0.);
            *v += (g - *v) / n as f64;
        }
    }
}

/// First-visit or every-visit Monte Carlo prediction of a fixed strategy
/// played on a live environment.
pub fn mc_prediction<E, P>(
    env: &mut E,
    policy: &P,
    config: &PredictionConfig,
    rng: &mut StdRng,
) -> Result<Prediction<E::State>>
where
    E: MdpSimulator,
    P: Policy<E::State> + ?Sized,
{
    config.validate()?;

    let mut prediction = Prediction::new();
    for e in 0..config.n_episodes {
        if is_cancelled(&config.cancel) {
            warn!(episodes = e, "prediction cancelled");
            prediction.cancelled = true;
            break;
        }

        let episode = run_episode(env, rng, None, config.max_episode_steps, |s, _, _| {
            policy.action(s).ok_or_else(|| {
                Error::invalid_parameter("policy", format!("no action for state {s:?}"))
            })
        })?;

        prediction.update(&episode, config.gamma, config.visit);
        prediction.stats.push(EpisodeStats::of(&episode));
        if config.log_every > 0 && (e + 1) % config.log_every == 0 {
            debug!(episodes = e + 1, of = config.n_episodes, "prediction progress");
        }
    }

    info!(states = prediction.v.len(), "prediction finished");
    Ok(prediction)
}

/// Monte Carlo prediction over recorded episodes.
pub fn evaluate_episodes<S: Ord + Clone>(
    episodes: &[Vec<EpisodeEvent<S>>],
    gamma: Continous,
    visit: VisitRule,
) -> Prediction<S> {
    let mut prediction = Prediction::new();
    for episode in episodes {
        prediction.update(episode, gamma, visit);
        prediction.stats.push(EpisodeStats::of(episode));
    }

    prediction
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use rl_envs::envs::gridworld::GridWorld;
    use rl_envs::envs::grid::{LEFT, UP};

    fn ev(s: Discrete, r: Continous) -> EpisodeEvent<Discrete> {
        EpisodeEvent { s, a: 0, r }
    }

    fn toy_episodes() -> Vec<Vec<EpisodeEvent<Discrete>>> {
        vec![
            vec![ev(1, -2.), ev(4, -1.), ev(1, -3.), ev(2, -1.)],
            vec![ev(1, 0.)],
            vec![ev(2, 0.)],
        ]
    }

    #[test]
    fn toy_example_with_first_vist() {
        let p = evaluate_episodes(&toy_episodes(), 0.9, VisitRule::FirstVisit);
        let v = [1, 2, 4].map(|s| p.v[&s]);

        assert_float_eq!(v.to_vec(), vec![-6.059 / 2., -1. / 2., -4.51], abs_all <= 1e-5);
        assert_eq!(p.visits[&1], 2);
        assert!(!p.v.contains_key(&3));
    }

    #[test]
    fn toy_example_with_every_vist() {
        let p = evaluate_episodes(&toy_episodes(), 0.9, VisitRule::EveryVisit);
        let v = [1, 2, 4].map(|s| p.v[&s]);

        assert_float_eq!(
            v.to_vec(),
            vec![(-6.059 + -3.9 + 0.) / 3., -1. / 2., -4.51],
            abs_all <= 1e-5
        );
        assert_eq!(p.visits[&1], 3);
    }

    #[test]
    fn first_visit_returns_keep_the_earliest_occurrence() {
        let episode = vec![
            EpisodeEvent { s: 'a', a: 1, r: 1. },
            EpisodeEvent { s: 'b', a: 0, r: 2. },
            EpisodeEvent { s: 'a', a: 1, r: 4. },
            EpisodeEvent { s: 'a', a: 0, r: 8. },
        ];
        assert_eq!(
            first_visit_returns(&episode, 1.),
            vec![('a', 0, 8.), ('a', 1, 15.), ('b', 0, 14.)]
        );
    }

    #[test]
    fn running_mean_of_first_visit_returns() {
        let mut q = QTable::new(2);
        let mut n = VisitTable::new(2);
        for g in [3., -1., 4.] {
            running_mean_update(&mut q, &mut n, &[EpisodeEvent { s: 0usize, a: 1, r: g }], 1.);
        }
        assert_float_eq!(q.get(&0, 1), 2., abs <= 1e-12);
        assert_eq!(n.get(&0, 1), 3);
        assert_eq!(n.get(&0, 0), 0);
    }

    #[test]
    fn episodes_stop_at_the_step_limit() {
        let rng = &mut StdRng::seed_from_u64(3);
        let mut sim = GridWorld::new(3, 3).unwrap().simulator();
        let episode = run_episode(&mut sim, rng, Some(4), Some(5), |_, _, _| Ok(UP)).unwrap();
        assert_eq!(episode.len(), 5);
        assert!(episode.iter().all(|e| e.r == -1.));

        let episode = run_episode(&mut sim, rng, Some(2), None, |_, _, _| Ok(LEFT)).unwrap();
        assert_eq!(episode.iter().map(|e| e.s).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn missing_policy_action_is_reported() {
        let rng = &mut StdRng::seed_from_u64(3);
        let mut sim = GridWorld::new(3, 3).unwrap().simulator();
        let nothing = |_: &Discrete| -> Option<Discrete> { None };
        struct Nothing<F>(F);
        impl<F: Fn(&Discrete) -> Option<Discrete>> Policy<Discrete> for Nothing<F> {
            fn action(&self, s: &Discrete) -> Option<Discrete> {
                (self.0)(s)
            }
        }

        let config = PredictionConfig::default().with_n_episodes(1);
        assert!(matches!(
            mc_prediction(&mut sim, &Nothing(nothing), &config, rng),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
