use super::{ControlOutcome, EpisodeStats};
use crate::cancel::is_cancelled;
use crate::mdps::policy::{epsilon_greedy_probs, sample_action};
use crate::mdps::schedules::robbins_monro_alpha;
use crate::mdps::value_table::{QTable, VisitTable};
use crate::{Result, TdConfig};
use rand::prelude::*;
use rl_envs::{Discrete, MdpSimulator};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TdTarget {
    /// Bootstraps on the next action actually chosen.
    Sarsa,
    /// Bootstraps on max_a Q(s', a).
    QLearning,
}

struct TdLearner<'a, S> {
    config: &'a TdConfig,
    q: QTable<S>,
    visits: VisitTable<S>,
}

impl<'a, S: Ord + Clone> TdLearner<'a, S> {
    fn choose(&self, s: &S, rng: &mut StdRng) -> Result<Discrete> {
        let epsilon = self.config.exploration.epsilon(self.visits.total(s));
        sample_action(epsilon_greedy_probs(self.q.row(s).view(), epsilon).view(), rng)
    }

    /// Q(s, a) += alpha (target - Q(s, a)), then N(s, a) += 1.
    fn update(&mut self, s: &S, a: Discrete, target: f64) {
        let alpha = robbins_monro_alpha(self.config.k, self.visits.get(s, a));
        let q_sa = &mut self.q.row_mut(s)[a];
        *q_sa += alpha * (target - *q_sa);
        self.visits.increment(s, a);
    }
}

fn td_control<E: MdpSimulator>(
    env: &mut E,
    config: &TdConfig,
    rng: &mut StdRng,
    target: TdTarget,
) -> Result<ControlOutcome<E::State>> {
    config.validate()?;

    let method = match target {
        TdTarget::Sarsa => "sarsa",
        TdTarget::QLearning => "q_learning",
    };
    let mut learner = TdLearner {
        config,
        q: QTable::new(env.n_a()),
        visits: VisitTable::new(env.n_a()),
    };
    let mut stats = vec![];
    let mut cancelled = false;

    for e in 0..config.n_episodes {
        if is_cancelled(&config.cancel) {
            warn!(method, episodes = e, "cancelled, returning partial estimates");
            cancelled = true;
            break;
        }

        let mut s = env.reset(rng, None)?;
        let mut a = learner.choose(&s, rng)?;
        let mut episode = EpisodeStats {
            length: 0,
            total_reward: 0.,
        };

        loop {
            let step = env.step(rng, a)?;
            episode.length += 1;
            episode.total_reward += step.reward;

            let truncated = config
                .max_episode_steps
                .is_some_and(|max| episode.length >= max);
            let s_next = step.observation;

            if step.terminated {
                learner.update(&s, a, step.reward);
                break;
            }

            match target {
                TdTarget::Sarsa => {
                    let a_next = learner.choose(&s_next, rng)?;
                    let q_next = learner.q.get(&s_next, a_next);
                    learner.update(&s, a, step.reward + config.gamma * q_next);
                    a = a_next;
                }
                TdTarget::QLearning => {
                    let q_next = learner.q.max(&s_next);
                    learner.update(&s, a, step.reward + config.gamma * q_next);
                    if !truncated {
                        a = learner.choose(&s_next, rng)?;
                    }
                }
            }

            if truncated {
                break;
            }
            s = s_next;
        }

        stats.push(episode);
        if config.log_every > 0 && (e + 1) % config.log_every == 0 {
            debug!(
                method,
                episodes = e + 1,
                length = episode.length,
                total_reward = episode.total_reward,
                "progress"
            );
        }
    }

    info!(method, episodes = stats.len(), states = learner.q.len(), "control finished");
    let TdLearner { q, visits, .. } = learner;
    Ok(ControlOutcome {
        policy: q.greedy_policy(rng),
        v: q.state_values(),
        q,
        visits,
        weights: None,
        stats,
        cancelled,
    })
}

/// SARSA, Sutton & Barto 2018 section 6.4.
///
/// Q(s, a) += alpha (r + gamma Q(s', a') - Q(s, a)) with a' the action the
/// epsilon-greedy policy takes next. On a terminal transition the target
/// is r and no next action is drawn.
pub fn sarsa<E: MdpSimulator>(
    env: &mut E,
    config: &TdConfig,
    rng: &mut StdRng,
) -> Result<ControlOutcome<E::State>> {
    td_control(env, config, rng, TdTarget::Sarsa)
}

/// Q-learning, Sutton & Barto 2018 section 6.5.
///
/// Q(s, a) += alpha (r + gamma max_a' Q(s', a') - Q(s, a)) whatever the
/// behavior policy does next.
pub fn q_learning<E: MdpSimulator>(
    env: &mut E,
    config: &TdConfig,
    rng: &mut StdRng,
) -> Result<ControlOutcome<E::State>> {
    td_control(env, config, rng, TdTarget::QLearning)
}
