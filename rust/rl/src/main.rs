use itertools::Itertools;
use rand::prelude::*;
use rl_envs::envs::blackjack::{threshold_strategy, Blackjack};
use rl_envs::envs::grid::{Grid, MOVE_CHARS};
use rl_envs::envs::{CliffGridWorld, Easy21, Gambler, GridWorld, WindyGridWorld, WindyMoves};
use rl_envs::{Discrete, MdpSimulator};
use serde::Serialize;
use std::error::Error;
use std::rc::Rc;
use tabular_rl::{
    evaluate_policy, mc_exploring_starts, mc_off_policy_wis, mc_on_policy, mc_prediction,
    q_learning, sarsa, ControlOutcome, DpConfig, McControlConfig, MdpSolver, MdpSolverPolicy,
    Policy, PolicyIteration, PredictionConfig, TabularPolicy, TdConfig, ValueIteration,
};
use tracing::info;

const SEED: u64 = 2718;

fn to_json<T: Serialize>(config: &T) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string(config)?)
}

fn render_policy(
    grid: Grid,
    terminal: impl Fn(Discrete) -> bool,
    action: impl Fn(Discrete) -> Option<Discrete>,
) -> String {
    (0..grid.height)
        .map(|y| {
            (0..grid.width)
                .map(|x| {
                    let s = grid.coords_to_state((y, x));
                    match action(s) {
                        _ if terminal(s) => 'T',
                        Some(a) => MOVE_CHARS[a],
                        None => ' ',
                    }
                })
                .collect::<String>()
        })
        .join("\n")
}

fn greedy_rollout<E: MdpSimulator>(
    env: &mut E,
    outcome: &ControlOutcome<E::State>,
    rng: &mut StdRng,
    max_steps: usize,
) -> Result<(usize, f64), Box<dyn Error>> {
    let mut s = env.reset(rng, None)?;
    let mut total = 0.;
    for t in 1..=max_steps {
        let a = outcome.action(&s).unwrap_or(0);
        let step = env.step(rng, a)?;
        total += step.reward;
        if step.terminated {
            return Ok((t, total));
        }
        s = step.observation;
    }

    Ok((max_steps, total))
}

fn gridworld(rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let gw = GridWorld::new(4, 4)?;
    let config = DpConfig::default();
    info!(config = %to_json(&config)?, "gridworld");

    let pe = evaluate_policy(&gw, &TabularPolicy::uniform(&gw), &config)?;
    info!(sweeps = pe.sweeps, v = ?pe.v.to_vec(), "uniform policy evaluated");

    let pi = PolicyIteration::solve(&gw, &config, rng)?;
    info!(
        totals = ?pi.total_values(),
        "policy iteration\n{}",
        render_policy(gw.grid(), |s| gw.is_done(s), |s| pi.pi_star(s))
    );

    let vi = Rc::new(ValueIteration::solve(&gw, &config, rng)?);
    info!(
        sweeps = vi.sweeps,
        "value iteration\n{}",
        render_policy(gw.grid(), |s| gw.is_done(s), |s| vi.pi_star(s))
    );

    let policy = MdpSolverPolicy::new(vi.clone());
    let prediction = mc_prediction(
        &mut gw.clone().simulator(),
        &policy,
        &PredictionConfig::default().with_n_episodes(1_000),
        rng,
    )?;
    let worst_gap = prediction
        .v
        .iter()
        .map(|(&s, &v)| (v - vi.v_star(s)).abs())
        .fold(0., f64::max);
    info!(worst_gap, "sampled returns of the value-iteration policy");

    Ok(())
}

fn gambler(rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let gambler = Gambler::new(0.4)?;
    let vi = ValueIteration::solve(&gambler, &DpConfig::default(), rng)?;
    for s in [25, 50, 75] {
        info!(
            capital = s,
            v = vi.v_star(s),
            stakes = ?vi.optimal_actions(s),
            "gambler value iteration"
        );
    }

    Ok(())
}

fn blackjack(rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let mut env = Blackjack::new();

    let config = PredictionConfig::default();
    info!(config = %to_json(&config)?, "blackjack prediction");
    let prediction = mc_prediction(&mut env, &threshold_strategy(20)?, &config, rng)?;
    info!(
        v_20_10 = prediction.v.get(&(20, 10, false)).copied().unwrap_or_default(),
        v_13_2 = prediction.v.get(&(13, 2, false)).copied().unwrap_or_default(),
        "stick on 20"
    );

    let config = McControlConfig::default();
    info!(config = %to_json(&config)?, "blackjack control");
    let es = mc_exploring_starts(&mut env, &config, rng)?;
    info!(
        states = es.q.len(),
        hit_on_16_vs_10 = es.action(&(16, 10, false)) == Some(1),
        "exploring starts"
    );

    let wis = mc_off_policy_wis(&mut env, &config, rng)?;
    info!(
        states = wis.q.len(),
        hit_on_16_vs_10 = wis.action(&(16, 10, false)) == Some(1),
        "off-policy weighted importance sampling"
    );

    Ok(())
}

fn easy21(rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let mut env = Easy21::new();
    let outcome = mc_on_policy(&mut env, &McControlConfig::default(), rng)?;
    let best = outcome
        .v
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(s, v)| (*s, *v));
    info!(states = outcome.q.len(), best = ?best, "easy21 on-policy control");

    Ok(())
}

fn td(rng: &mut StdRng) -> Result<(), Box<dyn Error>> {
    let config = TdConfig::sarsa();
    info!(config = %to_json(&config)?, "windy gridworld");
    let mut windy = WindyGridWorld::new(WindyMoves::Normal).simulator();
    let outcome = sarsa(&mut windy, &config, rng)?;
    let (steps, total) = greedy_rollout(&mut windy, &outcome, rng, 1_000)?;
    info!(
        last_episode = ?outcome.stats.last(),
        steps,
        total,
        "sarsa greedy rollout\n{}",
        render_policy(WindyGridWorld::grid(), |s| windy.mdp().is_target(s), |s| outcome.action(&s))
    );

    let config = TdConfig::q_learning();
    info!(config = %to_json(&config)?, "cliff gridworld");
    let mut cliff = CliffGridWorld::new().simulator();
    let outcome = q_learning(&mut cliff, &config, rng)?;
    let (steps, total) = greedy_rollout(&mut cliff, &outcome, rng, 1_000)?;
    info!(
        last_episode = ?outcome.stats.last(),
        steps,
        total,
        "q-learning greedy rollout\n{}",
        render_policy(CliffGridWorld::grid(), |s| cliff.mdp().is_target(s), |s| outcome.action(&s))
    );

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let rng = &mut StdRng::seed_from_u64(SEED);
    gridworld(rng)?;
    gambler(rng)?;
    blackjack(rng)?;
    easy21(rng)?;
    td(rng)?;

    Ok(())
}
