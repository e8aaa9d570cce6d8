mod common;

use common::{Corridor, JUMP, STEP};
use float_eq::*;
use rand::prelude::*;
use rl_envs::envs::grid::MOVE_CHARS;
use rl_envs::envs::{Gambler, GridWorld};
use rl_envs::Mdp;
use rstest::rstest;
use std::rc::Rc;
use tabular_rl::*;

#[rstest]
#[case(-3.)]
#[case(-1.5)]
#[case(-1.2)]
fn value_and_policy_iteration_agree_on_corridors(#[case] jump_reward: f64) {
    let rng = &mut StdRng::seed_from_u64(1);
    let corridor = Corridor::new(7, jump_reward);
    let config = DpConfig::default();

    let vi = ValueIteration::solve(&corridor, &config, rng).unwrap();
    let pi = PolicyIteration::solve(&corridor, &config, rng).unwrap();

    assert_float_eq!(vi.v.to_vec(), pi.v.to_vec(), abs_all <= 1e-6);
    for s in 0..corridor.n_s() {
        assert_eq!(vi.optimal_actions(s), pi.optimal_actions(s), "state {s}");
    }
}

#[test]
fn corridor_optimal_actions_are_known() {
    let rng = &mut StdRng::seed_from_u64(1);

    let costly_jump = ValueIteration::solve(&Corridor::new(7, -3.), &DpConfig::default(), rng).unwrap();
    for s in 0..6 {
        assert_eq!(costly_jump.optimal_actions(s), &[STEP]);
        assert_float_eq!(costly_jump.v_star(s), -(6. - s as f64), abs <= 1e-9);
    }

    let cheap_jump = ValueIteration::solve(&Corridor::new(7, -1.2), &DpConfig::default(), rng).unwrap();
    let expected: [&[usize]; 7] = [
        &[JUMP],
        &[STEP, JUMP],
        &[JUMP],
        &[STEP, JUMP],
        &[JUMP],
        &[STEP],
        &[STEP, JUMP],
    ];
    for (s, actions) in expected.into_iter().enumerate() {
        assert_eq!(cheap_jump.optimal_actions(s), actions, "state {s}");
    }
}

#[test]
fn policy_iteration_stops_when_total_value_stops_increasing() {
    let rng = &mut StdRng::seed_from_u64(3);
    let gw = GridWorld::new(4, 4).unwrap();
    let config = DpConfig::default();
    let pi = PolicyIteration::solve(&gw, &config, rng).unwrap();

    let totals = pi.total_values();
    assert!(totals.windows(2).all(|w| w[1] > w[0]), "{totals:?}");
    assert_eq!(totals.last().copied(), Some(pi.v.sum()));

    let next = TabularPolicy::deterministic(gw.n_a(), &improve_policy(&pi.q, rng));
    let next = evaluate_policy(&gw, &next, &config).unwrap();
    assert!(next.v.sum() <= pi.v.sum() + 1e-9);
}

#[test]
fn uniform_policy_on_the_small_gridworld() {
    let gw = GridWorld::new(4, 4).unwrap();
    let config = DpConfig::default().with_theta(1e-10);
    let pe = evaluate_policy(&gw, &TabularPolicy::uniform(&gw), &config).unwrap();

    assert_float_eq!(
        pe.v.to_vec(),
        vec![
            0., -14., -20., -22., //
            -14., -18., -20., -20., //
            -20., -20., -18., -14., //
            -22., -20., -14., 0.
        ],
        abs_all <= 1e-4
    );
    assert_eq!(pe.q[[1, 3]], -1.);
}

#[test]
fn gridworld_optimal_action_sets() {
    let rng = &mut StdRng::seed_from_u64(3);
    let gw = GridWorld::new(4, 4).unwrap();
    let vi = ValueIteration::solve(&gw, &DpConfig::default(), rng).unwrap();

    let grid = gw.grid();
    let rendered = (0..grid.height)
        .map(|y| {
            (0..grid.width)
                .map(|x| {
                    let s = grid.coords_to_state((y, x));
                    if gw.is_done(s) {
                        "T".to_string()
                    } else {
                        vi.optimal_actions(s).iter().map(|&a| ["U", "D", "R", "L"][a]).collect()
                    }
                })
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(rendered, @r###"
    T|L|L|DL
    U|UL|UDRL|D
    U|UDRL|DR|D
    UR|R|R|T
    "###);

    for s in 1..15 {
        let a = vi.pi_star(s).unwrap();
        assert!(vi.optimal_actions(s).contains(&a), "{}", MOVE_CHARS[a]);
    }
}

#[test]
fn sampled_returns_of_the_planned_policy_match_its_values() {
    let rng = &mut StdRng::seed_from_u64(5);
    let gw = GridWorld::new(4, 4).unwrap();
    let vi = Rc::new(ValueIteration::solve(&gw, &DpConfig::default(), rng).unwrap());
    let policy = MdpSolverPolicy::new(vi.clone());

    let config = PredictionConfig::default().with_n_episodes(500);
    let prediction = mc_prediction(&mut gw.simulator(), &policy, &config, rng).unwrap();

    assert_eq!(prediction.v.len(), 16);
    for (&s, &v) in &prediction.v {
        assert_float_eq!(v, vi.v_star(s), abs <= 1e-9);
    }
}

#[test]
fn sweep_budget_surfaces_as_non_convergence() {
    let rng = &mut StdRng::seed_from_u64(5);
    let gambler = Gambler::new(0.4).unwrap();
    let config = DpConfig::default().with_max_iterations(2);

    assert!(matches!(
        ValueIteration::solve(&gambler, &config, rng),
        Err(Error::NonConvergence { iterations: 2, .. })
    ));
}

#[test]
fn invalid_parameters_are_rejected_before_any_sweep() {
    let rng = &mut StdRng::seed_from_u64(5);
    let gw = GridWorld::new(2, 3).unwrap();
    let config = DpConfig::default().with_gamma(1.5);

    assert!(matches!(
        PolicyIteration::solve(&gw, &config, rng),
        Err(Error::InvalidParameter { .. })
    ));
}

#[test]
fn cancelled_planning_fails() {
    let rng = &mut StdRng::seed_from_u64(5);
    let gw = GridWorld::new(4, 4).unwrap();
    let token = CancelToken::new();
    token.cancel();

    let err = PolicyIteration::solve(&gw, &DpConfig::default().with_cancel(token), rng).unwrap_err();
    assert_eq!(err, Error::Cancelled { iterations: 0 });
}
