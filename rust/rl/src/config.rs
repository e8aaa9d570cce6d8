//! Hyperparameters of the planners and learners.
//!
//! Every config deserializes with missing fields filled from `Default`,
//! offers `with_*` setters, and is checked by `validate()` before an engine
//! runs its first iteration.

use crate::mdps::schedules::Exploration;
use crate::{CancelToken, Error, Result};
use serde::{Deserialize, Serialize};

fn ensure(ok: bool, name: &str, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::invalid_parameter(name, reason()))
    }
}

fn ensure_positive(value: f64, name: &str) -> Result<()> {
    ensure(value.is_finite() && value > 0., name, || {
        format!("{value} is not a positive number")
    })
}

fn validate_gamma(gamma: f64) -> Result<()> {
    ensure(gamma > 0. && gamma <= 1., "gamma", || {
        format!("{gamma} is outside (0, 1]")
    })
}

fn validate_episodes(n_episodes: usize, max_episode_steps: Option<usize>) -> Result<()> {
    ensure(n_episodes > 0, "n_episodes", || "must be positive".to_string())?;
    ensure(max_episode_steps != Some(0), "max_episode_steps", || {
        "must be positive when set".to_string()
    })
}

/// Settings shared by the dynamic-programming engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DpConfig {
    pub gamma: f64,
    /// Sweeps stop once max_s |V'(s) - V(s)| <= theta. Also the tolerance
    /// used when collecting the set of optimal actions.
    pub theta: f64,
    pub max_iterations: usize,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for DpConfig {
    fn default() -> Self {
        Self {
            gamma: 1.,
            theta: 1e-5,
            max_iterations: 1_000_000,
            cancel: None,
        }
    }
}

impl DpConfig {
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_gamma(self.gamma)?;
        ensure_positive(self.theta, "theta")?;
        ensure(self.max_iterations > 0, "max_iterations", || {
            "must be positive".to_string()
        })
    }
}

/// Settings of the three Monte Carlo control variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McControlConfig {
    pub n_episodes: usize,
    pub gamma: f64,
    /// On-policy exploration: epsilon(s) = n0 / (n0 + N(s)).
    pub n0: f64,
    /// Off-policy behavior exploration: epsilon(e) = sqrt(c / (c + e)).
    pub behavior_c: f64,
    /// Episodes longer than this are cut off without a terminal transition.
    pub max_episode_steps: Option<usize>,
    /// Episodes between two progress log lines.
    pub log_every: usize,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for McControlConfig {
    fn default() -> Self {
        Self {
            n_episodes: 5_000_000,
            gamma: 1.,
            n0: 100.,
            behavior_c: 33_333.,
            max_episode_steps: None,
            log_every: 100_000,
            cancel: None,
        }
    }
}

impl McControlConfig {
    pub fn with_n_episodes(mut self, n_episodes: usize) -> Self {
        self.n_episodes = n_episodes;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_n0(mut self, n0: f64) -> Self {
        self.n0 = n0;
        self
    }

    pub fn with_behavior_c(mut self, behavior_c: f64) -> Self {
        self.behavior_c = behavior_c;
        self
    }

    pub fn with_max_episode_steps(mut self, max_episode_steps: usize) -> Self {
        self.max_episode_steps = Some(max_episode_steps);
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_episodes(self.n_episodes, self.max_episode_steps)?;
        validate_gamma(self.gamma)?;
        ensure_positive(self.n0, "n0")?;
        ensure_positive(self.behavior_c, "behavior_c")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitRule {
    #[default]
    FirstVisit,
    EveryVisit,
}

/// Settings of Monte Carlo prediction of a fixed strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub n_episodes: usize,
    pub gamma: f64,
    pub visit: VisitRule,
    pub max_episode_steps: Option<usize>,
    pub log_every: usize,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            n_episodes: 100_000,
            gamma: 1.,
            visit: VisitRule::FirstVisit,
            max_episode_steps: None,
            log_every: 10_000,
            cancel: None,
        }
    }
}

impl PredictionConfig {
    pub fn with_n_episodes(mut self, n_episodes: usize) -> Self {
        self.n_episodes = n_episodes;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_visit(mut self, visit: VisitRule) -> Self {
        self.visit = visit;
        self
    }

    pub fn with_max_episode_steps(mut self, max_episode_steps: usize) -> Self {
        self.max_episode_steps = Some(max_episode_steps);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_episodes(self.n_episodes, self.max_episode_steps)?;
        validate_gamma(self.gamma)
    }
}

/// Settings of SARSA and Q-learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TdConfig {
    pub n_episodes: usize,
    pub gamma: f64,
    pub exploration: Exploration,
    /// Step size: alpha(s, a) = (k / (k + N(s, a)))^(2/3).
    pub k: f64,
    pub max_episode_steps: Option<usize>,
    pub log_every: usize,
    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

impl Default for TdConfig {
    fn default() -> Self {
        Self::sarsa()
    }
}

impl TdConfig {
    /// Visit-decayed exploration, epsilon(s) = 10 / (10 + N(s)).
    pub fn sarsa() -> Self {
        Self {
            n_episodes: 200,
            gamma: 1.,
            exploration: Exploration::VisitDecay { n0: 10. },
            k: 10.,
            max_episode_steps: None,
            log_every: 50,
            cancel: None,
        }
    }

    /// Constant exploration, epsilon = 0.1.
    pub fn q_learning() -> Self {
        Self {
            exploration: Exploration::Constant { epsilon: 0.1 },
            ..Self::sarsa()
        }
    }

    pub fn with_n_episodes(mut self, n_episodes: usize) -> Self {
        self.n_episodes = n_episodes;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_exploration(mut self, exploration: Exploration) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    pub fn with_max_episode_steps(mut self, max_episode_steps: usize) -> Self {
        self.max_episode_steps = Some(max_episode_steps);
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_episodes(self.n_episodes, self.max_episode_steps)?;
        validate_gamma(self.gamma)?;
        self.exploration.validate()?;
        ensure_positive(self.k, "k")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertor::*;
    use rstest::rstest;

    #[test]
    fn defaults_are_valid() {
        DpConfig::default().validate().unwrap();
        McControlConfig::default().validate().unwrap();
        PredictionConfig::default().validate().unwrap();
        TdConfig::sarsa().validate().unwrap();
        TdConfig::q_learning().validate().unwrap();
    }

    #[rstest]
    #[case(0.)]
    #[case(-0.5)]
    #[case(1.01)]
    fn gamma_outside_unit_interval_is_rejected(#[case] gamma: f64) {
        let err = DpConfig::default().with_gamma(gamma).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name, .. } if name == "gamma"));
        assert!(TdConfig::default().with_gamma(gamma).validate().is_err());
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert!(McControlConfig::default().with_n_episodes(0).validate().is_err());
        assert!(PredictionConfig::default().with_n_episodes(0).validate().is_err());
        assert!(TdConfig::default().with_max_episode_steps(0).validate().is_err());
        assert!(DpConfig::default().with_max_iterations(0).validate().is_err());
        assert!(DpConfig::default().with_theta(0.).validate().is_err());
        assert!(McControlConfig::default().with_n0(0.).validate().is_err());
        assert!(McControlConfig::default().with_behavior_c(-1.).validate().is_err());
        assert!(TdConfig::default().with_k(0.).validate().is_err());
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn non_finite_settings_are_rejected(#[case] value: f64) {
        assert!(DpConfig::default().with_theta(value).validate().is_err());
        assert!(McControlConfig::default().with_n0(value).validate().is_err());
        assert!(McControlConfig::default().with_behavior_c(value).validate().is_err());
        assert!(TdConfig::default().with_k(value).validate().is_err());
        assert!(TdConfig::default()
            .with_exploration(Exploration::VisitDecay { n0: value })
            .validate()
            .is_err());
    }

    #[test]
    fn exploration_probability_is_checked() {
        let config = TdConfig::q_learning().with_exploration(Exploration::Constant { epsilon: 1.5 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: TdConfig =
            serde_json::from_str(r#"{"n_episodes": 500, "exploration": {"constant": {"epsilon": 0.2}}}"#)
                .unwrap();
        assert_that!(config.n_episodes).is_equal_to(500);
        assert_that!(config.exploration).is_equal_to(Exploration::Constant { epsilon: 0.2 });
        assert_that!(config.k).is_equal_to(10.);

        let config: McControlConfig = serde_json::from_str("{}").unwrap();
        assert_that!(config.n_episodes).is_equal_to(5_000_000);
        assert_that!(config.behavior_c).is_equal_to(33_333.);
    }
}
