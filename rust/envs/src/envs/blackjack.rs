use crate::{Discrete, EpisodeCursor, Error, MdpSimulator, Result, StepInfo};
use rand::prelude::*;
use tracing::trace;

pub const STICK: Discrete = 0;
pub const HIT: Discrete = 1;

/// Infinite deck: aces count 1 (or 11 when usable), face cards count 10.
pub const CARDS: [u32; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

/// (player sum, dealer's showing card, usable ace).
pub type BlackjackState = (u32, u32, bool);

/// Cards dealt in the current round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hands {
    pub player: Vec<u32>,
    pub dealer: Vec<u32>,
}

/// Sutton & Barto example 5.1. The player's decisions only start at a sum
/// of 12: reset keeps drawing until then.
#[derive(Debug, Default)]
pub struct Blackjack {
    cursor: EpisodeCursor<BlackjackState>,
    player_sum: u32,
    dealer_card: u32,
    usable_ace: bool,
    player_cards: usize,
    hands: Hands,
}

impl Blackjack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hands(&self) -> &Hands {
        &self.hands
    }

    fn obs(&self) -> BlackjackState {
        (self.player_sum, self.dealer_card, self.usable_ace)
    }

    fn draw_card(rng: &mut StdRng) -> u32 {
        CARDS[rng.gen_range(0..CARDS.len())]
    }

    fn deal(&mut self, rng: &mut StdRng) {
        self.player_sum = 0;
        self.usable_ace = false;
        self.player_cards = 0;

        while self.player_sum < 12 {
            let c = Self::draw_card(rng);
            self.hands.player.push(c);
            self.player_cards += 1;
            if c == 1 && self.player_sum + 11 <= 21 {
                self.player_sum += 11;
                self.usable_ace = true;
            } else {
                self.player_sum += c;
            }
        }

        self.dealer_card = Self::draw_card(rng);
    }

    /// Returns the dealer's final sum, or `None` on a bust, and the number
    /// of cards the dealer holds.
    fn dealer_plays(&mut self, rng: &mut StdRng) -> (Option<u32>, usize) {
        let mut usable_ace = self.dealer_card == 1;
        let mut sum = if usable_ace { 11 } else { self.dealer_card };
        let mut cards = 1;

        while sum < 17 {
            let c = Self::draw_card(rng);
            self.hands.dealer.push(c);
            cards += 1;
            if c == 1 && sum + 11 <= 21 {
                sum += 11;
                usable_ace = true;
            } else if sum + c > 21 && usable_ace {
                sum = sum + c - 10;
                usable_ace = false;
            } else {
                sum += c;
            }
        }

        ((sum <= 21).then_some(sum), cards)
    }

    fn showdown(&self, dealer_sum: u32, dealer_cards: usize) -> f64 {
        let player_natural = self.player_cards == 2;
        let dealer_natural = dealer_cards == 2;

        match self.player_sum.cmp(&dealer_sum) {
            std::cmp::Ordering::Greater => 1.,
            std::cmp::Ordering::Less => -1.,
            std::cmp::Ordering::Equal if self.player_sum < 21 => 0.,
            std::cmp::Ordering::Equal => match (player_natural, dealer_natural) {
                (true, false) => 1.,
                (false, true) => -1.,
                _ => 0.,
            },
        }
    }
}

impl MdpSimulator for Blackjack {
    type State = BlackjackState;

    fn name(&self) -> String {
        "Blackjack".to_string()
    }

    fn n_a(&self) -> usize {
        2
    }

    /// A forced start is treated as a freshly dealt two-card hand.
    fn reset(&mut self, rng: &mut StdRng, start: Option<BlackjackState>) -> Result<BlackjackState> {
        self.hands = Hands::default();

        match start {
            Some((sum, dealer, ace)) => {
                if !(12..=21).contains(&sum) || !(1..=10).contains(&dealer) {
                    return Err(Error::invalid_parameter(
                        "start",
                        format!("({sum}, {dealer}, {ace}) is not a decision state"),
                    ));
                }
                self.player_sum = sum;
                self.dealer_card = dealer;
                self.usable_ace = ace;
                self.player_cards = 2;
            }
            None => self.deal(rng),
        }
        self.hands.dealer.push(self.dealer_card);

        let s = self.obs();
        self.cursor.begin(s);
        Ok(s)
    }

    fn step(&mut self, rng: &mut StdRng, action: Discrete) -> Result<StepInfo<BlackjackState>> {
        self.cursor.current(self.n_a(), action)?;

        let (reward, terminated) = if action == HIT {
            let c = Self::draw_card(rng);
            self.hands.player.push(c);
            self.player_cards += 1;
            if self.player_sum + c > 21 && self.usable_ace {
                self.player_sum = self.player_sum + c - 10;
                self.usable_ace = false;
                (0., false)
            } else if self.player_sum + c <= 21 {
                self.player_sum += c;
                (0., false)
            } else {
                (-1., true)
            }
        } else {
            let reward = match self.dealer_plays(rng) {
                (None, _) => 1.,
                (Some(sum), cards) => self.showdown(sum, cards),
            };
            trace!(hands = ?self.hands, reward, "round over");
            (reward, true)
        };

        let s = self.obs();
        self.cursor.advance(action, s, terminated);
        Ok(StepInfo {
            observation: s,
            reward,
            terminated,
        })
    }

    fn state_space_sample(&self, rng: &mut StdRng) -> BlackjackState {
        (rng.gen_range(12..=21), rng.gen_range(1..=10), rng.gen())
    }
}

/// Hit while the player's sum is below `threshold`, stick otherwise.
pub fn threshold_strategy(threshold: u32) -> Result<impl Fn(&BlackjackState) -> Discrete> {
    if !(12..=21).contains(&threshold) {
        return Err(Error::invalid_parameter(
            "threshold",
            format!("{threshold} is outside 12..=21"),
        ));
    }

    Ok(move |&(sum, _, _): &BlackjackState| if sum < threshold { HIT } else { STICK })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn dealt_hands_start_at_twelve() {
        let rng = &mut StdRng::seed_from_u64(7);
        let mut env = Blackjack::new();
        for _ in 0..500 {
            let (sum, dealer, ace) = env.reset(rng, None).unwrap();
            assert!((12..=21).contains(&sum));
            assert!((1..=10).contains(&dealer));
            if ace {
                assert!(env.hands().player.contains(&1));
            }
        }
    }

    #[test]
    fn episodes_end_after_a_stick() {
        let rng = &mut StdRng::seed_from_u64(17);
        let mut env = Blackjack::new();
        for _ in 0..500 {
            env.reset(rng, None).unwrap();
            let si = env.step(rng, STICK).unwrap();
            assert!(si.terminated);
            assert!([-1., 0., 1.].contains(&si.reward));
            assert!(env.hands().dealer.len() >= 2);
            assert!(matches!(
                env.step(rng, HIT).unwrap_err(),
                Error::UndefinedState { .. }
            ));
        }
    }

    #[test]
    fn usable_ace_absorbs_a_bust() {
        let rng = &mut StdRng::seed_from_u64(23);
        let mut env = Blackjack::new();
        for _ in 0..200 {
            env.reset(rng, Some((21, 5, true))).unwrap();
            let si = env.step(rng, HIT).unwrap();
            let c = *env.hands().player.last().unwrap();
            assert!(!si.terminated);
            assert_eq!(si.observation, (11 + c, 5, false));
        }
    }

    #[test]
    fn hard_twenty_one_busts_on_any_hit() {
        let rng = &mut StdRng::seed_from_u64(29);
        let mut env = Blackjack::new();
        env.reset(rng, Some((21, 10, false))).unwrap();
        let si = env.step(rng, HIT).unwrap();
        assert_eq!((si.observation, si.reward, si.terminated), ((21, 10, false), -1., true));
    }

    #[test]
    fn contract_errors() {
        let rng = &mut StdRng::seed_from_u64(1);
        let mut env = Blackjack::new();
        assert!(matches!(
            env.step(rng, HIT).unwrap_err(),
            Error::UndefinedState { .. }
        ));
        env.reset(rng, None).unwrap();
        assert_eq!(
            env.step(rng, 2).unwrap_err(),
            Error::InvalidAction { action: 2, n_a: 2 }
        );
        assert!(env.reset(rng, Some((22, 1, false))).is_err());
        assert!(env.reset(rng, Some((15, 0, false))).is_err());
    }

    #[test]
    fn threshold_strategy_hits_below_the_threshold() {
        let strategy = threshold_strategy(20).unwrap();
        assert_eq!(strategy(&(19, 3, false)), HIT);
        assert_eq!(strategy(&(20, 3, true)), STICK);
        assert!(threshold_strategy(11).is_err());
        assert!(threshold_strategy(22).is_err());
    }

    #[test]
    fn dealer_draws_past_a_soft_hand() {
        let rng = &mut StdRng::seed_from_u64(43);
        let mut env = Blackjack::new();
        let mut wins = 0;
        for _ in 0..2_000 {
            env.reset(rng, Some((20, 1, false))).unwrap();
            let si = env.step(rng, STICK).unwrap();
            assert!(si.terminated);
            assert!([-1., 0., 1.].contains(&si.reward));
            assert_eq!(env.hands().dealer[0], 1);
            if si.reward == 1. {
                wins += 1;
            }
        }
        assert!(wins > 0);
    }

    #[rstest]
    #[case(21, 2, 21, 2, 0.)]
    #[case(21, 2, 21, 3, 1.)]
    #[case(21, 3, 21, 2, -1.)]
    #[case(21, 4, 21, 3, 0.)]
    #[case(20, 2, 20, 3, 0.)]
    #[case(19, 3, 20, 2, -1.)]
    #[case(20, 3, 18, 4, 1.)]
    fn showdown_rules(
        #[case] player_sum: u32,
        #[case] player_cards: usize,
        #[case] dealer_sum: u32,
        #[case] dealer_cards: usize,
        #[case] reward: f64,
    ) {
        let env = Blackjack {
            player_sum,
            player_cards,
            ..Blackjack::default()
        };
        assert_eq!(env.showdown(dealer_sum, dealer_cards), reward);
    }

    #[test]
    fn sampled_states_are_decision_states() {
        let rng = &mut StdRng::seed_from_u64(2);
        let env = Blackjack::new();
        for _ in 0..200 {
            let (sum, dealer, _) = env.state_space_sample(rng);
            assert!((12..=21).contains(&sum) && (1..=10).contains(&dealer));
        }
    }
}
