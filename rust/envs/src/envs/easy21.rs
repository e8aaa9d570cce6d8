use crate::{Discrete, EpisodeCursor, Error, MdpSimulator, Result, StepInfo};
use rand::prelude::*;

pub const STICK: Discrete = 0;
pub const HIT: Discrete = 1;

/// (player sum, dealer's first card).
pub type Easy21State = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// A card's value and colour: black cards add, red cards subtract.
pub type Card = (i32, Color);

/// The Easy21 assignment from David Silver's RL course: no aces, an
/// infinite deck of values 1..=10 where a third of the cards are red.
/// Going below 1 or above 21 busts.
#[derive(Debug, Default)]
pub struct Easy21 {
    cursor: EpisodeCursor<Easy21State>,
    player_sum: i32,
    dealer_card: i32,
    cards: Vec<Card>,
}

impl Easy21 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cards dealt to the player in the current round.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    fn draw_card(rng: &mut StdRng) -> Card {
        let color = if rng.gen_bool(2. / 3.) {
            Color::Black
        } else {
            Color::Red
        };
        (rng.gen_range(1..=10), color)
    }

    fn add((value, color): Card, sum: i32) -> Option<i32> {
        let sum = match color {
            Color::Black => sum + value,
            Color::Red => sum - value,
        };
        (1..=21).contains(&sum).then_some(sum)
    }

    fn obs(&self) -> Easy21State {
        (self.player_sum, self.dealer_card)
    }
}

impl MdpSimulator for Easy21 {
    type State = Easy21State;

    fn name(&self) -> String {
        "Easy21".to_string()
    }

    fn n_a(&self) -> usize {
        2
    }

    /// Both opening cards are black.
    fn reset(&mut self, rng: &mut StdRng, start: Option<Easy21State>) -> Result<Easy21State> {
        let (player, dealer) = match start {
            Some((player, dealer)) if !(1..=21).contains(&player) || !(1..=10).contains(&dealer) => {
                return Err(Error::invalid_parameter(
                    "start",
                    format!("({player}, {dealer}) is outside 1..=21 x 1..=10"),
                ))
            }
            Some(s) => s,
            None => (rng.gen_range(1..=10), rng.gen_range(1..=10)),
        };

        self.player_sum = player;
        self.dealer_card = dealer;
        self.cards = vec![(player, Color::Black)];

        let s = self.obs();
        self.cursor.begin(s);
        Ok(s)
    }

    fn step(&mut self, rng: &mut StdRng, action: Discrete) -> Result<StepInfo<Easy21State>> {
        self.cursor.current(self.n_a(), action)?;

        let (reward, terminated) = if action == HIT {
            let card = Self::draw_card(rng);
            self.cards.push(card);
            match Self::add(card, self.player_sum) {
                Some(sum) => {
                    self.player_sum = sum;
                    (0., false)
                }
                None => (-1., true),
            }
        } else {
            let mut dealer_sum = Some(self.dealer_card);
            while let Some(sum) = dealer_sum.filter(|&sum| sum < 17) {
                dealer_sum = Self::add(Self::draw_card(rng), sum);
            }
            let reward = match dealer_sum {
                None => 1.,
                Some(sum) => match self.player_sum.cmp(&sum) {
                    std::cmp::Ordering::Greater => 1.,
                    std::cmp::Ordering::Less => -1.,
                    std::cmp::Ordering::Equal => 0.,
                },
            };
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

    fn state_space_sample(&self, rng: &mut StdRng) -> Easy21State {
        (rng.gen_range(1..=21), rng.gen_range(1..=10))
    }
}
