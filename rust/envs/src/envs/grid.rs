use crate::Discrete;

pub const UP: Discrete = 0;
pub const DOWN: Discrete = 1;
pub const RIGHT: Discrete = 2;
pub const LEFT: Discrete = 3;
pub const UP_RIGHT: Discrete = 4;
pub const UP_LEFT: Discrete = 5;
pub const DOWN_RIGHT: Discrete = 6;
pub const DOWN_LEFT: Discrete = 7;
pub const NO_MOVE: Discrete = 8;

/// (dy, dx) per action, indexed by the constants above.
pub const MOVES: [(i64, i64); 9] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, -1),
    (1, 1),
    (1, -1),
    (0, 0),
];

pub const MOVE_CHARS: [char; 9] = ['↑', '↓', '→', '←', '↗', '↖', '↘', '↙', '∅'];

/// Row-major indexing of a height x width board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub height: usize,
    pub width: usize,
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn n_s(&self) -> usize {
        self.height * self.width
    }

    pub fn state_to_coords(&self, s: Discrete) -> (usize, usize) {
        (s / self.width, s % self.width)
    }

    pub fn coords_to_state(&self, (y, x): (usize, usize)) -> Discrete {
        y * self.width + x
    }

    /// Clamps a possibly off-board position onto the board.
    pub fn limit_position(&self, y: i64, x: i64) -> Discrete {
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        self.coords_to_state((y, x))
    }

    /// Where `action` leads from `s` when the column pushes the agent
    /// `lift` cells upwards.
    pub fn shifted(&self, s: Discrete, action: Discrete, lift: i64) -> Discrete {
        let (y, x) = self.state_to_coords(s);
        let (dy, dx) = MOVES[action];
        self.limit_position(y as i64 + dy - lift, x as i64 + dx)
    }
}
