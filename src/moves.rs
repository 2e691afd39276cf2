use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(row, col)` coordinate. Row 0 is Black's back rank.
pub type Square = (usize, usize);

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Signed column displacement; a king move of ±2 is a castle.
    pub fn col_delta(&self) -> i32 {
        self.to.1 as i32 - self.from.1 as i32
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})->({},{})",
            self.from.0, self.from.1, self.to.0, self.to.1
        )
    }
}
