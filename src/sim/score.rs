//! Game state score

use serde::{Deserialize, Serialize};

/// Score representing the value of a game state
///
/// Positive favors the evaluated player, negative favors opponents.
/// `i32::MAX` / `i32::MIN` are reserved for won / lost terminal states; a
/// non-terminal evaluation never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Overall board value from the evaluated player's perspective
    pub value: i32,

    /// Score treating the player's summoning-sick creatures as worthless
    ///
    /// Used to encourage holding creatures until the second main phase when
    /// they provide no immediate value.
    pub summon_sick_value: i32,
}

impl Score {
    /// Score indicating the player has won
    pub const WIN: Score = Score {
        value: i32::MAX,
        summon_sick_value: i32::MAX,
    };

    /// Score indicating the player has lost
    pub const LOSS: Score = Score {
        value: i32::MIN,
        summon_sick_value: i32::MIN,
    };

    /// Create a new score with the same value for both metrics
    pub fn new(value: i32) -> Self {
        Score {
            value,
            summon_sick_value: value,
        }
    }

    /// Create a score with a distinct summon-sick value
    pub fn with_summon_sick(value: i32, summon_sick_value: i32) -> Self {
        Score {
            value,
            summon_sick_value,
        }
    }

    pub fn is_win(&self) -> bool {
        self.value == i32::MAX
    }

    pub fn is_loss(&self) -> bool {
        self.value == i32::MIN
    }

    pub fn is_terminal(&self) -> bool {
        self.is_win() || self.is_loss()
    }
}
