//! Player representation

use crate::core::{PlayerId, PlayerName};
use serde::{Deserialize, Serialize};

/// Represents a player in the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Life total
    pub life: i32,

    /// Poison counters (ten is lethal)
    pub poison: u8,

    /// Has the player lost?
    pub has_lost: bool,

    /// Lands played this turn
    pub lands_played_this_turn: u8,

    /// Maximum lands per turn (usually 1)
    pub max_lands_per_turn: u8,
}

impl Player {
    pub const MAX_HAND_SIZE: usize = 7;

    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            poison: 0,
            has_lost: false,
            lands_played_this_turn: 0,
            max_lands_per_turn: 1,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
        if self.life <= 0 {
            self.has_lost = true;
        }
    }

    pub fn add_poison(&mut self, amount: u8) {
        self.poison = self.poison.saturating_add(amount);
        if self.poison >= 10 {
            self.has_lost = true;
        }
    }

    pub fn can_play_land(&self) -> bool {
        self.lands_played_this_turn < self.max_lands_per_turn
    }

    pub fn play_land(&mut self) {
        self.lands_played_this_turn += 1;
    }

    pub fn reset_lands_played(&mut self) {
        self.lands_played_this_turn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_is_latched() {
        // The evaluator's terminal contract depends on a loss never
        // un-happening, whatever the life total does afterwards
        let mut player = Player::new(PlayerId::new(4), "Nissa", 12);
        player.lose_life(12);
        assert_eq!(player.life, 0);
        assert!(player.has_lost);

        player.gain_life(8);
        assert_eq!(player.life, 8);
        assert!(player.has_lost);
    }

    #[test]
    fn test_poison_is_lethal_at_ten_regardless_of_life() {
        let mut player = Player::new(PlayerId::new(2), "Sheoldred", 20);
        player.add_poison(4);
        player.add_poison(5);
        assert_eq!(player.poison, 9);
        assert!(!player.has_lost);

        player.add_poison(3);
        assert_eq!(player.poison, 12);
        assert!(player.has_lost);
        assert_eq!(player.life, 20);
    }

    #[test]
    fn test_land_drops_respect_per_turn_allowance() {
        let mut player = Player::new(PlayerId::new(7), "Azusa", 20);
        player.max_lands_per_turn = 2;

        player.play_land();
        assert!(player.can_play_land());
        player.play_land();
        assert!(!player.can_play_land());

        // A new turn restores the full allowance
        player.reset_lands_played();
        assert!(player.can_play_land());
        assert_eq!(player.lands_played_this_turn, 0);
    }
}
