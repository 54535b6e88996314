//! Turn phases and steps

use serde::{Deserialize, Serialize};

/// Major phases of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PreCombatMain,
    Combat,
    PostCombatMain,
    Ending,
}

/// Specific steps within phases
///
/// Thirteen values; `ordinal()` is both the hash field and the index of the
/// phase one-hot in the feature tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    // Beginning Phase
    Untap,
    Upkeep,
    Draw,

    // Pre-Combat Main Phase
    Main1,

    // Combat Phase
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    FirstStrikeDamage,
    CombatDamage,
    EndCombat,

    // Post-Combat Main Phase
    Main2,

    // Ending Phase
    End,
    Cleanup,
}

impl Step {
    pub const COUNT: usize = 13;

    /// Get the phase this step belongs to
    pub fn phase(&self) -> Phase {
        match self {
            Step::Untap | Step::Upkeep | Step::Draw => Phase::Beginning,
            Step::Main1 => Phase::PreCombatMain,
            Step::BeginCombat
            | Step::DeclareAttackers
            | Step::DeclareBlockers
            | Step::FirstStrikeDamage
            | Step::CombatDamage
            | Step::EndCombat => Phase::Combat,
            Step::Main2 => Phase::PostCombatMain,
            Step::End | Step::Cleanup => Phase::Ending,
        }
    }

    /// Position of this step in turn order (0..13)
    pub fn ordinal(&self) -> usize {
        match self {
            Step::Untap => 0,
            Step::Upkeep => 1,
            Step::Draw => 2,
            Step::Main1 => 3,
            Step::BeginCombat => 4,
            Step::DeclareAttackers => 5,
            Step::DeclareBlockers => 6,
            Step::FirstStrikeDamage => 7,
            Step::CombatDamage => 8,
            Step::EndCombat => 9,
            Step::Main2 => 10,
            Step::End => 11,
            Step::Cleanup => 12,
        }
    }

    /// Get the next step in turn order
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Untap => Some(Step::Upkeep),
            Step::Upkeep => Some(Step::Draw),
            Step::Draw => Some(Step::Main1),
            Step::Main1 => Some(Step::BeginCombat),
            Step::BeginCombat => Some(Step::DeclareAttackers),
            Step::DeclareAttackers => Some(Step::DeclareBlockers),
            Step::DeclareBlockers => Some(Step::FirstStrikeDamage),
            Step::FirstStrikeDamage => Some(Step::CombatDamage),
            Step::CombatDamage => Some(Step::EndCombat),
            Step::EndCombat => Some(Step::Main2),
            Step::Main2 => Some(Step::End),
            Step::End => Some(Step::Cleanup),
            Step::Cleanup => None, // End of turn
        }
    }

    /// Can a player play a sorcery in this step?
    pub fn is_sorcery_speed(&self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Can a player play lands in this step?
    pub fn can_play_lands(&self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Display name written into training records
    pub fn name(&self) -> &'static str {
        match self {
            Step::Untap => "UNTAP",
            Step::Upkeep => "UPKEEP",
            Step::Draw => "DRAW",
            Step::Main1 => "MAIN1",
            Step::BeginCombat => "COMBAT_BEGIN",
            Step::DeclareAttackers => "COMBAT_DECLARE_ATTACKERS",
            Step::DeclareBlockers => "COMBAT_DECLARE_BLOCKERS",
            Step::FirstStrikeDamage => "COMBAT_FIRST_STRIKE_DAMAGE",
            Step::CombatDamage => "COMBAT_DAMAGE",
            Step::EndCombat => "COMBAT_END",
            Step::Main2 => "MAIN2",
            Step::End => "END_OF_TURN",
            Step::Cleanup => "CLEANUP",
        }
    }
}

/// Represents the current turn structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Current turn number (starts at 1)
    pub turn_number: u32,

    /// Current step
    pub current_step: Step,

    /// Active player (whose turn it is)
    pub active_player: crate::core::PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: crate::core::PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::Untap,
            active_player: starting_player,
        }
    }

    /// Advance to the next step; returns false at end of turn
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                true
            }
            None => false,
        }
    }

    /// Begin the next turn for the given player
    pub fn next_turn(&mut self, next_player: crate::core::PlayerId) {
        self.turn_number += 1;
        self.current_step = Step::Untap;
        self.active_player = next_player;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ordering() {
        let mut step = Step::Untap;
        let mut count = 1;
        while let Some(next) = step.next() {
            step = next;
            count += 1;
        }
        assert_eq!(count, Step::COUNT);
        assert_eq!(step, Step::Cleanup);
    }

    #[test]
    fn test_ordinals_are_dense() {
        assert_eq!(Step::Untap.ordinal(), 0);
        assert_eq!(Step::Cleanup.ordinal(), 12);
        assert!(Step::Main1 < Step::Main2);
        assert!(Step::DeclareBlockers < Step::CombatDamage);
    }

    #[test]
    fn test_phases() {
        assert_eq!(Step::FirstStrikeDamage.phase(), Phase::Combat);
        assert_eq!(Step::Main2.phase(), Phase::PostCombatMain);
        assert!(Step::Main1.can_play_lands());
        assert!(!Step::Upkeep.can_play_lands());
    }
}
