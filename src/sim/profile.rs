//! Search and evaluation configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Card-name substring tables driving the evaluator's synergy bonus
///
/// Membership is configuration, not code: a card counts toward a category
/// when its name contains any of the category's substrings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyTables {
    pub graveyard: Vec<String>,
    pub sacrifice: Vec<String>,
    pub counters: Vec<String>,
    pub tribal: Vec<String>,
    pub mana_doublers: Vec<String>,
}

impl Default for SynergyTables {
    fn default() -> Self {
        let list = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        SynergyTables {
            graveyard: list(&[
                "Reanimate",
                "Unearth",
                "Gravecrawler",
                "Dread Return",
                "Muldrotha",
            ]),
            sacrifice: list(&[
                "Altar",
                "Blood Artist",
                "Viscera Seer",
                "Mayhem Devil",
                "Zulaport",
            ]),
            counters: list(&[
                "Hardened Scales",
                "Winding Constrictor",
                "Ozolith",
                "Conclave Mentor",
            ]),
            tribal: list(&[
                "Lord of",
                "Goblin King",
                "Elvish Archdruid",
                "Coat of Arms",
                "Vanquisher's Banner",
            ]),
            mana_doublers: list(&[
                "Mana Flare",
                "Nyxbloom",
                "Mirari's Wake",
                "Zendikar Resurgent",
            ]),
        }
    }
}

/// Configuration for the decision core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimProfile {
    /// Recursion cap for the simulation search
    pub max_depth: u32,

    /// Wall-clock cap per decision
    pub time_limit: Duration,

    /// Enable transposition-table probe/store
    pub use_transposition_table: bool,

    /// Enable the seen-hash infinite-loop guard
    pub loop_detection: bool,

    /// Enable futility pruning and the soft beta cutoff
    pub pruning: bool,

    /// Score gap below the depth's best at which recursion is skipped
    pub futility_margin: i32,

    /// Magnitude of the evaluator's synergy bonus (0 disables)
    pub combo_bonus: i32,

    /// Fold imminent combat into evaluation by fast-forwarding a copy
    pub fold_combat: bool,

    /// Iteration cap for MCTS
    pub mcts_iterations: u32,

    /// Exploration constant `c` in UCB1
    pub mcts_exploration: f64,

    /// Half-turns played in an MCTS rollout
    pub mcts_rollout_depth: u32,

    /// Synergy card-name tables
    pub synergy: SynergyTables,
}

impl Default for SimProfile {
    fn default() -> Self {
        SimProfile {
            max_depth: 4,
            time_limit: Duration::from_millis(5000),
            use_transposition_table: true,
            loop_detection: true,
            pruning: true,
            futility_margin: 300,
            combo_bonus: 0,
            fold_combat: true,
            mcts_iterations: 1000,
            mcts_exploration: std::f64::consts::SQRT_2,
            mcts_rollout_depth: 10,
            synergy: SynergyTables::default(),
        }
    }
}
