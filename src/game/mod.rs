//! Game state, turn structure, and the rules operations the decision core
//! consumes

pub mod actions;
pub mod combat;
pub mod logger;
pub mod phase;
pub mod state;

pub use combat::CombatState;
pub use logger::{GameLogger, VerbosityLevel};
pub use phase::{Phase, Step, TurnStructure};
pub use state::{GameEndReason, GameOutcome, GameState};
