//! Decisions and plans
//!
//! A search descends through decisions: chosen actions plus the ancillary
//! choices (targets, modes, chosen cards, an announced X) that belong to an
//! action. The final plan is the linear root-to-leaf sequence with each
//! ancillary decision folded into its owning action entry.

use crate::core::{ActionRef, CardId};
use crate::sim::score::Score;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One choice made while descending the search tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// A chosen candidate action
    Action(ActionRef),

    /// Targets chosen for the preceding action
    Targets(SmallVec<[CardId; 2]>),

    /// Modes chosen for the preceding action (bitmask plus description)
    Modes { mask: u32, description: String },

    /// Cards chosen for the preceding action
    Cards(SmallVec<[CardId; 4]>),

    /// X value announced for the preceding action
    XValue(i32),
}

/// A plan entry: one action with its sub-decisions merged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub action: ActionRef,
    pub targets: SmallVec<[CardId; 2]>,
    pub modes: Option<(u32, String)>,
    pub chosen_cards: SmallVec<[CardId; 4]>,
    pub x_value: Option<i32>,
}

impl PlanEntry {
    fn new(action: ActionRef) -> Self {
        PlanEntry {
            action,
            targets: SmallVec::new(),
            modes: None,
            chosen_cards: SmallVec::new(),
            x_value: None,
        }
    }
}

/// The best line the search found, as a linear list of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
    pub expected_score: Score,
}

impl Plan {
    /// Fold a raw decision sequence into plan entries in a single pass
    ///
    /// Ancillary decisions attach to the most recent action; any that
    /// precede the first action have no owner and are dropped.
    pub fn from_decisions(decisions: &[Decision], expected_score: Score) -> Self {
        let mut entries: Vec<PlanEntry> = Vec::new();

        for decision in decisions {
            match decision {
                Decision::Action(action_ref) => {
                    entries.push(PlanEntry::new(action_ref.clone()));
                }
                Decision::Targets(targets) => {
                    if let Some(entry) = entries.last_mut() {
                        entry.targets.extend(targets.iter().copied());
                    }
                }
                Decision::Modes { mask, description } => {
                    if let Some(entry) = entries.last_mut() {
                        entry.modes = Some((*mask, description.clone()));
                    }
                }
                Decision::Cards(cards) => {
                    if let Some(entry) = entries.last_mut() {
                        entry.chosen_cards.extend(cards.iter().copied());
                    }
                }
                Decision::XValue(x) => {
                    if let Some(entry) = entries.last_mut() {
                        entry.x_value = Some(*x);
                    }
                }
            }
        }

        Plan {
            entries,
            expected_score,
        }
    }

    /// The first action to take, if the plan is non-empty
    pub fn first_action(&self) -> Option<&ActionRef> {
        self.entries.first().map(|e| &e.action)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
