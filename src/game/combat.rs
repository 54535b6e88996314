//! Combat state and legality
//!
//! Tracks declared attackers and blockers, and answers the evasion-aware
//! legality questions the evaluator and the decision bridge ask.

use crate::core::{Card, CardId, Color, Keyword, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Combat state for the current combat phase
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombatState {
    /// Maps attacker ID to the player being attacked
    pub attackers: BTreeMap<CardId, PlayerId>,

    /// Maps blocker ID to the attackers it's blocking
    pub blockers: BTreeMap<CardId, SmallVec<[CardId; 2]>>,

    /// Reverse mapping: attacker -> blockers
    pub attacker_blockers: BTreeMap<CardId, SmallVec<[CardId; 4]>>,

    /// Whether combat has started this turn
    pub combat_active: bool,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Can this creature be declared as an attacker right now?
    pub fn can_attack(card: &Card, current_turn: u32) -> bool {
        card.is_creature()
            && !card.tapped
            && !card.has_defender()
            && !card.is_summoning_sick(current_turn)
    }

    /// Can `blocker` legally block `attacker` under evasion keywords?
    pub fn can_block(blocker: &Card, attacker: &Card) -> bool {
        if !blocker.is_creature() || blocker.tapped {
            return false;
        }

        if attacker.has_flying() && !(blocker.has_flying() || blocker.has_reach()) {
            return false;
        }
        if attacker.has_keyword(&Keyword::Horsemanship)
            && !blocker.has_keyword(&Keyword::Horsemanship)
        {
            return false;
        }
        if attacker.has_keyword(&Keyword::Shadow) && !blocker.has_keyword(&Keyword::Shadow) {
            return false;
        }
        // A creature with shadow can block only creatures with shadow
        if !attacker.has_keyword(&Keyword::Shadow) && blocker.has_keyword(&Keyword::Shadow) {
            return false;
        }
        // Fear: blocked only by artifact and/or black creatures
        if attacker.has_keyword(&Keyword::Fear)
            && !(blocker.is_artifact() || blocker.colors.contains(&Color::Black))
        {
            return false;
        }
        // Intimidate: blocked only by artifact creatures or those sharing a color
        if attacker.has_keyword(&Keyword::Intimidate)
            && !(blocker.is_artifact()
                || attacker.colors.iter().any(|c| blocker.colors.contains(c)))
        {
            return false;
        }

        true
    }

    /// Declare a creature as an attacker
    pub fn add_attacker(&mut self, attacker: CardId, defending_player: PlayerId) {
        self.attackers.insert(attacker, defending_player);
        self.combat_active = true;
    }

    /// Declare a creature as a blocker of the given attacker
    pub fn add_blocker(&mut self, blocker: CardId, attacker: CardId) {
        self.blockers.entry(blocker).or_default().push(attacker);
        self.attacker_blockers
            .entry(attacker)
            .or_default()
            .push(blocker);
    }

    /// Check that every declared attacker satisfies `can_attack`
    pub fn validate_attackers<'a>(
        &self,
        mut lookup: impl FnMut(CardId) -> Option<&'a Card>,
        current_turn: u32,
    ) -> bool {
        self.attackers.keys().all(|&id| {
            lookup(id)
                .map(|card| Self::can_attack(card, current_turn))
                .unwrap_or(false)
        })
    }

    pub fn is_attacking(&self, card_id: CardId) -> bool {
        self.attackers.contains_key(&card_id)
    }

    pub fn is_blocked(&self, attacker: CardId) -> bool {
        self.attacker_blockers
            .get(&attacker)
            .is_some_and(|blockers| !blockers.is_empty())
    }

    /// Get the blockers for a given attacker
    pub fn get_blockers(&self, attacker: CardId) -> SmallVec<[CardId; 4]> {
        self.attacker_blockers
            .get(&attacker)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_defending_player(&self, attacker: CardId) -> Option<PlayerId> {
        self.attackers.get(&attacker).copied()
    }

    pub fn get_attackers(&self) -> Vec<CardId> {
        self.attackers.keys().copied().collect()
    }

    /// Players currently being attacked
    pub fn defenders(&self) -> Vec<PlayerId> {
        let mut out: Vec<PlayerId> = self.attackers.values().copied().collect();
        out.sort();
        out.dedup();
        out
    }

    /// Remove all declared attackers (and their block assignments)
    pub fn clear_attackers(&mut self) {
        self.attackers.clear();
        self.blockers.clear();
        self.attacker_blockers.clear();
    }

    /// Clear all combat state (called at end of combat)
    pub fn clear(&mut self) {
        self.clear_attackers();
        self.combat_active = false;
    }
}
