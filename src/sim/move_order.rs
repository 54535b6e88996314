//! Candidate-action ordering for the simulation search
//!
//! Killer moves and a history table promote actions that caused cutoffs or
//! appeared on best lines, on top of a static per-API priority. Tables are
//! keyed on stable strings (card name + API kind) because object identity
//! does not survive game copies. Each searcher owns its tables — one
//! searcher per decision thread keeps them thread-local without globals.

use crate::core::SpellAbility;
use rustc_hash::FxHashMap;

const MAX_KILLER_DEPTH: usize = 20;
const KILLER_SLOTS: usize = 2;
const KILLER_BONUS: i32 = 10_000;
const HISTORY_TABLE_LIMIT: usize = 10_000;

/// Orders candidate actions to maximize pruning
#[derive(Debug, Default)]
pub struct MoveOrderer {
    /// Up to two recent cutoff actions per depth, most recent first
    killer_moves: Vec<[Option<String>; KILLER_SLOTS]>,

    /// Accumulated best-line credit per action key
    history: FxHashMap<String, i32>,
}

impl MoveOrderer {
    pub fn new() -> Self {
        MoveOrderer {
            killer_moves: vec![Default::default(); MAX_KILLER_DEPTH],
            history: FxHashMap::default(),
        }
    }

    /// Compute the ordering of `actions` at the given depth
    ///
    /// Returns a permutation of indices into `actions`, best first.
    /// Deterministic given the tables' current contents; ties keep the
    /// original candidate order.
    pub fn order_moves(&self, actions: &[SpellAbility], depth: u32) -> Vec<usize> {
        let mut scored: Vec<(usize, i32)> = actions
            .iter()
            .enumerate()
            .map(|(i, action)| (i, self.priority(action, depth)))
            .collect();
        scored.sort_by_key(|&(i, score)| (-score, i));
        scored.into_iter().map(|(i, _)| i).collect()
    }

    fn priority(&self, action: &SpellAbility, depth: u32) -> i32 {
        let key = action.history_key();
        let killer = self.is_killer(&key, depth);
        let history = self.history.get(&key).copied().unwrap_or(0);
        let static_priority = action.api.static_priority();

        (killer as i32) * KILLER_BONUS + history + static_priority
    }

    fn is_killer(&self, key: &str, depth: u32) -> bool {
        self.killer_moves
            .get(depth as usize)
            .map(|slots| slots.iter().flatten().any(|k| k == key))
            .unwrap_or(false)
    }

    /// Record an action that caused a cutoff at the given depth
    ///
    /// Slides the slot array right and inserts at the front, deduplicating
    /// by key. Depths at or beyond the table size are ignored.
    pub fn record_killer_move(&mut self, action: &SpellAbility, depth: u32) {
        let Some(slots) = self.killer_moves.get_mut(depth as usize) else {
            return;
        };
        let key = action.history_key();
        if slots[0].as_deref() == Some(key.as_str()) {
            return;
        }
        slots[1] = slots[0].take();
        slots[0] = Some(key);
    }

    /// Credit an action that was on the best line at the given depth
    pub fn update_history(&mut self, action: &SpellAbility, depth: u32) {
        let key = action.history_key();
        let credit = (depth * depth) as i32;
        *self.history.entry(key).or_insert(0) += credit;

        // Halve everything and drop zeros to keep values bounded
        if self.history.len() > HISTORY_TABLE_LIMIT {
            for value in self.history.values_mut() {
                *value /= 2;
            }
            self.history.retain(|_, v| *v != 0);
        }
    }

    /// Reset killers only; called between searches
    ///
    /// History persists across searches within a game.
    pub fn clear(&mut self) {
        for slots in &mut self.killer_moves {
            *slots = Default::default();
        }
    }

    /// Reset killers and history; called at game boundaries
    pub fn clear_all(&mut self) {
        self.clear();
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_score(&self, action: &SpellAbility) -> i32 {
        self.history
            .get(&action.history_key())
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiKind, CardName, EntityId, SpellAbilityKind, Target};

    fn action(name: &str, api: ApiKind) -> SpellAbility {
        SpellAbility {
            kind: SpellAbilityKind::CastSpell {
                card_id: EntityId::new(1),
                target: Target::None,
            },
            api,
            description: format!("Cast {}", name),
            host_name: Some(CardName::new(name)),
        }
    }

    #[test]
    fn test_static_priority_ordering() {
        let orderer = MoveOrderer::new();
        let actions = vec![
            action("Opt", ApiKind::DrawCards),
            action("Doom Blade", ApiKind::DestroyPermanent),
            action("Llanowar Elves", ApiKind::Mana),
        ];

        let order = orderer.order_moves(&actions, 0);
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_killer_moves_promote() {
        let mut orderer = MoveOrderer::new();
        let actions = vec![
            action("Doom Blade", ApiKind::DestroyPermanent),
            action("Opt", ApiKind::DrawCards),
        ];

        orderer.record_killer_move(&actions[1], 2);
        let order = orderer.order_moves(&actions, 2);
        assert_eq!(order, vec![1, 0]);

        // Killer only applies at its depth
        let order = orderer.order_moves(&actions, 3);
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_killer_slots_dedup_and_shift() {
        let mut orderer = MoveOrderer::new();
        let a = action("A", ApiKind::Generic);
        let b = action("B", ApiKind::Generic);
        let c = action("C", ApiKind::Generic);

        orderer.record_killer_move(&a, 1);
        orderer.record_killer_move(&a, 1);
        orderer.record_killer_move(&b, 1);
        orderer.record_killer_move(&c, 1);

        // Most recent two survive; A was shifted out
        assert!(orderer.is_killer(&c.history_key(), 1));
        assert!(orderer.is_killer(&b.history_key(), 1));
        assert!(!orderer.is_killer(&a.history_key(), 1));

        let actions = vec![a, b, c];
        let order = orderer.order_moves(&actions, 1);
        assert_eq!(order[2], 0); // the non-killer sorts last
    }

    #[test]
    fn test_killer_depth_cap() {
        let mut orderer = MoveOrderer::new();
        let a = action("A", ApiKind::Generic);
        // Ignored beyond the table
        orderer.record_killer_move(&a, 20);
        orderer.record_killer_move(&a, 99);
        assert!(!orderer.is_killer(&a.history_key(), 20));
    }

    #[test]
    fn test_history_accumulates_and_persists_through_clear() {
        let mut orderer = MoveOrderer::new();
        let a = action("A", ApiKind::Generic);

        orderer.update_history(&a, 3);
        assert_eq!(orderer.history_score(&a), 9);
        orderer.update_history(&a, 2);
        assert_eq!(orderer.history_score(&a), 13);

        orderer.clear();
        assert_eq!(orderer.history_score(&a), 13);

        orderer.clear_all();
        assert_eq!(orderer.history_score(&a), 0);
    }

    #[test]
    fn test_history_halving() {
        let mut orderer = MoveOrderer::new();
        // Overfill past the limit with distinct keys
        for i in 0..(HISTORY_TABLE_LIMIT + 1) {
            let a = action(&format!("Card {}", i), ApiKind::Generic);
            orderer.update_history(&a, 1);
        }
        // Credits of 1 halve to 0 and get dropped
        assert!(orderer.history_len() <= HISTORY_TABLE_LIMIT + 1);
        let early = action("Card 0", ApiKind::Generic);
        assert_eq!(orderer.history_score(&early), 0);
    }

    #[test]
    fn test_ordering_reproducible_after_clear() {
        let mut orderer = MoveOrderer::new();
        let actions = vec![
            action("A", ApiKind::DealDamage),
            action("B", ApiKind::DrawCards),
            action("C", ApiKind::DestroyPermanent),
        ];

        orderer.update_history(&actions[1], 4);
        let before = orderer.order_moves(&actions, 0);
        orderer.clear();
        let after = orderer.order_moves(&actions, 0);
        assert_eq!(before, after);
    }
}
