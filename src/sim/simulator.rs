//! Action simulation on owned game copies
//!
//! Each simulation snapshots the game it starts from, applies one action,
//! and scores the result. The copies live in frames owned by the search;
//! popping a frame releases its copy.

use crate::core::{CardId, PlayerId, SpellAbility};
use crate::game::GameState;
use crate::sim::evaluator::GameStateEvaluator;
use crate::sim::score::Score;

/// Outcome of simulating one action
pub enum SimOutcome {
    /// The action applied; here is the resulting game and its score
    Applied(Box<GameState>, Score),

    /// The action was no longer legal in the copy (stale branch)
    Stale,

    /// The rules engine failed mid-simulation; branch treated like a
    /// timeout and logged at diagnostic level
    EngineError,
}

/// Simulates candidate actions for the search
pub struct GameSimulator {
    player: PlayerId,
}

impl GameSimulator {
    pub fn new(player: PlayerId) -> Self {
        GameSimulator { player }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Snapshot `game`, apply `action` on the copy, and evaluate it
    pub fn simulate_action(
        &self,
        evaluator: &mut GameStateEvaluator,
        game: &GameState,
        action: &SpellAbility,
    ) -> SimOutcome {
        let mut copy = game.snapshot();
        match copy.play_action(self.player, action) {
            Ok(true) => {
                let score = evaluator.evaluate(&copy, self.player);
                SimOutcome::Applied(Box::new(copy), score)
            }
            Ok(false) => SimOutcome::Stale,
            Err(err) => {
                game.logger
                    .diag(format!("simulation failed for '{}': {}", action.description, err));
                SimOutcome::EngineError
            }
        }
    }

    /// Map a card handle from a simulated copy back to the search root
    ///
    /// Walks the chain copy -> ... -> root so identities recovered from deep
    /// frames are expressed in root terms. Returns None when the card has no
    /// antecedent (for example a token created during simulation).
    pub fn reverse_map_to_root(
        copy: &GameState,
        intermediates: &[&GameState],
        root: &GameState,
        card_id: CardId,
    ) -> Option<CardId> {
        let mut current = card_id;
        let mut from = copy;
        for &game in intermediates.iter().rev() {
            current = from.reverse_map(current, game)?;
            from = game;
        }
        from.reverse_map(current, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiKind, Card, CardType, Color, ManaCost, ManaProduction};
    use crate::game::Step;
    use crate::sim::profile::SimProfile;

    fn no_forward_profile() -> SimProfile {
        SimProfile {
            fold_combat: false,
            ..SimProfile::default()
        }
    }

    #[test]
    fn test_simulate_leaves_original_untouched() {
        let mut game = GameState::new_two_player("A".to_string(), "B".to_string(), 20);
        let p1 = game.player_order[0];
        game.turn.current_step = Step::Main1;

        let land_id = game.next_card_id();
        let mut land = Card::new(land_id, "Forest", p1);
        land.types.push(CardType::Land);
        land.mana_production = Some(ManaProduction::single(Color::Green));
        game.cards.insert(land_id, land);
        game.get_player_zones_mut(p1).unwrap().hand.add(land_id);

        let candidates = game.candidate_actions(p1);
        let action = candidates.first().unwrap();

        let simulator = GameSimulator::new(p1);
        let mut evaluator = GameStateEvaluator::new(no_forward_profile());

        match simulator.simulate_action(&mut evaluator, &game, action) {
            SimOutcome::Applied(copy, score) => {
                assert!(copy.battlefield.contains(land_id));
                assert!(!game.battlefield.contains(land_id));
                assert!(score.value > 0);
            }
            _ => panic!("expected the land play to apply"),
        }
    }

    #[test]
    fn test_stale_action_reported() {
        let mut game = GameState::new_two_player("A".to_string(), "B".to_string(), 20);
        let p1 = game.player_order[0];
        game.turn.current_step = Step::Main1;

        let bolt_id = game.next_card_id();
        let mut bolt = Card::new(bolt_id, "Lightning Bolt", p1);
        bolt.types.push(CardType::Instant);
        bolt.mana_cost = ManaCost::from_string("R");
        bolt.spell_kind = Some(ApiKind::DealDamage);
        bolt.effect_amount = 3;
        game.cards.insert(bolt_id, bolt);
        // Not in hand, so casting it is stale
        let action = SpellAbility {
            kind: crate::core::SpellAbilityKind::CastSpell {
                card_id: bolt_id,
                target: crate::core::Target::None,
            },
            api: ApiKind::DealDamage,
            description: "Cast Lightning Bolt".to_string(),
            host_name: None,
        };

        let simulator = GameSimulator::new(p1);
        let mut evaluator = GameStateEvaluator::new(no_forward_profile());
        assert!(matches!(
            simulator.simulate_action(&mut evaluator, &game, &action),
            SimOutcome::Stale
        ));
    }
}
