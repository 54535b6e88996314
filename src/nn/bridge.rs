//! The decision bridge
//!
//! Routes atomic in-game choices (mulligan, targeting, yes/no, numbers,
//! card picks) to a [`ChoicePolicy`], encoding game state and options into
//! the fixed feature tensors and optionally recording every consulted
//! decision for training.

use crate::core::{CardId, Color, PlayerId, SpellAbility};
use crate::game::{CombatState, GameState};
use crate::nn::features::{
    encode_boolean_choice, encode_card_options, encode_entity_options, encode_number_range,
    encode_state, none_option, DecisionKind, OptionRow, MAX_OPTIONS,
};
use crate::nn::policy::ChoicePolicy;
use crate::nn::recorder::GameRecorder;
use crate::Result;
use std::sync::Arc;

/// How much of the decision surface the policy covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMode {
    /// Only the six high-value decisions consult the policy: mulligan keep,
    /// mulligan tuck selection, declare attackers, declare blockers,
    /// single-entity targeting, and the spell-selection placeholder.
    /// Everything else stays with the engine's heuristics.
    Hybrid,

    /// Every discrete choice the bridge exposes goes through the policy.
    /// Informational calls, mana payment, combat damage assignment, opening
    /// hands and sideboarding remain heuristic either way.
    Full,
}

/// Policy-backed resolver for atomic choices
pub struct DecisionBridge {
    player: PlayerId,
    mode: BridgeMode,
    policy: Arc<dyn ChoicePolicy>,
    recorder: Option<GameRecorder>,
}

impl DecisionBridge {
    pub fn new(player: PlayerId, mode: BridgeMode, policy: Arc<dyn ChoicePolicy>) -> Self {
        DecisionBridge {
            player,
            mode,
            policy,
            recorder: None,
        }
    }

    /// Attach a per-game training recorder
    pub fn with_recorder(mut self, recorder: GameRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn mode(&self) -> BridgeMode {
        self.mode
    }

    /// Close out the training file at game end
    pub fn finish_game(&self, won: bool, turns: u32, reason: &str) {
        if let Some(recorder) = &self.recorder {
            recorder.finish_game(won, turns, reason);
        }
    }

    /// Does this decision kind consult the policy in the current mode?
    fn policy_covers(&self, kind: DecisionKind) -> bool {
        match self.mode {
            BridgeMode::Full => true,
            BridgeMode::Hybrid => matches!(
                kind,
                DecisionKind::Mulligan
                    | DecisionKind::Attack
                    | DecisionKind::Block
                    | DecisionKind::CardChoice
                    | DecisionKind::SpellSelection
            ),
        }
    }

    /// Consult the policy, clamp the answer, and record the call
    fn consult(
        &self,
        game: &GameState,
        kind: DecisionKind,
        options: &[OptionRow],
        valid_count: usize,
    ) -> Result<usize> {
        let valid = valid_count.min(MAX_OPTIONS).min(options.len());
        let state = encode_state(game, self.player);
        let raw = self.policy.choose_option(&state, kind, options, valid)?;
        let index = raw.min(valid.saturating_sub(1));

        if let Some(recorder) = &self.recorder {
            recorder.record_decision(
                game.turn.turn_number,
                game.turn.current_step.name(),
                kind.name(),
                &state,
                options,
                index,
            );
        }
        Ok(index)
    }

    /// Keep-or-mulligan for the current hand; true means keep
    pub fn choose_mulligan_keep(&self, game: &GameState, hand: &[CardId]) -> Result<bool> {
        let _ = hand;
        let options = encode_boolean_choice();
        let index = self.consult(game, DecisionKind::Mulligan, &options, 2)?;
        Ok(index == 0)
    }

    /// Pick `count` cards to put back after a mulligan, one at a time
    pub fn choose_cards_to_return(
        &self,
        game: &GameState,
        hand: &[CardId],
        count: usize,
    ) -> Result<Vec<CardId>> {
        let mut pool: Vec<CardId> = hand.to_vec();
        let mut returned = Vec::with_capacity(count);

        for _ in 0..count.min(hand.len()) {
            if pool.len() == 1 {
                returned.push(pool.remove(0));
                continue;
            }
            let options = encode_card_options(game, &pool);
            let index = self.consult(game, DecisionKind::CardChoice, &options, pool.len())?;
            returned.push(pool.remove(index));
        }
        Ok(returned)
    }

    /// Per-creature attack decisions; returns the chosen attackers
    pub fn choose_attackers(
        &self,
        game: &GameState,
        available: &[CardId],
    ) -> Result<Vec<CardId>> {
        let mut attackers = Vec::new();
        let turn = game.turn.turn_number;

        for &creature_id in available {
            let Ok(card) = game.cards.get(creature_id) else { continue };
            if !CombatState::can_attack(card, turn) {
                continue;
            }
            let options = encode_boolean_choice();
            let index = self.consult(game, DecisionKind::Attack, &options, 2)?;
            if index == 0 {
                attackers.push(creature_id);
            }
        }
        Ok(attackers)
    }

    /// Per-attacker blocker assignment; the trailing option is "no block"
    pub fn choose_blockers(
        &self,
        game: &GameState,
        attackers: &[CardId],
        available_blockers: &[CardId],
    ) -> Result<Vec<(CardId, CardId)>> {
        let mut assignments = Vec::new();
        let mut pool: Vec<CardId> = available_blockers.to_vec();

        for &attacker_id in attackers {
            if pool.is_empty() {
                break;
            }
            let Ok(attacker) = game.cards.get(attacker_id) else { continue };

            let legal: Vec<CardId> = pool
                .iter()
                .copied()
                .filter(|&b| {
                    game.cards
                        .get(b)
                        .map(|blocker| CombatState::can_block(blocker, attacker))
                        .unwrap_or(false)
                })
                .collect();
            if legal.is_empty() {
                continue;
            }

            let mut options = encode_card_options(game, &legal);
            let none_slot = options.len();
            options.push(none_option());

            let index = self.consult(game, DecisionKind::Block, &options, options.len())?;
            if index < none_slot {
                let blocker = legal[index];
                pool.retain(|&b| b != blocker);
                assignments.push((blocker, attacker_id));
            }
        }
        Ok(assignments)
    }

    /// Choose one entity, optionally declining
    ///
    /// A single mandatory option is returned without consulting the policy.
    /// At the 64-option cap an optional choice gives up its last slot to
    /// "choose nothing".
    pub fn choose_single_entity(
        &self,
        game: &GameState,
        entities: &[CardId],
        is_optional: bool,
    ) -> Result<Option<CardId>> {
        if entities.is_empty() {
            return Ok(None);
        }
        if entities.len() == 1 && !is_optional {
            return Ok(Some(entities[0]));
        }

        let mut considered: Vec<CardId> = entities.iter().copied().take(MAX_OPTIONS).collect();
        if is_optional && considered.len() == MAX_OPTIONS {
            considered.pop();
        }

        let mut options = encode_entity_options(game, &considered);
        let none_slot = if is_optional {
            options.push(none_option());
            Some(options.len() - 1)
        } else {
            None
        };

        let index = self.consult(game, DecisionKind::CardChoice, &options, options.len())?;
        if Some(index) == none_slot {
            return Ok(None);
        }
        Ok(considered.get(index).copied())
    }

    /// Spell selection entry point
    ///
    /// Delegates to the heuristic ordering in both modes.
    // TODO: route through the policy once the option schema carries
    // per-action targeting, so a logit can distinguish two candidates with
    // the same host card.
    pub fn choose_spell_ability(
        &self,
        _game: &GameState,
        candidates: &[SpellAbility],
    ) -> Result<Option<usize>> {
        Ok(candidates
            .iter()
            .enumerate()
            .max_by_key(|(i, a)| (a.api.static_priority(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i))
    }

    /// Yes/no question; heuristic answer is "no" outside full mode
    pub fn choose_boolean(&self, game: &GameState) -> Result<bool> {
        if !self.policy_covers(DecisionKind::Boolean) {
            return Ok(false);
        }
        let options = encode_boolean_choice();
        let index = self.consult(game, DecisionKind::Boolean, &options, 2)?;
        Ok(index == 0)
    }

    /// Choose a number in `[min, max]`
    ///
    /// Equal bounds short-circuit without consulting the policy.
    pub fn choose_number(&self, game: &GameState, min: i32, max: i32) -> Result<i32> {
        if min >= max {
            return Ok(min);
        }
        if !self.policy_covers(DecisionKind::Number) {
            return Ok(min);
        }
        let options = encode_number_range(min, max);
        let valid = options.len();
        let index = self.consult(game, DecisionKind::Number, &options, valid)?;
        Ok(min + index as i32)
    }

    /// Choose `count` cards from a list
    pub fn choose_cards(
        &self,
        game: &GameState,
        list: &[CardId],
        count: usize,
    ) -> Result<Vec<CardId>> {
        if !self.policy_covers(DecisionKind::CardChoice) || self.mode == BridgeMode::Hybrid {
            // Generic card picks stay heuristic in hybrid mode
            return Ok(list.iter().copied().take(count).collect());
        }
        let mut pool: Vec<CardId> = list.to_vec();
        let mut chosen = Vec::with_capacity(count);
        for _ in 0..count.min(list.len()) {
            if pool.len() == 1 {
                chosen.push(pool.remove(0));
                continue;
            }
            let options = encode_card_options(game, &pool);
            let index = self.consult(game, DecisionKind::CardChoice, &options, pool.len())?;
            chosen.push(pool.remove(index));
        }
        Ok(chosen)
    }

    /// Pick one of the given colors
    pub fn choose_color(&self, game: &GameState, colors: &[Color]) -> Result<Color> {
        if colors.is_empty() {
            return Ok(Color::Colorless);
        }
        if colors.len() == 1 || !self.policy_covers(DecisionKind::Generic) {
            return Ok(colors[0]);
        }
        let n = colors.len().min(MAX_OPTIONS);
        let options: Vec<OptionRow> = (0..n)
            .map(|i| {
                let mut row = none_option();
                row[0] = (i + 1) as f32 / n as f32;
                row
            })
            .collect();
        let index = self.consult(game, DecisionKind::Generic, &options, n)?;
        Ok(colors[index])
    }

    /// Pick one of a list of named options (types, keywords, etc.)
    pub fn choose_named_option(&self, game: &GameState, names: &[&str]) -> Result<usize> {
        if names.len() <= 1 || !self.policy_covers(DecisionKind::Generic) {
            return Ok(0);
        }
        let n = names.len().min(MAX_OPTIONS);
        let options: Vec<OptionRow> = (0..n)
            .map(|i| {
                let mut row = none_option();
                row[0] = (i + 1) as f32 / n as f32;
                row
            })
            .collect();
        self.consult(game, DecisionKind::Generic, &options, n)
    }

    /// Who plays first
    ///
    /// Deliberately takes the play for the choosing player.
    pub fn choose_starting_player(&self, _game: &GameState) -> PlayerId {
        self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType, Keyword};
    use crate::nn::policy::RandomPolicy;
    use std::sync::Arc;

    /// Policy that always answers with a fixed index (clamped by the bridge)
    struct FixedIndexPolicy(usize);

    impl ChoicePolicy for FixedIndexPolicy {
        fn choose_option(
            &self,
            _state: &[f32],
            _kind: DecisionKind,
            _options: &[OptionRow],
            valid_count: usize,
        ) -> Result<usize> {
            Ok(self.0.min(valid_count.saturating_sub(1)))
        }
    }

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];
        let p2 = game.player_order[1];
        (game, p1, p2)
    }

    fn bridge(player: PlayerId, mode: BridgeMode, index: usize) -> DecisionBridge {
        DecisionBridge::new(player, mode, Arc::new(FixedIndexPolicy(index)))
    }

    fn add_creature(
        game: &mut GameState,
        owner: PlayerId,
        name: &str,
        power: i8,
        toughness: i8,
    ) -> CardId {
        let id = game.next_card_id();
        let mut card = Card::new(id, name, owner);
        card.types.push(CardType::Creature);
        card.power = Some(power);
        card.toughness = Some(toughness);
        card.turn_entered_battlefield = Some(0);
        game.cards.insert(id, card);
        game.battlefield.add(id);
        id
    }

    #[test]
    fn test_mulligan_keep_and_throw() {
        let (game, p1, _) = setup();
        assert!(bridge(p1, BridgeMode::Hybrid, 0)
            .choose_mulligan_keep(&game, &[])
            .unwrap());
        assert!(!bridge(p1, BridgeMode::Hybrid, 1)
            .choose_mulligan_keep(&game, &[])
            .unwrap());
    }

    #[test]
    fn test_choose_number_boundaries() {
        let (game, p1, _) = setup();
        let b = bridge(p1, BridgeMode::Full, 2);
        // min == max short-circuits
        assert_eq!(b.choose_number(&game, 4, 4).unwrap(), 4);
        // index 2 over [2, 5] is the value 4
        assert_eq!(b.choose_number(&game, 2, 5).unwrap(), 4);

        // Hybrid mode answers min without the policy
        let b = bridge(p1, BridgeMode::Hybrid, 2);
        assert_eq!(b.choose_number(&game, 2, 5).unwrap(), 2);
    }

    #[test]
    fn test_single_entity_shortcuts() {
        let (mut game, p1, _) = setup();
        let only = add_creature(&mut game, p1, "Only", 1, 1);

        let b = bridge(p1, BridgeMode::Hybrid, 0);
        // Single mandatory option returns without consulting the policy
        assert_eq!(
            b.choose_single_entity(&game, &[only], false).unwrap(),
            Some(only)
        );
        assert_eq!(b.choose_single_entity(&game, &[], false).unwrap(), None);
    }

    #[test]
    fn test_single_entity_optional_none_slot() {
        let (mut game, p1, _) = setup();
        let a = add_creature(&mut game, p1, "A", 1, 1);
        let c = add_creature(&mut game, p1, "C", 1, 1);

        // Index 2 is the none slot for two entities + optional
        let b = bridge(p1, BridgeMode::Hybrid, 2);
        assert_eq!(
            b.choose_single_entity(&game, &[a, c], true).unwrap(),
            None
        );

        let b = bridge(p1, BridgeMode::Hybrid, 1);
        assert_eq!(
            b.choose_single_entity(&game, &[a, c], true).unwrap(),
            Some(c)
        );
    }

    #[test]
    fn test_single_entity_cap_with_optional() {
        let (mut game, p1, _) = setup();
        let entities: Vec<CardId> = (0..70)
            .map(|i| add_creature(&mut game, p1, &format!("E{}", i), 1, 1))
            .collect();

        // Non-optional: first 64 considered
        let b = bridge(p1, BridgeMode::Hybrid, 63);
        let chosen = b
            .choose_single_entity(&game, &entities, false)
            .unwrap()
            .unwrap();
        assert_eq!(chosen, entities[63]);

        // Optional at the cap: the 64th slot becomes "none"
        let b = bridge(p1, BridgeMode::Hybrid, 63);
        assert_eq!(b.choose_single_entity(&game, &entities, true).unwrap(), None);
    }

    #[test]
    fn test_attackers_respect_legality() {
        let (mut game, p1, _) = setup();
        let ready = add_creature(&mut game, p1, "Ready", 2, 2);
        let sick = add_creature(&mut game, p1, "Sick", 3, 3);
        game.turn.turn_number = 5;
        game.cards.get_mut(sick).unwrap().turn_entered_battlefield = Some(5);

        // Always answers "attack"
        let b = bridge(p1, BridgeMode::Hybrid, 0);
        let attackers = b.choose_attackers(&game, &[ready, sick]).unwrap();
        assert_eq!(attackers, vec![ready]);

        // Always declines
        let b = bridge(p1, BridgeMode::Hybrid, 1);
        assert!(b.choose_attackers(&game, &[ready]).unwrap().is_empty());
    }

    #[test]
    fn test_blockers_evasion_and_none() {
        let (mut game, p1, p2) = setup();
        let flyer = add_creature(&mut game, p2, "Flyer", 2, 2);
        game.cards
            .get_mut(flyer)
            .unwrap()
            .keywords
            .push(Keyword::Flying);
        let ground = add_creature(&mut game, p1, "Ground", 2, 2);
        let reacher = add_creature(&mut game, p1, "Reacher", 1, 3);
        game.cards
            .get_mut(reacher)
            .unwrap()
            .keywords
            .push(Keyword::Reach);

        // Only the reach creature may block; index 0 picks it
        let b = bridge(p1, BridgeMode::Hybrid, 0);
        let blocks = b
            .choose_blockers(&game, &[flyer], &[ground, reacher])
            .unwrap();
        assert_eq!(blocks, vec![(reacher, flyer)]);

        // Index 1 is the none slot (one legal blocker + none)
        let b = bridge(p1, BridgeMode::Hybrid, 1);
        let blocks = b
            .choose_blockers(&game, &[flyer], &[ground, reacher])
            .unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_hybrid_leaves_generic_choices_heuristic() {
        let (game, p1, _) = setup();
        // Index 0 would mean "yes", but hybrid mode answers without policy
        let b = bridge(p1, BridgeMode::Hybrid, 0);
        assert!(!b.choose_boolean(&game).unwrap());

        let b = bridge(p1, BridgeMode::Full, 0);
        assert!(b.choose_boolean(&game).unwrap());
    }

    #[test]
    fn test_starting_player_takes_the_play() {
        let (game, p1, p2) = setup();
        assert_eq!(bridge(p1, BridgeMode::Full, 0).choose_starting_player(&game), p1);
        assert_eq!(bridge(p2, BridgeMode::Full, 1).choose_starting_player(&game), p2);
    }

    #[test]
    fn test_spell_ability_seam_orders_by_priority() {
        let (game, p1, _) = setup();
        let b = bridge(p1, BridgeMode::Full, 0);

        let candidates = vec![
            SpellAbility {
                kind: crate::core::SpellAbilityKind::Pass,
                api: crate::core::ApiKind::DrawCards,
                description: "Cast Opt".to_string(),
                host_name: None,
            },
            SpellAbility {
                kind: crate::core::SpellAbilityKind::Pass,
                api: crate::core::ApiKind::DestroyPermanent,
                description: "Cast Doom Blade".to_string(),
                host_name: None,
            },
        ];
        assert_eq!(b.choose_spell_ability(&game, &candidates).unwrap(), Some(1));
        assert_eq!(b.choose_spell_ability(&game, &[]).unwrap(), None);
    }

    #[test]
    fn test_random_policy_integration() {
        let (game, p1, _) = setup();
        let b = DecisionBridge::new(p1, BridgeMode::Full, Arc::new(RandomPolicy::new(0)));
        for _ in 0..20 {
            let n = b.choose_number(&game, 1, 6).unwrap();
            assert!((1..=6).contains(&n));
        }
    }
}
