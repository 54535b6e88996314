//! Feature encoding for the policy bridge
//!
//! The byte layout here is a bit-exact contract with external policies:
//! a 664-float state block, an 8-wide decision-kind one-hot, a 64x16
//! options block, and a 64-wide legality mask, flattened to 1760 floats.

use crate::core::{CardId, PlayerId};
use crate::game::{GameState, Step};
use crate::zones::Zone;

/// Width of one encoded card
pub const CARD_FEATURES: usize = 16;

/// Length of the state block
pub const STATE_SIZE: usize = 664;

/// Maximum number of options the policy can see
pub const MAX_OPTIONS: usize = 64;

/// Number of decision kinds in the one-hot block
pub const DECISION_KIND_COUNT: usize = 8;

/// Flattened policy input length
pub const POLICY_INPUT_LEN: usize =
    STATE_SIZE + DECISION_KIND_COUNT + MAX_OPTIONS * CARD_FEATURES + MAX_OPTIONS;

/// Battlefield slots per side in the state block
const BATTLEFIELD_SLOTS: usize = 16;

/// Hand slots in the state block
const HAND_SLOTS: usize = 8;

/// One encoded option row
pub type OptionRow = [f32; CARD_FEATURES];

/// The discrete choice categories routed through the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionKind {
    SpellSelection,
    Mulligan,
    Attack,
    Block,
    CardChoice,
    Boolean,
    Number,
    Generic,
}

impl DecisionKind {
    pub fn index(&self) -> usize {
        match self {
            DecisionKind::SpellSelection => 0,
            DecisionKind::Mulligan => 1,
            DecisionKind::Attack => 2,
            DecisionKind::Block => 3,
            DecisionKind::CardChoice => 4,
            DecisionKind::Boolean => 5,
            DecisionKind::Number => 6,
            DecisionKind::Generic => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecisionKind::SpellSelection => "spell_selection",
            DecisionKind::Mulligan => "mulligan",
            DecisionKind::Attack => "attack",
            DecisionKind::Block => "block",
            DecisionKind::CardChoice => "card_choice",
            DecisionKind::Boolean => "boolean",
            DecisionKind::Number => "number",
            DecisionKind::Generic => "generic",
        }
    }
}

/// Encode one card into the 16-float schema
///
/// `[present, cmc/10, power/20, toughness/20, creature, land,
/// instant-or-sorcery, enchantment, artifact, W, U, B, R, G, tapped, sick]`
/// Non-creatures carry zero power and toughness.
pub fn encode_card(game: &GameState, card_id: CardId) -> OptionRow {
    let mut row = [0.0f32; CARD_FEATURES];
    let Ok(card) = game.cards.get(card_id) else {
        return row;
    };

    row[0] = 1.0;
    row[1] = card.mana_cost.cmc() as f32 / 10.0;
    if card.is_creature() {
        row[2] = card.current_power() as f32 / 20.0;
        row[3] = card.current_toughness() as f32 / 20.0;
        row[4] = 1.0;
    }
    if card.is_land() {
        row[5] = 1.0;
    }
    if card.is_instant_or_sorcery() {
        row[6] = 1.0;
    }
    if card.is_enchantment() {
        row[7] = 1.0;
    }
    if card.is_artifact() {
        row[8] = 1.0;
    }
    for color in &card.colors {
        match color {
            crate::core::Color::White => row[9] = 1.0,
            crate::core::Color::Blue => row[10] = 1.0,
            crate::core::Color::Black => row[11] = 1.0,
            crate::core::Color::Red => row[12] = 1.0,
            crate::core::Color::Green => row[13] = 1.0,
            crate::core::Color::Colorless => {}
        }
    }
    if card.tapped {
        row[14] = 1.0;
    }
    if card.is_summoning_sick(game.turn.turn_number) {
        row[15] = 1.0;
    }

    row
}

/// Encode the full state block from the given player's perspective
pub fn encode_state(game: &GameState, player: PlayerId) -> Vec<f32> {
    let mut state = vec![0.0f32; STATE_SIZE];

    let opponent = game.opponents(player).first().copied();

    let my_life = game.get_player(player).map(|p| p.life).unwrap_or(0);
    let opp_life = opponent
        .and_then(|o| game.get_player(o).ok().map(|p| p.life))
        .unwrap_or(0);

    state[0] = my_life as f32 / 20.0;
    state[1] = opp_life as f32 / 20.0;
    state[2] = game.hand_size(player) as f32 / 7.0;
    state[3] = opponent.map(|o| game.hand_size(o)).unwrap_or(0) as f32 / 7.0;
    state[4] = game.graveyard_size(player) as f32 / 20.0;
    state[5] = opponent.map(|o| game.graveyard_size(o)).unwrap_or(0) as f32 / 20.0;
    state[6] = game.library_size(player) as f32 / 60.0;
    state[7] = opponent.map(|o| game.library_size(o)).unwrap_or(0) as f32 / 60.0;
    state[8] = (game.turn.turn_number as f32 / 20.0).min(1.0);
    state[9] = if game.is_player_turn(player) { 1.0 } else { 0.0 };

    // Phase one-hot over the thirteen steps
    state[10 + game.turn.current_step.ordinal()] = 1.0;

    state[23] = game.untapped_lands(player) as f32 / 10.0;

    // Battlefield blocks: creatures first, then converted cost descending;
    // overflow beyond the slots is discarded
    write_battlefield_block(game, player, &mut state[24..24 + 256]);
    if let Some(opp) = opponent {
        write_battlefield_block(game, opp, &mut state[280..280 + 256]);
    }

    // Hand block
    let hand = game.cards_in(player, Zone::Hand);
    for (slot, &card_id) in hand.iter().take(HAND_SLOTS).enumerate() {
        let row = encode_card(game, card_id);
        let offset = 536 + slot * CARD_FEATURES;
        state[offset..offset + CARD_FEATURES].copy_from_slice(&row);
    }

    state
}

fn write_battlefield_block(game: &GameState, player: PlayerId, block: &mut [f32]) {
    let mut permanents = game.permanents_of(player);
    permanents.sort_by_key(|&id| {
        game.cards
            .get(id)
            .map(|c| (!c.is_creature() as u8, std::cmp::Reverse(c.mana_cost.cmc())))
            .unwrap_or((1, std::cmp::Reverse(0)))
    });

    for (slot, &card_id) in permanents.iter().take(BATTLEFIELD_SLOTS).enumerate() {
        let row = encode_card(game, card_id);
        let offset = slot * CARD_FEATURES;
        block[offset..offset + CARD_FEATURES].copy_from_slice(&row);
    }
}

/// Options for a yes/no choice: row 0 is yes, row 1 is no
pub fn encode_boolean_choice() -> Vec<OptionRow> {
    let mut yes = [0.0f32; CARD_FEATURES];
    yes[0] = 1.0;
    let mut no = [0.0f32; CARD_FEATURES];
    no[1] = 1.0;
    vec![yes, no]
}

/// Options for choosing a number in `[min, max]`
///
/// Row `i` (value `min + i`) has its first feature set to `i / (max - min)`,
/// or 1 when the range is a single value.
pub fn encode_number_range(min: i32, max: i32) -> Vec<OptionRow> {
    let span = (max - min).max(0);
    let count = span as usize + 1;
    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        let mut row = [0.0f32; CARD_FEATURES];
        row[0] = if span == 0 {
            1.0
        } else {
            i as f32 / span as f32
        };
        rows.push(row);
    }
    rows
}

/// Options for a list of cards
pub fn encode_card_options(game: &GameState, cards: &[CardId]) -> Vec<OptionRow> {
    cards
        .iter()
        .take(MAX_OPTIONS)
        .map(|&id| encode_card(game, id))
        .collect()
}

/// Options for a list of candidate abilities: each row is the ability's
/// host card, or all zeros for hostless pseudo-actions
pub fn encode_ability_options(
    game: &GameState,
    abilities: &[crate::core::SpellAbility],
) -> Vec<OptionRow> {
    abilities
        .iter()
        .take(MAX_OPTIONS)
        .map(|ability| match ability.host() {
            Some(card_id) => encode_card(game, card_id),
            None => [0.0f32; CARD_FEATURES],
        })
        .collect()
}

/// Options for arbitrary entities: cards use the card schema, anything else
/// gets a positional presence marker `(i + 1) / N`
pub fn encode_entity_options(game: &GameState, entities: &[CardId]) -> Vec<OptionRow> {
    let n = entities.len().min(MAX_OPTIONS);
    entities
        .iter()
        .take(MAX_OPTIONS)
        .enumerate()
        .map(|(i, &id)| {
            if game.cards.contains(id) {
                encode_card(game, id)
            } else {
                let mut row = [0.0f32; CARD_FEATURES];
                row[0] = (i + 1) as f32 / n as f32;
                row
            }
        })
        .collect()
}

/// An all-zero row used for "choose nothing" slots
pub fn none_option() -> OptionRow {
    [0.0f32; CARD_FEATURES]
}

/// Flatten state + decision one-hot + padded options + legality mask into
/// the fixed policy input tensor
pub fn build_policy_input(
    state: &[f32],
    kind: DecisionKind,
    options: &[OptionRow],
    valid_count: usize,
) -> Vec<f32> {
    debug_assert_eq!(state.len(), STATE_SIZE);

    let mut input = Vec::with_capacity(POLICY_INPUT_LEN);
    input.extend_from_slice(state);

    let mut one_hot = [0.0f32; DECISION_KIND_COUNT];
    one_hot[kind.index()] = 1.0;
    input.extend_from_slice(&one_hot);

    for i in 0..MAX_OPTIONS {
        match options.get(i) {
            Some(row) => input.extend_from_slice(row),
            None => input.extend_from_slice(&[0.0f32; CARD_FEATURES]),
        }
    }

    for i in 0..MAX_OPTIONS {
        input.push(if i < valid_count { 1.0 } else { 0.0 });
    }

    debug_assert_eq!(input.len(), POLICY_INPUT_LEN);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardType};

    #[test]
    fn test_layout_constants() {
        assert_eq!(POLICY_INPUT_LEN, 1760);
        assert_eq!(STATE_SIZE, 24 + 256 + 256 + 128);
    }

    #[test]
    fn test_boolean_encoding() {
        let rows = encode_boolean_choice();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], 1.0);
        assert!(rows[0][1..].iter().all(|&v| v == 0.0));
        assert_eq!(rows[1][1], 1.0);
        assert_eq!(rows[1][0], 0.0);
        assert!(rows[1][2..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_number_range_encoding() {
        let rows = encode_number_range(2, 5);
        assert_eq!(rows.len(), 4);
        let firsts: Vec<f32> = rows.iter().map(|r| r[0]).collect();
        assert_eq!(firsts[0], 0.0);
        assert!((firsts[1] - 1.0 / 3.0).abs() < 1e-6);
        assert!((firsts[2] - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(firsts[3], 1.0);
        for row in &rows {
            assert!(row[1..].iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_number_range_degenerate() {
        let rows = encode_number_range(3, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], 1.0);
    }

    #[test]
    fn test_fresh_game_state_layout() {
        let mut game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];

        // Seven cards in hand, fifty-three in library
        for i in 0..60 {
            let id = game.next_card_id();
            let mut card = Card::new(id, format!("Card {}", i), p1);
            card.types.push(CardType::Land);
            game.cards.insert(id, card);
            if i < 7 {
                game.get_player_zones_mut(p1).unwrap().hand.add(id);
            } else {
                game.get_player_zones_mut(p1).unwrap().library.add(id);
            }
        }

        let state = encode_state(&game, p1);
        assert_eq!(state.len(), STATE_SIZE);

        assert_eq!(state[0], 1.0); // 20/20 life
        assert_eq!(state[1], 1.0); // opponent at 20
        assert_eq!(state[2], 1.0); // 7/7 hand
        assert!((state[8] - 0.05).abs() < 1e-6); // turn 1 of 20
        assert_eq!(state[9], 1.0); // my turn
        assert_eq!(state[10], 1.0); // UNTAP one-hot

        // No permanents: battlefield and opponent blocks all zero
        assert!(state[24..536].iter().all(|&v| v == 0.0));
        // Hand block is populated
        assert!(state[536..].iter().any(|&v| v != 0.0));
        assert!(state.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_battlefield_sort_creatures_first() {
        let mut game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];

        let land_id = game.next_card_id();
        let mut land = Card::new(land_id, "Plains", p1);
        land.types.push(CardType::Land);
        game.cards.insert(land_id, land);
        game.battlefield.add(land_id);

        let big_id = game.next_card_id();
        let mut big = Card::new(big_id, "Colossus", p1);
        big.types.push(CardType::Creature);
        big.power = Some(8);
        big.toughness = Some(8);
        big.mana_cost = crate::core::ManaCost::from_string("8");
        game.cards.insert(big_id, big);
        game.battlefield.add(big_id);

        let small_id = game.next_card_id();
        let mut small = Card::new(small_id, "Squire", p1);
        small.types.push(CardType::Creature);
        small.power = Some(1);
        small.toughness = Some(2);
        small.mana_cost = crate::core::ManaCost::from_string("1W");
        game.cards.insert(small_id, small);
        game.battlefield.add(small_id);

        let state = encode_state(&game, p1);

        // Slot 0: the expensive creature; slot 1: the cheap creature;
        // slot 2: the land
        assert_eq!(state[24 + 4], 1.0); // slot 0 is a creature
        assert!((state[24 + 1] - 0.8).abs() < 1e-6); // cmc 8/10
        assert_eq!(state[24 + CARD_FEATURES + 4], 1.0); // slot 1 creature
        assert_eq!(state[24 + 2 * CARD_FEATURES + 5], 1.0); // slot 2 land
    }

    #[test]
    fn test_policy_input_shape_and_mask() {
        let game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];

        let state = encode_state(&game, p1);
        let options = encode_boolean_choice();
        let input = build_policy_input(&state, DecisionKind::Boolean, &options, 2);

        assert_eq!(input.len(), POLICY_INPUT_LEN);

        // Decision one-hot
        let kind_offset = STATE_SIZE;
        assert_eq!(input[kind_offset + DecisionKind::Boolean.index()], 1.0);

        // Legality mask: two legal, rest zero
        let mask_offset = STATE_SIZE + DECISION_KIND_COUNT + MAX_OPTIONS * CARD_FEATURES;
        assert_eq!(input[mask_offset], 1.0);
        assert_eq!(input[mask_offset + 1], 1.0);
        assert!(input[mask_offset + 2..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_ability_options_use_host_card() {
        let mut game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];

        let id = game.next_card_id();
        let mut card = Card::new(id, "Llanowar Elves", p1);
        card.types.push(CardType::Creature);
        card.power = Some(1);
        card.toughness = Some(1);
        game.cards.insert(id, card);
        game.battlefield.add(id);

        let cast = crate::core::SpellAbility {
            kind: crate::core::SpellAbilityKind::CastSpell {
                card_id: id,
                target: crate::core::Target::None,
            },
            api: crate::core::ApiKind::Mana,
            description: "Activate Llanowar Elves".to_string(),
            host_name: None,
        };
        let rows = encode_ability_options(&game, &[cast, crate::core::SpellAbility::pass()]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], 1.0); // host card present
        assert_eq!(rows[0][4], 1.0); // host is a creature
        assert!(rows[1].iter().all(|&v| v == 0.0)); // pass has no host
    }

    #[test]
    fn test_entity_options_positional_marker() {
        let game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        // Ids that are not cards get positional markers
        let entities = vec![CardId::new(900), CardId::new(901)];
        let rows = encode_entity_options(&game, &entities);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], 0.5);
        assert_eq!(rows[1][0], 1.0);
    }

    #[test]
    fn test_overflow_discarded() {
        let mut game = GameState::new_two_player("Me".to_string(), "You".to_string(), 20);
        let p1 = game.player_order[0];
        let ids: Vec<CardId> = (0..80)
            .map(|i| {
                let id = game.next_card_id();
                let mut card = Card::new(id, format!("C{}", i), p1);
                card.types.push(CardType::Creature);
                card.power = Some(1);
                card.toughness = Some(1);
                game.cards.insert(id, card);
                id
            })
            .collect();

        let rows = encode_card_options(&game, &ids);
        assert_eq!(rows.len(), MAX_OPTIONS);
    }
}
