//! Game state evaluation for the simulation AI
//!
//! Holistic board evaluation, scoring the overall game state from one
//! player's perspective. Both search controllers share this evaluator.

use crate::core::{AbilityCostShape, Card, Color, Keyword, PlayerId};
use crate::game::{CombatState, GameState, Step};
use crate::sim::deck_stats::DeckStatistics;
use crate::sim::profile::SimProfile;
use crate::sim::score::Score;
use crate::zones::Zone;
use rustc_hash::FxHashMap;

/// Game state evaluator
///
/// Deterministic and pure apart from an owned cache of non-creature card
/// values. Creature values depend on the current board and are never cached.
pub struct GameStateEvaluator {
    profile: SimProfile,
    deck_stats: DeckStatistics,
    /// Cached values for non-creature permanents, keyed by card id and
    /// tapped bit
    card_cache: FxHashMap<(u32, bool), i32>,
}

impl GameStateEvaluator {
    pub fn new(profile: SimProfile) -> Self {
        GameStateEvaluator {
            profile,
            deck_stats: DeckStatistics::default(),
            card_cache: FxHashMap::default(),
        }
    }

    /// Attach deck statistics so the mana-base score can cap rewards at
    /// what the deck can use
    pub fn with_deck_stats(mut self, stats: DeckStatistics) -> Self {
        self.deck_stats = stats;
        self
    }

    pub fn set_deck_stats(&mut self, stats: DeckStatistics) {
        self.deck_stats = stats;
    }

    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }

    /// Evaluate the game from the given player's perspective
    ///
    /// Returns `Score::WIN` / `Score::LOSS` exactly when the game is over
    /// for that player; otherwise both components are finite.
    pub fn evaluate(&mut self, game: &GameState, player: PlayerId) -> Score {
        if let Some(score) = Self::terminal_score(game, player) {
            return score;
        }

        // Fold imminent combat into the position by playing it out on a copy
        if self.profile.fold_combat && game.turn.current_step < Step::CombatDamage {
            let mut copy = game.snapshot();
            copy.advance_to(Step::EndCombat, &mut |_| {});
            if let Some(score) = Self::terminal_score(&copy, player) {
                return score;
            }
            return self.evaluate_impl(&copy, player);
        }

        self.evaluate_impl(game, player)
    }

    fn terminal_score(game: &GameState, player: PlayerId) -> Option<Score> {
        if !game.is_game_over() {
            return None;
        }
        if game.has_won(player) {
            Some(Score::WIN)
        } else if game.has_lost(player) {
            Some(Score::LOSS)
        } else {
            // Drawn games are neutral, not sentinel
            Some(Score::new(0))
        }
    }

    fn evaluate_impl(&mut self, game: &GameState, player: PlayerId) -> Score {
        let mut score = 0i32;

        // Cards in hand: excess over the maximum hand size only counts 1x
        let my_hand = game.hand_size(player) as i32;
        let opponents = game.opponents(player);
        let opp_hand: i32 = opponents.iter().map(|&o| game.hand_size(o) as i32).sum();

        score += Self::hand_material(my_hand, 5) - Self::hand_material(opp_hand, 4);

        // Life totals, averaged across opponents
        let my_life = game.get_player(player).map(|p| p.life).unwrap_or(0);
        let opp_life_total: i32 = opponents
            .iter()
            .filter_map(|&o| game.get_player(o).ok())
            .map(|p| p.life)
            .sum();
        let avg_opp_life = if opponents.is_empty() {
            0
        } else {
            opp_life_total / opponents.len() as i32
        };
        score += 2 * (my_life - avg_opp_life);

        if self.profile.combo_bonus > 0 {
            score += self.combo_bonus(game, player);
        }

        score += self.eval_mana_base(game, player);

        // Battlefield permanents, signed by controller
        let mut summon_sick_score = score;
        let current_turn = game.turn.turn_number;
        let before_main2 = game.turn.current_step < Step::Main2;

        for &card_id in &game.battlefield.cards {
            let Ok(card) = game.cards.get(card_id) else { continue };
            let value = self.eval_card(game, player, card);

            let mut sick_value = value;
            if before_main2
                && card.controller == player
                && card.is_summoning_sick(current_turn)
            {
                sick_value = 0;
            }

            if card.controller == player {
                score += value;
                summon_sick_score += sick_value;
            } else {
                score -= value;
                summon_sick_score -= sick_value;
            }
        }

        Score::with_summon_sick(score, summon_sick_score)
    }

    fn hand_material(cards: i32, weight: i32) -> i32 {
        let max = crate::core::Player::MAX_HAND_SIZE as i32;
        weight * cards.min(max) + (cards - max).max(0)
    }

    /// Heuristic synergy bonus
    ///
    /// Each matched signal contributes a fraction of the configured bonus;
    /// list membership comes from the profile's synergy tables.
    fn combo_bonus(&self, game: &GameState, player: PlayerId) -> i32 {
        let bonus = self.profile.combo_bonus;
        let mut value = 0;

        let lowest_opp_life = game
            .opponents(player)
            .iter()
            .filter_map(|&o| game.get_player(o).ok())
            .map(|p| p.life)
            .min()
            .unwrap_or(i32::MAX);
        if lowest_opp_life <= 3 {
            value += bonus / 2;
        } else if lowest_opp_life <= 5 {
            value += bonus / 4;
        }

        let untapped_sources = game
            .battlefield
            .cards
            .iter()
            .filter_map(|&id| game.cards.get(id).ok())
            .filter(|c| c.controller == player && !c.tapped && c.is_mana_source())
            .count();
        if untapped_sources >= 7 {
            value += bonus / 4;
        }

        if game.hand_size(player) >= 7 {
            value += bonus / 4;
        }

        let tables = &self.profile.synergy;
        let categories: [&[String]; 5] = [
            &tables.graveyard,
            &tables.sacrifice,
            &tables.counters,
            &tables.tribal,
            &tables.mana_doublers,
        ];

        let mut matches = 0;
        for zone in [Zone::Battlefield, Zone::Hand] {
            for &card_id in game.cards_in(player, zone) {
                let Ok(card) = game.cards.get(card_id) else { continue };
                if zone == Zone::Battlefield && card.controller != player {
                    continue;
                }
                let name = card.name.as_str();
                for table in categories {
                    if table.iter().any(|s| name.contains(s.as_str())) {
                        matches += 1;
                        break;
                    }
                }
            }
        }
        value += ((bonus as i64 * matches as i64) / 8).min(2 * bonus as i64) as i32;

        value
    }

    /// Mana base quality, capped at what the deck can use
    fn eval_mana_base(&self, game: &GameState, player: PlayerId) -> i32 {
        let mut value = 0;

        // Potential production counts all controlled sources, tapped or not
        let mut pips = [0u32; 6];
        let mut max_producible = 0i32;
        for &card_id in &game.battlefield.cards {
            let Ok(card) = game.cards.get(card_id) else { continue };
            if card.controller != player {
                continue;
            }
            let Some(production) = &card.mana_production else { continue };
            for color in Color::ALL {
                if production.produces_color(color) {
                    pips[color.index()] += 1;
                }
            }
            max_producible += production.net().max(0);
        }

        for color in Color::ALL {
            let cap = self.deck_stats.max_pips[color.index()] as u32;
            value += 100 * pips[color.index()].min(cap) as i32;
        }

        let max_cost = self.deck_stats.max_cost as i32;
        value += 100 * max_producible.min(max_cost);
        value += 5 * (max_producible - max_cost).max(0);

        value
    }

    /// Value of a single battlefield permanent
    fn eval_card(&mut self, game: &GameState, player: PlayerId, card: &Card) -> i32 {
        if card.is_creature() {
            // Depends on the rest of the board, so never cached
            return self.evaluate_creature(game, player, card);
        }

        let key = (card.id.as_u32(), card.tapped);
        if let Some(&cached) = self.card_cache.get(&key) {
            return cached;
        }

        let value = if card.is_land() {
            Self::evaluate_land(card)
        } else if card.is_aura {
            // Auras only provide value through what they enchant
            0
        } else {
            let cmc = card.mana_cost.cmc() as i32;
            let mut v = 50 + 30 * cmc;
            if card.is_planeswalker() {
                v += 2 * card.loyalty as i32;
            }
            v
        };

        self.card_cache.insert(key, value);
        value
    }

    /// Evaluate a land card
    pub fn evaluate_land(card: &Card) -> i32 {
        let mut value = 3;

        if let Some(production) = &card.mana_production {
            value += 100 * production.net().max(0);
            value += 3 * production.distinct_colors() as i32;
        }

        for ability in &card.activated_abilities {
            if ability.is_mana_ability {
                continue;
            }
            match ability.cost_shape {
                // Activates without tapping: rates like a manland
                AbilityCostShape::NoTap => value += 25,
                // One-shot
                AbilityCostShape::Sacrifice => value += 10,
                // Repeatable utility that gets you ahead over time
                AbilityCostShape::Tap => value += 50,
            }
        }

        value += 6 * card.static_ability_count as i32;

        value
    }

    /// Creature value in board context
    ///
    /// Context is judged against the opponents of the creature's
    /// controller, whichever side is being evaluated.
    pub fn evaluate_creature(&self, game: &GameState, _player: PlayerId, card: &Card) -> i32 {
        let mut value = Self::creature_base_value(card);

        let opponents = game.opponents(card.controller);
        let mut opposing: Vec<&Card> = Vec::new();
        for opp in &opponents {
            for id in game.creatures_in_play(*opp) {
                if let Ok(c) = game.cards.get(id) {
                    opposing.push(c);
                }
            }
        }

        let power = card.current_power();

        // Few or no bodies able to block this creature
        let blocker_count = opposing
            .iter()
            .filter(|b| CombatState::can_block(b, card))
            .count();
        if blocker_count == 0 {
            value += power * 15;
        } else if blocker_count <= 2 {
            value += power * 5;
        }

        // Sparse boards make every body matter more
        let total_creatures = game
            .player_order
            .iter()
            .map(|&p| game.creatures_in_play(p).len())
            .sum::<usize>();
        if total_creatures <= 2 {
            value += 25;
        }

        // Outclasses the whole opposing board
        if !opposing.is_empty() {
            let dominates = opposing.iter().all(|o| {
                let kills = power >= o.current_toughness() || card.has_deathtouch();
                let survives =
                    card.current_toughness() > o.current_power() && !o.has_deathtouch();
                kills || survives
            });
            if dominates {
                value += 30;
            }
            if card.has_deathtouch() && opposing.iter().any(|o| o.current_power() >= 4) {
                value += 15;
            }
        }

        value
    }

    /// Context-free creature value: stats plus keyword modifiers
    fn creature_base_value(card: &Card) -> i32 {
        let mut value = 80;

        if !card.is_token {
            value += 20;
        }

        let power = card.current_power();
        let toughness = card.current_toughness();

        value += power * 15;
        value += toughness * 10;
        value += card.mana_cost.cmc() as i32 * 5;

        // Evasion
        if card.has_flying() {
            value += power * 10;
        }
        if card.has_keyword(&Keyword::Horsemanship) {
            value += power * 10;
        }
        if card.has_keyword(&Keyword::Shadow) {
            value += power * 10;
        }
        if card.has_keyword(&Keyword::Fear) {
            value += power * 6;
        }
        if card.has_keyword(&Keyword::Intimidate) {
            value += power * 6;
        }
        if card.has_keyword(&Keyword::Menace) {
            value += power * 4;
        }
        if card.has_keyword(&Keyword::Skulk) {
            value += power * 3;
        }

        // Combat keywords only matter with power
        if power > 0 {
            if card.has_double_strike() {
                value += 10 + power * 15;
            } else if card.has_first_strike() {
                value += 10 + power * 5;
            }
            if card.has_deathtouch() {
                value += 25;
            }
            if card.has_lifelink() {
                value += power * 10;
            }
            if power > 1 && card.has_trample() {
                value += (power - 1) * 5;
            }
            if card.has_keyword(&Keyword::Vigilance) {
                value += power * 5 + toughness * 5;
            }
            if card.has_keyword(&Keyword::Infect) {
                value += power * 15;
            } else if card.has_keyword(&Keyword::Wither) {
                value += power * 10;
            }
        }

        if card.has_reach() && !card.has_flying() {
            value += 5;
        }

        // Protection
        if card.has_keyword(&Keyword::Indestructible) {
            value += 70;
        }
        if card.has_keyword(&Keyword::Hexproof) {
            value += 35;
        }
        if card.has_keyword(&Keyword::Shroud) {
            value += 30;
        }

        if card.has_defender() {
            value -= power * 9 + 40;
        }

        if card.is_mana_source() {
            value += 10;
        }

        value
    }
}
