//! Main game state structure

use crate::core::{Card, CardId, Color, EntityStore, Player, PlayerId};
use crate::game::{CombatState, GameLogger, TurnStructure};
use crate::zones::{CardZone, PlayerZones, Zone};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndReason {
    LifeLoss,
    Poison,
    DeckOut,
    Concede,
    TurnLimit,
}

impl GameEndReason {
    pub fn name(&self) -> &'static str {
        match self {
            GameEndReason::LifeLoss => "life",
            GameEndReason::Poison => "poison",
            GameEndReason::DeckOut => "deckout",
            GameEndReason::Concede => "concede",
            GameEndReason::TurnLimit => "turn_limit",
        }
    }
}

/// Final result of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub is_draw: bool,
    pub winning_player: Option<PlayerId>,
    pub winning_player_name: Option<String>,
    pub reason: GameEndReason,
}

impl GameOutcome {
    /// Index of the winner in the given roster, if any
    ///
    /// Prefers id identity; falls back to name equality for outcome values
    /// built outside this crate whose ids may not match the roster
    /// (compatibility shim).
    pub fn winner_index(&self, roster: &[(PlayerId, &str)]) -> Option<usize> {
        if self.is_draw {
            return None;
        }
        if let Some(winner) = self.winning_player {
            if let Some(idx) = roster.iter().position(|(id, _)| *id == winner) {
                return Some(idx);
            }
        }
        if let Some(name) = &self.winning_player_name {
            return roster.iter().position(|(_, n)| n == name);
        }
        None
    }
}

/// Complete game state
///
/// Central structure holding all game information, designed to be
/// efficiently clonable for tree search. Entity ids are preserved by
/// snapshots, which is what makes cross-copy handle mapping work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All cards in the game
    pub cards: EntityStore<Card>,

    /// All players in the game
    pub players: EntityStore<Player>,

    /// Players in turn order
    pub player_order: Vec<PlayerId>,

    /// Zones for each player
    pub player_zones: Vec<(PlayerId, PlayerZones)>,

    /// Shared battlefield (all players)
    pub battlefield: CardZone,

    /// The stack (for spells and abilities)
    pub stack: CardZone,

    /// Turn structure
    pub turn: TurnStructure,

    /// Current combat assignments
    pub combat: CombatState,

    /// Diagnostic logger
    pub logger: GameLogger,

    /// End-of-game result once decided
    pub outcome: Option<GameOutcome>,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,
}

impl GameState {
    /// Create a new game with two players
    pub fn new_two_player(player1_name: String, player2_name: String, starting_life: i32) -> Self {
        let mut next_id = 0;

        let p1_id = PlayerId::new(next_id);
        next_id += 1;
        let p2_id = PlayerId::new(next_id);
        next_id += 1;

        let player1 = Player::new(p1_id, player1_name, starting_life);
        let player2 = Player::new(p2_id, player2_name, starting_life);

        let mut players = EntityStore::new();
        players.insert(p1_id, player1);
        players.insert(p2_id, player2);

        let player_zones = vec![
            (p1_id, PlayerZones::new(p1_id)),
            (p2_id, PlayerZones::new(p2_id)),
        ];

        // Shared zones need an owner id that is not a player
        let shared_id = PlayerId::new(next_id);
        next_id += 1;

        GameState {
            cards: EntityStore::new(),
            players,
            player_order: vec![p1_id, p2_id],
            player_zones,
            battlefield: CardZone::new(Zone::Battlefield, shared_id),
            stack: CardZone::new(Zone::Stack, shared_id),
            turn: TurnStructure::new(p1_id),
            combat: CombatState::new(),
            logger: GameLogger::new(),
            outcome: None,
            next_entity_id: next_id,
        }
    }

    /// Get next card ID
    pub fn next_card_id(&mut self) -> CardId {
        let id = CardId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn get_player(&self, player_id: PlayerId) -> Result<&Player> {
        self.players.get(player_id)
    }

    pub fn get_player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(player_id)
    }

    /// Get player zones for a specific player
    pub fn get_player_zones(&self, player_id: PlayerId) -> Option<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    /// Get mutable player zones for a specific player
    pub fn get_player_zones_mut(&mut self, player_id: PlayerId) -> Option<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player_id)
            .map(|(_, zones)| zones)
    }

    /// All opponents of the given player, in turn order
    pub fn opponents(&self, player_id: PlayerId) -> Vec<PlayerId> {
        self.player_order
            .iter()
            .copied()
            .filter(|&id| id != player_id)
            .collect()
    }

    pub fn is_player_turn(&self, player_id: PlayerId) -> bool {
        self.turn.active_player == player_id
    }

    /// Cards in the given player's zone
    pub fn cards_in(&self, player_id: PlayerId, zone: Zone) -> &[CardId] {
        match zone {
            Zone::Battlefield => &self.battlefield.cards,
            Zone::Stack => &self.stack.cards,
            _ => self
                .get_player_zones(player_id)
                .and_then(|zones| zones.get_zone(zone))
                .map(|z| z.cards.as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn hand_size(&self, player_id: PlayerId) -> usize {
        self.cards_in(player_id, Zone::Hand).len()
    }

    pub fn library_size(&self, player_id: PlayerId) -> usize {
        self.cards_in(player_id, Zone::Library).len()
    }

    pub fn graveyard_size(&self, player_id: PlayerId) -> usize {
        self.cards_in(player_id, Zone::Graveyard).len()
    }

    /// Battlefield permanents controlled by the given player
    pub fn permanents_of(&self, player_id: PlayerId) -> Vec<CardId> {
        self.battlefield
            .cards
            .iter()
            .copied()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .map(|c| c.controller == player_id)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Creatures controlled by the given player
    pub fn creatures_in_play(&self, player_id: PlayerId) -> Vec<CardId> {
        self.battlefield
            .cards
            .iter()
            .copied()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .map(|c| c.controller == player_id && c.is_creature())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Untapped lands controlled by the given player
    pub fn untapped_lands(&self, player_id: PlayerId) -> usize {
        self.battlefield
            .cards
            .iter()
            .filter(|&&id| {
                self.cards
                    .get(id)
                    .map(|c| c.controller == player_id && c.is_land() && !c.tapped)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Total mana producible right now from untapped sources, net of
    /// activation costs
    pub fn max_producible_mana(&self, player_id: PlayerId) -> i32 {
        self.battlefield
            .cards
            .iter()
            .filter_map(|&id| self.cards.get(id).ok())
            .filter(|c| c.controller == player_id && !c.tapped)
            .filter_map(|c| c.mana_production.as_ref())
            .map(|p| p.net().max(0))
            .sum()
    }

    /// Number of untapped sources able to produce each color position
    pub fn producible_pips(&self, player_id: PlayerId) -> [u32; 6] {
        let mut pips = [0u32; 6];
        for &id in &self.battlefield.cards {
            let Ok(card) = self.cards.get(id) else { continue };
            if card.controller != player_id || card.tapped {
                continue;
            }
            if let Some(production) = &card.mana_production {
                for color in Color::ALL {
                    if production.produces_color(color) {
                        pips[color.index()] += 1;
                    }
                }
            }
        }
        pips
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Move a card from one zone to another
    pub fn move_card(&mut self, card_id: CardId, from: Zone, to: Zone, owner: PlayerId) -> Result<()> {
        let removed = match from {
            Zone::Battlefield => self.battlefield.remove(card_id),
            Zone::Stack => self.stack.remove(card_id),
            _ => self
                .get_player_zones_mut(owner)
                .and_then(|zones| zones.get_zone_mut(from))
                .map(|zone| zone.remove(card_id))
                .unwrap_or(false),
        };

        if !removed {
            return Err(crate::SimError::InvalidAction(format!(
                "Card {} not found in source zone",
                card_id
            )));
        }

        match to {
            Zone::Battlefield => self.battlefield.add(card_id),
            Zone::Stack => self.stack.add(card_id),
            _ => {
                if let Some(zone) = self
                    .get_player_zones_mut(owner)
                    .and_then(|zones| zones.get_zone_mut(to))
                {
                    zone.add(card_id);
                }
            }
        }

        Ok(())
    }

    /// Draw a card; losing to an empty library is decided here
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<Option<CardId>> {
        let drawn = self
            .get_player_zones_mut(player_id)
            .and_then(|zones| zones.library.draw_top());

        match drawn {
            Some(card_id) => {
                if let Some(zones) = self.get_player_zones_mut(player_id) {
                    zones.hand.add(card_id);
                }
                Ok(Some(card_id))
            }
            None => {
                self.get_player_mut(player_id)?.has_lost = true;
                self.decide_outcome(GameEndReason::DeckOut);
                Ok(None)
            }
        }
    }

    /// Untap all permanents controlled by a player
    pub fn untap_all(&mut self, player_id: PlayerId) -> Result<()> {
        for card_id in self.battlefield.cards.clone() {
            if let Ok(card) = self.cards.get_mut(card_id) {
                if card.controller == player_id {
                    card.untap();
                }
            }
        }
        Ok(())
    }

    /// Create an independent deep copy of this game
    ///
    /// Subsequent mutation of the copy does not affect the original; entity
    /// ids are preserved.
    pub fn snapshot(&self) -> GameState {
        self.clone()
    }

    /// Map a card handle from a copy of this game back to `original`
    ///
    /// Ids are stable across snapshots, so the id itself resolves in the
    /// common case. A card created after the snapshot (e.g. a token made
    /// during simulation) has no antecedent and maps to None; a name probe
    /// covers copies whose id spaces diverged.
    pub fn reverse_map(&self, copied: CardId, original: &GameState) -> Option<CardId> {
        if original.cards.contains(copied) {
            return Some(copied);
        }
        let name = self.cards.get(copied).ok()?.name.clone();
        original
            .cards
            .iter()
            .find(|(_, card)| card.name == name)
            .map(|(id, _)| *id)
    }

    /// Check if the game is over
    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
            || self.players.iter().filter(|(_, p)| !p.has_lost).count() <= 1
    }

    /// Has this player's team won?
    pub fn has_won(&self, player_id: PlayerId) -> bool {
        if let Some(outcome) = &self.outcome {
            return !outcome.is_draw && outcome.winning_player == Some(player_id);
        }
        self.players
            .iter()
            .all(|(id, p)| *id == player_id || p.has_lost)
            && !self
                .players
                .get(player_id)
                .map(|p| p.has_lost)
                .unwrap_or(true)
    }

    /// Has this player's team lost?
    pub fn has_lost(&self, player_id: PlayerId) -> bool {
        if let Some(outcome) = &self.outcome {
            return !outcome.is_draw && outcome.winning_player != Some(player_id);
        }
        self.players
            .get(player_id)
            .map(|p| p.has_lost)
            .unwrap_or(false)
    }

    /// Record the outcome if the game just ended
    pub fn decide_outcome(&mut self, reason: GameEndReason) {
        if self.outcome.is_some() {
            return;
        }
        let alive: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, p)| !p.has_lost)
            .map(|(id, _)| *id)
            .collect();

        match alive.len() {
            0 => {
                self.outcome = Some(GameOutcome {
                    is_draw: true,
                    winning_player: None,
                    winning_player_name: None,
                    reason,
                });
            }
            1 => {
                let winner = alive[0];
                let name = self
                    .players
                    .get(winner)
                    .map(|p| p.name.as_str().to_string())
                    .ok();
                self.outcome = Some(GameOutcome {
                    is_draw: false,
                    winning_player: Some(winner),
                    winning_player_name: name,
                    reason,
                });
            }
            _ => {}
        }
    }
}
