//! Deck-level statistics for mana-base evaluation

use crate::core::{Color, PlayerId};
use crate::game::GameState;
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

/// Color and cost ceilings derived from a player's deck
///
/// The mana-base score only rewards sources up to what the deck can
/// actually use: the heaviest colored-pip requirement per color and the
/// most expensive card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStatistics {
    /// Heaviest number of pips of each color in any single cost (WUBRGC)
    pub max_pips: [u8; 6],

    /// Converted cost of the most expensive card
    pub max_cost: u8,
}

impl DeckStatistics {
    /// Compute statistics from every card the player owns, wherever it is
    pub fn from_game(game: &GameState, player: PlayerId) -> Self {
        let mut stats = DeckStatistics::default();

        let zones = [Zone::Library, Zone::Hand, Zone::Battlefield, Zone::Graveyard];
        for zone in zones {
            for &card_id in game.cards_in(player, zone) {
                let Ok(card) = game.cards.get(card_id) else { continue };
                if card.owner != player || card.is_land() {
                    continue;
                }
                for color in Color::ALL {
                    let pips = card.mana_cost.pips(color);
                    if pips > stats.max_pips[color.index()] {
                        stats.max_pips[color.index()] = pips;
                    }
                }
                let cmc = card.mana_cost.cmc();
                if cmc > stats.max_cost {
                    stats.max_cost = cmc;
                }
            }
        }

        stats
    }
}
