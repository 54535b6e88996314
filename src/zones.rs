//! Card zones (hand, library, battlefield, etc.)

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// The zones a card can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Hand,
    Library,
    Graveyard,
    Battlefield,
    Stack,
    Exile,
}

/// An ordered collection of cards in a zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub zone: Zone,
    pub owner: PlayerId,
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn remove(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.cards.iter().position(|&c| c == card_id) {
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    /// Remove and return the top card (end of the Vec)
    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Per-player zones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub hand: CardZone,
    pub library: CardZone,
    pub graveyard: CardZone,
    pub exile: CardZone,
}

impl PlayerZones {
    pub fn new(owner: PlayerId) -> Self {
        PlayerZones {
            hand: CardZone::new(Zone::Hand, owner),
            library: CardZone::new(Zone::Library, owner),
            graveyard: CardZone::new(Zone::Graveyard, owner),
            exile: CardZone::new(Zone::Exile, owner),
        }
    }

    pub fn get_zone(&self, zone: Zone) -> Option<&CardZone> {
        match zone {
            Zone::Hand => Some(&self.hand),
            Zone::Library => Some(&self.library),
            Zone::Graveyard => Some(&self.graveyard),
            Zone::Exile => Some(&self.exile),
            _ => None,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Hand => Some(&mut self.hand),
            Zone::Library => Some(&mut self.library),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            _ => None,
        }
    }
}
