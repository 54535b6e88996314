//! Spell ability representation
//!
//! A SpellAbility is any playable candidate action a player can take in a
//! priority window: playing a land, casting a spell (with its targets
//! already chosen), or passing. Candidates carry a textual description that
//! is stable within a game, which is what allows a serializable ActionRef
//! to find "the same" action again in a game copy.

use crate::core::{CardId, CardName, PlayerId};
use serde::{Deserialize, Serialize};

/// Target of a candidate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Permanent(CardId),
    Player(PlayerId),
    None,
}

/// The concrete move a candidate performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellAbilityKind {
    /// Play a land card from hand (does not use the stack)
    PlayLand { card_id: CardId },

    /// Cast a spell from hand with targets chosen up front
    CastSpell { card_id: CardId, target: Target },

    /// Take no action and pass priority
    Pass,
}

/// Static classification of what an action does
///
/// Used for move-ordering priority and as half of the history-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiKind {
    DestroyPermanent,
    DealDamage,
    DrawCards,
    Token,
    Pump,
    Mana,
    GainLife,
    Discard,
    CounterSpell,
    PermanentCreature,
    PermanentNoncreature,
    LandPlay,
    Generic,
}

impl ApiKind {
    /// Baseline ordering priority, before killer/history adjustments
    pub fn static_priority(&self) -> i32 {
        match self {
            ApiKind::LandPlay => 450,
            ApiKind::DestroyPermanent => 400,
            ApiKind::DealDamage => 350,
            ApiKind::DrawCards => 300,
            ApiKind::Token => 250,
            ApiKind::PermanentCreature => 200,
            ApiKind::Pump => 150,
            ApiKind::PermanentNoncreature => 120,
            ApiKind::GainLife => 100,
            ApiKind::CounterSpell => 90,
            ApiKind::Discard => 80,
            ApiKind::Mana => 50,
            ApiKind::Generic => 0,
        }
    }

    /// Short name used in history-table keys
    pub fn key_name(&self) -> &'static str {
        match self {
            ApiKind::DestroyPermanent => "Destroy",
            ApiKind::DealDamage => "DealDamage",
            ApiKind::DrawCards => "Draw",
            ApiKind::Token => "Token",
            ApiKind::Pump => "Pump",
            ApiKind::Mana => "Mana",
            ApiKind::GainLife => "GainLife",
            ApiKind::Discard => "Discard",
            ApiKind::CounterSpell => "Counter",
            ApiKind::PermanentCreature => "Creature",
            ApiKind::PermanentNoncreature => "Permanent",
            ApiKind::LandPlay => "Land",
            ApiKind::Generic => "Generic",
        }
    }
}

/// A candidate action in a priority window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellAbility {
    pub kind: SpellAbilityKind,

    /// API classification for ordering
    pub api: ApiKind,

    /// Stable textual identifier within this game
    pub description: String,

    /// Name of the host card, if any
    pub host_name: Option<CardName>,
}

impl SpellAbility {
    pub fn pass() -> Self {
        SpellAbility {
            kind: SpellAbilityKind::Pass,
            api: ApiKind::Generic,
            description: "Pass".to_string(),
            host_name: None,
        }
    }

    /// Host card this action originates from
    pub fn host(&self) -> Option<CardId> {
        match &self.kind {
            SpellAbilityKind::PlayLand { card_id } => Some(*card_id),
            SpellAbilityKind::CastSpell { card_id, .. } => Some(*card_id),
            SpellAbilityKind::Pass => None,
        }
    }

    pub fn is_land_play(&self) -> bool {
        matches!(self.kind, SpellAbilityKind::PlayLand { .. })
    }

    pub fn is_pass(&self) -> bool {
        matches!(self.kind, SpellAbilityKind::Pass)
    }

    pub fn target(&self) -> Target {
        match &self.kind {
            SpellAbilityKind::CastSpell { target, .. } => *target,
            _ => Target::None,
        }
    }

    /// Key used by the history table: host name + API kind
    ///
    /// Object identity does not survive game copies, so the key is built
    /// from stable strings.
    pub fn history_key(&self) -> String {
        let name = self
            .host_name
            .as_ref()
            .map(|n| n.as_str())
            .unwrap_or("<none>");
        format!("{}:{}", name, self.api.key_name())
    }
}

/// A serializable handle identifying an action across game copies
///
/// Resolution first tries the remembered candidate index (cheap path), and
/// falls back to scanning for the first candidate with a matching
/// description. Not finding the action means the branch holding this
/// reference must be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub candidate_index: usize,
    pub description: String,
    pub host_name: Option<CardName>,
}

impl ActionRef {
    pub fn new(candidate_index: usize, action: &SpellAbility) -> Self {
        ActionRef {
            candidate_index,
            description: action.description.clone(),
            host_name: action.host_name.clone(),
        }
    }

    /// Find this action in a candidate list from an equivalent game copy
    pub fn resolve_in<'a>(&self, candidates: &'a [SpellAbility]) -> Option<(usize, &'a SpellAbility)> {
        if let Some(action) = candidates.get(self.candidate_index) {
            if action.description == self.description {
                return Some((self.candidate_index, action));
            }
        }
        candidates
            .iter()
            .enumerate()
            .find(|(_, a)| a.description == self.description)
    }
}
