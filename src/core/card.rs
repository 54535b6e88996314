//! Card types and definitions

use crate::core::{ApiKind, CardId, CardName, Color, ManaCost, ManaProduction, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

/// Keyword abilities relevant to evaluation and combat legality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Horsemanship,
    Shadow,
    Fear,
    Intimidate,
    Skulk,
    Menace,
    Reach,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Lifelink,
    Trample,
    Vigilance,
    Haste,
    Defender,
    Hexproof,
    Shroud,
    Indestructible,
    Infect,
    Wither,
}

/// Cost shape of a non-mana activated ability
///
/// The land evaluator only cares about the shape of the cost, not the cost
/// itself: abilities without a tap cost rate like manlands, sacrifice
/// abilities are one-shot, tap abilities are repeatable utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityCostShape {
    NoTap,
    Tap,
    Sacrifice,
}

/// Compact summary of an activated ability for evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedAbilitySummary {
    pub is_mana_ability: bool,
    pub cost_shape: AbilityCostShape,
}

/// A card instance during gameplay
///
/// Cards keep their id across snapshots; the id is the cross-copy identity
/// used by reverse-mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Unique ID for this card instance
    pub id: CardId,

    /// Card name (e.g., "Lightning Bolt")
    pub name: CardName,

    /// Mana cost
    pub mana_cost: ManaCost,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    /// Colors of the card
    pub colors: SmallVec<[Color; 2]>,

    /// Power (for creatures)
    pub power: Option<i8>,

    /// Toughness (for creatures)
    pub toughness: Option<i8>,

    /// Temporary power bonus (until end of turn)
    pub power_bonus: i32,

    /// Temporary toughness bonus (until end of turn)
    pub toughness_bonus: i32,

    /// Damage marked on this creature this turn
    pub damage_marked: i32,

    /// +1/+1 counters minus -1/-1 counters
    pub pt_counters: i32,

    /// Loyalty counters (planeswalkers)
    pub loyalty: u8,

    /// Current owner
    pub owner: PlayerId,

    /// Current controller (can differ from owner)
    pub controller: PlayerId,

    /// Is the card tapped?
    pub tapped: bool,

    /// Token permanents evaluate below real cards
    pub is_token: bool,

    /// Is this an aura attached to something?
    pub is_aura: bool,

    /// Turn number when this permanent entered the battlefield
    /// None = not on battlefield yet, Some(turn) = entered on this turn
    pub turn_entered_battlefield: Option<u32>,

    /// Keyword abilities (Flying, First Strike, etc.)
    pub keywords: Vec<Keyword>,

    /// What this permanent's mana abilities can produce, if any
    pub mana_production: Option<ManaProduction>,

    /// Activated abilities by shape (mana and non-mana)
    pub activated_abilities: Vec<ActivatedAbilitySummary>,

    /// Number of static abilities on this permanent
    pub static_ability_count: u8,

    /// What this card does when cast as a spell (instants/sorceries)
    pub spell_kind: Option<ApiKind>,

    /// Effect magnitude for spells (damage amount, cards drawn, etc.)
    pub effect_amount: i32,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<CardName>, owner: PlayerId) -> Self {
        Card {
            id,
            name: name.into(),
            mana_cost: ManaCost::new(),
            types: SmallVec::new(),
            colors: SmallVec::new(),
            power: None,
            toughness: None,
            power_bonus: 0,
            toughness_bonus: 0,
            damage_marked: 0,
            pt_counters: 0,
            loyalty: 0,
            owner,
            controller: owner,
            tapped: false,
            is_token: false,
            is_aura: false,
            turn_entered_battlefield: None,
            keywords: Vec::new(),
            mana_production: None,
            activated_abilities: Vec::new(),
            static_ability_count: 0,
            spell_kind: None,
            effect_amount: 0,
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_instant_or_sorcery(&self) -> bool {
        self.is_type(CardType::Instant) || self.is_type(CardType::Sorcery)
    }

    pub fn is_artifact(&self) -> bool {
        self.is_type(CardType::Artifact)
    }

    pub fn is_enchantment(&self) -> bool {
        self.is_type(CardType::Enchantment)
    }

    pub fn is_planeswalker(&self) -> bool {
        self.is_type(CardType::Planeswalker)
    }

    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn has_flying(&self) -> bool {
        self.has_keyword(&Keyword::Flying)
    }

    pub fn has_reach(&self) -> bool {
        self.has_keyword(&Keyword::Reach)
    }

    pub fn has_first_strike(&self) -> bool {
        self.has_keyword(&Keyword::FirstStrike)
    }

    pub fn has_double_strike(&self) -> bool {
        self.has_keyword(&Keyword::DoubleStrike)
    }

    pub fn has_trample(&self) -> bool {
        self.has_keyword(&Keyword::Trample)
    }

    pub fn has_lifelink(&self) -> bool {
        self.has_keyword(&Keyword::Lifelink)
    }

    pub fn has_deathtouch(&self) -> bool {
        self.has_keyword(&Keyword::Deathtouch)
    }

    pub fn has_haste(&self) -> bool {
        self.has_keyword(&Keyword::Haste)
    }

    pub fn has_defender(&self) -> bool {
        self.has_keyword(&Keyword::Defender)
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Current power (including counters and temporary bonuses)
    pub fn current_power(&self) -> i32 {
        self.power.unwrap_or(0) as i32 + self.pt_counters + self.power_bonus
    }

    /// Current toughness (including counters and temporary bonuses)
    pub fn current_toughness(&self) -> i32 {
        self.toughness.unwrap_or(0) as i32 + self.pt_counters + self.toughness_bonus
    }

    /// Is this creature summoning sick on the given turn?
    ///
    /// A creature that entered the battlefield this turn cannot attack
    /// unless it has haste.
    pub fn is_summoning_sick(&self, current_turn: u32) -> bool {
        if !self.is_creature() || self.has_haste() {
            return false;
        }
        self.turn_entered_battlefield == Some(current_turn)
    }

    /// Is this permanent a mana source?
    pub fn is_mana_source(&self) -> bool {
        self.mana_production.is_some()
    }
}
