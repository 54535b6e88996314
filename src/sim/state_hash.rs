//! Position hashing and the infinite-loop guard
//!
//! The hash is deliberately lossy: only the fields that matter to the
//! search participate, in a fixed order, so equivalent positions reached by
//! different move orders collide on purpose.

use crate::core::PlayerId;
use crate::game::GameState;
use rustc_hash::FxHashSet;

/// Computes a 64-bit hash of the search-relevant projection of a game state
#[derive(Debug, Clone, Copy, Default)]
pub struct GameStateHasher;

impl GameStateHasher {
    const PRIME: u64 = 31;

    pub fn new() -> Self {
        GameStateHasher
    }

    /// Hash the game from a fixed field order: turn, step, per-player
    /// totals, battlefield permanents, stack depth
    pub fn hash(&self, game: &GameState) -> u64 {
        let mut acc: u64 = 1469598103934665603; // FNV offset basis seed

        acc = Self::mix(acc, game.turn.turn_number as u64);
        acc = Self::mix(acc, game.turn.current_step.ordinal() as u64);

        for &player_id in &game.player_order {
            acc = Self::mix_player(acc, game, player_id);
        }

        // Battlefield order is stable within a game and across snapshots
        for &card_id in &game.battlefield.cards {
            let Ok(card) = game.cards.get(card_id) else { continue };
            acc = Self::mix(acc, card.id.as_u32() as u64);
            acc = Self::mix(acc, card.tapped as u64);
            if card.is_creature() {
                acc = Self::mix(acc, card.is_summoning_sick(game.turn.turn_number) as u64);
                acc = Self::mix(acc, card.current_power() as u64);
                acc = Self::mix(acc, card.current_toughness() as u64);
            }
        }

        acc = Self::mix(acc, game.stack_depth() as u64);

        acc
    }

    fn mix_player(mut acc: u64, game: &GameState, player_id: PlayerId) -> u64 {
        let life = game
            .get_player(player_id)
            .map(|p| p.life)
            .unwrap_or(0);
        let poison = game
            .get_player(player_id)
            .map(|p| p.poison)
            .unwrap_or(0);
        acc = Self::mix(acc, life as u64);
        acc = Self::mix(acc, game.hand_size(player_id) as u64);
        acc = Self::mix(acc, game.graveyard_size(player_id) as u64);
        acc = Self::mix(acc, game.library_size(player_id) as u64);
        acc = Self::mix(acc, poison as u64);
        acc
    }

    #[inline]
    fn mix(acc: u64, value: u64) -> u64 {
        let mut h = acc.wrapping_mul(Self::PRIME).wrapping_add(value);
        // Avalanche so small field deltas touch high bits
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51afd7ed558ccd);
        h
    }
}

/// Seen-hash set guarding against simulation loops
///
/// Bounded: when the cap is reached the set clears itself and starts over.
/// A probe reporting "already seen" tells the search to abandon the branch.
#[derive(Debug, Clone)]
pub struct LoopGuard {
    seen: FxHashSet<u64>,
    cap: usize,
}

impl LoopGuard {
    pub const DEFAULT_CAP: usize = 10_000;

    pub fn new() -> Self {
        Self::with_cap(Self::DEFAULT_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        LoopGuard {
            seen: FxHashSet::default(),
            cap,
        }
    }

    /// Record a hash; returns true if it was already present (a loop)
    pub fn check_and_insert(&mut self, hash: u64) -> bool {
        if self.seen.len() >= self.cap {
            self.seen.clear();
        }
        !self.seen.insert(hash)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new()
    }
}
