//! Depth-bounded simulation search
//!
//! An all-MAX search from the deciding player's perspective: opponent
//! responses and combat are folded into the evaluator's fast-forward, so
//! there is no min/max alternation. Classical alpha-beta does not apply;
//! pruning is futility (skip recursion for moves far below the depth's
//! best) plus a soft beta cutoff (stop siblings once this depth beats the
//! parent depth's best).

use crate::core::{ActionRef, PlayerId, SpellAbility, Target};
use crate::game::GameState;
use crate::sim::deck_stats::DeckStatistics;
use crate::sim::evaluator::GameStateEvaluator;
use crate::sim::move_order::MoveOrderer;
use crate::sim::plan::{Decision, Plan};
use crate::sim::profile::SimProfile;
use crate::sim::score::Score;
use crate::sim::simulator::{GameSimulator, SimOutcome};
use crate::sim::state_hash::{GameStateHasher, LoopGuard};
use crate::sim::transposition::{Bound, TranspositionTable};
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::time::Instant;

/// Key identifying a previously simulated targeted effect
///
/// Host and target identities are expressed in root-game terms so entries
/// match across branches; the target's current card score guards against
/// reusing a delta after the target changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EffectKey {
    host_name: String,
    target: crate::core::CardId,
    description: String,
    target_card_score: i32,
}

/// Simulation-based search controller for one player
///
/// Owns all mutable search state (tables, caches, evaluator), so distinct
/// controllers on distinct threads never contend.
pub struct SimulationController {
    player: PlayerId,
    profile: SimProfile,
    evaluator: GameStateEvaluator,
    simulator: GameSimulator,
    orderer: MoveOrderer,
    hasher: GameStateHasher,
    tt: TranspositionTable,
    loop_guard: LoopGuard,
    /// Negative score deltas of targeted effects; positive deltas are never
    /// cached (a shortcut may only conclude "don't bother")
    effect_cache: FxHashMap<EffectKey, i32>,
    deadline: Option<Instant>,
}

impl SimulationController {
    pub fn new(player: PlayerId, profile: SimProfile) -> Self {
        SimulationController {
            player,
            evaluator: GameStateEvaluator::new(profile.clone()),
            simulator: GameSimulator::new(player),
            orderer: MoveOrderer::new(),
            hasher: GameStateHasher::new(),
            tt: TranspositionTable::new(),
            loop_guard: LoopGuard::new(),
            effect_cache: FxHashMap::default(),
            deadline: None,
            profile,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Forget per-game state; call at game boundaries
    pub fn reset_for_new_game(&mut self) {
        self.orderer.clear_all();
        self.tt.clear();
        self.loop_guard.clear();
        self.effect_cache.clear();
    }

    /// Search for the best line of play from this state
    ///
    /// Returns None when no candidate improves on doing nothing (the caller
    /// passes priority).
    pub fn choose_best_plan(&mut self, game: &GameState) -> Option<Plan> {
        self.orderer.clear();
        self.loop_guard.clear();
        self.deadline = Some(Instant::now() + self.profile.time_limit);
        self.evaluator
            .set_deck_stats(DeckStatistics::from_game(game, self.player));

        let base = self.evaluator.evaluate(game, self.player);
        if base.is_terminal() {
            return None;
        }

        let (best, path) = self.search(game, game, 0, None);
        if path.is_empty() || best.value <= base.value {
            return None;
        }
        Some(Plan::from_decisions(&path, best))
    }

    /// Convenience wrapper returning the first concrete action of the plan
    pub fn choose_best_action(&mut self, game: &GameState) -> Option<SpellAbility> {
        let plan = self.choose_best_plan(game)?;
        let first = plan.first_action()?;
        let candidates = game.candidate_actions(self.player);
        first.resolve_in(&candidates).map(|(_, a)| a.clone())
    }

    fn timed_out(&self) -> bool {
        self.deadline
            .map(|d| Instant::now() >= d)
            .unwrap_or(false)
    }

    /// Gate on further descent: stop once winning, out of depth, or out of
    /// time
    fn should_recurse(&self, depth: u32, best: &Score) -> bool {
        !best.is_win() && depth + 1 < self.profile.max_depth && !self.timed_out()
    }

    /// Best score reachable from `game`, and the decisions of that line
    fn search(
        &mut self,
        root: &GameState,
        game: &GameState,
        depth: u32,
        parent_best: Option<i32>,
    ) -> (Score, Vec<Decision>) {
        let base = self.evaluator.evaluate(game, self.player);
        if base.is_terminal() {
            return (base, Vec::new());
        }

        let candidates = game.candidate_actions(self.player);
        if candidates.is_empty() {
            return (base, Vec::new());
        }

        let order = self.orderer.order_moves(&candidates, depth);

        // Doing nothing is always available
        let mut best = base;
        let mut best_path: Vec<Decision> = Vec::new();
        let mut best_at_depth = i32::MIN;

        for idx in order {
            if self.timed_out() {
                break;
            }
            let action = candidates[idx].clone();

            let effect_key = match action.target() {
                Target::Permanent(t) => self.effect_key(root, game, &action, t),
                _ => None,
            };

            // A cached negative delta means this effect was already shown
            // to not be worth it from an equivalent position
            if let Some(key) = &effect_key {
                if let Some(&delta) = self.effect_cache.get(key) {
                    best_at_depth = best_at_depth.max(base.value.saturating_add(delta));
                    continue;
                }
            }

            let (next_game, immediate) =
                match self
                    .simulator
                    .simulate_action(&mut self.evaluator, game, &action)
                {
                    SimOutcome::Applied(g, s) => (g, s),
                    // Stale reference or engine failure: abandon the branch,
                    // score unchanged
                    SimOutcome::Stale | SimOutcome::EngineError => continue,
                };

            if self.profile.loop_detection {
                let hash = self.hasher.hash(&next_game);
                if self.loop_guard.check_and_insert(hash) {
                    continue;
                }
            }

            let futile = self.profile.pruning
                && best_at_depth > i32::MIN
                && !immediate.is_win()
                && immediate.value <= best_at_depth.saturating_sub(self.profile.futility_margin);

            let (branch_score, sub_path) = if !futile && self.should_recurse(depth, &best) {
                self.recurse(root, &next_game, depth + 1, best_at_depth)
            } else {
                (immediate, Vec::new())
            };

            if let Some(key) = effect_key {
                if !branch_score.is_terminal() {
                    let delta = branch_score.value.saturating_sub(base.value);
                    if delta <= 0 {
                        self.effect_cache.insert(key, delta);
                    }
                }
            }

            if branch_score.value > best.value {
                best = branch_score;
                let mut path = vec![Decision::Action(ActionRef::new(idx, &action))];
                match action.target() {
                    Target::Permanent(t) => path.push(Decision::Targets(smallvec![t])),
                    Target::Player(p) => path.push(Decision::Targets(smallvec![p])),
                    Target::None => {}
                }
                path.extend(sub_path);
                best_path = path;
                self.orderer.update_history(&action, depth);
            }
            best_at_depth = best_at_depth.max(branch_score.value);

            // A winning line short-circuits everything else
            if best.is_win() {
                break;
            }

            if self.profile.pruning && depth >= 2 {
                if let Some(parent) = parent_best {
                    if parent > i32::MIN && best_at_depth >= parent {
                        self.orderer.record_killer_move(&action, depth);
                        break;
                    }
                }
            }
        }

        (best, best_path)
    }

    /// Descend into a simulated position, going through the transposition
    /// table when enabled
    fn recurse(
        &mut self,
        root: &GameState,
        game: &GameState,
        depth: u32,
        parent_best: i32,
    ) -> (Score, Vec<Decision>) {
        let budget = self.profile.max_depth.saturating_sub(depth);
        let hash = if self.profile.use_transposition_table {
            Some(self.hasher.hash(game))
        } else {
            None
        };

        if let Some(h) = hash {
            if let Some(entry) = self.tt.probe(h, budget) {
                return (entry.score, Vec::new());
            }
        }

        let (score, path) = self.search(root, game, depth, Some(parent_best));

        if let Some(h) = hash {
            if !score.is_terminal() {
                let bound = if self.timed_out() {
                    Bound::Lower
                } else {
                    Bound::Exact
                };
                self.tt.store(h, score, budget, bound);
            }
        }

        (score, path)
    }

    fn effect_key(
        &self,
        root: &GameState,
        game: &GameState,
        action: &SpellAbility,
        target: crate::core::CardId,
    ) -> Option<EffectKey> {
        let host_name = action.host_name.as_ref()?.as_str().to_string();
        let root_target = game.reverse_map(target, root)?;
        let card = game.cards.get(target).ok()?;
        let target_card_score = if card.is_creature() {
            self.evaluator.evaluate_creature(game, self.player, card)
        } else {
            50 + 30 * card.mana_cost.cmc() as i32
        };
        Some(EffectKey {
            host_name,
            target: root_target,
            description: action.description.clone(),
            target_card_score,
        })
    }

    /// Transposition-table telemetry: (hits, misses)
    pub fn tt_stats(&self) -> (u64, u64) {
        (self.tt.hits(), self.tt.misses())
    }

    pub fn history_len(&self) -> usize {
        self.orderer.history_len()
    }
}
