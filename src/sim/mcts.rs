//! Monte Carlo Tree Search controller
//!
//! Shares the static evaluator with the simulation search. Each iteration
//! selects by UCB1, expands by replaying the path of action references on a
//! fresh snapshot, rolls out a shallow heuristic playout, and backpropagates
//! a normalized reward. Thread safety is by instance isolation: one
//! controller per decision thread.

use crate::core::{ActionRef, PlayerId, SpellAbility};
use crate::game::{GameState, Step};
use crate::sim::deck_stats::DeckStatistics;
use crate::sim::evaluator::GameStateEvaluator;
use crate::sim::profile::SimProfile;
use crate::sim::score::Score;
use std::time::Instant;

/// Reward normalization scale: score deltas of this size move the logistic
/// by one unit
const REWARD_SCALE: f64 = 150.0;

/// Iterations required before early termination may trigger
const MIN_ITERATIONS: u32 = 50;

/// Share of root visits that ends the search early
const EARLY_TERMINATION_SHARE: f64 = 0.80;

/// A non-pass child within this much mean reward deposes a pass choice
const PASS_PREFERENCE_MARGIN: f64 = 0.03;

/// Below this mean reward the controller declines to act
const MIN_ACTION_CONFIDENCE: f64 = 0.35;

/// Reward for iterations whose path replay failed
const NEUTRAL_REWARD: f64 = 0.5;

#[derive(Debug, Clone)]
struct MctsNode {
    parent: Option<usize>,
    /// Action that led here (None for the root)
    action: Option<ActionRef>,
    is_pass: bool,
    children: Vec<usize>,
    /// Legal actions, discovered on first expansion, pass appended last
    legal_actions: Option<Vec<SpellAbility>>,
    next_unexpanded: usize,
    visits: u32,
    total_reward: f64,
    terminal: bool,
    terminal_score: Option<Score>,
}

impl MctsNode {
    fn root() -> Self {
        MctsNode {
            parent: None,
            action: None,
            is_pass: false,
            children: Vec::new(),
            legal_actions: None,
            next_unexpanded: 0,
            visits: 0,
            total_reward: 0.0,
            terminal: false,
            terminal_score: None,
        }
    }

    fn child_of(parent: usize, action: ActionRef, is_pass: bool) -> Self {
        MctsNode {
            parent: Some(parent),
            action: Some(action),
            is_pass,
            children: Vec::new(),
            legal_actions: None,
            next_unexpanded: 0,
            visits: 0,
            total_reward: 0.0,
            terminal: false,
            terminal_score: None,
        }
    }

    fn fully_expanded(&self) -> bool {
        self.legal_actions
            .as_ref()
            .map(|a| self.next_unexpanded >= a.len())
            .unwrap_or(false)
    }

    fn mean_reward(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / self.visits as f64
        }
    }
}

/// MCTS decision controller for one player
pub struct MctsController {
    player: PlayerId,
    profile: SimProfile,
    evaluator: GameStateEvaluator,
    nodes: Vec<MctsNode>,
    iterations_run: u32,
}

impl MctsController {
    pub fn new(player: PlayerId, profile: SimProfile) -> Self {
        MctsController {
            player,
            evaluator: GameStateEvaluator::new(profile.clone()),
            nodes: Vec::new(),
            iterations_run: 0,
            profile,
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn iterations_run(&self) -> u32 {
        self.iterations_run
    }

    /// Run the search and pick an action, or None to pass priority
    pub fn choose_action(&mut self, game: &GameState) -> Option<SpellAbility> {
        self.nodes.clear();
        self.nodes.push(MctsNode::root());
        self.iterations_run = 0;
        self.evaluator
            .set_deck_stats(DeckStatistics::from_game(game, self.player));

        let initial = self.evaluator.evaluate(game, self.player);
        if initial.is_terminal() {
            return None;
        }

        let deadline = Instant::now() + self.profile.time_limit;
        for i in 0..self.profile.mcts_iterations {
            if Instant::now() >= deadline {
                break;
            }
            self.iterate(game, initial.value);
            self.iterations_run = i + 1;

            if self.iterations_run >= MIN_ITERATIONS && self.visits_converged() {
                break;
            }
        }

        self.select_root_action(game)
    }

    /// One select/expand/rollout/backpropagate cycle
    fn iterate(&mut self, root_game: &GameState, initial_score: i32) {
        // SELECT: descend while fully expanded and non-terminal
        let mut node = 0usize;
        while !self.nodes[node].terminal && self.nodes[node].fully_expanded() {
            match self.best_ucb_child(node) {
                Some(child) => node = child,
                None => break,
            }
        }

        // EXPAND: replay the path onto a snapshot of the root
        let mut game = root_game.snapshot();
        if !self.replay_path(node, &mut game) {
            // A step failed to resolve; neutral reward, branch effectively dead
            self.backpropagate(node, NEUTRAL_REWARD);
            return;
        }

        if self.nodes[node].terminal {
            let reward = self.nodes[node]
                .terminal_score
                .map(|s| self.normalize_reward(s, initial_score))
                .unwrap_or(NEUTRAL_REWARD);
            self.backpropagate(node, reward);
            return;
        }

        if self.nodes[node].legal_actions.is_none() {
            let mut actions = game.candidate_actions(self.player);
            actions.push(SpellAbility::pass());
            self.nodes[node].legal_actions = Some(actions);
        }

        let idx = self.nodes[node].next_unexpanded;
        let action = {
            let actions = self.nodes[node].legal_actions.as_ref().unwrap();
            actions[idx].clone()
        };
        self.nodes[node].next_unexpanded += 1;

        let action_ref = ActionRef::new(idx, &action);
        let child = self.nodes.len();
        self.nodes
            .push(MctsNode::child_of(node, action_ref, action.is_pass()));
        self.nodes[node].children.push(child);

        if !self.apply(&mut game, &action) {
            self.nodes[child].terminal = true;
            self.backpropagate(child, NEUTRAL_REWARD);
            return;
        }

        if game.is_game_over() {
            let score = self.evaluator.evaluate(&game, self.player);
            self.nodes[child].terminal = true;
            self.nodes[child].terminal_score = Some(score);
            let reward = self.normalize_reward(score, initial_score);
            self.backpropagate(child, reward);
            return;
        }

        // ROLLOUT
        let score = self.rollout(&mut game);
        let reward = self.normalize_reward(score, initial_score);
        self.backpropagate(child, reward);
    }

    /// Replay the action references from the root to `node` onto `game`
    fn replay_path(&self, node: usize, game: &mut GameState) -> bool {
        let mut refs: Vec<&ActionRef> = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            refs.push(self.nodes[current].action.as_ref().unwrap());
            current = parent;
        }
        refs.reverse();

        for action_ref in refs {
            let mut candidates = game.candidate_actions(self.player);
            candidates.push(SpellAbility::pass());
            let Some((_, action)) = action_ref.resolve_in(&candidates) else {
                return false;
            };
            let action = action.clone();
            if !self.apply(game, &action) {
                return false;
            }
            if game.is_game_over() {
                break;
            }
        }
        true
    }

    /// Apply one action; passing advances to the next step
    fn apply(&self, game: &mut GameState, action: &SpellAbility) -> bool {
        if action.is_pass() {
            Self::advance_one_step(game);
            true
        } else {
            game.play_action(self.player, action).unwrap_or(false)
        }
    }

    fn advance_one_step(game: &mut GameState) {
        let target = game.turn.current_step.next().unwrap_or(Step::Untap);
        game.advance_to(target, &mut |_| {});
    }

    /// Shallow heuristic playout: first land play, else highest converted
    /// cost, one action per half-turn
    fn rollout(&mut self, game: &mut GameState) -> Score {
        for _ in 0..self.profile.mcts_rollout_depth {
            if game.is_game_over() {
                break;
            }

            let side = game.turn.active_player;
            let candidates = game.candidate_actions(side);
            let choice = candidates
                .iter()
                .find(|a| a.is_land_play())
                .or_else(|| {
                    candidates
                        .iter()
                        .max_by_key(|a| self.action_cost(game, a))
                })
                .cloned();

            if let Some(action) = choice {
                let _ = game.play_action(side, &action);
            }

            // Hand the turn over
            while !game.is_game_over() && game.turn.active_player == side {
                Self::advance_one_step(game);
            }
        }

        self.evaluator.evaluate(game, self.player)
    }

    fn action_cost(&self, game: &GameState, action: &SpellAbility) -> u8 {
        action
            .host()
            .and_then(|id| game.cards.get(id).ok())
            .map(|c| c.mana_cost.cmc())
            .unwrap_or(0)
    }

    /// Walk parent links, crediting every node on the path
    fn backpropagate(&mut self, node: usize, reward: f64) {
        let mut current = Some(node);
        while let Some(idx) = current {
            self.nodes[idx].visits += 1;
            self.nodes[idx].total_reward += reward;
            current = self.nodes[idx].parent;
        }
    }

    /// UCB1 child selection; unvisited children win immediately
    fn best_ucb_child(&self, node: usize) -> Option<usize> {
        let parent_visits = self.nodes[node].visits.max(1) as f64;
        let c = self.profile.mcts_exploration;

        self.nodes[node]
            .children
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let ua = self.ucb1(a, parent_visits, c);
                let ub = self.ucb1(b, parent_visits, c);
                ua.partial_cmp(&ub).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn ucb1(&self, node: usize, parent_visits: f64, c: f64) -> f64 {
        let n = &self.nodes[node];
        if n.visits == 0 {
            return f64::INFINITY;
        }
        let visits = n.visits as f64;
        n.total_reward / visits + c * (parent_visits.ln() / visits).sqrt()
    }

    /// Has one root child soaked up most of the visits?
    fn visits_converged(&self) -> bool {
        let root = &self.nodes[0];
        let total: u32 = root
            .children
            .iter()
            .map(|&c| self.nodes[c].visits)
            .sum();
        if total == 0 {
            return false;
        }
        let max = root
            .children
            .iter()
            .map(|&c| self.nodes[c].visits)
            .max()
            .unwrap_or(0);
        (max as f64) >= EARLY_TERMINATION_SHARE * (total as f64)
    }

    /// Pick the action to actually take
    fn select_root_action(&self, game: &GameState) -> Option<SpellAbility> {
        let root = &self.nodes[0];
        let most_visited = root
            .children
            .iter()
            .copied()
            .max_by_key(|&c| self.nodes[c].visits)?;

        let mut chosen = most_visited;
        if self.nodes[most_visited].is_pass {
            // Prefer an action over passing when it is nearly as good
            let pass_mean = self.nodes[most_visited].mean_reward();
            let best_action = root
                .children
                .iter()
                .copied()
                .filter(|&c| !self.nodes[c].is_pass && self.nodes[c].visits > 0)
                .max_by(|&a, &b| {
                    self.nodes[a]
                        .mean_reward()
                        .partial_cmp(&self.nodes[b].mean_reward())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(alt) = best_action {
                if self.nodes[alt].mean_reward() + PASS_PREFERENCE_MARGIN >= pass_mean {
                    chosen = alt;
                }
            }
        }

        if self.nodes[chosen].is_pass {
            return None;
        }
        if self.nodes[chosen].mean_reward() < MIN_ACTION_CONFIDENCE {
            return None;
        }

        let action_ref = self.nodes[chosen].action.as_ref()?;
        let candidates = game.candidate_actions(self.player);
        action_ref
            .resolve_in(&candidates)
            .map(|(_, action)| action.clone())
    }

    /// Map a score to [0, 1]: won games are 1, lost games are 0, everything
    /// else a logistic of the score delta
    fn normalize_reward(&self, score: Score, initial: i32) -> f64 {
        if score.is_win() {
            return 1.0;
        }
        if score.is_loss() {
            return 0.0;
        }
        let delta = (score.value - initial) as f64 / REWARD_SCALE;
        1.0 / (1.0 + (-delta).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ApiKind, Card, CardType, Color, ManaCost, ManaProduction};

    fn mcts_profile(iterations: u32) -> SimProfile {
        SimProfile {
            mcts_iterations: iterations,
            mcts_rollout_depth: 4,
            fold_combat: false,
            ..SimProfile::default()
        }
    }

    fn setup() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("AI".to_string(), "Opp".to_string(), 20);
        game.turn.current_step = Step::Main1;
        let p1 = game.player_order[0];
        let p2 = game.player_order[1];
        (game, p1, p2)
    }

    #[test]
    fn test_reward_normalization() {
        let controller = MctsController::new(PlayerId::new(0), mcts_profile(10));
        assert_eq!(controller.normalize_reward(Score::WIN, 0), 1.0);
        assert_eq!(controller.normalize_reward(Score::LOSS, 0), 0.0);

        let even = controller.normalize_reward(Score::new(100), 100);
        assert!((even - 0.5).abs() < 1e-9);

        let better = controller.normalize_reward(Score::new(250), 100);
        assert!(better > 0.5 && better < 1.0);

        let worse = controller.normalize_reward(Score::new(-50), 100);
        assert!(worse < 0.5 && worse > 0.0);
    }

    #[test]
    fn test_finds_lethal_action() {
        let (mut game, p1, p2) = setup();
        game.get_player_mut(p2).unwrap().life = 3;

        let land_id = game.next_card_id();
        let mut land = Card::new(land_id, "Mountain", p1);
        land.types.push(CardType::Land);
        land.mana_production = Some(ManaProduction::single(Color::Red));
        game.cards.insert(land_id, land);
        game.battlefield.add(land_id);

        let bolt_id = game.next_card_id();
        let mut bolt = Card::new(bolt_id, "Lightning Bolt", p1);
        bolt.types.push(CardType::Instant);
        bolt.mana_cost = ManaCost::from_string("R");
        bolt.spell_kind = Some(ApiKind::DealDamage);
        bolt.effect_amount = 3;
        game.cards.insert(bolt_id, bolt);
        game.get_player_zones_mut(p1).unwrap().hand.add(bolt_id);

        let mut controller = MctsController::new(p1, mcts_profile(200));
        let action = controller.choose_action(&game).expect("lethal bolt");
        assert!(action.description.contains("Lightning Bolt"));
        assert!(action.description.contains("Opp"));
    }

    #[test]
    fn test_terminal_root_returns_none() {
        let (mut game, p1, p2) = setup();
        game.get_player_mut(p2).unwrap().lose_life(20);
        game.decide_outcome(crate::game::GameEndReason::LifeLoss);

        let mut controller = MctsController::new(p1, mcts_profile(50));
        assert!(controller.choose_action(&game).is_none());
    }

    #[test]
    fn test_early_termination_on_convergence() {
        let (mut game, p1, p2) = setup();
        game.get_player_mut(p2).unwrap().life = 3;

        let land_id = game.next_card_id();
        let mut land = Card::new(land_id, "Mountain", p1);
        land.types.push(CardType::Land);
        land.mana_production = Some(ManaProduction::single(Color::Red));
        game.cards.insert(land_id, land);
        game.battlefield.add(land_id);

        let bolt_id = game.next_card_id();
        let mut bolt = Card::new(bolt_id, "Lightning Bolt", p1);
        bolt.types.push(CardType::Instant);
        bolt.mana_cost = ManaCost::from_string("R");
        bolt.spell_kind = Some(ApiKind::DealDamage);
        bolt.effect_amount = 3;
        game.cards.insert(bolt_id, bolt);
        game.get_player_zones_mut(p1).unwrap().hand.add(bolt_id);

        let mut controller = MctsController::new(p1, mcts_profile(10_000));
        let _ = controller.choose_action(&game);

        // A winning line dominates visits long before the cap
        assert!(controller.iterations_run() < 10_000);
    }

    #[test]
    fn test_empty_position_passes() {
        let (game, p1, _) = setup();
        let mut controller = MctsController::new(p1, mcts_profile(100));
        // Only pass is available; the controller declines to act
        assert!(controller.choose_action(&game).is_none());
    }
}
