//! End-to-end search scenarios
//!
//! Drives the simulation search and the MCTS controller over concrete
//! board states and checks the lines they find.

use mtg_sim_ai::core::{ActionRef, ApiKind, Card, CardType, Color, ManaCost, ManaProduction, PlayerId};
use mtg_sim_ai::game::{GameState, Step};
use mtg_sim_ai::sim::{
    Bound, GameStateHasher, MctsController, MoveOrderer, Score, SimProfile, SimulationController,
    TranspositionTable,
};

fn profile() -> SimProfile {
    SimProfile {
        max_depth: 3,
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

fn add_mountain(game: &mut GameState, owner: PlayerId) {
    let id = game.next_card_id();
    let mut land = Card::new(id, format!("Mountain {}", id), owner);
    land.types.push(CardType::Land);
    land.mana_production = Some(ManaProduction::single(Color::Red));
    game.cards.insert(id, land);
    game.battlefield.add(id);
}

fn add_bolt(game: &mut GameState, owner: PlayerId) {
    let id = game.next_card_id();
    let mut bolt = Card::new(id, "Lightning Bolt", owner);
    bolt.types.push(CardType::Instant);
    bolt.mana_cost = ManaCost::from_string("R");
    bolt.spell_kind = Some(ApiKind::DealDamage);
    bolt.effect_amount = 3;
    game.cards.insert(id, bolt);
    game.get_player_zones_mut(owner).unwrap().hand.add(id);
}

#[test]
fn test_minimax_finds_two_bolt_lethal() {
    let (mut game, p1, p2) = setup();
    game.get_player_mut(p2).unwrap().life = 6;
    add_mountain(&mut game, p1);
    add_mountain(&mut game, p1);
    add_bolt(&mut game, p1);
    add_bolt(&mut game, p1);

    let mut controller = SimulationController::new(p1, profile());
    let plan = controller.choose_best_plan(&game).expect("a lethal plan");

    assert!(plan.expected_score.is_win());
    assert_eq!(plan.len(), 2);
    for entry in &plan.entries {
        assert!(entry.action.description.contains("Lightning Bolt"));
        assert!(entry.action.description.contains("Opp"));
    }
}

#[test]
fn test_minimax_removes_blocker_before_face_damage() {
    let (mut game, p1, p2) = setup();
    add_mountain(&mut game, p1);

    // A big opposing creature the bolt can cleanly kill
    let id = game.next_card_id();
    let mut bear = Card::new(id, "River Bear", p2);
    bear.types.push(CardType::Creature);
    bear.power = Some(3);
    bear.toughness = Some(3);
    bear.mana_cost = ManaCost::from_string("2G");
    game.cards.insert(id, bear);
    game.battlefield.add(id);

    add_bolt(&mut game, p1);

    let mut controller = SimulationController::new(p1, profile());
    let action = controller.choose_best_action(&game).expect("bolt the bear");

    // Killing the creature swings board material more than three face
    // damage moves life
    assert!(action.description.contains("River Bear"));
}

#[test]
fn test_action_ref_round_trip_across_snapshots() {
    let (mut game, p1, _) = setup();
    add_mountain(&mut game, p1);
    add_bolt(&mut game, p1);

    let candidates = game.candidate_actions(p1);
    assert!(!candidates.is_empty());

    let copy = game.snapshot();
    let copied_candidates = copy.candidate_actions(p1);

    for (idx, action) in candidates.iter().enumerate() {
        let aref = ActionRef::new(idx, action);
        let (resolved_idx, resolved) = aref
            .resolve_in(&copied_candidates)
            .expect("candidate resolves in the copy");
        assert_eq!(resolved_idx, idx);
        assert_eq!(resolved.description, action.description);
    }
}

#[test]
fn test_hash_stable_across_snapshot() {
    let (mut game, p1, _) = setup();
    add_mountain(&mut game, p1);
    add_bolt(&mut game, p1);

    let hasher = GameStateHasher::new();
    let copy = game.snapshot();
    assert_eq!(hasher.hash(&game), hasher.hash(&copy));

    // Mutating the copy diverges the hash
    let mut copy = game.snapshot();
    copy.get_player_mut(p1).unwrap().lose_life(1);
    assert_ne!(hasher.hash(&game), hasher.hash(&copy));
}

#[test]
fn test_transposition_lru_scenario() {
    // Capacity three: insert H1..H3, probe H1, insert H4, H2 is gone
    let mut tt = TranspositionTable::with_capacity(3);
    tt.store(1, Score::new(10), 1, Bound::Exact);
    tt.store(2, Score::new(20), 1, Bound::Exact);
    tt.store(3, Score::new(30), 1, Bound::Exact);

    assert!(tt.probe(1, 1).is_some());
    tt.store(4, Score::new(40), 1, Bound::Exact);

    assert!(tt.probe(2, 1).is_none());
    assert!(tt.probe(1, 1).is_some());
    assert!(tt.probe(4, 1).is_some());
}

#[test]
fn test_move_orderer_deterministic_per_thread() {
    // Two threads with their own orderers and identical histories produce
    // identical orderings without observing each other
    let build_actions = || {
        let (mut game, p1, _) = setup();
        add_mountain(&mut game, p1);
        add_bolt(&mut game, p1);
        let id = game.next_card_id();
        let mut land = Card::new(id, "Forest", p1);
        land.types.push(CardType::Land);
        land.mana_production = Some(ManaProduction::single(Color::Green));
        game.cards.insert(id, land);
        game.get_player_zones_mut(p1).unwrap().hand.add(id);
        let candidates = game.candidate_actions(p1);
        (game, candidates)
    };

    let worker = move || {
        let (_game, candidates) = build_actions();
        let mut orderer = MoveOrderer::new();
        orderer.update_history(&candidates[0], 3);
        let first = orderer.order_moves(&candidates, 1);
        orderer.clear();
        let second = orderer.order_moves(&candidates, 1);
        assert_eq!(first, second);
        first
    };

    let handle_a = std::thread::spawn(worker);
    let handle_b = std::thread::spawn(worker);
    let order_a = handle_a.join().unwrap();
    let order_b = handle_b.join().unwrap();
    assert_eq!(order_a, order_b);
}

#[test]
fn test_mcts_matches_minimax_on_lethal() {
    let (mut game, p1, p2) = setup();
    game.get_player_mut(p2).unwrap().life = 3;
    add_mountain(&mut game, p1);
    add_bolt(&mut game, p1);

    let mut mcts_profile = profile();
    mcts_profile.mcts_iterations = 300;
    mcts_profile.mcts_rollout_depth = 4;

    let mut minimax = SimulationController::new(p1, profile());
    let mut mcts = MctsController::new(p1, mcts_profile);

    let minimax_action = minimax.choose_best_action(&game).expect("minimax lethal");
    let mcts_action = mcts.choose_action(&game).expect("mcts lethal");

    assert!(minimax_action.description.contains("Opp"));
    assert_eq!(minimax_action.description, mcts_action.description);
}

#[test]
fn test_parallel_decisions_are_isolated() {
    // Distinct controllers on distinct threads deciding over the same
    // position reach the same answer
    let decide = || {
        let (mut game, p1, p2) = setup();
        game.get_player_mut(p2).unwrap().life = 3;
        add_mountain(&mut game, p1);
        add_bolt(&mut game, p1);
        let mut controller = SimulationController::new(p1, profile());
        controller
            .choose_best_action(&game)
            .map(|a| a.description)
    };

    let handles: Vec<_> = (0..4).map(|_| std::thread::spawn(decide)).collect();
    let results: Vec<Option<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().all(|r| r.is_some()));
    let first = results[0].clone();
    assert!(results.iter().all(|r| *r == first));
}
