use pokemon_battle_search::battle::ReferenceSim;
use pokemon_battle_search::env::BattleEnv;
use pokemon_battle_search::model::{BattleState, Combatant, Move, Side, Status, Team};
use pokemon_battle_search::types::{PkmType, TypeChart};
use pokemon_battle_search::{
    BattlePolicy, DecisionPath, PolicyConfig, PolicyError, SearchAlgorithm,
};
use std::cell::Cell;

/// Wraps the reference simulator and counts how often a turn is resolved.
struct CountingEnv {
    inner: ReferenceSim,
    steps: Cell<usize>,
}

impl CountingEnv {
    fn new() -> Self {
        CountingEnv {
            inner: ReferenceSim::new(0, TypeChart::standard()),
            steps: Cell::new(0),
        }
    }
}

impl BattleEnv for CountingEnv {
    fn legal_action_count(&self, state: &BattleState, side: Side) -> usize {
        self.inner.legal_action_count(state, side)
    }

    fn step(&self, state: &BattleState, actions: [usize; 2]) -> BattleState {
        self.steps.set(self.steps.get() + 1);
        self.inner.step(state, actions)
    }
}

/// Reports no legal action for anyone.
struct StuckEnv;

impl BattleEnv for StuckEnv {
    fn legal_action_count(&self, _state: &BattleState, _side: Side) -> usize {
        0
    }

    fn step(&self, state: &BattleState, _actions: [usize; 2]) -> BattleState {
        state.clone()
    }
}

fn make_move(name: &str, move_type: PkmType, power: f64) -> Move {
    Move::new(name, move_type, power)
}

fn make_mon(name: &str, pkm_type: PkmType, hp: f64, moves: Vec<Move>) -> Combatant {
    Combatant {
        name: name.to_string(),
        pkm_type,
        hp,
        max_hp: 100.0,
        status: Status::None,
        moves,
    }
}

fn lethal_state(finisher: Move) -> BattleState {
    BattleState::new(
        Team::new(make_mon("Striker", PkmType::Normal, 100.0, vec![finisher]), vec![]),
        Team::new(
            make_mon(
                "Target",
                PkmType::Normal,
                70.0,
                vec![make_move("Tackle", PkmType::Normal, 40.0)],
            ),
            vec![],
        ),
    )
}

fn midgame_state() -> BattleState {
    BattleState::new(
        Team::new(
            make_mon(
                "Torrent",
                PkmType::Water,
                90.0,
                vec![
                    make_move("Surf", PkmType::Water, 90.0),
                    make_move("Ice Beam", PkmType::Ice, 90.0),
                    make_move("Tackle", PkmType::Normal, 40.0),
                ],
            ),
            vec![make_mon(
                "Cinder",
                PkmType::Fire,
                100.0,
                vec![make_move("Flamethrower", PkmType::Fire, 90.0)],
            )],
        ),
        Team::new(
            make_mon(
                "Volt",
                PkmType::Electric,
                180.0,
                vec![make_move("Thunderbolt", PkmType::Electric, 90.0), Move::unknown()],
            ),
            vec![make_mon("Boulder", PkmType::Rock, 100.0, vec![Move::unknown()])],
        ),
    )
}

#[test]
fn lethal_move_is_played_without_searching() {
    let env = CountingEnv::new();
    let mut policy = BattlePolicy::new(&env, PolicyConfig::default()).unwrap();
    let decision = policy
        .decide(&lethal_state(make_move("Body Slam", PkmType::Normal, 80.0)))
        .unwrap();
    assert_eq!(decision.action, 0);
    assert_eq!(decision.path, DecisionPath::LethalShortcut);
    assert!(decision.outcome.is_none());
    assert_eq!(env.steps.get(), 0);
}

#[test]
fn fixed_damage_finisher_counts_as_lethal() {
    let env = CountingEnv::new();
    let mut finisher = make_move("Sonic Boom", PkmType::Normal, 0.0);
    finisher.fixed_damage = 80.0;
    let mut policy = BattlePolicy::new(&env, PolicyConfig::default()).unwrap();
    assert_eq!(policy.choose_action(&lethal_state(finisher)).unwrap(), 0);
    assert_eq!(env.steps.get(), 0);
}

#[test]
fn inaccurate_finisher_goes_through_search() {
    let env = CountingEnv::new();
    let mut finisher = make_move("Mega Kick", PkmType::Normal, 120.0);
    finisher.accuracy = 0.5;
    let mut policy = BattlePolicy::new(&env, PolicyConfig::default().with_max_depth(1)).unwrap();
    let decision = policy.decide(&lethal_state(finisher)).unwrap();
    assert_eq!(decision.action, 0);
    assert_eq!(
        decision.path,
        DecisionPath::Search(SearchAlgorithm::SequentialAlphaBeta)
    );
    assert!(env.steps.get() > 0);
}

#[test]
fn choose_action_is_deterministic() {
    for algorithm in [
        SearchAlgorithm::SequentialAlphaBeta,
        SearchAlgorithm::MatrixGame,
        SearchAlgorithm::Greedy,
    ] {
        let config = PolicyConfig::default().with_algorithm(algorithm).with_seed(42);
        let state = midgame_state();
        let sim = ReferenceSim::new(9, TypeChart::standard());
        let mut first = BattlePolicy::new(sim.clone(), config.clone()).unwrap();
        let mut second = BattlePolicy::new(sim, config).unwrap();
        let a = first.decide(&state).unwrap();
        let b = second.decide(&state).unwrap();
        assert_eq!(a, b, "{algorithm}");
        assert_eq!(first.choose_action(&state).unwrap(), a.action);
    }
}

#[test]
fn every_algorithm_returns_a_legal_action() {
    let state = midgame_state();
    let sim = ReferenceSim::new(3, TypeChart::standard());
    let legal = sim.legal_action_count(&state, Side::Player);
    for algorithm in [
        SearchAlgorithm::SequentialAlphaBeta,
        SearchAlgorithm::MatrixGame,
        SearchAlgorithm::Greedy,
    ] {
        for depth in 0..=2 {
            let config = PolicyConfig::default()
                .with_algorithm(algorithm)
                .with_max_depth(depth);
            let mut policy = BattlePolicy::new(&sim, config).unwrap();
            let action = policy.choose_action(&state).unwrap();
            assert!(action < legal, "{algorithm} depth {depth} chose {action}");
        }
    }
}

#[test]
fn caller_state_keeps_its_unknown_moves() {
    let state = midgame_state();
    let before = state.clone();
    let mut policy =
        BattlePolicy::new(ReferenceSim::new(1, TypeChart::standard()), PolicyConfig::default())
            .unwrap();
    policy.choose_action(&state).unwrap();
    assert_eq!(state, before);
    assert!(state.active(Side::Opponent).has_unknown_moves());
}

#[test]
fn no_legal_action_is_an_invalid_state() {
    let mut policy = BattlePolicy::new(StuckEnv, PolicyConfig::default()).unwrap();
    let result = policy.choose_action(&midgame_state());
    assert!(matches!(result, Err(PolicyError::InvalidState(_))));
}

#[test]
fn little_opponent_knowledge_falls_back_to_greedy() {
    let env = CountingEnv::new();
    let config = PolicyConfig::default().with_min_known_moves(2);
    let mut policy = BattlePolicy::new(&env, config).unwrap();
    let decision = policy.decide(&midgame_state()).unwrap();
    assert_eq!(decision.path, DecisionPath::EstimationGap);
    assert_eq!(env.steps.get(), 0);
}

#[test]
fn remembered_moves_close_the_knowledge_gap() {
    let env = CountingEnv::new();
    let config = PolicyConfig::default()
        .with_min_known_moves(2)
        .with_max_depth(1);
    let mut policy = BattlePolicy::new(&env, config).unwrap();

    let mut revealed = midgame_state();
    revealed.teams[1].active.moves[1] = make_move("Quick Attack", PkmType::Normal, 40.0);
    policy.decide(&revealed).unwrap();

    // the same opponent later shows up with the slot hidden again
    let decision = policy.decide(&midgame_state()).unwrap();
    assert_eq!(
        decision.path,
        DecisionPath::Search(SearchAlgorithm::SequentialAlphaBeta)
    );

    policy.start_match();
    let decision = policy.decide(&midgame_state()).unwrap();
    assert_eq!(decision.path, DecisionPath::EstimationGap);
}

#[test]
fn disabling_the_shortcut_searches_even_when_lethal() {
    let env = CountingEnv::new();
    let config = PolicyConfig::default()
        .without_lethal_shortcut()
        .with_max_depth(1);
    let mut policy = BattlePolicy::new(&env, config).unwrap();
    let decision = policy
        .decide(&lethal_state(make_move("Body Slam", PkmType::Normal, 80.0)))
        .unwrap();
    assert_eq!(decision.action, 0);
    assert!(matches!(decision.path, DecisionPath::Search(_)));
    assert!(env.steps.get() > 0);
}

fn priority_threat_state(hidden: bool) -> BattleState {
    let mut sucker_punch = make_move("Sucker Punch", PkmType::Dark, 70.0);
    sucker_punch.priority = true;
    let opponent_move = if hidden { Move::unknown() } else { sucker_punch };
    let mut state = BattleState::new(
        Team::new(
            make_mon(
                "Striker",
                PkmType::Normal,
                50.0,
                vec![make_move("Body Slam", PkmType::Normal, 80.0)],
            ),
            vec![],
        ),
        Team::new(make_mon("Target", PkmType::Dark, 70.0, vec![opponent_move]), vec![]),
    );
    state.teams[0].stage[2] = 1;
    state
}

#[test]
fn remembered_priority_move_blocks_the_shortcut() {
    let config = PolicyConfig::default().with_max_depth(1);
    let sim = ReferenceSim::new(2, TypeChart::standard());
    let mut policy = BattlePolicy::new(&sim, config.clone()).unwrap();

    let first = policy.decide(&priority_threat_state(false)).unwrap();
    assert!(matches!(first.path, DecisionPath::Search(_)));

    let second = policy.decide(&priority_threat_state(true)).unwrap();
    assert_eq!(policy.history().revealed("Target").len(), 1);
    assert!(matches!(second.path, DecisionPath::Search(_)));

    // without the memory the hidden slot looks harmless
    let mut fresh = BattlePolicy::new(&sim, config).unwrap();
    let blind = fresh.decide(&priority_threat_state(true)).unwrap();
    assert_eq!(blind.path, DecisionPath::LethalShortcut);
}

#[test]
fn out_of_range_stage_is_an_invalid_state() {
    let mut state = midgame_state();
    state.teams[1].stage[0] = 6;
    let mut policy =
        BattlePolicy::new(ReferenceSim::new(1, TypeChart::standard()), PolicyConfig::default())
            .unwrap();
    let result = policy.choose_action(&state);
    assert!(matches!(result, Err(PolicyError::InvalidState(_))));
}
