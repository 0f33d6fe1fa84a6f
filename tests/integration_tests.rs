//! Integration tests for mixtour-engine
//!
//! Moves are written in the usual text notation `[count]<col><row>[<col><row>]`:
//! columns are letters starting at `a`, rows are digits starting at `1`, the
//! count defaults to 1, and a single coordinate places a new piece. `pass`
//! passes. For example `c3` places on c3 and `3a1c3` moves the top 3 pieces
//! of a1 onto c3.

use std::sync::Arc;

use fastrand::Rng;
use serde_json::json;

use mixtour_engine::geometry::{BoardConfig, BoardGeometry};
use mixtour_engine::montecarlo::{self, MonteCarloConfig};
use mixtour_engine::moves::Move;
use mixtour_engine::negamax::{self, NegamaxConfig};
use mixtour_engine::selfplay::{play_game, Agent, GameOutcome};
use mixtour_engine::state::{GameState, Snapshot};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn standard() -> Arc<BoardGeometry> {
    Arc::new(BoardGeometry::standard(2).unwrap())
}

//             a5
//          b4 b5 b6
//       c3 c4 c5 c6 c7
//    d2 d3 d4 d5 d6 d7 d8
// e1 e2 e3 e4 e5 e6 e7 e8 e9
fn triangle(player_count: usize) -> Arc<BoardGeometry> {
    let config = BoardConfig {
        rows: 5,
        cols: 9,
        padding_size: 0,
        player_count,
        ..BoardConfig::default()
    };
    let layout = concat!(
        "####0####",
        "###000###",
        "##00000##",
        "#0000000#",
        "000000000",
    );
    Arc::new(BoardGeometry::build(config, layout).unwrap())
}

/// Parse a single move in text notation.
fn parse_move(geo: &BoardGeometry, text: &str) -> Move {
    if text == "pass" {
        return Move::Pass;
    }
    let bytes = text.as_bytes();
    assert!((2..=5).contains(&bytes.len()), "bad move {text:?}");
    let mut i = 0;
    let count = if bytes.len() % 2 == 1 {
        i += 1;
        (bytes[0] - b'0') as usize
    } else {
        1
    };
    let coord = |i: &mut usize| {
        let col = (bytes[*i] - b'a') as usize;
        let row = (bytes[*i + 1] - b'1') as usize;
        *i += 2;
        geo.field_at(row, col)
            .unwrap_or_else(|| panic!("bad field in {text:?}"))
    };
    let src = coord(&mut i);
    let dst = if i < bytes.len() { coord(&mut i) } else { src };
    if src == dst {
        assert_eq!(count, 1, "bad placement {text:?}");
        Move::Place { dst }
    } else {
        Move::Shift { src, count, dst }
    }
}

fn parse_moves(geo: &BoardGeometry, text: &str) -> Vec<Move> {
    text.split(' ').map(|s| parse_move(geo, s)).collect()
}

fn format_field(geo: &BoardGeometry, field: usize) -> String {
    let (row, col) = geo.row_col(field);
    let letter = char::from_u32('a' as u32 + col as u32).unwrap_or('?');
    format!("{letter}{row}", row = row + 1)
}

fn format_move(geo: &BoardGeometry, mv: Move) -> String {
    match mv {
        Move::Pass => "pass".to_string(),
        Move::Place { dst } => format_field(geo, dst),
        Move::Shift { src, count, dst } => {
            let prefix = if count > 1 { count.to_string() } else { String::new() };
            format!("{prefix}{}{}", format_field(geo, src), format_field(geo, dst))
        }
    }
}

fn format_moves(geo: &BoardGeometry, moves: &[Move]) -> String {
    moves
        .iter()
        .map(|&mv| format_move(geo, mv))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Play a sequence of moves, checking each one is legal.
fn replay(state: &mut GameState, text: &str) {
    let geo = state.geometry().clone();
    for mv in parse_moves(&geo, text) {
        assert!(
            state.generate_moves().contains(&mv),
            "illegal move {}",
            format_move(&geo, mv)
        );
        state.apply_move(mv);
    }
}

const OPENING: &str = "a1 b1 a3 b1a1 a3a1 d3 c3 d3c3 e4 d5 e5 d5e4 2e4e5";

// =============================================================================
// Geometry tests
// =============================================================================

#[test]
fn test_standard_field_numbering() {
    let geo = standard();
    assert_eq!(geo.field_count(), 25);
    assert_eq!(geo.field_at(0, 0), Some(0));
    assert_eq!(geo.field_at(4, 4), Some(24));
    assert_eq!(geo.field_at(5, 0), None);
    assert_eq!(format_field(&geo, 7), "c2");
    assert_eq!(parse_move(&geo, "3c2e4"), Move::Shift { src: 7, count: 3, dst: 19 });
}

#[test]
fn test_triangle_field_numbering() {
    let geo = triangle(2);
    assert_eq!(geo.field_count(), 25);
    assert_eq!(geo.field_at(0, 4), Some(0));
    assert_eq!(geo.field_at(0, 3), None);
    assert_eq!(geo.field_at(4, 8), Some(24));
}

// =============================================================================
// Snapshot tests
// =============================================================================

#[test]
fn test_snapshot_json_shape() {
    let mut state = GameState::with_counts(standard(), 20, 3);
    replay(&mut state, "a2 b3 a2b3 e5");

    let value = serde_json::to_value(state.to_snapshot()).unwrap();
    assert_eq!(
        value,
        json!({
            "fields": [
                [], [], [], [], [],
                [], [], [], [], [],
                [], [1, 0], [], [], [],
                [], [], [], [], [],
                [], [], [], [], [1],
            ],
            "lastMove": [-1, 1, 24],
            "nextPlayer": 0,
            "piecesLeft": [19, 18],
            "scoresLeft": [3, 3],
        })
    );
}

#[test]
fn test_snapshot_move_listing() {
    let geo = standard();
    let snapshot: Snapshot = serde_json::from_value(json!({
        "fields": [
            [], [], [], [], [],
            [], [], [], [], [],
            [], [1, 0], [], [0], [],
            [], [], [1], [], [],
            [], [], [], [1], [],
        ],
        "lastMove": [-1, 1, 24],
        "nextPlayer": 0,
        "piecesLeft": [18, 17],
        "scoresLeft": [1, 1],
    }))
    .unwrap();
    let state = GameState::from_snapshot(geo.clone(), snapshot).unwrap();

    assert_eq!(
        format_moves(&geo, &state.generate_moves()),
        "a1 b1 c1 d1 e1 a2 b2 c2 d2 e2 a3 d3b3 c3 c4d3 e3 a4 b4 d5c4 d3c4 b3c4 2b3c4 \
         d4 e4 a5 b5 c5 c4d5 e5"
    );
}

#[test]
fn test_snapshot_restores_play() {
    let mut state = GameState::new(standard());
    replay(&mut state, OPENING);
    let json = serde_json::to_string(&state.to_snapshot()).unwrap();

    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    let restored = GameState::from_snapshot(standard(), snapshot).unwrap();
    assert_eq!(restored, state);
    assert_eq!(restored.generate_moves(), state.generate_moves());
}

// =============================================================================
// Game rules tests
// =============================================================================

#[test]
fn test_winner_first_player() {
    let mut state = GameState::new(standard());
    replay(&mut state, OPENING);
    assert_eq!(state.winner(), None);
    replay(&mut state, "3a1c3");
    assert_eq!(state.winner(), Some(0));
    assert!(state.generate_moves().is_empty());
}

#[test]
fn test_winner_second_player() {
    let mut state = GameState::new(standard());
    replay(&mut state, OPENING);
    replay(&mut state, "3e5c3");
    assert_eq!(state.winner(), Some(1));
}

#[test]
fn test_clone_with_tower_override() {
    let mut base = GameState::with_counts(standard(), 20, 3);
    replay(&mut base, OPENING);

    let mut state1 = base.clone_with_towers(None);
    let mut state2 = base.clone_with_towers(Some(1));
    assert_eq!(state1, base);

    let mut expected = state1.to_snapshot();
    expected.scores_left = vec![1, 1];
    assert_eq!(state2.to_snapshot(), expected);
    assert_eq!(state1.generate_moves(), base.generate_moves());
    assert_eq!(state2.generate_moves(), base.generate_moves());

    replay(&mut state1, "3a1c3");
    replay(&mut state2, "3e5c3");
    assert_eq!(state1.winner(), None);
    assert_eq!(state2.winner(), Some(1));
    assert_eq!(state1.scores_left(), [2, 3]);
    assert_eq!(state2.scores_left(), [1, 0]);

    // The base state is untouched.
    assert_eq!(base.scores_left(), [3, 3]);
}

#[test]
fn test_triage_partition() {
    let geo = standard();
    let mut state = GameState::new(geo.clone());
    replay(&mut state, OPENING);

    let moves = parse_moves(&geo, "2e5c3 3a1c3 c1 3e5c3");
    let triage = state.triage_moves(&moves);
    assert_eq!(format_moves(&geo, &triage.winning), "3e5c3");
    assert_eq!(format_moves(&geo, &triage.neutral), "2e5c3 c1");
    assert_eq!(format_moves(&geo, &triage.losing), "3a1c3");
}

#[test]
fn test_random_playthrough_undo_redo() {
    let mut state = GameState::with_counts(triangle(3), 99, 3);
    let mut rng = Rng::with_seed(12345);
    let mut history = Vec::new();

    let mut player = 0;
    for _ in 0..10_000 {
        assert_eq!(state.next_player(), player);
        let moves = state.generate_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.usize(..moves.len())];
        let undo = state.apply_move(mv);
        history.push((player, moves, mv, undo));
        // Passing hands the turn back to the previous player.
        player = (player + if mv == Move::Pass { 2 } else { 1 }) % 3;
    }
    let final_state = state.clone();
    let winner = state.winner();
    assert!(winner.is_some());

    for (player, moves, mv, undo) in history.iter().rev() {
        state.undo_move(*mv, undo.clone());
        assert_eq!(state.next_player(), *player);
        assert_eq!(&state.generate_moves(), moves);
    }
    assert_eq!(state, GameState::with_counts(triangle(3), 99, 3));

    for (player, moves, mv, _) in &history {
        assert_eq!(state.next_player(), *player);
        assert_eq!(&state.generate_moves(), moves);
        state.apply_move(*mv);
    }
    assert_eq!(state.winner(), winner);
    assert_eq!(state, final_state);
}

// =============================================================================
// Search tests
// =============================================================================

#[test]
fn test_negamax_known_line() {
    let geo = standard();
    let mut state = GameState::new(geo.clone());
    let config = NegamaxConfig::default();

    // Initial state: all moves are equally good.
    let all_moves = state.generate_moves();
    let best = negamax::find_best_moves(&mut state, &all_moves, &config).unwrap();
    assert_eq!(best.moves, all_moves);
    assert_eq!(best.value, 0);

    replay(
        &mut state,
        "c3 a1 d3 d3c3 e3 a1c3 d5 a3 c2 3c3c2 a4 e4 c5 c4 a1 c4c5",
    );

    // Slightly worse for the player to move.
    let all_moves = state.generate_moves();
    let best = negamax::find_best_moves(&mut state, &all_moves, &config).unwrap();
    assert!(best.moves.len() < all_moves.len());
    assert_eq!(best.value, -158);
    assert_eq!(format_moves(&geo, &best.moves), "b4");

    replay(&mut state, "a4a3");

    // Win in 2.
    let moves = state.generate_moves();
    let best = negamax::find_best_moves(&mut state, &moves, &config).unwrap();
    assert_eq!(format_moves(&geo, &best.moves), "c1");
    assert_eq!(best.value, 1_000_000_001);

    replay(&mut state, "c1");

    // Loss in 1.
    let moves = state.generate_moves();
    let best = negamax::find_best_moves(&mut state, &moves, &config).unwrap();
    assert_eq!(best.value, -1_000_000_002);

    replay(&mut state, "c5d5");

    // Win in 1.
    let moves = state.generate_moves();
    let best = negamax::find_best_moves(&mut state, &moves, &config).unwrap();
    assert_eq!(format_moves(&geo, &best.moves), "4c2c1");
    assert_eq!(best.value, 1_000_000_003);

    replay(&mut state, "4c2c1");
    assert_eq!(state.winner(), Some(1));
}

#[test]
fn test_montecarlo_takes_immediate_win() {
    let geo = standard();
    let mut state = GameState::new(geo.clone());
    replay(&mut state, OPENING);
    let before = state.clone();

    let moves = state.generate_moves();
    let mut rng = Rng::with_seed(99);
    let best =
        montecarlo::find_best_moves(&state, &moves, &MonteCarloConfig::default(), &mut rng)
            .unwrap();
    assert_eq!(best.value, 1.0);
    assert!(best.moves.contains(&parse_move(&geo, "3e5c3")));
    assert_eq!(state.triage_moves(&best.moves).winning, best.moves);
    assert_eq!(state, before);
}

#[test]
fn test_montecarlo_three_players() {
    let geo = Arc::new(BoardGeometry::standard(3).unwrap());
    let mut state = GameState::new(geo.clone());
    replay(&mut state, "c3 c2 c4");

    let moves = state.generate_moves();
    let config = MonteCarloConfig {
        total_simulations: 300,
        ..MonteCarloConfig::default()
    };
    let best = montecarlo::find_best_moves(&state, &moves, &config, &mut Rng::with_seed(4))
        .unwrap();
    assert!(!best.moves.is_empty());
    assert!(best.moves.iter().all(|mv| moves.contains(mv)));
    assert!((0.0..=1.0).contains(&best.value));
}

// =============================================================================
// Self-play tests
// =============================================================================

fn montecarlo_agent(total_simulations: usize) -> Agent {
    Agent::MonteCarlo(MonteCarloConfig {
        total_simulations,
        ..MonteCarloConfig::default()
    })
}

#[test]
fn test_selfplay_montecarlo_beats_dummy() {
    let agents = [montecarlo_agent(200), Agent::Dummy];
    let mut rng = Rng::with_seed(7);
    for _ in 0..3 {
        let mut state = GameState::new(standard());
        let (outcome, history) = play_game(&mut state, &agents, 1000, &mut rng).unwrap();
        assert_eq!(outcome, GameOutcome::Won(0));
        assert_eq!(state.winner(), Some(0));

        let mut replayed = GameState::new(standard());
        for &mv in &history {
            replayed.apply_move(mv);
        }
        assert_eq!(replayed, state);
    }
}

#[test]
fn test_selfplay_montecarlo_beats_two_dummies() {
    let geo = Arc::new(BoardGeometry::standard(3).unwrap());
    let agents = [Agent::Dummy, montecarlo_agent(300), Agent::Dummy];
    let mut rng = Rng::with_seed(21);
    let mut wins = [0; 3];
    for _ in 0..3 {
        let mut state = GameState::with_counts(geo.clone(), 15, 1);
        let (outcome, _) = play_game(&mut state, &agents, 1000, &mut rng).unwrap();
        if let GameOutcome::Won(p) = outcome {
            wins[p as usize] += 1;
        }
    }
    assert!(wins[1] >= 2, "wins: {wins:?}");
}

#[test]
fn test_selfplay_triangle_board_is_decided() {
    let agents = [
        Agent::Negamax(NegamaxConfig { depth: 3 }),
        montecarlo_agent(500),
    ];
    let mut state = GameState::with_counts(triangle(2), 20, 1);
    let (outcome, _) = play_game(&mut state, &agents, 1000, &mut Rng::with_seed(3)).unwrap();
    assert!(matches!(outcome, GameOutcome::Won(_)), "{outcome:?}");
}

#[test]
fn test_selfplay_negamax_needs_two_players() {
    let agents = [
        Agent::Negamax(NegamaxConfig { depth: 2 }),
        Agent::Dummy,
        Agent::Dummy,
    ];
    let mut state = GameState::new(Arc::new(BoardGeometry::standard(3).unwrap()));
    assert!(play_game(&mut state, &agents, 100, &mut Rng::with_seed(0)).is_err());
}
