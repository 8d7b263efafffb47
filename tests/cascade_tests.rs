//! Cascade tests - end-to-end rounds through the public engine API

use std::cell::RefCell;
use std::rc::Rc;

use matchfall::{
    BoardListener, BombKind, CascadeEngine, Collectible, LevelBoard, LevelGoal, MatchValue,
    PieceFactory, PieceSpec, ScoreBoard, SimpleRng, StandardFactory, TICK_MS,
};
use MatchValue::*;

/// Event counter used to observe a round from the outside
#[derive(Default)]
struct Recorder {
    cleared: u32,
    bombs_cleared: u32,
    collectibles: u32,
    moves_made: u32,
    tiles_broken: u32,
}

impl BoardListener for Recorder {
    fn piece_cleared(&mut self, _x: i32, _y: i32, was_bomb: bool) {
        self.cleared += 1;
        if was_bomb {
            self.bombs_cleared += 1;
        }
    }

    fn collectible_collected(&mut self, _x: i32, _y: i32) {
        self.collectibles += 1;
    }

    fn tile_broken(&mut self, _remaining: u8, _x: i32, _y: i32) {
        self.tiles_broken += 1;
    }

    fn user_moved(&mut self) {
        self.moves_made += 1;
    }
}

/// Factory dealing a fixed value sequence, for exact board layouts
struct ScriptedFactory {
    values: Vec<MatchValue>,
    next: usize,
}

impl PieceFactory for ScriptedFactory {
    fn next_spec(&mut self, _rng: &mut SimpleRng, _allow_collectible: bool) -> PieceSpec {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        PieceSpec::Value(value)
    }

    fn collectible_cleared(&mut self) {}
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(width: i32, height: i32) -> CascadeEngine {
    init_logs();
    let level = LevelBoard::basic(1, width, height, 30);
    CascadeEngine::new(level, 42)
        .with_factory(Box::new(StandardFactory::with_collectibles(0.0, 0)))
}

fn run_until_idle(engine: &mut CascadeEngine) {
    for _ in 0..10_000 {
        if !engine.is_busy() {
            return;
        }
        engine.tick(TICK_MS);
    }
    panic!("engine never settled");
}

fn assert_stable_and_full(engine: &CascadeEngine) {
    assert!(engine.input_enabled());
    for (x, y) in engine.grid().coords().collect::<Vec<_>>() {
        assert!(engine.piece_at(x, y).is_some(), "hole at ({x}, {y})");
    }
    assert!(matchfall::core::matches::all_matches(engine.grid()).is_empty());
}

#[test]
fn test_three_run_clears_and_refills() {
    // 6x6 board; swapping (2, 1) down completes a red run on the bottom row
    let mut engine = engine(6, 6);
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Red);
    engine.place_piece(2, 0, Blue);
    engine.place_piece(2, 1, Red);
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());
    let score = Rc::new(RefCell::new(ScoreBoard::new()));
    engine.add_listener(score.clone());

    assert!(engine.try_swap((2, 1), (2, 0)));
    run_until_idle(&mut engine);

    assert_stable_and_full(&engine);
    let rec = recorder.borrow();
    assert_eq!(rec.moves_made, 1);
    assert_eq!(rec.cleared, 3);
    assert_eq!(rec.bombs_cleared, 0);
    // Three pieces at base value, multiplier 1, no group bonus under four
    assert_eq!(score.borrow().score(), 60);
}

#[test]
fn test_failed_swap_consumes_nothing() {
    let mut engine = engine(4, 4);
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Blue);
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());

    assert!(engine.try_swap((0, 0), (1, 0)));
    run_until_idle(&mut engine);

    assert_eq!(engine.piece_at(0, 0).map(|p| p.value), Some(Red));
    assert_eq!(engine.piece_at(1, 0).map(|p| p.value), Some(Blue));
    assert!(engine.input_enabled());
    assert_eq!(recorder.borrow().moves_made, 0);
    assert_eq!(recorder.borrow().cleared, 0);
}

#[test]
fn test_horizontal_swipe_on_four_run_spawns_row_bomb() {
    // Column 1 holds three reds; the horizontal swap drops a fourth in at
    // the bottom, so the swipe axis picks a Row bomb at the landing cell
    let mut engine = engine(4, 4);
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Blue);
    engine.place_piece(1, 1, Red);
    engine.place_piece(1, 2, Red);
    engine.place_piece(1, 3, Red);
    engine.set_input_enabled(true);

    assert!(engine.try_swap((0, 0), (1, 0)));
    run_until_idle(&mut engine);

    let bomb = engine.piece_at(1, 0).expect("bomb at the landing cell");
    assert_eq!(bomb.bomb, Some(BombKind::Row));
    assert_eq!(bomb.value, Red);
    assert_stable_and_full(&engine);
}

#[test]
fn test_five_run_spawns_color_bomb_with_wild_value() {
    let mut engine = engine(6, 6);
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Blue);
    for y in 1..5 {
        engine.place_piece(1, y, Red);
    }
    engine.set_input_enabled(true);

    assert!(engine.try_swap((0, 0), (1, 0)));
    run_until_idle(&mut engine);

    let bomb = engine.piece_at(1, 0).expect("bomb at the landing cell");
    assert_eq!(bomb.bomb, Some(BombKind::Color));
    assert_eq!(bomb.value, Wild);
}

#[test]
fn test_corner_match_spawns_adjacent_bomb() {
    // Horizontal arm (1..3, 1) and vertical arm (1, 1..3) meet at (1, 1);
    // the swap brings the corner piece in from outside both arms
    let mut engine = engine(4, 4);
    engine.place_piece(0, 0, Teal);
    engine.place_piece(1, 0, Cyan);
    engine.place_piece(2, 0, Magenta);
    engine.place_piece(3, 0, Indigo);
    engine.place_piece(0, 1, Red);
    engine.place_piece(1, 1, Blue);
    engine.place_piece(2, 1, Red);
    engine.place_piece(3, 1, Red);
    engine.place_piece(1, 2, Red);
    engine.place_piece(1, 3, Red);
    engine.set_input_enabled(true);

    assert!(engine.try_swap((0, 1), (1, 1)));
    run_until_idle(&mut engine);

    let bomb = engine.piece_at(1, 1).expect("bomb at the corner");
    assert_eq!(bomb.bomb, Some(BombKind::Adjacent));
    assert_eq!(bomb.value, Red);
}

#[test]
fn test_color_bomb_swap_clears_value_board_wide() {
    let mut engine = engine(4, 4);
    engine.place_bomb(0, 0, Wild, BombKind::Color);
    engine.place_piece(1, 0, Red);
    engine.place_piece(3, 0, Red);
    engine.place_piece(2, 0, Blue);
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());

    assert!(engine.try_swap((0, 0), (1, 0)));
    run_until_idle(&mut engine);

    // The recolored bomb and both reds go; the blue survives
    let rec = recorder.borrow();
    assert_eq!(rec.cleared, 3);
    assert_eq!(rec.bombs_cleared, 1);
    assert_eq!(rec.moves_made, 1);
}

#[test]
fn test_two_color_bombs_clear_the_board() {
    let mut engine = engine(4, 4);
    engine.place_bomb(0, 0, Wild, BombKind::Color);
    engine.place_bomb(1, 0, Wild, BombKind::Color);
    engine.place_piece(2, 0, Red);
    engine.place_piece(3, 0, Blue);
    engine.place_piece(2, 1, Green);
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());

    assert!(engine.try_swap((0, 0), (1, 0)));
    run_until_idle(&mut engine);

    let rec = recorder.borrow();
    assert_eq!(rec.cleared, 5);
    assert_eq!(rec.bombs_cleared, 2);
}

#[test]
fn test_collectible_collects_at_the_bottom() {
    // The match clears the bottom row under the collectible; it slides down
    // and the next clearing step collects it
    let mut engine = engine(4, 4);
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Red);
    engine.place_piece(2, 0, Blue);
    engine.place_piece(2, 1, Red);
    engine.place_collectible(1, 1, Collectible::default());
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());

    assert!(engine.try_swap((2, 1), (2, 0)));
    run_until_idle(&mut engine);

    assert_eq!(recorder.borrow().collectibles, 1);
    for (x, y) in engine.grid().coords().collect::<Vec<_>>() {
        assert!(engine
            .piece_at(x, y)
            .map_or(true, |p| p.collectible.is_none()));
    }
}

#[test]
fn test_breakable_tile_wears_down_under_a_clear() {
    let mut level = LevelBoard::basic(1, 4, 4, 30);
    level.tiles.push(matchfall::TileSpawn {
        x: 0,
        y: 0,
        kind: matchfall::TileType::Breakable,
    });
    init_logs();
    let mut engine = CascadeEngine::new(level, 42)
        .with_factory(Box::new(StandardFactory::with_collectibles(0.0, 0)));
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Red);
    engine.place_piece(2, 0, Blue);
    engine.place_piece(2, 1, Red);
    engine.set_input_enabled(true);

    let recorder = Rc::new(RefCell::new(Recorder::default()));
    engine.add_listener(recorder.clone());

    assert!(engine.try_swap((2, 1), (2, 0)));
    run_until_idle(&mut engine);

    assert_eq!(recorder.borrow().tiles_broken, 1);
    assert_eq!(
        engine.tile_at(0, 0).map(|t| t.kind),
        Some(matchfall::TileType::Normal)
    );
}

#[test]
fn test_setup_pins_starting_pieces() {
    let mut level = LevelBoard::basic(1, 8, 8, 30);
    level.starting_pieces.push(matchfall::PieceSpawn {
        x: 0,
        y: 0,
        value: Teal,
    });
    level.starting_pieces.push(matchfall::PieceSpawn {
        x: 7,
        y: 7,
        value: Magenta,
    });
    init_logs();
    let mut engine = CascadeEngine::new(level, 42)
        .with_factory(Box::new(StandardFactory::with_collectibles(0.0, 0)));
    engine.setup();

    // Pinned before the random fill, which leaves occupied slots alone
    assert_eq!(engine.piece_at(0, 0).map(|p| p.value), Some(Teal));
    assert_eq!(engine.piece_at(7, 7).map(|p| p.value), Some(Magenta));

    run_until_idle(&mut engine);
    assert_stable_and_full(&engine);
}

#[test]
fn test_deadlocked_fill_reshuffles_and_resumes() {
    // Diagonal three-color striping: every window of three is all-distinct,
    // so the freshly filled board has no legal move and stabilization must
    // reshuffle it before handing input back
    let script = vec![
        Red, Blue, Green, Red, // y = 0
        Green, Red, Blue, Green, // y = 1
        Blue, Green, Red, Blue, // y = 2
        Red, Blue, Green, Red, // y = 3
    ];
    init_logs();
    let mut engine = CascadeEngine::new(LevelBoard::basic(1, 4, 4, 30), 42).with_factory(
        Box::new(ScriptedFactory {
            values: script,
            next: 0,
        }),
    );
    engine.setup();
    let initial = engine.snapshot();

    run_until_idle(&mut engine);
    let after = engine.snapshot();

    // The shuffle ran and moved pieces
    assert_ne!(after, initial);

    // Multiset preserved across the reshuffle
    let counts = |cells: &[Option<MatchValue>]| {
        let mut vals: Vec<MatchValue> = cells.iter().flatten().copied().collect();
        vals.sort_by_key(|v| v.as_str());
        vals
    };
    assert_eq!(counts(&after.cells), counts(&initial.cells));

    assert_stable_and_full(&engine);
}

#[test]
fn test_goal_gate_stops_play_when_moves_run_out() {
    let mut level = LevelBoard::basic(1, 6, 6, 1);
    level.score_goals = vec![10_000, 20_000, 30_000];
    init_logs();
    let mut engine = CascadeEngine::new(level.clone(), 42)
        .with_factory(Box::new(StandardFactory::with_collectibles(0.0, 0)));
    engine.place_piece(0, 0, Red);
    engine.place_piece(1, 0, Red);
    engine.place_piece(2, 0, Blue);
    engine.place_piece(2, 1, Red);
    engine.set_input_enabled(true);

    let goal = Rc::new(RefCell::new(LevelGoal::new(&level)));
    engine.add_listener(goal.clone());
    engine.set_input_gate(goal.clone());

    assert!(engine.try_swap((2, 1), (2, 0)));
    run_until_idle(&mut engine);

    // The only move is spent; the gate keeps input off
    assert_eq!(goal.borrow().remaining(), 0);
    assert!(!engine.input_enabled());
    assert!(!engine.try_swap((0, 0), (1, 0)));
}
