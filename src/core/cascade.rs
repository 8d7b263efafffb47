//! Cascade controller - the tick-driven heart of the engine
//!
//! `CascadeEngine` owns the grid, the RNG, and the phase state machine that
//! sequences a round of play: swap, clear, collapse, refill, rescan, and the
//! deadlock check once the board stabilizes. `tick(elapsed_ms)` advances both
//! piece motion and the phase timers; hosts call it once per frame or per
//! scheduler step.
//!
//! Input gating is the single mutual-exclusion mechanism: the input-enabled
//! flag drops the moment a swap is accepted and returns only after the board
//! has stabilized and the installed gate agrees play may continue.

use arrayvec::ArrayVec;
use log::{debug, warn};

use crate::core::bombs::{self, StagedBomb};
use crate::core::deadlock;
use crate::core::factory::{PieceFactory, PieceSpec, StandardFactory};
use crate::core::grid::{BoardSnapshot, Grid, Tile};
use crate::core::matches;
use crate::core::piece::{Collectible, Piece};
use crate::core::rng::SimpleRng;
use crate::core::shuffle;
use crate::events::{BoardListener, SharedGate, SharedListener};
use crate::level::LevelBoard;
use crate::types::{
    BombKind, Coord, MatchValue, SwapDirection, CASCADE_RETRY_LIMIT, CLEAR_PAUSE_MS,
    COLLAPSE_STEP_MS, FILL_FALL_MS, FILL_RETRY_LIMIT, FILL_Y_OFFSET, SETTLE_MS, SETUP_DELAY_MS,
    SWAP_MS,
};

/// Where the state machine currently is within a round
#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    /// Initial fill dropping in
    Setup { wait_ms: u32 },
    /// Swapped pieces travelling toward each other's cells
    Swapping {
        a: Coord,
        b: Coord,
        direction: SwapDirection,
        wait_ms: u32,
    },
    /// Failed swap travelling back
    Reverting { wait_ms: u32 },
    /// Clear pass done, pausing before the columns collapse
    Clearing {
        cleared: Vec<Coord>,
        tries: u32,
        wait_ms: u32,
    },
    /// Columns collapsing, polled until every piece settles
    Collapsing { moved: Vec<Coord>, tries: u32 },
    /// Settled after a collapse, pausing before the rescan
    PostCollapse {
        moved: Vec<Coord>,
        tries: u32,
        wait_ms: u32,
    },
    /// Refill pieces dropping in, polled until settled
    Refilling { tries: u32 },
    /// Board quiet, waiting out the settle delay before the deadlock check
    Stabilizing { wait_ms: u32 },
    /// Shuffled pieces travelling to their new cells; resumes with a fresh
    /// match scan and deadlock re-check once they settle
    Shuffling,
}

/// The board simulation engine
pub struct CascadeEngine {
    grid: Grid,
    rng: SimpleRng,
    factory: Box<dyn PieceFactory>,
    listeners: Vec<SharedListener>,
    gate: Option<SharedGate>,
    level: LevelBoard,
    phase: Phase,
    input_enabled: bool,
    refilling: bool,
    staged_bombs: ArrayVec<StagedBomb, 2>,
    shuffles: u32,
    next_id: u32,
}

impl CascadeEngine {
    /// Build an engine for the given level. Tile overrides are applied
    /// immediately; pieces arrive when `setup` runs.
    pub fn new(level: LevelBoard, seed: u32) -> Self {
        let mut grid = Grid::new(level.width, level.height);
        for t in &level.tiles {
            grid.set_tile(t.x, t.y, t.kind);
        }
        Self {
            grid,
            rng: SimpleRng::new(seed),
            factory: Box::new(StandardFactory::new()),
            listeners: Vec::new(),
            gate: None,
            level,
            phase: Phase::Idle,
            input_enabled: false,
            refilling: false,
            staged_bombs: ArrayVec::new(),
            shuffles: 0,
            next_id: 0,
        }
    }

    /// Swap in a custom spawn factory
    pub fn with_factory(mut self, factory: Box<dyn PieceFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn add_listener(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    pub fn set_input_gate(&mut self, gate: SharedGate) {
        self.gate = Some(gate);
    }

    // --- queries ---

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece_at(&self, x: i32, y: i32) -> Option<&Piece> {
        self.grid.piece_at(x, y)
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<Tile> {
        self.grid.tile_at(x, y)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.grid.snapshot()
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Whether a round is still in flight
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Host-side override of the input flag (pausing, countdowns)
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    // --- board construction ---

    /// Place a plain piece, already settled. Public so hosts and tests can
    /// stage exact board states.
    pub fn place_piece(&mut self, x: i32, y: i32, value: MatchValue) -> bool {
        let id = self.alloc_id();
        self.grid.place(Piece::new(id, x, y, value), x, y)
    }

    pub fn place_bomb(&mut self, x: i32, y: i32, value: MatchValue, kind: BombKind) -> bool {
        let id = self.alloc_id();
        self.grid.place(Piece::new_bomb(id, x, y, value, kind), x, y)
    }

    pub fn place_collectible(&mut self, x: i32, y: i32, flags: Collectible) -> bool {
        let id = self.alloc_id();
        self.grid.place(Piece::new_collectible(id, x, y, flags), x, y)
    }

    /// Pin the level's starting pieces and drop in the initial fill.
    /// Input stays disabled until the board settles and passes the
    /// deadlock check.
    pub fn setup(&mut self) {
        let starting = self.level.starting_pieces.clone();
        for p in starting {
            let id = self.alloc_id();
            self.grid.place(Piece::new(id, p.x, p.y, p.value), p.x, p.y);
        }
        self.fill_board();
        self.input_enabled = false;
        self.phase = Phase::Setup {
            wait_ms: SETUP_DELAY_MS,
        };
        debug!(
            "setup: level {} ({}x{})",
            self.level.number, self.level.width, self.level.height
        );
    }

    // --- input ---

    /// Attempt to swap the pieces at two orthogonally adjacent cells.
    /// Rejected (returning false, logged) while input is disabled, for
    /// non-adjacent cells, for empty cells, or while either piece is still
    /// moving. An accepted swap disables input until the round finishes.
    pub fn try_swap(&mut self, a: Coord, b: Coord) -> bool {
        if !self.input_enabled {
            debug!("swap {a:?}<->{b:?} ignored, input disabled");
            return false;
        }
        if (a.0 - b.0).abs() + (a.1 - b.1).abs() != 1 {
            warn!("swap {a:?}<->{b:?} ignored, cells not adjacent");
            return false;
        }
        if !self.grid.is_available(a.0, a.1, true) || !self.grid.is_available(b.0, b.1, true) {
            warn!("swap {a:?}<->{b:?} ignored, empty or blocked cell");
            return false;
        }
        let moving = |c: &Coord| {
            self.grid
                .piece_at(c.0, c.1)
                .is_some_and(|p| p.is_moving())
        };
        if moving(&a) || moving(&b) {
            debug!("swap {a:?}<->{b:?} ignored, piece in motion");
            return false;
        }

        let direction = if a.1 == b.1 {
            SwapDirection::Horizontal
        } else {
            SwapDirection::Vertical
        };

        self.swap_slots(a, b);
        self.input_enabled = false;
        self.phase = Phase::Swapping {
            a,
            b,
            direction,
            wait_ms: SWAP_MS,
        };
        true
    }

    // --- tick ---

    /// Advance piece motion and the phase state machine
    pub fn tick(&mut self, elapsed_ms: u32) {
        self.grid.advance_motion(elapsed_ms);

        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        self.phase = match phase {
            Phase::Idle => Phase::Idle,

            Phase::Setup { wait_ms } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::Setup { wait_ms: left }
                } else if !self.grid.all_settled() {
                    Phase::Setup { wait_ms: 0 }
                } else {
                    Phase::Stabilizing { wait_ms: 0 }
                }
            }

            Phase::Swapping {
                a,
                b,
                direction,
                wait_ms,
            } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::Swapping {
                        a,
                        b,
                        direction,
                        wait_ms: left,
                    }
                } else {
                    self.resolve_swap(a, b, direction)
                }
            }

            Phase::Reverting { wait_ms } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::Reverting { wait_ms: left }
                } else {
                    // No move was consumed, so no gate consultation here
                    self.input_enabled = true;
                    Phase::Idle
                }
            }

            Phase::Clearing {
                cleared,
                tries,
                wait_ms,
            } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::Clearing {
                        cleared,
                        tries,
                        wait_ms: left,
                    }
                } else {
                    let moved = self.collapse(&cleared);
                    Phase::Collapsing { moved, tries }
                }
            }

            Phase::Collapsing { moved, tries } => {
                if self.grid.all_settled() {
                    Phase::PostCollapse {
                        moved,
                        tries,
                        wait_ms: CLEAR_PAUSE_MS,
                    }
                } else {
                    Phase::Collapsing { moved, tries }
                }
            }

            Phase::PostCollapse {
                moved,
                tries,
                wait_ms,
            } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::PostCollapse {
                        moved,
                        tries,
                        wait_ms: left,
                    }
                } else {
                    let rescan = matches::matches_at_coords(&self.grid, &moved);
                    self.continue_or_refill(rescan, tries)
                }
            }

            Phase::Refilling { tries } => {
                if !self.grid.all_settled() {
                    Phase::Refilling { tries }
                } else if tries >= CASCADE_RETRY_LIMIT {
                    Phase::Stabilizing {
                        wait_ms: SETTLE_MS,
                    }
                } else {
                    let rescan = matches::all_matches(&self.grid);
                    if rescan.is_empty() && self.bottom_collectibles().is_empty() {
                        Phase::Stabilizing {
                            wait_ms: SETTLE_MS,
                        }
                    } else {
                        self.continue_clearing(rescan, tries)
                    }
                }
            }

            Phase::Stabilizing { wait_ms } => {
                if let Some(left) = tick_down(wait_ms, elapsed_ms) {
                    Phase::Stabilizing { wait_ms: left }
                } else if !deadlock::is_deadlocked(&self.grid) {
                    self.finish_round()
                } else if self.shuffles >= CASCADE_RETRY_LIMIT {
                    warn!("still deadlocked after {} shuffles, giving up", self.shuffles);
                    self.finish_round()
                } else {
                    self.shuffles += 1;
                    shuffle::shuffle_board(&mut self.grid, &mut self.rng);
                    Phase::Shuffling
                }
            }

            Phase::Shuffling => {
                if self.grid.all_settled() {
                    // A shuffle may leave a standing match (reroll
                    // exhaustion) or another dead board, so the round
                    // resumes from a fresh scan, not from Idle
                    Phase::Refilling { tries: 0 }
                } else {
                    Phase::Shuffling
                }
            }
        };
    }

    // --- internals ---

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn notify<F: FnMut(&mut dyn BoardListener)>(&self, mut f: F) {
        for listener in &self.listeners {
            f(&mut *listener.borrow_mut());
        }
    }

    fn gate_allows(&self) -> bool {
        self.gate.as_ref().map_or(true, |g| g.borrow().can_play())
    }

    /// Exchange two occupied slots and animate both pieces across
    fn swap_slots(&mut self, a: Coord, b: Coord) {
        let pa = self.grid.take_piece(a.0, a.1);
        let pb = self.grid.take_piece(b.0, b.1);
        if let Some(p) = pa {
            self.grid.place(p, b.0, b.1);
        }
        if let Some(p) = pb {
            self.grid.place(p, a.0, a.1);
        }
        for &(x, y) in &[a, b] {
            let started = self
                .grid
                .piece_at_mut(x, y)
                .map(|p| (p.id, p.begin_move(x, y, SWAP_MS)));
            if let Some((id, true)) = started {
                self.notify(|l| l.move_requested(id, x, y, SWAP_MS));
            }
        }
    }

    /// The swap animation finished; decide between clearing and reverting.
    /// The clicked piece now sits at `b`, the target piece at `a`.
    fn resolve_swap(&mut self, a: Coord, b: Coord, direction: SwapDirection) -> Phase {
        let clicked_bomb = self.grid.piece_at(b.0, b.1).and_then(|p| p.bomb);
        let target_bomb = self.grid.piece_at(a.0, a.1).and_then(|p| p.bomb);
        let clicked_value = self.grid.value_at(b.0, b.1);
        let target_value = self.grid.value_at(a.0, a.1);

        let mut color_coords: Vec<Coord> = Vec::new();
        match (clicked_bomb, target_bomb) {
            (Some(BombKind::Color), Some(BombKind::Color)) => {
                // Two color bombs wipe the board
                color_coords = self
                    .grid
                    .coords()
                    .filter(|&(x, y)| {
                        self.grid.piece_at(x, y).is_some_and(|p| {
                            p.collectible.map_or(true, |c| c.cleared_by_bomb)
                        })
                    })
                    .collect();
            }
            (Some(BombKind::Color), _) => {
                if let Some(v) = target_value.filter(|v| v.is_matchable()) {
                    if let Some(p) = self.grid.piece_at_mut(b.0, b.1) {
                        p.value = v;
                    }
                    color_coords = matches::matches_by_value(&self.grid, v);
                }
            }
            (_, Some(BombKind::Color)) => {
                if let Some(v) = clicked_value.filter(|v| v.is_matchable()) {
                    if let Some(p) = self.grid.piece_at_mut(a.0, a.1) {
                        p.value = v;
                    }
                    color_coords = matches::matches_by_value(&self.grid, v);
                }
            }
            _ => {}
        }

        let clicked_matches = matches::matches_at(&self.grid, b.0, b.1).unwrap_or_default();
        let target_matches = matches::matches_at(&self.grid, a.0, a.1).unwrap_or_default();

        if clicked_matches.is_empty() && target_matches.is_empty() && color_coords.is_empty() {
            debug!("swap {a:?}<->{b:?} made no match, reverting");
            self.swap_slots(a, b);
            return Phase::Reverting { wait_ms: SWAP_MS };
        }

        self.notify(|l| l.user_moved());
        self.notify(|l| l.bonus_chain_updated(false));

        // Bombs are earned only by the player's own swap, one per side
        self.stage_bomb(&clicked_matches, b, direction);
        self.stage_bomb(&target_matches, a, direction);

        let mut combined = clicked_matches;
        for c in target_matches.into_iter().chain(color_coords) {
            if !combined.contains(&c) {
                combined.push(c);
            }
        }
        self.start_clear(combined, 0)
    }

    fn stage_bomb(&mut self, group: &[Coord], at: Coord, direction: SwapDirection) {
        let Some(kind) = bombs::classify(group, direction) else {
            return;
        };
        let Some(value) = self.grid.value_at(at.0, at.1) else {
            return;
        };
        if self.staged_bombs.is_full() {
            return;
        }
        self.staged_bombs.push(StagedBomb {
            coord: at,
            kind,
            value: bombs::spawn_value(kind, value),
        });
    }

    /// One clearing step: expand by bombs, clear pieces, wear tiles, then
    /// enable the staged bombs into the holes left behind
    fn start_clear(&mut self, coords: Vec<Coord>, tries: u32) -> Phase {
        let mut set = coords;
        for c in self.bottom_collectibles() {
            if !set.contains(&c) {
                set.push(c);
            }
        }

        let group_size = set.len();
        self.notify(|l| l.group_cleared(group_size));

        let expanded = bombs::expand_with_bombs(&self.grid, &set);
        for &(x, y) in &expanded {
            let Some(piece) = self.grid.take_piece(x, y) else {
                continue;
            };
            if piece.collectible.is_some() {
                self.factory.collectible_cleared();
                self.notify(|l| l.collectible_collected(x, y));
            } else {
                let was_bomb = piece.bomb.is_some();
                self.notify(|l| l.piece_cleared(x, y, was_bomb));
            }
            if let Some(remaining) = self.grid.break_tile(x, y) {
                self.notify(|l| l.tile_broken(remaining, x, y));
            }
        }

        let staged: Vec<StagedBomb> = self.staged_bombs.drain(..).collect();
        for sb in staged {
            let (x, y) = sb.coord;
            if self.grid.is_available(x, y, false) {
                let id = self.alloc_id();
                self.grid
                    .place(Piece::new_bomb(id, x, y, sb.value, sb.kind), x, y);
            }
        }

        Phase::Clearing {
            cleared: expanded,
            tries,
            wait_ms: CLEAR_PAUSE_MS,
        }
    }

    /// Slide columns down over the holes and animate the slides
    fn collapse(&mut self, cleared: &[Coord]) -> Vec<Coord> {
        let moves = self.grid.collapse_columns(cleared);
        let mut moved = Vec::with_capacity(moves.len());
        for m in moves {
            let duration = (m.from_y - m.to_y).unsigned_abs() * COLLAPSE_STEP_MS;
            let started = self
                .grid
                .piece_at_mut(m.x, m.to_y)
                .is_some_and(|p| p.begin_move(m.x, m.to_y, duration));
            if started {
                self.notify(|l| l.move_requested(m.id, m.x, m.to_y, duration));
            }
            moved.push((m.x, m.to_y));
        }
        moved
    }

    /// After a collapse rescan: keep clearing if new matches formed,
    /// otherwise move on to the refill
    fn continue_or_refill(&mut self, rescan: Vec<Coord>, tries: u32) -> Phase {
        if rescan.is_empty() && self.bottom_collectibles().is_empty() {
            return self.begin_refill(tries);
        }
        self.continue_clearing(rescan, tries)
    }

    fn continue_clearing(&mut self, rescan: Vec<Coord>, tries: u32) -> Phase {
        if tries + 1 >= CASCADE_RETRY_LIMIT {
            warn!("cascade retry limit reached, refilling and stopping");
            // Passing the limit itself makes the refill terminal
            return self.begin_refill(CASCADE_RETRY_LIMIT);
        }
        self.notify(|l| l.bonus_chain_updated(true));
        self.start_clear(rescan, tries + 1)
    }

    fn begin_refill(&mut self, tries: u32) -> Phase {
        if !self.refilling {
            self.refilling = true;
            self.notify(|l| l.refill_state_changed(true));
        }
        self.fill_board();
        Phase::Refilling { tries }
    }

    /// Spawn pieces into every open slot, rerolling values that would
    /// complete a run. New pieces drop in from above the board.
    fn fill_board(&mut self) {
        let top = self.grid.height() - 1;
        for (x, y) in self.grid.open_slots() {
            let mut iterations = 0;
            loop {
                let spec = self.factory.next_spec(&mut self.rng, y == top);
                let id = self.alloc_id();
                let piece = match spec {
                    PieceSpec::Value(v) => Piece::new(id, x, y, v),
                    PieceSpec::Collectible(flags) => Piece::new_collectible(id, x, y, flags),
                };
                self.grid.place(piece, x, y);

                let matched = matches::has_match_on_fill(&self.grid, x, y);
                if matched && iterations < FILL_RETRY_LIMIT {
                    self.grid.take_piece(x, y);
                    iterations += 1;
                    continue;
                }
                if matched {
                    warn!("fill reroll limit reached at ({x}, {y}), placing anyway");
                }
                let started = self.grid.piece_at_mut(x, y).and_then(|piece| {
                    piece.set_visual(x as f32, (y + FILL_Y_OFFSET) as f32);
                    piece.begin_move(x, y, FILL_FALL_MS).then_some(piece.id)
                });
                if let Some(id) = started {
                    self.notify(|l| l.move_requested(id, x, y, FILL_FALL_MS));
                }
                break;
            }
        }
    }

    /// Collectibles sitting on the bottom row that collect there
    fn bottom_collectibles(&self) -> Vec<Coord> {
        (0..self.grid.width())
            .filter(|&x| {
                self.grid
                    .piece_at(x, 0)
                    .and_then(|p| p.collectible)
                    .is_some_and(|c| c.cleared_at_bottom)
            })
            .map(|x| (x, 0))
            .collect()
    }

    fn finish_round(&mut self) -> Phase {
        if self.refilling {
            self.refilling = false;
            self.notify(|l| l.refill_state_changed(false));
        }
        self.shuffles = 0;
        self.input_enabled = self.gate_allows();
        Phase::Idle
    }
}

/// Count a timer down; `Some(left)` while it still runs, `None` once done
fn tick_down(wait_ms: u32, elapsed_ms: u32) -> Option<u32> {
    let left = wait_ms.saturating_sub(elapsed_ms);
    (left > 0).then_some(left)
}
