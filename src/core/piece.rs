//! Piece module - the movable contents of the board
//!
//! A piece couples its logical cell coordinate with a visual position that
//! interpolates toward that cell over a time-bounded move. The cascade
//! controller commits grid mutations eagerly and then polls visual positions
//! to decide when a collapse has finished.

use log::warn;

use crate::types::{BombKind, Coord, MatchValue, SETTLE_EPSILON};

/// Collectible behavior flags.
///
/// A collectible has `MatchValue::None` and never joins a run; it leaves the
/// board by reaching the bottom row (`cleared_at_bottom`) or, if flagged, by
/// being caught in a bomb blast (`cleared_by_bomb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collectible {
    pub cleared_by_bomb: bool,
    pub cleared_at_bottom: bool,
}

impl Default for Collectible {
    fn default() -> Self {
        Self {
            cleared_by_bomb: false,
            cleared_at_bottom: true,
        }
    }
}

/// An in-flight interpolated move
#[derive(Debug, Clone, Copy, PartialEq)]
struct MoveState {
    from: (f32, f32),
    to: (f32, f32),
    elapsed_ms: u32,
    duration_ms: u32,
}

/// A single board piece
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    /// Stable id, unique for the lifetime of the engine (exported in move requests)
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub value: MatchValue,
    pub bomb: Option<BombKind>,
    pub collectible: Option<Collectible>,
    /// Visual position in grid units; hosts may overwrite this directly
    pub pos: (f32, f32),
    moving: Option<MoveState>,
}

impl Piece {
    /// Create an ordinary piece resting at (x, y)
    pub fn new(id: u32, x: i32, y: i32, value: MatchValue) -> Self {
        Self {
            id,
            x,
            y,
            value,
            bomb: None,
            collectible: None,
            pos: (x as f32, y as f32),
            moving: None,
        }
    }

    /// Create a bomb piece resting at (x, y)
    pub fn new_bomb(id: u32, x: i32, y: i32, value: MatchValue, kind: BombKind) -> Self {
        let mut piece = Self::new(id, x, y, value);
        piece.bomb = Some(kind);
        piece
    }

    /// Create a collectible resting at (x, y); its match value is always `None`
    pub fn new_collectible(id: u32, x: i32, y: i32, flags: Collectible) -> Self {
        let mut piece = Self::new(id, x, y, MatchValue::None);
        piece.collectible = Some(flags);
        piece
    }

    /// Update the stored cell coordinate (grid placement keeps this in sync)
    pub fn set_coord(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn coord(&self) -> Coord {
        (self.x, self.y)
    }

    /// Whether a move is currently in flight
    pub fn is_moving(&self) -> bool {
        self.moving.is_some()
    }

    /// Start a time-bounded move of the visual position toward (x, y).
    ///
    /// A piece that is already moving rejects the request; overlapping move
    /// requests are a caller bug, not a race to resolve.
    pub fn begin_move(&mut self, x: i32, y: i32, duration_ms: u32) -> bool {
        if self.moving.is_some() {
            warn!("piece {}: cannot start move, already moving", self.id);
            return false;
        }
        if duration_ms == 0 {
            self.pos = (x as f32, y as f32);
            return true;
        }
        self.moving = Some(MoveState {
            from: self.pos,
            to: (x as f32, y as f32),
            elapsed_ms: 0,
            duration_ms,
        });
        true
    }

    /// Place the visual position somewhere off-grid (used for refill drop-in)
    pub fn set_visual(&mut self, x: f32, y: f32) {
        self.pos = (x, y);
    }

    /// Advance the in-flight move, if any
    pub fn advance(&mut self, elapsed_ms: u32) {
        let Some(mut state) = self.moving else {
            return;
        };

        state.elapsed_ms = state.elapsed_ms.saturating_add(elapsed_ms);
        let t = (state.elapsed_ms as f32 / state.duration_ms as f32).clamp(0.0, 1.0);
        let eased = smoother_step(t);

        self.pos = (
            state.from.0 + (state.to.0 - state.from.0) * eased,
            state.from.1 + (state.to.1 - state.from.1) * eased,
        );

        if state.elapsed_ms >= state.duration_ms {
            self.pos = state.to;
            self.moving = None;
        } else {
            self.moving = Some(state);
        }
    }

    /// Whether the visual position has arrived at the logical cell
    pub fn is_settled(&self) -> bool {
        let dx = self.pos.0 - self.x as f32;
        let dy = self.pos.1 - self.y as f32;
        (dx * dx + dy * dy).sqrt() <= SETTLE_EPSILON
    }
}

fn smoother_step(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}
