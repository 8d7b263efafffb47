//! matchfall - a deterministic match-3 board-simulation engine
//!
//! The engine owns the full board lifecycle: fill, swap validation, match
//! clearing, bomb spawning and chaining, gravity collapse, refill, cascade
//! rescans, and deadlock recovery by reshuffling. Everything is seeded and
//! tick-driven, so a given level and seed replay identically.
//!
//! There is no rendering here. Hosts drive [`CascadeEngine::tick`] from
//! their own scheduler, feed player input through
//! [`CascadeEngine::try_swap`], and observe the board through registered
//! [`BoardListener`]s or [`CascadeEngine::snapshot`].
//!
//! ```
//! use matchfall::{CascadeEngine, LevelBoard, TICK_MS};
//!
//! let mut engine = CascadeEngine::new(LevelBoard::basic(1, 8, 8, 30), 42);
//! engine.setup();
//! while engine.is_busy() {
//!     engine.tick(TICK_MS);
//! }
//! assert!(engine.input_enabled());
//! ```

pub mod core;
pub mod events;
pub mod level;
pub mod types;

pub use crate::core::cascade::CascadeEngine;
pub use crate::core::factory::{PieceFactory, PieceSpec, StandardFactory};
pub use crate::core::grid::{BoardSnapshot, Grid, SlideMove, Tile};
pub use crate::core::piece::{Collectible, Piece};
pub use crate::core::rng::SimpleRng;
pub use crate::core::scoring::{LevelGoal, ScoreBoard};
pub use crate::events::{BoardListener, InputGate, SharedGate, SharedListener};
pub use crate::level::{
    load_with_fallback, LevelBoard, LevelError, LevelProvider, PieceSpawn, StaticLevels, TileSpawn,
};
pub use crate::types::{
    BombKind, Coord, GoalCurrency, MatchValue, SwapDirection, TileType, TICK_MS,
};
