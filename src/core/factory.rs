//! Piece factory - the injection seam for spawn decisions
//!
//! The cascade engine asks the factory what each spawned piece should be;
//! the factory never touches the grid. The standard implementation rolls a
//! uniform palette value and, for top-row spawns, occasionally a collectible
//! under a concurrency cap.

use log::debug;

use crate::core::piece::Collectible;
use crate::core::rng::SimpleRng;
use crate::types::{MatchValue, COLLECTIBLE_CHANCE, MAX_COLLECTIBLES};

/// What the next spawned piece should be
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PieceSpec {
    Value(MatchValue),
    Collectible(Collectible),
}

/// Spawn-decision trait, injected into the engine at construction
pub trait PieceFactory {
    /// Decide the next spawned piece. `allow_collectible` is true only for
    /// pieces entering at the top row during refill.
    fn next_spec(&mut self, rng: &mut SimpleRng, allow_collectible: bool) -> PieceSpec;

    /// A collectible left the board (reached the bottom or was bombed)
    fn collectible_cleared(&mut self);
}

/// Default factory: uniform palette values, 10 % collectible rolls capped
/// at three concurrent
pub struct StandardFactory {
    collectible_chance: f32,
    max_collectibles: u32,
    active_collectibles: u32,
}

impl StandardFactory {
    pub fn new() -> Self {
        Self {
            collectible_chance: COLLECTIBLE_CHANCE,
            max_collectibles: MAX_COLLECTIBLES,
            active_collectibles: 0,
        }
    }

    pub fn with_collectibles(chance: f32, cap: u32) -> Self {
        Self {
            collectible_chance: chance,
            max_collectibles: cap,
            active_collectibles: 0,
        }
    }

    pub fn active_collectibles(&self) -> u32 {
        self.active_collectibles
    }
}

impl Default for StandardFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceFactory for StandardFactory {
    fn next_spec(&mut self, rng: &mut SimpleRng, allow_collectible: bool) -> PieceSpec {
        if allow_collectible
            && self.active_collectibles < self.max_collectibles
            && rng.next_f32() < self.collectible_chance
        {
            self.active_collectibles += 1;
            debug!(
                "spawning collectible ({} of {} active)",
                self.active_collectibles, self.max_collectibles
            );
            return PieceSpec::Collectible(Collectible::default());
        }

        let palette = MatchValue::PALETTE;
        PieceSpec::Value(palette[rng.next_range(palette.len() as u32) as usize])
    }

    fn collectible_cleared(&mut self) {
        self.active_collectibles = self.active_collectibles.saturating_sub(1);
    }
}
