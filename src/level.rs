//! Level descriptors and loading
//!
//! A level is plain data: board dimensions, tile overrides, pinned starting
//! pieces, and the score goals. The engine never does file I/O; hosts
//! implement `LevelProvider` over whatever storage they use, and the bounded
//! fallback loader walks down to an earlier level when a descriptor is
//! missing.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::types::{GoalCurrency, MatchValue, TileType};

/// How many earlier levels the fallback loader will try
pub const LEVEL_FALLBACK_LIMIT: u32 = 10;

/// A tile override at a coordinate (everything else defaults to Normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpawn {
    pub x: i32,
    pub y: i32,
    pub kind: TileType,
}

/// A piece pinned at a coordinate before the random fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSpawn {
    pub x: i32,
    pub y: i32,
    pub value: MatchValue,
}

/// Full description of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBoard {
    pub number: u32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub tiles: Vec<TileSpawn>,
    #[serde(default)]
    pub starting_pieces: Vec<PieceSpawn>,
    /// Ascending score thresholds; reaching the last one wins the level
    pub score_goals: Vec<u32>,
    #[serde(default)]
    pub currency: GoalCurrency,
    /// Moves or seconds, per `currency`
    pub budget: u32,
}

impl LevelBoard {
    /// A plain level: all-Normal tiles, no pinned pieces
    pub fn basic(number: u32, width: i32, height: i32, budget: u32) -> Self {
        Self {
            number,
            width,
            height,
            tiles: Vec::new(),
            starting_pieces: Vec::new(),
            score_goals: vec![1000, 2000, 3000],
            currency: GoalCurrency::Moves,
            budget,
        }
    }

    /// Check the descriptor is internally consistent
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(LevelError::InvalidDimensions {
                number: self.number,
                width: self.width,
                height: self.height,
            });
        }
        let oob = |x: i32, y: i32| x < 0 || x >= self.width || y < 0 || y >= self.height;
        for t in &self.tiles {
            if oob(t.x, t.y) {
                return Err(LevelError::SpawnOutOfBounds {
                    number: self.number,
                    x: t.x,
                    y: t.y,
                });
            }
        }
        for p in &self.starting_pieces {
            if oob(p.x, p.y) {
                return Err(LevelError::SpawnOutOfBounds {
                    number: self.number,
                    x: p.x,
                    y: p.y,
                });
            }
        }
        if self.score_goals.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LevelError::UnorderedGoals {
                number: self.number,
            });
        }
        Ok(())
    }
}

/// Errors surfaced when loading or validating levels
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("no level descriptor found at or below level {0}")]
    NotFound(u32),
    #[error("level {number}: invalid dimensions {width}x{height}")]
    InvalidDimensions { number: u32, width: i32, height: i32 },
    #[error("level {number}: spawn out of bounds at ({x}, {y})")]
    SpawnOutOfBounds { number: u32, x: i32, y: i32 },
    #[error("level {number}: score goals must be strictly ascending")]
    UnorderedGoals { number: u32 },
}

/// Storage seam for level descriptors
pub trait LevelProvider {
    fn level(&self, number: u32) -> Option<LevelBoard>;
}

/// In-memory provider, the reference implementation (and test fixture)
pub struct StaticLevels {
    levels: Vec<LevelBoard>,
}

impl StaticLevels {
    pub fn new(levels: Vec<LevelBoard>) -> Self {
        Self { levels }
    }
}

impl LevelProvider for StaticLevels {
    fn level(&self, number: u32) -> Option<LevelBoard> {
        self.levels.iter().find(|l| l.number == number).cloned()
    }
}

/// Load the requested level, falling back one level at a time when a
/// descriptor is missing. The walk is bounded by `LEVEL_FALLBACK_LIMIT`.
pub fn load_with_fallback(
    provider: &dyn LevelProvider,
    number: u32,
) -> Result<LevelBoard, LevelError> {
    let floor = number.saturating_sub(LEVEL_FALLBACK_LIMIT);
    let mut n = number;
    loop {
        if let Some(level) = provider.level(n) {
            if n != number {
                warn!("level {number} missing, loaded level {n} instead");
            }
            level.validate()?;
            return Ok(level);
        }
        if n == 0 || n <= floor {
            return Err(LevelError::NotFound(number));
        }
        n -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_level_validates() {
        assert_eq!(LevelBoard::basic(1, 8, 8, 30).validate(), Ok(()));
    }

    #[test]
    fn test_invalid_dimensions_rejected() {
        let level = LevelBoard::basic(2, 0, 8, 30);
        assert!(matches!(
            level.validate(),
            Err(LevelError::InvalidDimensions { number: 2, .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_spawn_rejected() {
        let mut level = LevelBoard::basic(3, 4, 4, 30);
        level.starting_pieces.push(PieceSpawn {
            x: 4,
            y: 0,
            value: MatchValue::Red,
        });
        assert!(matches!(
            level.validate(),
            Err(LevelError::SpawnOutOfBounds { x: 4, y: 0, .. })
        ));
    }

    #[test]
    fn test_unordered_goals_rejected() {
        let mut level = LevelBoard::basic(4, 4, 4, 30);
        level.score_goals = vec![1000, 1000, 3000];
        assert!(matches!(
            level.validate(),
            Err(LevelError::UnorderedGoals { number: 4 })
        ));
    }

    #[test]
    fn test_fallback_walks_down() {
        let provider = StaticLevels::new(vec![LevelBoard::basic(3, 8, 8, 30)]);
        let loaded = load_with_fallback(&provider, 7).unwrap();
        assert_eq!(loaded.number, 3);
    }

    #[test]
    fn test_fallback_is_bounded() {
        let provider = StaticLevels::new(vec![LevelBoard::basic(1, 8, 8, 30)]);
        let result = load_with_fallback(&provider, 1 + LEVEL_FALLBACK_LIMIT + 1);
        assert_eq!(result, Err(LevelError::NotFound(12)));
    }

    #[test]
    fn test_descriptor_round_trips_through_json() {
        let mut level = LevelBoard::basic(5, 7, 9, 45);
        level.tiles.push(TileSpawn {
            x: 2,
            y: 3,
            kind: TileType::Breakable,
        });
        level.starting_pieces.push(PieceSpawn {
            x: 0,
            y: 0,
            value: MatchValue::Teal,
        });
        level.currency = GoalCurrency::Seconds;

        let json = serde_json::to_string(&level).unwrap();
        let back: LevelBoard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, level);
    }
}
