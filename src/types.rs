//! Core types shared across the engine
//! This module contains pure data types with no external dependencies

/// Engine timing constants (in milliseconds)
pub const TICK_MS: u32 = 16;
pub const SWAP_MS: u32 = 200;
pub const CLEAR_PAUSE_MS: u32 = 200;
pub const COLLAPSE_STEP_MS: u32 = 100;
pub const FILL_FALL_MS: u32 = 100;
pub const SETTLE_MS: u32 = 1000;
pub const SETUP_DELAY_MS: u32 = 500;

/// Refill pieces enter from this many cells above the top row
pub const FILL_Y_OFFSET: i32 = 10;

/// A moved piece counts as settled within this distance of its target cell
pub const SETTLE_EPSILON: f32 = 0.05;

/// Bounded-loop limits
pub const FILL_RETRY_LIMIT: u32 = 100;
pub const CASCADE_RETRY_LIMIT: u32 = 5;

/// Bomb-detonation expansion passes per clearing step (chain depth)
pub const BOMB_CHAIN_PASSES: u32 = 2;

/// Deadlock scan window length (run length needed for a match)
pub const DEADLOCK_WINDOW: usize = 3;

/// Collectible spawn policy defaults
pub const COLLECTIBLE_CHANCE: f32 = 0.1;
pub const MAX_COLLECTIBLES: u32 = 3;

/// Default score value of a single cleared piece
pub const PIECE_SCORE: u32 = 20;
/// Group-size bonus per piece in the cleared group
pub const GROUP_BONUS: u32 = 20;

/// Color/kind identity used to decide whether two pieces can form a run.
///
/// `Wild` matches nothing in a scan (carried by color bombs); `None` matches
/// nothing either (carried by collectibles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MatchValue {
    Yellow,
    Blue,
    Magenta,
    Indigo,
    Green,
    Teal,
    Red,
    Cyan,
    Wild,
    None,
}

impl MatchValue {
    /// The ordinary palette: every value a random fill may produce.
    pub const PALETTE: [MatchValue; 8] = [
        MatchValue::Yellow,
        MatchValue::Blue,
        MatchValue::Magenta,
        MatchValue::Indigo,
        MatchValue::Green,
        MatchValue::Teal,
        MatchValue::Red,
        MatchValue::Cyan,
    ];

    /// Whether this value can participate in a run
    pub fn is_matchable(&self) -> bool {
        !matches!(self, MatchValue::Wild | MatchValue::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchValue::Yellow => "yellow",
            MatchValue::Blue => "blue",
            MatchValue::Magenta => "magenta",
            MatchValue::Indigo => "indigo",
            MatchValue::Green => "green",
            MatchValue::Teal => "teal",
            MatchValue::Red => "red",
            MatchValue::Cyan => "cyan",
            MatchValue::Wild => "wild",
            MatchValue::None => "none",
        }
    }
}

/// Tile kinds making up the static board layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum TileType {
    #[default]
    Normal,
    /// Never holds a piece; excluded from fill and collapse
    Obstacle,
    /// One hit to convert back to Normal
    Breakable,
    /// Two hits to convert back to Normal
    DoubleBreakable,
}

impl TileType {
    /// Starting durability of the breakable overlay (0 = not breakable)
    pub fn durability(&self) -> u8 {
        match self {
            TileType::Normal | TileType::Obstacle => 0,
            TileType::Breakable => 1,
            TileType::DoubleBreakable => 2,
        }
    }
}

/// Special behavior carried by a bomb piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BombKind {
    /// Clears its entire row on detonation
    Row,
    /// Clears its entire column on detonation
    Column,
    /// Clears the 3x3 neighborhood around itself
    Adjacent,
    /// Clears every piece of its current match value board-wide
    Color,
}

impl BombKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BombKind::Row => "row",
            BombKind::Column => "column",
            BombKind::Adjacent => "adjacent",
            BombKind::Color => "color",
        }
    }
}

/// Axis of a committed swap, used when choosing Row vs Column bombs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    Horizontal,
    Vertical,
}

/// What the level counts down while the player acts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum GoalCurrency {
    #[default]
    Moves,
    Seconds,
}

/// A board coordinate. y = 0 is the bottom row; gravity pulls toward y = 0.
pub type Coord = (i32, i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_excludes_specials() {
        assert!(!MatchValue::PALETTE.contains(&MatchValue::Wild));
        assert!(!MatchValue::PALETTE.contains(&MatchValue::None));
        for value in MatchValue::PALETTE {
            assert!(value.is_matchable());
        }
    }

    #[test]
    fn test_special_values_do_not_match() {
        assert!(!MatchValue::Wild.is_matchable());
        assert!(!MatchValue::None.is_matchable());
    }

    #[test]
    fn test_tile_durability() {
        assert_eq!(TileType::Normal.durability(), 0);
        assert_eq!(TileType::Obstacle.durability(), 0);
        assert_eq!(TileType::Breakable.durability(), 1);
        assert_eq!(TileType::DoubleBreakable.durability(), 2);
    }
}
