//! Bomb resolver - classification from match shape and blast expansion
//!
//! Bombs are ordinary pieces carrying a `BombKind`. Classification happens
//! when a swap produces a large enough group; detonation happens when a bomb
//! is caught in a clear set, expanding the set by the bomb's blast.

use std::collections::HashSet;

use crate::core::grid::Grid;
use crate::core::matches;
use crate::types::{BombKind, Coord, MatchValue, SwapDirection, BOMB_CHAIN_PASSES};

/// Minimum group size that produces a bomb
pub const MIN_BOMB_GROUP: usize = 4;

/// A bomb created by a clear pass, held back until the pass finishes so it
/// is not consumed by the clear that spawned it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedBomb {
    pub coord: Coord,
    pub kind: BombKind,
    pub value: MatchValue,
}

/// Whether the group bends: it spans a second column and a second row
/// relative to its first piece (an L or T shape)
pub fn is_corner_match(group: &[Coord]) -> bool {
    let Some(&(x0, y0)) = group.first() else {
        return false;
    };
    let horizontal = group.iter().any(|&(x, _)| x != x0);
    let vertical = group.iter().any(|&(_, y)| y != y0);
    horizontal && vertical
}

/// Pick the bomb a cleared group earns, if any.
///
/// Corner shapes beat size: an L of five still yields an Adjacent bomb.
/// Straight groups of five or more yield a Color bomb; straight fours yield
/// a Row or Column bomb along the swipe axis.
pub fn classify(group: &[Coord], swap: SwapDirection) -> Option<BombKind> {
    if group.len() < MIN_BOMB_GROUP {
        return None;
    }
    if is_corner_match(group) {
        return Some(BombKind::Adjacent);
    }
    if group.len() >= 5 {
        return Some(BombKind::Color);
    }
    Some(match swap {
        SwapDirection::Horizontal => BombKind::Row,
        SwapDirection::Vertical => BombKind::Column,
    })
}

/// The stored value a freshly spawned bomb carries. Color bombs match
/// anything and hold `Wild`; other bombs keep the value of the piece whose
/// match created them.
pub fn spawn_value(kind: BombKind, match_value: MatchValue) -> MatchValue {
    match kind {
        BombKind::Color => MatchValue::Wild,
        _ => match_value,
    }
}

/// Coordinates cleared by the bomb at (x, y) detonating in place.
///
/// A Color bomb caught in another blast clears every piece sharing its
/// current value; one still holding `Wild` (never swapped) clears nothing
/// beyond itself.
pub fn blast_coords(grid: &Grid, x: i32, y: i32) -> Vec<Coord> {
    let Some(piece) = grid.piece_at(x, y) else {
        return Vec::new();
    };
    let Some(kind) = piece.bomb else {
        return Vec::new();
    };

    let raw: Vec<Coord> = match kind {
        BombKind::Row => grid.row_coords(y),
        BombKind::Column => grid.column_coords(x),
        BombKind::Adjacent => grid.neighborhood_coords(x, y).to_vec(),
        BombKind::Color => {
            if piece.value.is_matchable() {
                matches::matches_by_value(grid, piece.value)
            } else {
                Vec::new()
            }
        }
    };

    // Collectibles survive blasts unless flagged bomb-clearable
    raw.into_iter()
        .filter(|&(cx, cy)| {
            grid.piece_at(cx, cy)
                .and_then(|p| p.collectible)
                .map_or(true, |c| c.cleared_by_bomb)
        })
        .collect()
}

/// Expand a clear set by the blasts of every bomb it contains.
///
/// Two expansion passes: a bomb revealed by the first pass detonates too,
/// but chains no further within this clearing step.
pub fn expand_with_bombs(grid: &Grid, coords: &[Coord]) -> Vec<Coord> {
    let mut set: HashSet<Coord> = coords.iter().copied().collect();

    for _ in 0..BOMB_CHAIN_PASSES {
        let snapshot: Vec<Coord> = set.iter().copied().collect();
        for (x, y) in snapshot {
            if grid.piece_at(x, y).is_some_and(|p| p.bomb.is_some()) {
                set.extend(blast_coords(grid, x, y));
            }
        }
    }

    let mut out: Vec<Coord> = set.into_iter().collect();
    out.sort_unstable();
    out
}
