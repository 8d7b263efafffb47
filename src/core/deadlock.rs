//! Deadlock detector - read-only scan for any remaining legal move
//!
//! A window of three consecutive cells along a row or column admits a move
//! when two of its pieces share a value and the odd piece has an orthogonal
//! neighbor outside the window carrying that value: swapping the odd piece
//! with that neighbor completes a run of three.

use log::warn;

use crate::core::grid::Grid;
use crate::types::{Coord, MatchValue, DEADLOCK_WINDOW};

fn window_coords(x: i32, y: i32, horizontal: bool) -> [Coord; DEADLOCK_WINDOW] {
    let mut out = [(0, 0); DEADLOCK_WINDOW];
    for (i, slot) in out.iter_mut().enumerate() {
        let i = i as i32;
        *slot = if horizontal { (x + i, y) } else { (x, y + i) };
    }
    out
}

/// The value shared by at least two window pieces, if any
fn majority_value(grid: &Grid, window: &[Coord]) -> Option<MatchValue> {
    for &(x, y) in window {
        let value = grid.value_at(x, y)?;
        if !value.is_matchable() {
            continue;
        }
        let count = window
            .iter()
            .filter(|&&(wx, wy)| grid.value_at(wx, wy) == Some(value))
            .count();
        if count >= 2 {
            return Some(value);
        }
    }
    None
}

fn has_move_at(grid: &Grid, x: i32, y: i32, horizontal: bool) -> bool {
    let window = window_coords(x, y, horizontal);

    // Windows running off the board or over empty/obstacle cells are skipped
    if window.iter().any(|&(wx, wy)| grid.piece_at(wx, wy).is_none()) {
        return false;
    }

    let Some(majority) = majority_value(grid, &window) else {
        return false;
    };

    for &(wx, wy) in &window {
        if grid.value_at(wx, wy) == Some(majority) {
            continue;
        }
        // The odd piece: a neighbor outside the window with the majority
        // value can be swapped in
        for (nx, ny) in [(wx - 1, wy), (wx + 1, wy), (wx, wy - 1), (wx, wy + 1)] {
            if window.contains(&(nx, ny)) {
                continue;
            }
            if grid.value_at(nx, ny) == Some(majority) {
                return true;
            }
        }
    }
    false
}

/// Whether no legal move remains anywhere on the board
pub fn is_deadlocked(grid: &Grid) -> bool {
    for (x, y) in grid.coords() {
        if has_move_at(grid, x, y, true) || has_move_at(grid, x, y, false) {
            return false;
        }
    }
    warn!("board is deadlocked, no legal moves remain");
    true
}
