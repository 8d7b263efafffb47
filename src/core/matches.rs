//! Match finder - directional run scanning
//!
//! All scans are read-only over the grid. A return of `None` means "no match
//! here", which is distinct from an empty list and lets callers skip work
//! without allocating.

use std::collections::HashSet;

use crate::core::grid::Grid;
use crate::types::{Coord, MatchValue};

/// Minimum run length for a full match
pub const MIN_MATCH_LENGTH: usize = 3;

/// Walk from `start` in the direction of `step` (components clamped to unit
/// steps) collecting same-value pieces. The walk stops at the edge, an empty
/// slot, a value mismatch, or a non-matchable value. Returns the run
/// (including the start piece) if it reaches `min_length`.
pub fn scan(grid: &Grid, start: Coord, step: (i32, i32), min_length: usize) -> Option<Vec<Coord>> {
    let (sx, sy) = start;
    let value = grid.value_at(sx, sy)?;
    if !value.is_matchable() {
        return None;
    }

    let dx = step.0.clamp(-1, 1);
    let dy = step.1.clamp(-1, 1);

    let mut run = vec![start];
    let max_steps = grid.width().max(grid.height()) - 1;
    for i in 1..=max_steps {
        let next = (sx + dx * i, sy + dy * i);
        match grid.value_at(next.0, next.1) {
            Some(v) if v == value && v.is_matchable() && !run.contains(&next) => run.push(next),
            _ => break,
        }
    }

    if run.len() >= min_length {
        Some(run)
    } else {
        None
    }
}

fn merged_axis_scan(grid: &Grid, at: Coord, step: (i32, i32)) -> Option<Vec<Coord>> {
    // Two half-scans with min length 2 re-merged under the overall minimum,
    // so runs crossing the start piece in the middle are still found
    let forward = scan(grid, at, step, 2).unwrap_or_default();
    let backward = scan(grid, at, (-step.0, -step.1), 2).unwrap_or_default();

    let mut run = forward;
    for coord in backward {
        if !run.contains(&coord) {
            run.push(coord);
        }
    }

    if run.len() >= MIN_MATCH_LENGTH {
        Some(run)
    } else {
        None
    }
}

/// Horizontal run through (x, y) of at least the full match length
pub fn horizontal_matches_at(grid: &Grid, x: i32, y: i32) -> Option<Vec<Coord>> {
    merged_axis_scan(grid, (x, y), (1, 0))
}

/// Vertical run through (x, y) of at least the full match length
pub fn vertical_matches_at(grid: &Grid, x: i32, y: i32) -> Option<Vec<Coord>> {
    merged_axis_scan(grid, (x, y), (0, 1))
}

/// All matched coordinates running through (x, y), both axes combined.
/// `None` when neither axis has a full run.
pub fn matches_at(grid: &Grid, x: i32, y: i32) -> Option<Vec<Coord>> {
    let horizontal = horizontal_matches_at(grid, x, y);
    let vertical = vertical_matches_at(grid, x, y);
    if horizontal.is_none() && vertical.is_none() {
        return None;
    }

    let mut combined = horizontal.unwrap_or_default();
    for coord in vertical.unwrap_or_default() {
        if !combined.contains(&coord) {
            combined.push(coord);
        }
    }
    Some(combined)
}

/// Matches running through any of the given coordinates, deduplicated
pub fn matches_at_coords(grid: &Grid, coords: &[Coord]) -> Vec<Coord> {
    let mut seen = HashSet::new();
    for &(x, y) in coords {
        if let Some(run) = matches_at(grid, x, y) {
            seen.extend(run);
        }
    }
    let mut out: Vec<Coord> = seen.into_iter().collect();
    out.sort_unstable();
    out
}

/// Every matched coordinate anywhere on the board, deduplicated
pub fn all_matches(grid: &Grid) -> Vec<Coord> {
    let coords: Vec<Coord> = grid.coords().collect();
    matches_at_coords(grid, &coords)
}

/// Whether a piece just placed at (x, y) completes a run. Fill proceeds
/// left-to-right, bottom-to-top, so only the left and downward scans can
/// already hold pieces.
pub fn has_match_on_fill(grid: &Grid, x: i32, y: i32) -> bool {
    scan(grid, (x, y), (-1, 0), MIN_MATCH_LENGTH).is_some()
        || scan(grid, (x, y), (0, -1), MIN_MATCH_LENGTH).is_some()
}

/// Every occupied coordinate holding the given value (color-bomb clears)
pub fn matches_by_value(grid: &Grid, value: MatchValue) -> Vec<Coord> {
    grid.coords()
        .filter(|&(x, y)| grid.value_at(x, y) == Some(value))
        .collect()
}
