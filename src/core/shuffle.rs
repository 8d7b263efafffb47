//! Shuffle engine - deadlock recovery by permuting the movable pieces
//!
//! Bombs and collectibles stay where they are; everything else is pulled
//! off the board, permuted with the engine's seeded RNG, and redistributed
//! under the same no-immediate-match policy the refill uses.

use std::collections::VecDeque;

use log::{debug, error};

use crate::core::grid::Grid;
use crate::core::matches;
use crate::core::piece::Piece;
use crate::core::rng::SimpleRng;
use crate::types::{FILL_RETRY_LIMIT, SWAP_MS};

/// Pull every non-bomb, non-collectible piece off the board
fn extract_movable(grid: &mut Grid) -> Vec<Piece> {
    let coords: Vec<_> = grid.coords().collect();
    let mut out = Vec::new();
    for (x, y) in coords {
        let keep = grid
            .piece_at(x, y)
            .is_some_and(|p| p.bomb.is_none() && p.collectible.is_none());
        if keep {
            if let Some(piece) = grid.take_piece(x, y) {
                out.push(piece);
            }
        }
    }
    out
}

/// Deal a list of pieces back onto the open slots, cycling the queue while
/// a placement would complete a run. The reroll is bounded per slot; on
/// exhaustion the matching placement stands and is logged.
pub fn refill_from_list(grid: &mut Grid, pieces: Vec<Piece>) {
    let mut queue: VecDeque<Piece> = pieces.into();

    for (x, y) in grid.open_slots() {
        let mut iterations = 0;
        loop {
            let Some(piece) = queue.pop_front() else {
                return;
            };
            grid.place(piece, x, y);

            let matched = matches::has_match_on_fill(grid, x, y);
            if matched && iterations < FILL_RETRY_LIMIT {
                if let Some(rejected) = grid.take_piece(x, y) {
                    queue.push_back(rejected);
                }
                iterations += 1;
                continue;
            }
            if matched {
                error!("refill reroll limit reached at ({x}, {y}), placing anyway");
            }
            // Slide the piece from its old visual position to its new cell
            if let Some(placed) = grid.piece_at_mut(x, y) {
                placed.begin_move(x, y, SWAP_MS);
            }
            break;
        }
    }
}

/// Permute the movable pieces in place. Grid occupancy is unchanged as a
/// multiset; only positions differ.
pub fn shuffle_board(grid: &mut Grid, rng: &mut SimpleRng) {
    let mut movable = extract_movable(grid);
    debug!("shuffling {} movable pieces", movable.len());
    rng.shuffle(&mut movable);
    refill_from_list(grid, movable);
}
