//! Grid module - tile layer plus piece slots
//!
//! The grid owns two parallel layers over the same `width x height` area:
//! a static tile layer (normal, obstacle, breakable) and the piece slots.
//! All coordinate access goes through `index()`, which returns `None` for
//! out-of-bounds coordinates so callers never index raw storage.
//!
//! Orientation: y = 0 is the bottom row. Gravity collapses pieces toward
//! y = 0 and refill enters at y = height - 1.

use arrayvec::ArrayVec;

use crate::core::piece::Piece;
use crate::types::{Coord, MatchValue, TileType};

/// One cell of the static tile layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileType,
    /// Remaining hits for breakable overlays; 0 for plain tiles
    pub durability: u8,
}

impl Tile {
    pub fn new(kind: TileType) -> Self {
        Self {
            kind,
            durability: kind.durability(),
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(TileType::Normal)
    }
}

/// A committed downward slide of one piece within a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideMove {
    pub id: u32,
    pub x: i32,
    pub from_y: i32,
    pub to_y: i32,
}

/// Compact board state for host consumption
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BoardSnapshot {
    pub width: i32,
    pub height: i32,
    /// Row-major from the bottom row up; `None` for empty slots
    pub cells: Vec<Option<MatchValue>>,
}

/// The board: tiles and piece slots
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    pieces: Vec<Option<Piece>>,
}

impl Grid {
    /// Create a grid of all-Normal tiles and empty slots
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![Tile::default(); len],
            pieces: vec![None; len],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Convert (x, y) to a storage index; `None` when out of bounds
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    // --- tile layer ---

    pub fn tile_at(&self, x: i32, y: i32) -> Option<Tile> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    pub fn set_tile(&mut self, x: i32, y: i32, kind: TileType) {
        if let Some(i) = self.index(x, y) {
            self.tiles[i] = Tile::new(kind);
        }
    }

    /// Wear down a breakable tile by one hit. Returns the remaining
    /// durability if the tile was breakable, `None` otherwise. At zero the
    /// tile converts back to Normal.
    pub fn break_tile(&mut self, x: i32, y: i32) -> Option<u8> {
        let i = self.index(x, y)?;
        let tile = &mut self.tiles[i];
        if tile.durability == 0 {
            return None;
        }
        tile.durability -= 1;
        if tile.durability == 0 {
            tile.kind = TileType::Normal;
        }
        Some(tile.durability)
    }

    // --- piece slots ---

    pub fn piece_at(&self, x: i32, y: i32) -> Option<&Piece> {
        self.index(x, y).and_then(|i| self.pieces[i].as_ref())
    }

    pub fn piece_at_mut(&mut self, x: i32, y: i32) -> Option<&mut Piece> {
        self.index(x, y).and_then(|i| self.pieces[i].as_mut())
    }

    /// Remove and return the piece at (x, y)
    pub fn take_piece(&mut self, x: i32, y: i32) -> Option<Piece> {
        self.index(x, y).and_then(|i| self.pieces[i].take())
    }

    /// Whether (x, y) is in bounds, not an Obstacle, and matches the wanted
    /// occupancy (`require_occupied`: true = slot must hold a piece,
    /// false = slot must be empty)
    pub fn is_available(&self, x: i32, y: i32, require_occupied: bool) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.tiles[i].kind == TileType::Obstacle {
            return false;
        }
        self.pieces[i].is_some() == require_occupied
    }

    /// Put a piece into slot (x, y), syncing its stored coordinate.
    /// Returns false when the slot is out of bounds or an Obstacle;
    /// callers that must not lose the piece check availability first.
    pub fn place(&mut self, mut piece: Piece, x: i32, y: i32) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.tiles[i].kind == TileType::Obstacle {
            return false;
        }
        piece.set_coord(x, y);
        self.pieces[i] = Some(piece);
        true
    }

    /// Value of the piece at (x, y), if any
    pub fn value_at(&self, x: i32, y: i32) -> Option<MatchValue> {
        self.piece_at(x, y).map(|p| p.value)
    }

    // --- lanes and neighborhoods ---

    /// Occupied coordinates of an entire row
    pub fn row_coords(&self, y: i32) -> Vec<Coord> {
        (0..self.width)
            .filter(|&x| self.piece_at(x, y).is_some())
            .map(|x| (x, y))
            .collect()
    }

    /// Occupied coordinates of an entire column
    pub fn column_coords(&self, x: i32) -> Vec<Coord> {
        (0..self.height)
            .filter(|&y| self.piece_at(x, y).is_some())
            .map(|y| (x, y))
            .collect()
    }

    /// Occupied coordinates in the Chebyshev-1 neighborhood of (x, y),
    /// including (x, y) itself
    pub fn neighborhood_coords(&self, x: i32, y: i32) -> ArrayVec<Coord, 9> {
        let mut out = ArrayVec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if self.piece_at(nx, ny).is_some() {
                    out.push((nx, ny));
                }
            }
        }
        out
    }

    /// All in-bounds coordinates, bottom row first
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| (x, y)))
    }

    /// Empty, non-obstacle slots
    pub fn open_slots(&self) -> Vec<Coord> {
        self.coords()
            .filter(|&(x, y)| self.is_available(x, y, false))
            .collect()
    }

    // --- collapse ---

    /// Slide every piece in column x down over empty non-obstacle slots.
    /// Grid state is committed immediately; the returned moves let the
    /// caller animate the slides.
    pub fn collapse_column(&mut self, x: i32) -> Vec<SlideMove> {
        let mut moves = Vec::new();
        for y in 0..self.height - 1 {
            if !self.is_available(x, y, false) {
                continue;
            }
            for above in y + 1..self.height {
                // Obstacles block the fall; pieces rest on top of them
                if self
                    .tile_at(x, above)
                    .is_some_and(|t| t.kind == TileType::Obstacle)
                {
                    break;
                }
                if !self.is_available(x, above, true) {
                    continue;
                }
                if let Some(piece) = self.take_piece(x, above) {
                    let id = piece.id;
                    self.place(piece, x, y);
                    moves.push(SlideMove {
                        id,
                        x,
                        from_y: above,
                        to_y: y,
                    });
                }
                break;
            }
        }
        moves
    }

    /// Collapse every column touched by the given coordinates
    pub fn collapse_columns(&mut self, coords: &[Coord]) -> Vec<SlideMove> {
        let mut columns: Vec<i32> = coords.iter().map(|&(x, _)| x).collect();
        columns.sort_unstable();
        columns.dedup();

        let mut moves = Vec::new();
        for x in columns {
            moves.extend(self.collapse_column(x));
        }
        moves
    }

    /// Whether every piece on the board has visually arrived at its cell
    pub fn all_settled(&self) -> bool {
        self.pieces
            .iter()
            .flatten()
            .all(|p| p.is_settled() && !p.is_moving())
    }

    /// Advance every in-flight piece move
    pub fn advance_motion(&mut self, elapsed_ms: u32) {
        for piece in self.pieces.iter_mut().flatten() {
            piece.advance(elapsed_ms);
        }
    }

    /// Compact value-grid view of the current state
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            width: self.width,
            height: self.height,
            cells: self.pieces.iter().map(|p| p.as_ref().map(|p| p.value)).collect(),
        }
    }
}
