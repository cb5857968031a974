//! Cell and tile storage.
//!
//! Cells are created once with the grid and never move; only their
//! occupancy changes. Every live tile sits on exactly one cell and that
//! cell points back at it. The one exception is a tile staged for a merge
//! during [`resolve`](crate::resolve): it is referenced from the
//! destination's `merge_tile` slot until the merge completes at the end of
//! the same move.

use crate::error::GridError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, trace};

/// A cell coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

/// Identity of a tile, assigned in creation order and never reused within a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileId(u64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A numbered token occupying a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    id: TileId,
    position: Position,
    value: u32,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// A fixed grid slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    position: Position,
    tile: Option<TileId>,
    merge_tile: Option<TileId>,
}

impl Cell {
    pub fn position(&self) -> Position {
        self.position
    }

    /// The tile occupying this cell, if any.
    pub fn tile(&self) -> Option<TileId> {
        self.tile
    }

    /// A tile waiting to merge into the occupant. Only set mid-move.
    pub fn merge_tile(&self) -> Option<TileId> {
        self.merge_tile
    }

    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
    }
}

/// A completed merge: `absorbed` was removed and `survivor` now holds `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Merge {
    pub survivor: TileId,
    pub absorbed: TileId,
    pub position: Position,
    pub value: u32,
}

/// The cells of one game and the tiles on them.
///
/// Cells are stored in row-major order: index `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    tiles: BTreeMap<TileId, Tile>,
    next_id: u64,
}

impl GridModel {
    /// Create an empty `size × size` grid.
    pub fn new(size: usize) -> Result<Self, GridError> {
        Self::with_dimensions(size, size)
    }

    /// Create an empty grid that need not be square.
    pub fn with_dimensions(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Position::new(x, y)))
            .map(|position| Cell {
                position,
                tile: None,
                merge_tile: None,
            })
            .collect();
        Ok(GridModel {
            width,
            height,
            cells,
            tiles: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// Build a grid from rows of values, `0` meaning an empty cell.
    ///
    /// Tiles are created in row-major order, so their ids follow that order.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(GridError::RaggedRows);
        }
        let mut grid = Self::with_dimensions(width, rows.len())?;
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value != 0 {
                    grid.place_tile(Position::new(x, y), value)?;
                }
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        (position.x < self.width && position.y < self.height)
            .then(|| position.y * self.width + position.x)
    }

    /// The cell at `position`, or `None` if it lies outside the grid.
    pub fn cell_at(&self, position: Position) -> Option<&Cell> {
        self.index_of(position).map(|i| &self.cells[i])
    }

    fn cell_mut(&mut self, position: Position) -> Result<&mut Cell, GridError> {
        let index = self
            .index_of(position)
            .ok_or(GridError::OutOfBounds(position))?;
        Ok(&mut self.cells[index])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Positions of cells without an occupying tile, in row-major order.
    pub fn empty_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .filter(|cell| cell.is_empty())
            .map(Cell::position)
            .collect()
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// The tile occupying `position`, if any.
    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.cell_at(position)
            .and_then(Cell::tile)
            .and_then(|id| self.tiles.get(&id))
    }

    /// Live tiles ordered by id.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tile values as rows, `0` for empty cells.
    pub fn values(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.width)
            .map(|row| {
                row.iter()
                    .map(|cell| self.value_of(cell).unwrap_or(0))
                    .collect()
            })
            .collect()
    }

    /// The largest tile value on the board, `0` when empty.
    pub fn max_value(&self) -> u32 {
        self.tiles.values().map(Tile::value).max().unwrap_or(0)
    }

    fn value_of(&self, cell: &Cell) -> Option<u32> {
        cell.tile
            .and_then(|id| self.tiles.get(&id))
            .map(Tile::value)
    }

    /// Whether a tile of `value` may slide into or merge with the cell at `position`.
    ///
    /// A cell accepts when it is empty, or when its occupant has the same
    /// value, no merge is already pending there, and the merged value still
    /// fits in a `u32`.
    pub fn cell_accepts(&self, position: Position, value: u32) -> bool {
        let Some(cell) = self.cell_at(position) else {
            return false;
        };
        match self.value_of(cell) {
            None => true,
            Some(occupant) => {
                cell.merge_tile.is_none()
                    && occupant == value
                    && occupant.checked_add(value).is_some()
            }
        }
    }

    /// Create a tile of `value` on the cell at `position`.
    pub fn place_tile(&mut self, position: Position, value: u32) -> Result<TileId, GridError> {
        let id = TileId(self.next_id);
        let cell = self.cell_mut(position)?;
        if cell.tile.is_some() {
            return Err(GridError::Occupied(position));
        }
        cell.tile = Some(id);
        self.next_id += 1;
        self.tiles.insert(
            id,
            Tile {
                id,
                position,
                value,
            },
        );
        trace!(tile = %id, x = position.x, y = position.y, value, "placed tile");
        Ok(id)
    }

    /// Clear the tile's cell and remove the tile from the grid.
    pub fn detach_tile(&mut self, id: TileId) -> Result<Tile, GridError> {
        let tile = self.tiles.remove(&id).ok_or(GridError::UnknownTile(id))?;
        if let Ok(cell) = self.cell_mut(tile.position) {
            if cell.tile == Some(id) {
                cell.tile = None;
            }
            if cell.merge_tile == Some(id) {
                cell.merge_tile = None;
            }
        }
        Ok(tile)
    }

    /// Move a tile onto the empty cell at `to`, vacating its origin.
    pub(crate) fn relocate(&mut self, id: TileId, to: Position) -> Result<(), GridError> {
        let from = self.vacate(id, to)?;
        self.cell_mut(to)?.tile = Some(id);
        trace!(tile = %id, from_x = from.x, from_y = from.y, to_x = to.x, to_y = to.y, "slid tile");
        Ok(())
    }

    /// Move a tile onto the occupied cell at `to` as its pending merge partner.
    pub(crate) fn stage_merge(&mut self, id: TileId, to: Position) -> Result<(), GridError> {
        self.vacate(id, to)?;
        self.cell_mut(to)?.merge_tile = Some(id);
        Ok(())
    }

    /// Clear the tile's current cell and point the tile at `to`.
    ///
    /// Checks both ends before touching anything so a failed lookup leaves
    /// the grid as it was.
    fn vacate(&mut self, id: TileId, to: Position) -> Result<Position, GridError> {
        self.index_of(to).ok_or(GridError::OutOfBounds(to))?;
        let from = self
            .tiles
            .get(&id)
            .map(Tile::position)
            .ok_or(GridError::UnknownTile(id))?;
        let origin = self.cell_mut(from)?;
        if origin.tile == Some(id) {
            origin.tile = None;
        }
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.position = to;
        }
        Ok(from)
    }

    /// Combine every staged merge and clear all merge markers.
    ///
    /// The occupant survives with the summed value; the staged tile is
    /// removed from the grid.
    pub(crate) fn complete_merges(&mut self) -> Vec<Merge> {
        let mut merges = Vec::new();
        for index in 0..self.cells.len() {
            let Some(absorbed) = self.cells[index].merge_tile.take() else {
                continue;
            };
            let position = self.cells[index].position;
            let Some(survivor) = self.cells[index].tile else {
                error!(tile = %absorbed, x = position.x, y = position.y, "merge staged on an empty cell");
                self.cells[index].tile = Some(absorbed);
                continue;
            };
            let Some(absorbed_tile) = self.tiles.remove(&absorbed) else {
                error!(tile = %absorbed, "staged merge references a missing tile");
                continue;
            };
            let Some(target) = self.tiles.get_mut(&survivor) else {
                error!(tile = %survivor, "merge target is missing");
                self.tiles.insert(absorbed, absorbed_tile);
                self.cells[index].tile = Some(absorbed);
                continue;
            };
            target.value = target.value.saturating_add(absorbed_tile.value);
            let merge = Merge {
                survivor,
                absorbed,
                position,
                value: target.value,
            };
            trace!(survivor = %survivor, absorbed = %absorbed, value = merge.value, "merged tiles");
            merges.push(merge);
        }
        merges
    }

    /// Whether any cell still carries a merge marker.
    pub fn has_pending_merges(&self) -> bool {
        self.cells.iter().any(|cell| cell.merge_tile.is_some())
    }

    /// Check the occupancy bijection: every tile sits on the cell at its
    /// position, every occupied cell names a live tile at that position, and
    /// no merge marker is left behind.
    pub fn is_consistent(&self) -> bool {
        let tiles_placed = self.tiles.values().all(|tile| {
            self.cell_at(tile.position)
                .is_some_and(|cell| cell.tile == Some(tile.id))
        });
        let cells_backed = self.cells.iter().all(|cell| match cell.tile {
            None => true,
            Some(id) => self
                .tiles
                .get(&id)
                .is_some_and(|tile| tile.position == cell.position),
        });
        let occupied = self.cells.iter().filter(|cell| cell.tile.is_some()).count();
        tiles_placed && cells_backed && occupied == self.tiles.len() && !self.has_pending_merges()
    }
}

impl fmt::Display for GridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = format!("+{}", "------+".repeat(self.width));
        writeln!(f, "{border}")?;
        for row in self.values() {
            write!(f, "|")?;
            for val in row {
                if val == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", val)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "{border}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
