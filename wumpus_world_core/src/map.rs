use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// What a single tile of the world is made of.
///
/// Only `Gold` ever changes during a simulation: it turns into `Empty` when grabbed
/// (or back into `Gold` under the strict drop policy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Empty,
    Wall,
    Pit,
    Wumpus,
    Gold,
    Chest,
}

impl Terrain {
    /// Entering this tile kills the agent.
    pub fn is_deadly(self) -> bool {
        matches!(self, Terrain::Pit | Terrain::Wumpus)
    }

    /// An agent may step onto this tile (deadly tiles included).
    pub fn is_passable(self) -> bool {
        !matches!(self, Terrain::Wall)
    }
}

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order, row 0 being
/// the bottom row. Anything outside the bounds is treated by callers as a wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index_of(&self, position: Position) -> Option<usize> {
        if self.contains(position) {
            Some(position.y * self.width + position.x)
        } else {
            None
        }
    }

    /// Checks if the given position is within the grid boundaries.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        let index = self.index_of(position)?;
        self.cells.get(index)
    }

    /// Shifts `position` by `(dx, dy)`.
    ///
    /// Returns `None` when the result falls outside the grid; it never wraps.
    pub fn offset(&self, position: Position, dx: isize, dy: isize) -> Option<Position> {
        let target = Position {
            x: position.x.checked_add_signed(dx)?,
            y: position.y.checked_add_signed(dy)?,
        };
        self.contains(target).then_some(target)
    }

    /// The orthogonal neighbours of `position` that lie inside the grid.
    pub fn neighbors(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            let (dx, dy) = direction.delta();
            self.offset(position, dx, dy)
        })
    }

    /// Returns an iterator that yields `(position, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let position = Position {
                x: index % width,
                y: index / width,
            };
            (position, cell)
        })
    }
}

/// Panics when `position` is outside the grid; [`Grid::get`] returns `None` instead.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.index_of(position) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size ({}, {})",
                position, self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.index_of(position) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index {} out of bounds for grid size ({}, {})",
                position, width, height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_bounds() {
        let grid: Grid<Terrain> = Grid::new(3, 2);
        assert!(grid.contains(pos(2, 1)));
        assert!(!grid.contains(pos(3, 0)));
        assert!(!grid.contains(pos(0, 2)));
        assert_eq!(grid.get(pos(0, 2)), None);
        assert_eq!(grid.get(pos(1, 1)), Some(&Terrain::Empty));
    }

    #[test]
    fn test_offset_never_wraps() {
        let grid: Grid<Terrain> = Grid::new(4, 4);
        assert_eq!(grid.offset(pos(0, 0), -1, 0), None);
        assert_eq!(grid.offset(pos(0, 0), 0, -1), None);
        assert_eq!(grid.offset(pos(3, 3), 1, 0), None);
        assert_eq!(grid.offset(pos(3, 3), 0, 1), None);
        assert_eq!(grid.offset(pos(1, 1), 0, 1), Some(pos(1, 2)));
    }

    #[test]
    fn test_neighbors_clip_at_edges() {
        let grid: Grid<Terrain> = Grid::new(4, 4);
        let mut corner: Vec<_> = grid.neighbors(pos(0, 0)).collect();
        corner.sort_by_key(|p| (p.x, p.y));
        assert_eq!(corner, vec![pos(0, 1), pos(1, 0)]);
        assert_eq!(grid.neighbors(pos(2, 2)).count(), 4);
    }

    #[test]
    fn test_enumerate_is_row_major_from_bottom() {
        let mut grid: Grid<Terrain> = Grid::new(3, 2);
        grid[pos(2, 1)] = Terrain::Gold;
        assert_eq!(grid[pos(2, 1)], Terrain::Gold);
        let first: Vec<_> = grid.enumerate().take(4).map(|(p, _)| p).collect();
        assert_eq!(first, vec![pos(0, 0), pos(1, 0), pos(2, 0), pos(0, 1)]);
        assert_eq!(grid.enumerate().last(), Some((pos(2, 1), &Terrain::Gold)));
    }

    #[test]
    fn test_terrain_classes() {
        assert!(Terrain::Pit.is_deadly());
        assert!(Terrain::Wumpus.is_deadly());
        assert!(!Terrain::Gold.is_deadly());
        assert!(Terrain::Pit.is_passable());
        assert!(!Terrain::Wall.is_passable());
    }
}
