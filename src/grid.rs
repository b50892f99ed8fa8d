use rand::seq::SliceRandom;
use rand::Rng;
use segregation_common::InvalidConfiguration;

/// Cell state: `EMPTY`, or the agent type (1 or 2).
pub type CellValue = u8;

pub const EMPTY: CellValue = 0;
pub const AGENT_TYPES: [CellValue; 2] = [1, 2];

/// Row/column offsets of the Moore neighborhood, in N, NE, E, SE, S, SW, W, NW order.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Zero-based cell address. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    pub const fn new(row: u32, col: u32) -> Self {
        Position { row, col }
    }
}

/// Square toroidal lattice stored row-major in a flat vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    side: u32,
    cells: Vec<CellValue>,
}

// Maps `coord + delta` onto [0, side).
#[inline(always)]
fn wrap(coord: u32, delta: i64, side: u32) -> u32 {
    (i64::from(coord) + delta).rem_euclid(i64::from(side)) as u32
}

impl Grid {
    /// Shuffles `type_counts[v]` copies of each value `v` into a `cells_side²` grid.
    /// Every arrangement of the multiset is equally likely.
    pub fn initialize<R: Rng + ?Sized>(
        cells_side: u32,
        type_counts: [usize; 3],
        rng: &mut R,
    ) -> Result<Self, InvalidConfiguration> {
        if cells_side == 0 {
            return Err(InvalidConfiguration::NonPositiveSide);
        }
        let expected = cells_side as usize * cells_side as usize;
        let actual: usize = type_counts.iter().sum();
        if actual != expected {
            return Err(InvalidConfiguration::CountMismatch { expected, actual });
        }

        let mut cells = Vec::with_capacity(expected);
        for (value, &count) in (EMPTY..).zip(type_counts.iter()) {
            cells.extend(std::iter::repeat(value).take(count));
        }
        cells.shuffle(rng);

        Ok(Grid { side: cells_side, cells })
    }

    /// Builds a grid from an explicit row-major layout.
    pub fn from_cells(cells_side: u32, cells: Vec<CellValue>) -> Result<Self, InvalidConfiguration> {
        if cells_side == 0 {
            return Err(InvalidConfiguration::NonPositiveSide);
        }
        let expected = cells_side as usize * cells_side as usize;
        if cells.len() != expected {
            return Err(InvalidConfiguration::CellCountMismatch { expected, actual: cells.len() });
        }
        if let Some((index, &value)) = cells
            .iter()
            .enumerate()
            .find(|(_, &v)| v != EMPTY && !AGENT_TYPES.contains(&v))
        {
            return Err(InvalidConfiguration::InvalidCellValue { index, value });
        }
        Ok(Grid { side: cells_side, cells })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Row-major view of every cell.
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// 2-D copy of the grid, one inner vector per row.
    pub fn to_rows(&self) -> Vec<Vec<CellValue>> {
        self.cells
            .chunks(self.side as usize)
            .map(<[CellValue]>::to_vec)
            .collect()
    }

    /// Wraps out-of-range coordinates back onto the torus.
    #[inline(always)]
    pub fn wrapped(&self, position: Position) -> Position {
        Position::new(position.row % self.side, position.col % self.side)
    }

    #[inline(always)]
    pub fn index_of(&self, position: Position) -> usize {
        let p = self.wrapped(position);
        p.row as usize * self.side as usize + p.col as usize
    }

    #[inline(always)]
    pub fn position_of(&self, index: usize) -> Position {
        let side = self.side as usize;
        let index = index % self.cells.len();
        Position::new((index / side) as u32, (index % side) as u32)
    }

    /// The 8 toroidal neighbors in N, NE, E, SE, S, SW, W, NW order.
    /// For grids narrower than 3 some of these coincide.
    pub fn neighbors_of(&self, position: Position) -> [Position; 8] {
        let p = self.wrapped(position);
        NEIGHBOR_OFFSETS.map(|(dr, dc)| Position::new(wrap(p.row, dr, self.side), wrap(p.col, dc, self.side)))
    }

    #[inline(always)]
    pub fn value_at(&self, position: Position) -> CellValue {
        self.cells[self.index_of(position)]
    }

    #[inline(always)]
    pub fn set_value(&mut self, position: Position, value: CellValue) {
        let idx = self.index_of(position);
        self.cells[idx] = value;
    }

    pub fn is_empty_at(&self, position: Position) -> bool {
        self.value_at(position) == EMPTY
    }

    /// Moves the value at `from` into `to`, leaving `from` empty.
    pub fn move_agent(&mut self, from: Position, to: Position) {
        let value = self.value_at(from);
        self.set_value(from, EMPTY);
        self.set_value(to, value);
    }

    /// Uniformly random cell, occupied or not.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        self.position_of(rng.random_range(0..self.cells.len()))
    }

    pub fn count_of(&self, value: CellValue) -> usize {
        self.cells.iter().filter(|&&v| v == value).count()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len() - self.count_of(EMPTY)
    }

    /// Positions of every non-empty cell, in row-major order.
    pub fn occupied_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != EMPTY)
            .map(|(idx, _)| self.position_of(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn initialize_places_exact_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::initialize(5, [15, 5, 5], &mut rng).unwrap();
        assert_eq!(grid.num_cells(), 25);
        assert_eq!(grid.count_of(EMPTY), 15);
        assert_eq!(grid.count_of(1), 5);
        assert_eq!(grid.count_of(2), 5);
        assert_eq!(grid.occupied_count(), 10);
    }

    #[test]
    fn initialize_is_reproducible_for_a_seed() {
        let a = Grid::initialize(6, [20, 8, 8], &mut StdRng::seed_from_u64(9)).unwrap();
        let b = Grid::initialize(6, [20, 8, 8], &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn initialize_shuffles_the_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::initialize(10, [50, 25, 25], &mut rng).unwrap();
        let mut sorted = grid.cells().to_vec();
        sorted.sort_unstable();
        assert_ne!(grid.cells(), sorted.as_slice());
    }

    #[test]
    fn initialize_rejects_mismatched_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Grid::initialize(5, [10, 5, 5], &mut rng),
            Err(InvalidConfiguration::CountMismatch { expected: 25, actual: 20 })
        );
        assert_eq!(
            Grid::initialize(0, [0, 0, 0], &mut rng),
            Err(InvalidConfiguration::NonPositiveSide)
        );
    }

    #[test]
    fn from_cells_validates_layout() {
        assert!(Grid::from_cells(2, vec![0, 1, 2, 0]).is_ok());
        assert_eq!(
            Grid::from_cells(2, vec![0, 1, 2]),
            Err(InvalidConfiguration::CellCountMismatch { expected: 4, actual: 3 })
        );
        assert_eq!(
            Grid::from_cells(2, vec![0, 1, 3, 0]),
            Err(InvalidConfiguration::InvalidCellValue { index: 2, value: 3 })
        );
    }

    #[test]
    fn every_cell_has_eight_distinct_in_bounds_neighbors() {
        let grid = Grid::from_cells(4, vec![0; 16]).unwrap();
        for idx in 0..grid.num_cells() {
            let pos = grid.position_of(idx);
            let neighbors = grid.neighbors_of(pos);
            let distinct: HashSet<_> = neighbors.iter().copied().collect();
            assert_eq!(distinct.len(), 8, "cell {:?}", pos);
            assert!(!distinct.contains(&pos));
            assert!(neighbors.iter().all(|n| n.row < 4 && n.col < 4));
        }
    }

    #[test]
    fn corner_wraps_to_opposite_edges() {
        let grid = Grid::from_cells(5, vec![0; 25]).unwrap();
        let neighbors = grid.neighbors_of(Position::new(0, 0));
        assert_eq!(
            neighbors,
            [
                Position::new(4, 0), // N
                Position::new(4, 1), // NE
                Position::new(0, 1), // E
                Position::new(1, 1), // SE
                Position::new(1, 0), // S
                Position::new(1, 4), // SW
                Position::new(0, 4), // W
                Position::new(4, 4), // NW
            ]
        );

        let far = grid.neighbors_of(Position::new(4, 4));
        assert!(far.contains(&Position::new(0, 0)));
        assert!(far.contains(&Position::new(0, 4)));
        assert!(far.contains(&Position::new(4, 0)));
    }

    #[test]
    fn neighbors_are_symmetric() {
        let grid = Grid::from_cells(5, vec![0; 25]).unwrap();
        for idx in 0..grid.num_cells() {
            let pos = grid.position_of(idx);
            for n in grid.neighbors_of(pos) {
                assert!(grid.neighbors_of(n).contains(&pos));
            }
        }
    }

    #[test]
    fn index_and_position_round_trip() {
        let grid = Grid::from_cells(3, vec![0; 9]).unwrap();
        for idx in 0..9 {
            assert_eq!(grid.index_of(grid.position_of(idx)), idx);
        }
        assert_eq!(grid.position_of(5), Position::new(1, 2));
    }

    #[test]
    fn out_of_range_positions_wrap() {
        let mut grid = Grid::from_cells(3, vec![0; 9]).unwrap();
        grid.set_value(Position::new(3, 4), 2);
        assert_eq!(grid.value_at(Position::new(0, 1)), 2);
    }

    #[test]
    fn move_agent_vacates_source() {
        let mut grid = Grid::from_cells(2, vec![1, 0, 0, 2]).unwrap();
        grid.move_agent(Position::new(0, 0), Position::new(1, 0));
        assert_eq!(grid.cells(), &[0, 0, 1, 2]);
        assert!(grid.is_empty_at(Position::new(0, 0)));
    }

    #[test]
    fn to_rows_splits_by_side() {
        let grid = Grid::from_cells(2, vec![1, 0, 0, 2]).unwrap();
        assert_eq!(grid.to_rows(), vec![vec![1, 0], vec![0, 2]]);
        let occupied: Vec<_> = grid.occupied_positions().collect();
        assert_eq!(occupied, vec![Position::new(0, 0), Position::new(1, 1)]);
    }

    #[test]
    fn random_position_stays_in_bounds() {
        let grid = Grid::from_cells(3, vec![0; 9]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let p = grid.random_position(&mut rng);
            assert!(p.row < 3 && p.col < 3);
        }
    }
}
