//! Grid geometry and the per-cell transition model.
//!
//! # Transition codes
//!
//! Every cell stores a 16-bit transition code.  For a train occupying the cell
//! with heading `h`, the permitted exit directions are the four bits
//!
//! ```text
//! bit(h, e) = 15 - (4 * h + e)        h, e ∈ {N=0, E=1, S=2, W=3}
//! ```
//!
//! i.e. the code reads `NN NE NS NW | EN EE ES EW | SN SE SS SW | WN WE WS WW`
//! from the most significant bit down.  A straight east-west track is
//! `0b0000_0100_0000_0001` (EE + WW = 1025), a north-south one 32800.  The
//! layout matches the codes exported by common grid-rail scenario editors, so
//! scenario files can be loaded without translation.
//!
//! A *heading* is the direction of travel, so a train entering a cell from
//! its west side has heading `East`.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── Direction ─────────────────────────────────────────────────────────────────

/// Compass direction of travel (or a cell side).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North = 0,
    East  = 1,
    South = 2,
    West  = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Direction> {
        Self::ALL.get(i).copied()
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 2) % 4]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::North => "N",
            Direction::East  => "E",
            Direction::South => "S",
            Direction::West  => "W",
        };
        f.write_str(s)
    }
}

// ── Position ──────────────────────────────────────────────────────────────────

/// A `(row, col)` grid coordinate.  Row 0 is the northern edge.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

impl Position {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// The neighbouring cell in `dir`, or `None` when that would underflow.
    /// Upper bounds are checked by [`TransitionGrid::step`].
    #[inline]
    pub fn step(self, dir: Direction) -> Option<Position> {
        match dir {
            Direction::North => self.row.checked_sub(1).map(|row| Position { row, ..self }),
            Direction::East  => Some(Position { col: self.col + 1, ..self }),
            Direction::South => Some(Position { row: self.row + 1, ..self }),
            Direction::West  => self.col.checked_sub(1).map(|col| Position { col, ..self }),
        }
    }
}

impl From<(u32, u32)> for Position {
    fn from((row, col): (u32, u32)) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ── Exits ─────────────────────────────────────────────────────────────────────

/// A set of directions, stored as a 4-bit mask (bit `d` = `Direction` `d`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Exits(u8);

impl Exits {
    pub const NONE: Exits = Exits(0);

    #[inline]
    pub fn contains(self, dir: Direction) -> bool {
        self.0 & (1 << dir.index()) != 0
    }

    #[inline]
    pub fn with(self, dir: Direction) -> Exits {
        Exits(self.0 | (1 << dir.index()))
    }

    #[inline]
    pub fn union(self, other: Exits) -> Exits {
        Exits(self.0 | other.0)
    }

    #[inline]
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The only direction in the set, if it has exactly one.
    pub fn single(self) -> Option<Direction> {
        if self.count() == 1 {
            Direction::from_index(self.0.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// Directions in N, E, S, W order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

// ── TransitionGrid ────────────────────────────────────────────────────────────

/// A `height × width` grid of 16-bit transition codes, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionGrid {
    height: u32,
    width:  u32,
    cells:  Vec<u16>,
}

impl TransitionGrid {
    /// An empty grid (no track anywhere).
    pub fn new(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            cells: vec![0; height as usize * width as usize],
        }
    }

    /// Build from nested rows of transition codes (the usual scenario-file
    /// layout).  All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<u16>>) -> CoreResult<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(height * width);
        for (row, codes) in rows.into_iter().enumerate() {
            if codes.len() != width {
                return Err(CoreError::RaggedGrid { row, expected: width, got: codes.len() });
            }
            cells.extend(codes);
        }
        let height = u32::try_from(height).map_err(|_| CoreError::Config("grid too tall".into()))?;
        let width = u32::try_from(width).map_err(|_| CoreError::Config("grid too wide".into()))?;
        Ok(Self { height, width, cells })
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    /// Traversal hop budget: `height * width * depth_factor`.
    #[inline]
    pub fn hop_budget(&self, depth_factor: u32) -> u64 {
        self.height as u64 * self.width as u64 * depth_factor as u64
    }

    /// The neighbouring cell in `dir`, or `None` when it lies off the grid.
    #[inline]
    pub fn step(&self, pos: Position, dir: Direction) -> Option<Position> {
        pos.step(dir).filter(|p| self.contains(*p))
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Position { row, col }))
    }

    #[inline]
    fn offset(&self, pos: Position) -> usize {
        pos.row as usize * self.width as usize + pos.col as usize
    }

    /// Raw transition code of `pos`; 0 for positions off the grid.
    #[inline]
    pub fn cell(&self, pos: Position) -> u16 {
        if self.contains(pos) { self.cells[self.offset(pos)] } else { 0 }
    }

    pub fn set_cell(&mut self, pos: Position, code: u16) -> CoreResult<()> {
        if !self.contains(pos) {
            return Err(CoreError::OutOfBounds(pos));
        }
        let i = self.offset(pos);
        self.cells[i] = code;
        Ok(())
    }

    /// Permitted exits for a train in `pos` travelling with `heading`.
    #[inline]
    pub fn transitions(&self, pos: Position, heading: Direction) -> Exits {
        let nibble = (self.cell(pos) >> ((3 - heading.index()) * 4)) & 0xF;
        Direction::ALL
            .into_iter()
            .filter(|e| nibble & (1 << (3 - e.index())) != 0)
            .fold(Exits::NONE, Exits::with)
    }

    /// Union of permitted exits over all headings.
    pub fn exits(&self, pos: Position) -> Exits {
        Direction::ALL
            .into_iter()
            .fold(Exits::NONE, |acc, h| acc.union(self.transitions(pos, h)))
    }

    /// `true` if some heading offers more than one exit.
    pub fn is_switch(&self, pos: Position) -> bool {
        Direction::ALL.into_iter().any(|h| self.transitions(pos, h).count() > 1)
    }

    /// `true` for switches, dead ends, and crossings: any track cell that is
    /// not a plain two-sided through cell.
    pub fn is_decision_point(&self, pos: Position) -> bool {
        self.cell(pos) != 0 && (self.is_switch(pos) || self.exits(pos).count() != 2)
    }

    // ── Authoring helpers ─────────────────────────────────────────────────

    /// Allow (or forbid) leaving `pos` towards `exit` while heading `heading`.
    pub fn set_transition(
        &mut self,
        pos:     Position,
        heading: Direction,
        exit:    Direction,
        allowed: bool,
    ) -> CoreResult<()> {
        let bit = 1u16 << (15 - (heading.index() * 4 + exit.index()));
        let code = self.cell(pos);
        let code = if allowed { code | bit } else { code & !bit };
        self.set_cell(pos, code)
    }

    /// Lay a bidirectional track piece joining cell sides `a` and `b`.
    ///
    /// A train entering through side `a` travels with heading `a.opposite()`
    /// and leaves through side `b`, and vice versa.  `a == b` lays a dead end
    /// (the train turns around).
    pub fn add_track(&mut self, pos: Position, a: Direction, b: Direction) -> CoreResult<()> {
        self.set_transition(pos, a.opposite(), b, true)?;
        self.set_transition(pos, b.opposite(), a, true)
    }

    /// Lay a dead end reachable only through `side`.
    pub fn add_dead_end(&mut self, pos: Position, side: Direction) -> CoreResult<()> {
        self.add_track(pos, side, side)
    }
}
