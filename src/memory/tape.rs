//! Cyclic tape and address arithmetic

use super::{ADDR_MASK, TAPE_CAPACITY};
use std::fmt;
use std::ops::{Index, IndexMut};

/// A tape address.
///
/// Always in range: every constructor and offset reduces modulo
/// [`TAPE_CAPACITY`], so wraparound cannot be forgotten at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Addr(usize);

impl Addr {
    pub fn new(index: usize) -> Self {
        Addr(index & ADDR_MASK)
    }

    /// The address a signed delta away, wrapping in either direction.
    pub fn offset(self, delta: i64) -> Self {
        Addr((self.0 as i64 + delta) as usize & ADDR_MASK)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

/// The fixed-capacity cell array.
///
/// Cells are full-width integers narrowed to their low 8 bits only on
/// observation (see [`Tape::narrow`]).
pub struct Tape {
    cells: Vec<i64>,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            cells: vec![0; TAPE_CAPACITY],
        }
    }

    /// Truncate the cell at `addr` to its low 8 bits in place and return the
    /// resulting byte. This is the single observation point for zero tests
    /// and output.
    pub fn narrow(&mut self, addr: Addr) -> u8 {
        let cell = &mut self.cells[addr.index()];
        *cell &= 0xff;
        *cell as u8
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Addr> for Tape {
    type Output = i64;

    fn index(&self, addr: Addr) -> &i64 {
        &self.cells[addr.index()]
    }
}

impl IndexMut<Addr> for Tape {
    fn index_mut(&mut self, addr: Addr) -> &mut i64 {
        &mut self.cells[addr.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_revolution_returns_home() {
        let addr = Addr::new(7);
        assert_eq!(addr.offset(TAPE_CAPACITY as i64), addr);
        assert_eq!(addr.offset(-(TAPE_CAPACITY as i64)), addr);
    }

    #[test]
    fn test_backward_wrap_from_zero() {
        let addr = Addr::new(0);
        assert_eq!(addr.offset(-1).index(), TAPE_CAPACITY - 1);
    }

    #[test]
    fn test_forward_wrap_at_capacity() {
        let addr = Addr::new(TAPE_CAPACITY - 1);
        assert_eq!(addr.offset(1).index(), 0);
    }

    #[test]
    fn test_new_reduces_out_of_range_index() {
        assert_eq!(Addr::new(TAPE_CAPACITY + 5).index(), 5);
    }

    #[test]
    fn test_narrow_truncates_in_place() {
        let mut tape = Tape::new();
        let addr = Addr::new(0);

        tape[addr] = 256;
        assert_eq!(tape.narrow(addr), 0);
        assert_eq!(tape[addr], 0);

        tape[addr] = 257;
        assert_eq!(tape.narrow(addr), 1);
        assert_eq!(tape[addr], 1);
    }

    #[test]
    fn test_narrow_of_negative_cell() {
        let mut tape = Tape::new();
        let addr = Addr::new(42);

        tape[addr] = -1;
        assert_eq!(tape.narrow(addr), 255);
        assert_eq!(tape[addr], 255);
    }
}
