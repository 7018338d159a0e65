//! Memory model for the tape machine
//!
//! This module provides the cyclic tape and its addressing:
//! - [`tape::Addr`]: a tape address, reduced modulo the capacity on every
//!   construction and offset, so no out-of-range address can exist
//! - [`tape::Tape`]: the fixed-capacity cell array with in-place 8-bit
//!   narrowing on observation
//!
//! # Numeric semantics
//!
//! Cells hold full-width signed integers; arithmetic never wraps at a byte
//! boundary on its own. The low 8 bits become authoritative only when a cell
//! is *observed* (tested for zero by a loop, or emitted as output), at which
//! point the cell is truncated in place as a visible side effect. A cell that
//! reached 256 through arithmetic therefore tests as zero, while a folded
//! loop that consumes the cell before any observation sees the full 256.

pub mod tape;

/// Number of cells on the tape. Addressing is cyclic modulo this capacity.
pub const TAPE_CAPACITY: usize = 1 << 24;

/// Mask equivalent to reduction modulo [`TAPE_CAPACITY`].
pub const ADDR_MASK: usize = TAPE_CAPACITY - 1;
