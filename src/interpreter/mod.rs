//! Execution engine for compiled tape programs
//!
//! This module provides the core execution logic:
//! - [`engine`]: the machine (tape + pointer + program counter) and the
//!   per-instruction semantics
//! - [`errors`]: runtime error types
//!
//! # Execution model
//!
//! The engine consumes the instruction sequence by program counter,
//! advancing by one after every instruction; jump instructions redirect the
//! counter to their partner before the advance. Folded loop instructions
//! (`LinearCombine`, `Skip`, `GeneralLoop`) complete their entire source
//! loop inside a single step.

pub mod engine;
pub mod errors;
