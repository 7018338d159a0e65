//! Tape-language source parser
//!
//! This module transforms source text into a finished instruction sequence:
//! - [`lexer`]: tokenization (comment stripping, run collapsing, flat-loop
//!   isolation, trace markers)
//! - [`parser`]: classification and jump resolution (tokens → [`instruction::Program`])
//! - [`instruction`]: instruction and program definitions
//!
//! # Loop folding
//!
//! The parser is also the optimizer. A *flat* loop (a bracket pair whose
//! body is only `+ - < >`) never reaches the engine as a loop at all; it is
//! folded into one of three closed instructions:
//! - `Skip`: the body only moves the pointer (`[>]`, `[<<]`)
//! - `LinearCombine`: the pointer returns home and the pivot cell nets
//!   exactly −1 per pass (`[->+<]`, `[-]`); runs in time independent of the
//!   pivot value
//! - `GeneralLoop`: everything else; one compiled pass per iteration
//!
//! Loops containing I/O, nested brackets, or any other character parse
//! generically into `LoopOpen`/`LoopClose` pairs with mutually resolved
//! jump targets.
//!
//! # Parser implementation
//!
//! Hand-written single-pass recursive parser. No external parser generator
//! dependencies.

pub mod instruction;
pub mod lexer;
pub mod parser;
