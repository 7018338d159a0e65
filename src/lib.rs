//! # Introduction
//!
//! tapefold compiles programs written in the classic eight-symbol
//! tape-and-pointer language into an instruction sequence, folding common
//! loop idioms into closed-form instructions, and executes the result
//! against a cyclic 2²⁴-cell tape.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser/Classifier → Program → Engine → Output
//!                                                  ↓
//!                                             TraceSink → Agent
//! ```
//!
//! 1. [`parser`]: tokenizes the source (collapsing symbol runs and
//!    isolating flat loops), classifies loop idioms, and resolves jump
//!    targets into a finished [`parser::instruction::Program`].
//! 2. [`interpreter`]: the machine, executing the program against a
//!    [`memory::tape::Tape`] with byte-at-a-time I/O.
//! 3. [`memory`]: the cyclic tape and its always-in-range addressing.
//! 4. [`trace`]: the span-marker boundary: an injectable
//!    [`trace::TraceSink`], a recorder that pairs spans, and a Unix-socket
//!    agent client for shipping them out of process.
//!
//! ## Loop folding
//!
//! A loop whose body contains only `+ - < >` never executes as a loop. A
//! pure pointer scan becomes a single stride-until-zero instruction; a
//! balanced single-decrement loop becomes one closed-form multiply-add whose
//! cost is independent of the iteration count; everything else becomes a
//! compiled pass applied once per iteration. Loops with I/O or nesting run
//! as ordinary jump pairs.

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod trace;
