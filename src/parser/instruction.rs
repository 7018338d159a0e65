// Instruction model for the tape-language interpreter

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A single compiled instruction.
///
/// The parser collapses symbol runs and folds recognized loop idioms, so one
/// instruction may stand for many source symbols. Jump targets in
/// [`Instruction::LoopOpen`] and [`Instruction::LoopClose`] are indices into
/// the owning [`Program`]; each one points at its partner, so the engine's
/// post-step advance lands one past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Add a net delta to the current cell (collapsed `+`/`-` run).
    MemAdd(i64),
    /// Move the pointer by a net delta (collapsed `<`/`>` run).
    PtrMove(i64),
    /// Narrow the current cell and emit it as one byte.
    Output,
    /// Read one byte into the current cell; 255 on end of stream.
    Input,
    /// `[`: narrow and test the current cell; jump to the matching close
    /// when zero.
    LoopOpen(usize),
    /// `]`: narrow and test the current cell; jump back to the matching
    /// open when nonzero.
    LoopClose(usize),
    /// A balanced decrement loop folded to its closed form: zero the pivot
    /// cell and add `pivot * factor` at each nonzero offset. Offsets are
    /// unique, nonzero, and sorted.
    LinearCombine(Vec<(i64, i64)>),
    /// A pure scan loop: stride the pointer until it lands on a zero cell.
    Skip(i64),
    /// A flat loop with no closed form: apply every `(offset, delta)` and
    /// stride the pointer, once per iteration, until the pivot narrows to
    /// zero. Deltas are sorted by offset; empty deltas with stride 0 is the
    /// degenerate `[]` loop.
    GeneralLoop { deltas: Vec<(i64, i64)>, stride: i64 },
    /// A preserved `#{...}` marker; surfaces at runtime as a trace
    /// notification carrying the literal interior text.
    TraceEvent(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::MemAdd(d) => write!(f, "mem {:+}", d),
            Instruction::PtrMove(d) => write!(f, "ptr {:+}", d),
            Instruction::Output => write!(f, "out"),
            Instruction::Input => write!(f, "in"),
            Instruction::LoopOpen(t) => write!(f, "open -> {}", t),
            Instruction::LoopClose(t) => write!(f, "close -> {}", t),
            Instruction::LinearCombine(pairs) => write!(f, "linear {:?}", pairs),
            Instruction::Skip(stride) => write!(f, "skip {:+}", stride),
            Instruction::GeneralLoop { deltas, stride } => {
                write!(f, "loop {:?} stride {:+}", deltas, stride)
            }
            Instruction::TraceEvent(text) => write!(f, "trace {:?}", text),
        }
    }
}

/// A finished instruction sequence with resolved jump targets.
///
/// Built once by the parser and immutable afterwards. Invariant: every
/// `LoopOpen(t)` has `ops[t] == LoopClose(s)` with `ops[s]` the same
/// `LoopOpen`, and loop pairs nest properly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub ops: Vec<Instruction>,
}

impl Program {
    pub fn new(ops: Vec<Instruction>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
