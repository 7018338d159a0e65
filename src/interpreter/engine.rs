// Execution engine for compiled tape programs

use crate::interpreter::errors::RuntimeError;
use crate::memory::tape::{Addr, Tape};
use crate::parser::instruction::{Instruction, Program};
use crate::trace::{NullSink, SpanMarker, TraceSink};
use std::io::{ErrorKind, Read, Write};
use std::time::SystemTime;

/// Environment variable that echoes trace-marker payloads to stderr.
pub const DEBUG_ENV: &str = "TAPEFOLD_DEBUG";

/// The machine: a compiled program, the cyclic tape, a data pointer, and a
/// program counter, wired to byte streams and a trace sink.
///
/// Execution is fully synchronous and single-threaded; the only suspension
/// points are the byte-level read and write. The trace sink is notified and
/// never waited on. The machine runs until the program counter passes the
/// last instruction, or forever if the program's own logic never terminates.
pub struct Interpreter<R: Read, W: Write, S: TraceSink = NullSink> {
    program: Program,

    /// The cyclic memory tape.
    tape: Tape,

    /// Data pointer, always reduced into tape range.
    ptr: Addr,

    /// Program counter: index of the instruction being executed.
    pc: usize,

    /// Byte-at-a-time input stream.
    input: R,

    /// Byte-at-a-time output stream.
    output: W,

    /// Span notification receiver.
    trace: S,

    /// Echo trace markers to stderr (set via [`DEBUG_ENV`]).
    debug_markers: bool,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    /// Create a machine with the default no-op trace sink.
    pub fn new(program: Program, input: R, output: W) -> Self {
        Self::with_trace(program, input, output, NullSink)
    }
}

impl<R: Read, W: Write, S: TraceSink> Interpreter<R, W, S> {
    /// Create a machine that notifies `trace` of span markers.
    pub fn with_trace(program: Program, input: R, output: W, trace: S) -> Self {
        Self {
            program,
            tape: Tape::new(),
            ptr: Addr::default(),
            pc: 0,
            input,
            output,
            trace,
            debug_markers: std::env::var_os(DEBUG_ENV).is_some(),
        }
    }

    /// Execute the program to completion.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.pc < self.program.len() {
            self.step()?;
            self.pc += 1;
        }
        Ok(())
    }

    /// Execute the instruction under the program counter. Jump instructions
    /// set the counter to their partner's index; the post-step advance in
    /// [`Interpreter::run`] then lands one past it.
    fn step(&mut self) -> Result<(), RuntimeError> {
        match &self.program.ops[self.pc] {
            Instruction::MemAdd(delta) => {
                self.tape[self.ptr] += delta;
            }

            Instruction::PtrMove(delta) => {
                self.ptr = self.ptr.offset(*delta);
            }

            Instruction::Output => {
                let byte = self.tape.narrow(self.ptr);
                self.output
                    .write_all(&[byte])
                    .map_err(RuntimeError::OutputFailed)?;
            }

            Instruction::Input => {
                self.tape[self.ptr] = read_byte(&mut self.input)? as i64;
            }

            Instruction::LoopOpen(target) => {
                let target = *target;
                if self.tape.narrow(self.ptr) == 0 {
                    self.pc = target;
                }
            }

            Instruction::LoopClose(target) => {
                let target = *target;
                if self.tape.narrow(self.ptr) != 0 {
                    self.pc = target;
                }
            }

            Instruction::LinearCombine(pairs) => {
                // The pivot is read at full width: a folded loop consumes the
                // cell before any narrowing observation.
                let pivot = self.tape[self.ptr];
                self.tape[self.ptr] = 0;
                for &(offset, factor) in pairs {
                    let addr = self.ptr.offset(offset);
                    self.tape[addr] += pivot * factor;
                }
            }

            Instruction::Skip(stride) => {
                let stride = *stride;
                while self.tape.narrow(self.ptr) != 0 {
                    self.ptr = self.ptr.offset(stride);
                }
            }

            Instruction::GeneralLoop { deltas, stride } => {
                while self.tape.narrow(self.ptr) != 0 {
                    for &(offset, delta) in deltas {
                        let addr = self.ptr.offset(offset);
                        self.tape[addr] += delta;
                    }
                    self.ptr = self.ptr.offset(*stride);
                }
            }

            Instruction::TraceEvent(text) => {
                if self.debug_markers {
                    eprintln!("{}", text);
                }
                match SpanMarker::parse(text) {
                    Some(SpanMarker::Begin(name)) => {
                        self.trace.span_begin(name, SystemTime::now(), self.pc);
                    }
                    Some(SpanMarker::End(name)) => {
                        self.trace.span_end(name, SystemTime::now(), self.pc);
                    }
                    None => {}
                }
            }
        }

        Ok(())
    }

    /// The tape, for inspection after (or between) runs.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Mutable access to the tape, for seeding cells before a run.
    pub fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    /// Current data pointer.
    pub fn pointer(&self) -> Addr {
        self.ptr
    }

    /// Recover the trace sink, consuming the machine.
    pub fn into_trace(self) -> S {
        self.trace
    }
}

/// Read one byte. End of stream yields the sentinel 255, not an error.
fn read_byte<R: Read>(input: &mut R) -> Result<u8, RuntimeError> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(255),
            Ok(_) => return Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RuntimeError::InputFailed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TAPE_CAPACITY;
    use crate::parser::parser::Parser;
    use std::io::empty;

    fn compile(source: &str) -> Program {
        Parser::new(source).parse_program().expect("Parsing failed")
    }

    fn run_collecting(source: &str, input: &[u8]) -> Vec<u8> {
        let mut output = Vec::new();
        let mut machine = Interpreter::new(compile(source), input, &mut output);
        machine.run().expect("Execution failed");
        drop(machine);
        output
    }

    #[test]
    fn test_mem_and_output() {
        assert_eq!(run_collecting("+++.", &[]), vec![3]);
    }

    #[test]
    fn test_input_echo() {
        assert_eq!(run_collecting(",.", b"A"), vec![65]);
    }

    #[test]
    fn test_input_exhausted_stores_sentinel() {
        assert_eq!(run_collecting(",.", &[]), vec![255]);
    }

    #[test]
    fn test_generic_loop_countdown() {
        // Not flat (contains output), so it runs through LoopOpen/LoopClose.
        assert_eq!(run_collecting("+++[.-]", &[]), vec![3, 2, 1]);
    }

    #[test]
    fn test_loop_skipped_when_cell_zero() {
        assert_eq!(run_collecting("[.]+.", &[]), vec![1]);
    }

    #[test]
    fn test_linear_combine_pre_narrow_pivot() {
        // 16 * 16 = 256 lands in the second cell without ever being
        // observed; the fold must move the full 256, not the narrowed 0.
        let program = compile("[->++++++++++++++++<]>[->+<]");
        let mut machine = Interpreter::new(program, empty(), Vec::new());
        machine.tape[Addr::new(0)] = 16;
        machine.run().expect("Execution failed");

        assert_eq!(machine.tape()[Addr::new(2)], 256);
        assert_eq!(machine.tape()[Addr::new(1)], 0);
    }

    #[test]
    fn test_narrowing_is_an_observable_side_effect() {
        // The loop test narrows the cell in place; afterwards the cell
        // holds 0, not 256.
        let program = compile("[.]");
        let mut machine = Interpreter::new(program, empty(), Vec::new());
        machine.tape[Addr::new(0)] = 256;
        machine.run().expect("Execution failed");

        assert_eq!(machine.tape()[Addr::new(0)], 0);
    }

    #[test]
    fn test_skip_halts_on_zero_without_touching_cells() {
        let program = compile(">[>]");
        let mut machine = Interpreter::new(program, empty(), Vec::new());
        machine.tape[Addr::new(1)] = 5;
        machine.tape[Addr::new(2)] = 7;
        // Cell 3 is zero: the scan must stop exactly there.
        machine.run().expect("Execution failed");

        assert_eq!(machine.pointer(), Addr::new(3));
        assert_eq!(machine.tape()[Addr::new(1)], 5);
        assert_eq!(machine.tape()[Addr::new(2)], 7);
    }

    #[test]
    fn test_pointer_wraps_backward() {
        let program = compile("<+.");
        let mut machine = Interpreter::new(program, empty(), Vec::new());
        machine.run().expect("Execution failed");

        assert_eq!(machine.pointer(), Addr::new(TAPE_CAPACITY - 1));
        assert_eq!(machine.tape()[Addr::new(TAPE_CAPACITY - 1)], 1);
    }

    #[test]
    fn test_trace_markers_reach_the_sink() {
        use crate::trace::SpanRecorder;

        let program = compile("#{push:Body}+++#{pop:Body}");
        let mut machine =
            Interpreter::with_trace(program, empty(), Vec::new(), SpanRecorder::new());
        machine.run().expect("Execution failed");

        let recorder = machine.into_trace();
        assert_eq!(recorder.records().len(), 1);
        assert_eq!(recorder.records()[0].name, "Body");
        // pc of the closing marker: instructions are trace, mem, trace.
        assert_eq!(recorder.records()[0].pc, 2);
    }

    #[test]
    fn test_unrecognized_marker_is_inert() {
        use crate::trace::SpanRecorder;

        let program = compile("#{just a note}+");
        let mut machine =
            Interpreter::with_trace(program, empty(), Vec::new(), SpanRecorder::new());
        machine.run().expect("Execution failed");

        assert!(machine.into_trace().records().is_empty());
    }
}
