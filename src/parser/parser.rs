//! Parser and loop classifier
//!
//! Consumes the token stream and produces a finished [`Program`]. Flat loops
//! (already isolated by the lexer) are classified algebraically into one of
//! three folded instructions; generic bracket pairs are parsed by recursive
//! re-entry, with each recursive call returning its own finished sublist and
//! the caller relocating jump targets while splicing.

use crate::parser::instruction::{Instruction, Program, SourceLocation};
use crate::parser::lexer::{Lexer, Token};
use rustc_hash::FxHashMap;
use std::fmt;

/// Parser error type
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Recursive parser over the token stream
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        Self {
            tokens: lexer.tokenize(),
            position: 0,
        }
    }

    /// Parse the entire source into a program with resolved jump targets.
    ///
    /// Fails on an unmatched `]` (close with no open loop) or an unmatched
    /// `[` (still open at end of source); both abort before any execution.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let ops = self.parse_sequence(0)?;
        Ok(Program::new(ops))
    }

    /// Parse instructions until end of source or, at `depth > 0`, an
    /// unconsumed `]` belonging to the caller. Jump targets in the returned
    /// sublist are relative to its own start.
    fn parse_sequence(&mut self, depth: usize) -> Result<Vec<Instruction>, ParseError> {
        let mut ops = Vec::new();

        loop {
            match self.peek().clone() {
                Token::Eof(_) => break,
                Token::LoopClose(loc) => {
                    if depth == 0 {
                        return Err(ParseError {
                            message: "unmatched ']' with no open loop".to_string(),
                            location: loc,
                        });
                    }
                    // The caller consumes the close.
                    break;
                }
                Token::ArithRun(n, _) => {
                    self.advance();
                    ops.push(Instruction::MemAdd(n));
                }
                Token::MoveRun(n, _) => {
                    self.advance();
                    ops.push(Instruction::PtrMove(n));
                }
                Token::Output(_) => {
                    self.advance();
                    ops.push(Instruction::Output);
                }
                Token::Input(_) => {
                    self.advance();
                    ops.push(Instruction::Input);
                }
                Token::Trace(text, _) => {
                    self.advance();
                    ops.push(Instruction::TraceEvent(text));
                }
                Token::FlatLoop(interior, _) => {
                    self.advance();
                    ops.push(classify_flat_loop(&interior));
                }
                Token::LoopOpen(loc) => {
                    self.advance();
                    let body = self.parse_sequence(depth + 1)?;

                    match self.peek() {
                        Token::LoopClose(_) => {
                            self.advance();
                        }
                        _ => {
                            return Err(ParseError {
                                message: "unmatched '[' still open at end of source"
                                    .to_string(),
                                location: loc,
                            });
                        }
                    }

                    let open_at = ops.len();
                    let close_at = open_at + body.len() + 1;
                    ops.push(Instruction::LoopOpen(close_at));
                    splice(&mut ops, body);
                    ops.push(Instruction::LoopClose(open_at));
                }
            }
        }

        Ok(ops)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }
}

/// Append a finished sublist, relocating its block-relative jump targets to
/// the splice point.
fn splice(ops: &mut Vec<Instruction>, block: Vec<Instruction>) {
    let offset = ops.len();
    for ins in block {
        ops.push(match ins {
            Instruction::LoopOpen(target) => Instruction::LoopOpen(target + offset),
            Instruction::LoopClose(target) => Instruction::LoopClose(target + offset),
            other => other,
        });
    }
}

/// Classify a flat loop body into its folded instruction.
///
/// Walks the interior with a running pointer offset and a map of net cell
/// deltas. Three outcomes:
/// - the pointer moves but no cell is touched: a pure scan, [`Instruction::Skip`];
/// - the pointer returns home and the pivot decrements by exactly one net per
///   pass: the loop runs exactly `pivot` iterations, so it folds to
///   [`Instruction::LinearCombine`] over the nonzero offsets;
/// - anything else (including the empty `[]` body): [`Instruction::GeneralLoop`],
///   which keeps iterate-until-zero semantics without per-symbol dispatch.
fn classify_flat_loop(interior: &str) -> Instruction {
    let mut ptr: i64 = 0;
    let mut addsub: FxHashMap<i64, i64> = FxHashMap::default();

    for ch in interior.chars() {
        match ch {
            '+' => *addsub.entry(ptr).or_insert(0) += 1,
            '-' => *addsub.entry(ptr).or_insert(0) -= 1,
            '>' => ptr += 1,
            '<' => ptr -= 1,
            // The lexer only admits the four symbols above into a flat loop.
            other => unreachable!("'{}' inside a flat loop body", other),
        }
    }

    if ptr != 0 && addsub.is_empty() {
        Instruction::Skip(ptr)
    } else if ptr == 0 && addsub.get(&0).copied().unwrap_or(0) == -1 {
        let mut pairs: Vec<(i64, i64)> = addsub
            .into_iter()
            .filter(|&(offset, _)| offset != 0)
            .collect();
        pairs.sort_unstable_by_key(|&(offset, _)| offset);
        Instruction::LinearCombine(pairs)
    } else {
        let mut deltas: Vec<(i64, i64)> = addsub.into_iter().collect();
        deltas.sort_unstable_by_key(|&(offset, _)| offset);
        Instruction::GeneralLoop {
            deltas,
            stride: ptr,
        }
    }
}
