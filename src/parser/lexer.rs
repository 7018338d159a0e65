//! Lexer (tokenizer) for the tape language
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the
//! parser. Symbol runs are collapsed at this stage: a maximal `+`/`-` run
//! becomes one [`Token::ArithRun`] carrying its net delta, and likewise for
//! `<`/`>` runs. A bracket pair whose interior is exclusively the four
//! movement/arithmetic symbols lexes as a single [`Token::FlatLoop`] so the
//! parser can fold it; any other character inside the pair (including
//! whitespace) breaks flatness and the brackets lex individually.
//!
//! Comment conventions: `#` followed by a space discards the rest of the
//! line; `#{...}` is preserved verbatim as a [`Token::Trace`] marker (the
//! marker must close on its own line, otherwise the characters scan
//! normally). Every other character outside the eight commands is ignored.

use super::instruction::SourceLocation;
use std::fmt;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A maximal bracket pair containing only `+ - < >` (possibly empty).
    /// Carries the literal interior text.
    FlatLoop(String, SourceLocation),
    /// A maximal `+`/`-` run, collapsed to its net delta.
    ArithRun(i64, SourceLocation),
    /// A maximal `<`/`>` run, collapsed to its net delta.
    MoveRun(i64, SourceLocation),
    /// A `[` that did not qualify as a flat loop.
    LoopOpen(SourceLocation),
    /// A `]`.
    LoopClose(SourceLocation),
    /// A `.`.
    Output(SourceLocation),
    /// A `,`.
    Input(SourceLocation),
    /// A `#{...}` marker, carrying the literal interior text.
    Trace(String, SourceLocation),
    /// End of source.
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::FlatLoop(_, loc)
            | Token::ArithRun(_, loc)
            | Token::MoveRun(_, loc)
            | Token::LoopOpen(loc)
            | Token::LoopClose(loc)
            | Token::Output(loc)
            | Token::Input(loc)
            | Token::Trace(_, loc)
            | Token::Eof(loc) => *loc,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::FlatLoop(body, _) => write!(f, "flat loop '[{}]'", body),
            Token::ArithRun(n, _) => write!(f, "arithmetic run ({:+})", n),
            Token::MoveRun(n, _) => write!(f, "move run ({:+})", n),
            Token::LoopOpen(_) => write!(f, "'['"),
            Token::LoopClose(_) => write!(f, "']'"),
            Token::Output(_) => write!(f, "'.'"),
            Token::Input(_) => write!(f, "','"),
            Token::Trace(text, _) => write!(f, "trace marker '#{{{}}}'", text),
            Token::Eof(_) => write!(f, "end of source"),
        }
    }
}

/// Lexer for tape-language source text
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input.
    ///
    /// Never fails: characters that are not commands, markers, or comments
    /// are simply skipped.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            self.skip_ignored();

            if self.is_at_end() {
                tokens.push(Token::Eof(self.current_location()));
                break;
            }

            tokens.push(self.next_token());
        }

        tokens
    }

    /// Get the next token. Only called with the cursor on a command
    /// character or on the `#` of a well-formed trace marker.
    fn next_token(&mut self) -> Token {
        let loc = self.current_location();

        match self.peek().expect("next_token called at end of input") {
            '[' => self.bracket_open(loc),
            ']' => {
                self.advance();
                Token::LoopClose(loc)
            }
            '.' => {
                self.advance();
                Token::Output(loc)
            }
            ',' => {
                self.advance();
                Token::Input(loc)
            }
            '+' | '-' => {
                let mut net: i64 = 0;
                while let Some(ch) = self.peek() {
                    match ch {
                        '+' => net += 1,
                        '-' => net -= 1,
                        _ => break,
                    }
                    self.advance();
                }
                Token::ArithRun(net, loc)
            }
            '<' | '>' => {
                let mut net: i64 = 0;
                while let Some(ch) = self.peek() {
                    match ch {
                        '>' => net += 1,
                        '<' => net -= 1,
                        _ => break,
                    }
                    self.advance();
                }
                Token::MoveRun(net, loc)
            }
            '#' => self.trace_marker(loc),
            ch => unreachable!("skip_ignored left cursor on '{}'", ch),
        }
    }

    /// Lex a `[`: either a whole flat loop or a lone open bracket.
    fn bracket_open(&mut self, loc: SourceLocation) -> Token {
        let saved_position = self.position;
        let saved_column = self.column;

        self.advance(); // consume '['
        let interior_start = self.position;
        while matches!(self.peek(), Some('+' | '-' | '<' | '>')) {
            self.advance();
        }

        if self.peek() == Some(']') {
            let interior: String =
                self.input[interior_start..self.position].iter().collect();
            self.advance(); // consume ']'
            return Token::FlatLoop(interior, loc);
        }

        // Not flat: something other than + - < > before the close. Rewind
        // and emit the bracket alone. The interior scanned so far never
        // contains a newline, so restoring the column is enough.
        self.position = saved_position;
        self.column = saved_column;
        self.advance();
        Token::LoopOpen(loc)
    }

    /// Lex a `#{...}` marker. `skip_ignored` guarantees the closing `}` is
    /// present on this line.
    fn trace_marker(&mut self, loc: SourceLocation) -> Token {
        self.advance(); // consume '#'
        self.advance(); // consume '{'
        let start = self.position;
        while self.peek() != Some('}') {
            self.advance();
        }
        let text: String = self.input[start..self.position].iter().collect();
        self.advance(); // consume '}'
        Token::Trace(text, loc)
    }

    /// Consume characters until the cursor rests on something `next_token`
    /// handles: a command character, or the `#` of a marker that closes on
    /// its line. `# ` comments are discarded to end of line; a stray `#`
    /// (unclosed marker, or `#` followed by anything else) is dropped and
    /// whatever follows it scans normally.
    fn skip_ignored(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                '+' | '-' | '<' | '>' | '[' | ']' | '.' | ',' => return,
                '#' => match self.peek_next() {
                    Some('{') if self.marker_closes_on_line() => return,
                    Some(' ') => self.skip_line(),
                    _ => {
                        self.advance();
                    }
                },
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Whether the `#{` at the cursor has a matching `}` before the next
    /// newline or end of input.
    fn marker_closes_on_line(&self) -> bool {
        let mut pos = self.position + 2;
        while let Some(&ch) = self.input.get(pos) {
            match ch {
                '}' => return true,
                '\n' => return false,
                _ => pos += 1,
            }
        }
        false
    }

    /// Skip to the end of the current line (the newline itself goes through
    /// the ignored-character path).
    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                return;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_collapsing() {
        let mut lexer = Lexer::new("+++-- >><");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::ArithRun(1, _)));
        assert!(matches!(tokens[1], Token::MoveRun(1, _)));
        assert!(matches!(tokens[2], Token::Eof(_)));
    }

    #[test]
    fn test_flat_loop() {
        let mut lexer = Lexer::new("[->+<]");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::FlatLoop(ref s, _) if s == "->+<"));
        assert!(matches!(tokens[1], Token::Eof(_)));
    }

    #[test]
    fn test_empty_loop_is_flat() {
        let mut lexer = Lexer::new("[]");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::FlatLoop(ref s, _) if s.is_empty()));
    }

    #[test]
    fn test_whitespace_breaks_flatness() {
        let mut lexer = Lexer::new("[- -]");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::LoopOpen(_)));
        assert!(matches!(tokens[1], Token::ArithRun(-1, _)));
        assert!(matches!(tokens[2], Token::ArithRun(-1, _)));
        assert!(matches!(tokens[3], Token::LoopClose(_)));
    }

    #[test]
    fn test_io_breaks_flatness() {
        let mut lexer = Lexer::new("[-.]");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::LoopOpen(_)));
        assert!(matches!(tokens[1], Token::ArithRun(-1, _)));
        assert!(matches!(tokens[2], Token::Output(_)));
        assert!(matches!(tokens[3], Token::LoopClose(_)));
    }

    #[test]
    fn test_nested_brackets_break_flatness() {
        let mut lexer = Lexer::new("[[-]]");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::LoopOpen(_)));
        assert!(matches!(tokens[1], Token::FlatLoop(ref s, _) if s == "-"));
        assert!(matches!(tokens[2], Token::LoopClose(_)));
    }

    #[test]
    fn test_line_comments() {
        let mut lexer = Lexer::new("+ # add one, then [some] brackets\n-");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::ArithRun(1, _)));
        assert!(matches!(tokens[1], Token::ArithRun(-1, _)));
        assert!(matches!(tokens[2], Token::Eof(_)));
    }

    #[test]
    fn test_trace_marker() {
        let mut lexer = Lexer::new("+#{push:Work}-#{pop:Work}");
        let tokens = lexer.tokenize();

        assert!(matches!(tokens[0], Token::ArithRun(1, _)));
        assert!(matches!(tokens[1], Token::Trace(ref s, _) if s == "push:Work"));
        assert!(matches!(tokens[2], Token::ArithRun(-1, _)));
        assert!(matches!(tokens[3], Token::Trace(ref s, _) if s == "pop:Work"));
    }

    #[test]
    fn test_unclosed_marker_scans_normally() {
        let mut lexer = Lexer::new("#{++\n-");
        let tokens = lexer.tokenize();

        // The stray '#' and '{' are dropped; the interior is live code.
        assert!(matches!(tokens[0], Token::ArithRun(2, _)));
        assert!(matches!(tokens[1], Token::ArithRun(-1, _)));
    }

    #[test]
    fn test_bare_hash_ignored() {
        let mut lexer = Lexer::new("#!x\n+");
        let tokens = lexer.tokenize();

        // '#' without a following space or '{' is dropped; the rest of the
        // line scans as ordinary (ignored) characters.
        assert!(matches!(tokens[0], Token::ArithRun(1, _)));
        assert!(matches!(tokens[1], Token::Eof(_)));
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("+\n  ]");
        let tokens = lexer.tokenize();

        assert_eq!(tokens[0].location(), SourceLocation::new(1, 1));
        assert_eq!(tokens[1].location(), SourceLocation::new(2, 3));
    }
}
