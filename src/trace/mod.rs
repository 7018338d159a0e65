//! Trace-event boundary
//!
//! The engine forwards named span markers found in the source to a
//! [`TraceSink`]. The sink is an injectable capability: the engine holds one
//! by value, defaults to the no-op [`NullSink`], never waits on it, and a
//! sink can never touch tape, pointer, or program counter. Everything beyond
//! the notification (pairing, buffering, shipping) lives on the collector
//! side ([`SpanRecorder`] here, [`agent`] for the wire).
//!
//! A marker `#{push:Name}` begins the span `Name`; `#{pop:Name}` ends it.
//! Any other marker payload is inert (and only visible via the debug echo).

pub mod agent;

use std::time::SystemTime;

/// Receiver for span begin/end notifications emitted by the engine.
pub trait TraceSink {
    fn span_begin(&mut self, name: &str, at: SystemTime, pc: usize);
    fn span_end(&mut self, name: &str, at: SystemTime, pc: usize);
}

/// The default sink: ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn span_begin(&mut self, _name: &str, _at: SystemTime, _pc: usize) {}
    fn span_end(&mut self, _name: &str, _at: SystemTime, _pc: usize) {}
}

/// A recognized span marker payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanMarker<'a> {
    Begin(&'a str),
    End(&'a str),
}

impl<'a> SpanMarker<'a> {
    /// Parse a trace-event payload. Returns `None` for payloads that are
    /// neither `push:<name>` nor `pop:<name>`.
    pub fn parse(text: &'a str) -> Option<Self> {
        if let Some(name) = text.strip_prefix("push:") {
            Some(SpanMarker::Begin(name))
        } else {
            text.strip_prefix("pop:").map(SpanMarker::End)
        }
    }
}

/// A completed span as recorded by [`SpanRecorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    pub name: String,
    pub start: SystemTime,
    pub stop: SystemTime,
    /// Program counter at the moment the span ended.
    pub pc: usize,
}

/// Collector implementation that pairs begin/end notifications into
/// [`SpanRecord`]s.
///
/// Ends are matched against a stack of open spans. An end with no open span
/// is dropped; an end whose name differs from the top of the stack warns and
/// closes the top entry anyway. [`SpanRecorder::finish`] closes anything
/// still open using the last completed stop time.
pub struct SpanRecorder {
    open: Vec<(String, SystemTime, usize)>,
    records: Vec<SpanRecord>,
    start_time: SystemTime,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self {
            open: Vec::new(),
            records: Vec::new(),
            start_time: SystemTime::now(),
        }
    }

    /// The moment the recorder was created; used as the controller span's
    /// start when reporting.
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    pub fn records(&self) -> &[SpanRecord] {
        &self.records
    }

    /// Close every still-open span. Orphans get the stop time of the last
    /// completed record, or their own start time when nothing completed.
    pub fn finish(&mut self) {
        while let Some((name, start, pc)) = self.open.pop() {
            let stop = self.records.last().map(|r| r.stop).unwrap_or(start);
            self.records.push(SpanRecord {
                name,
                start,
                stop,
                pc,
            });
        }
    }
}

impl Default for SpanRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for SpanRecorder {
    fn span_begin(&mut self, name: &str, at: SystemTime, pc: usize) {
        self.open.push((name.to_string(), at, pc));
    }

    fn span_end(&mut self, name: &str, at: SystemTime, pc: usize) {
        let Some((open_name, start, _)) = self.open.pop() else {
            return;
        };
        if open_name != name {
            eprintln!(
                "Warning: span '{}' ended while '{}' was open",
                name, open_name
            );
        }
        self.records.push(SpanRecord {
            name: open_name,
            start,
            stop: at,
            pc,
        });
    }
}
