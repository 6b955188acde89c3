//! Status output for archive operations
//!
//! The writer and extractor report one human-readable line per entry
//! (`adding: x`, `inflating: y`). Callers decide where those lines go by
//! passing a [`StatusSink`]; any [`std::io::Write`] works, and [`Discard`]
//! drops everything.

use std::io::Write;

/// Receiver for line-oriented progress messages
pub trait StatusSink {
    /// Report a single status line (without trailing newline)
    fn status(&mut self, line: &str);
}

/// Writers get the Info-ZIP layout: two-space indent, newline terminated.
/// Write failures are ignored.
impl<W: Write> StatusSink for W {
    fn status(&mut self, line: &str) {
        let _ = writeln!(self, "  {}", line);
    }
}

/// Sink that silently discards all status lines
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl StatusSink for Discard {
    fn status(&mut self, _line: &str) {}
}
