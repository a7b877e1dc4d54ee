//! Terminal device abstraction.
//!
//! [`Backend`] is the seam every screen mutation goes through. The writer
//! engine is written entirely against this trait so the same engine runs on
//! a real terminal ([`CrosstermBackend`]) and on the in-memory emulator
//! ([`TestBackend`]) used by the test suite.
//!
//! The trait deliberately exposes the *legacy* device model: a bounded
//! buffer of `buffer_size()` rows, a single pair of current color
//! registers, and a cursor that clamps at the last row while the buffer
//! scrolls underneath it. Modern escape-sequence styling is an
//! implementation detail of the crossterm backend.

mod crossterm;
mod test;

pub use self::crossterm::CrosstermBackend;
pub use self::test::TestBackend;

use crate::style::Color;
use std::io;

/// The visible sub-range of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible buffer row.
    pub top: u16,
    /// Number of visible rows.
    pub height: u16,
}

/// A single decoded keypress, the unit the raw-mode readers consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Escape.
    Esc,
    /// Any other key; ignored by the readers.
    Other,
}

/// A terminal device the writer engine can drive.
///
/// Implementations are not required to be internally synchronized; the
/// session serializes every call under its own lock.
pub trait Backend: Send {
    /// Buffer dimensions `(columns, rows)`.
    ///
    /// An error here at session construction disables position tracking
    /// entirely (the session degrades to plain sequential output).
    fn buffer_size(&self) -> io::Result<(u16, u16)>;

    /// The currently visible window within the buffer.
    fn viewport(&self) -> io::Result<Viewport>;

    /// Live cursor position `(column, row)`.
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    /// Move the cursor to an absolute position.
    fn move_cursor(&mut self, col: u16, row: u16) -> io::Result<()>;

    /// Show the cursor.
    fn show_cursor(&mut self) -> io::Result<()>;

    /// Hide the cursor.
    fn hide_cursor(&mut self) -> io::Result<()>;

    /// Write text at the cursor using the current color registers,
    /// advancing (and possibly wrapping/scrolling) the cursor.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Blank the row under the cursor.
    fn clear_line(&mut self) -> io::Result<()>;

    /// Current foreground register.
    fn foreground(&self) -> Color;

    /// Current background register.
    fn background(&self) -> Color;

    /// Set the foreground register.
    fn set_foreground(&mut self, color: Color) -> io::Result<()>;

    /// Set the background register.
    fn set_background(&mut self, color: Color) -> io::Result<()>;

    /// Flush any buffered output to the device.
    fn flush(&mut self) -> io::Result<()>;

    /// Whether the device interprets escape sequences (zero-width) rather
    /// than printing them as glyphs. Feeds the wrap calculator.
    fn escape_processing(&self) -> bool;

    /// Enter raw mode for key-at-a-time input.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Leave raw mode.
    fn leave_raw_mode(&mut self) -> io::Result<()>;

    /// Cooked-mode line read (the device echoes and line-edits itself).
    fn read_line(&mut self) -> io::Result<String>;

    /// Blocking read of one decoded keypress (raw mode).
    fn read_key(&mut self) -> io::Result<Key>;
}
