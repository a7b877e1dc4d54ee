//! In-memory terminal emulator for tests.
//!
//! Models the legacy device the engine is specified against: a bounded
//! character grid whose cursor clamps at the last row while earlier rows
//! scroll away underneath it. The wrapping rules intentionally mirror the
//! [`wrap`](crate::wrap) module's model; the test suite asserts the two
//! stay equivalent.
//!
//! The backend is a cloneable handle over shared state, so a test can keep
//! a view of the screen after moving a clone into a
//! [`Session`](crate::session::Session):
//!
//! ```
//! use inkline::session::Session;
//! use inkline::terminal::TestBackend;
//!
//! let backend = TestBackend::new(40, 10);
//! let session = Session::with_backend(backend.clone());
//! session.write_line(&["hello"]).unwrap();
//! assert_eq!(backend.line(0), "hello");
//! ```

use super::{Backend, Key, Viewport};
use crate::style::Color;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Marker for the trailing half of a wide character.
    const CONTINUATION: char = '\0';

    const fn blank() -> Self {
        Self {
            ch: ' ',
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

#[derive(Debug)]
struct State {
    width: u16,
    height: u16,
    window_height: u16,
    grid: Vec<Vec<Cell>>,
    cursor: (u16, u16),
    cursor_visible: bool,
    raw_mode: bool,
    fg: Color,
    bg: Color,
    scrolled: u64,
    escape_processing: bool,
    report_size: bool,
    keys: VecDeque<Key>,
    lines: VecDeque<String>,
}

impl State {
    fn blank_row(&self) -> Vec<Cell> {
        vec![Cell::blank(); usize::from(self.width)]
    }

    /// Move to the next row, scrolling when already on the last one.
    fn advance_row(&mut self) {
        if self.cursor.1 + 1 >= self.height {
            self.grid.remove(0);
            let row = self.blank_row();
            self.grid.push(row);
            self.cursor.1 = self.height - 1;
            self.scrolled += 1;
        } else {
            self.cursor.1 += 1;
        }
    }

    fn wrap_line(&mut self) {
        self.cursor.0 = 0;
        self.advance_row();
    }

    fn put(&mut self, ch: char, w: u16) {
        let (x, y) = self.cursor;
        let row = &mut self.grid[usize::from(y)];
        row[usize::from(x)] = Cell {
            ch,
            fg: self.fg,
            bg: self.bg,
        };
        if w == 2 && usize::from(x) + 1 < row.len() {
            row[usize::from(x) + 1] = Cell {
                ch: Cell::CONTINUATION,
                fg: self.fg,
                bg: self.bg,
            };
        }
    }

    fn print(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\n' => {
                    self.cursor.0 = 0;
                    self.advance_row();
                }
                '\r' => self.cursor.0 = 0,
                '\t' => {
                    let mut target = (self.cursor.0 / 8 + 1) * 8;
                    while target >= self.width {
                        target -= self.width;
                        self.wrap_line();
                    }
                    self.cursor.0 = target;
                }
                '\u{8}' => self.cursor.0 = self.cursor.0.saturating_sub(1),
                '\u{1b}' if self.escape_processing => {
                    // Interpreted as a zero-width control unit; this device
                    // does not act on it beyond skipping it.
                    skip_escape(&mut chars);
                }
                _ => {
                    let w = if c == '\u{1b}' {
                        1
                    } else {
                        UnicodeWidthChar::width(c).unwrap_or(0) as u16
                    };
                    if w == 0 {
                        continue;
                    }
                    if w > 1 && self.cursor.0 + w > self.width {
                        self.wrap_line();
                    }
                    self.put(if c == '\u{1b}' { '^' } else { c }, w);
                    self.cursor.0 += w;
                    if self.cursor.0 >= self.width {
                        self.wrap_line();
                    }
                }
            }
        }
    }
}

fn skip_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    match chars.peek() {
        Some('[') => {
            chars.next();
            for c in chars.by_ref() {
                if matches!(c, '\u{40}'..='\u{7e}') {
                    break;
                }
            }
        }
        Some(']') => {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '\u{7}' {
                    break;
                }
                if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                    chars.next();
                    break;
                }
            }
        }
        Some(_) => {
            chars.next();
        }
        None => {}
    }
}

/// Cloneable in-memory [`Backend`].
#[derive(Debug, Clone)]
pub struct TestBackend {
    state: Arc<Mutex<State>>,
}

impl TestBackend {
    /// A blank grid of `width` columns by `height` rows, fully visible.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let mut state = State {
            width,
            height,
            window_height: height,
            grid: Vec::new(),
            cursor: (0, 0),
            cursor_visible: true,
            raw_mode: false,
            fg: Color::Default,
            bg: Color::Default,
            scrolled: 0,
            escape_processing: true,
            report_size: true,
            keys: VecDeque::new(),
            lines: VecDeque::new(),
        };
        state.grid = (0..height).map(|_| state.blank_row()).collect();
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Restrict the visible window to the bottom `height` rows of the
    /// buffer, leaving the rest addressable but out of sight.
    #[must_use]
    pub fn with_window_height(self, height: u16) -> Self {
        {
            let mut state = self.state.lock();
            assert!(height > 0 && height <= state.height);
            state.window_height = height;
        }
        self
    }

    /// A device that cannot report its buffer size; sessions built on it
    /// run with positioning unsupported.
    #[must_use]
    pub fn sizeless(width: u16, height: u16) -> Self {
        let backend = Self::new(width, height);
        backend.state.lock().report_size = false;
        backend
    }

    /// Treat escape sequences as printable glyphs instead of controls.
    #[must_use]
    pub fn without_escape_processing(self) -> Self {
        self.state.lock().escape_processing = false;
        self
    }

    /// Queue a key for the raw-mode readers.
    pub fn push_key(&self, key: Key) {
        self.state.lock().keys.push_back(key);
    }

    /// Queue every character of `text` as a key press, without a
    /// terminating Enter.
    pub fn push_keys(&self, text: &str) {
        let mut state = self.state.lock();
        state.keys.extend(text.chars().map(Key::Char));
    }

    /// Queue a cooked-mode input line.
    pub fn push_line(&self, line: impl Into<String>) {
        self.state.lock().lines.push_back(line.into());
    }

    /// Text of one row, trailing blanks trimmed.
    #[must_use]
    pub fn line(&self, row: u16) -> String {
        let state = self.state.lock();
        let cells = &state.grid[usize::from(row)];
        let mut s: String = cells
            .iter()
            .filter(|c| c.ch != Cell::CONTINUATION)
            .map(|c| c.ch)
            .collect();
        while s.ends_with(' ') {
            s.pop();
        }
        s
    }

    /// All rows, trailing blanks trimmed.
    #[must_use]
    pub fn contents(&self) -> Vec<String> {
        let height = self.state.lock().height;
        (0..height).map(|r| self.line(r)).collect()
    }

    /// Foreground color of the cell at `(col, row)`.
    #[must_use]
    pub fn fg_at(&self, col: u16, row: u16) -> Color {
        self.state.lock().grid[usize::from(row)][usize::from(col)].fg
    }

    /// Background color of the cell at `(col, row)`.
    #[must_use]
    pub fn bg_at(&self, col: u16, row: u16) -> Color {
        self.state.lock().grid[usize::from(row)][usize::from(col)].bg
    }

    /// Current cursor position `(column, row)`.
    #[must_use]
    pub fn cursor(&self) -> (u16, u16) {
        self.state.lock().cursor
    }

    /// Total rows scrolled off the top since creation.
    #[must_use]
    pub fn scrolled(&self) -> u64 {
        self.state.lock().scrolled
    }

    /// Whether the cursor is currently visible.
    #[must_use]
    pub fn is_cursor_visible(&self) -> bool {
        self.state.lock().cursor_visible
    }
}

impl Backend for TestBackend {
    fn buffer_size(&self) -> io::Result<(u16, u16)> {
        let state = self.state.lock();
        if state.report_size {
            Ok((state.width, state.height))
        } else {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "device does not report a buffer size",
            ))
        }
    }

    fn viewport(&self) -> io::Result<Viewport> {
        let state = self.state.lock();
        Ok(Viewport {
            top: state.height - state.window_height,
            height: state.window_height,
        })
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        Ok(self.state.lock().cursor)
    }

    fn move_cursor(&mut self, col: u16, row: u16) -> io::Result<()> {
        let mut state = self.state.lock();
        state.cursor = (col.min(state.width - 1), row.min(state.height - 1));
        Ok(())
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        self.state.lock().cursor_visible = true;
        Ok(())
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        self.state.lock().cursor_visible = false;
        Ok(())
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        self.state.lock().print(text);
        Ok(())
    }

    fn clear_line(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        let row = usize::from(state.cursor.1);
        let blank = state.blank_row();
        state.grid[row] = blank;
        Ok(())
    }

    fn foreground(&self) -> Color {
        self.state.lock().fg
    }

    fn background(&self) -> Color {
        self.state.lock().bg
    }

    fn set_foreground(&mut self, color: Color) -> io::Result<()> {
        self.state.lock().fg = color;
        Ok(())
    }

    fn set_background(&mut self, color: Color) -> io::Result<()> {
        self.state.lock().bg = color;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn escape_processing(&self) -> bool {
        self.state.lock().escape_processing
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        self.state.lock().raw_mode = true;
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        self.state.lock().raw_mode = false;
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<String> {
        let line = {
            let mut state = self.state.lock();
            state.lines.pop_front().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted input line")
            })?
        };
        // Cooked mode echoes the line and the terminator.
        let mut state = self.state.lock();
        state.print(&line);
        state.print("\n");
        Ok(line)
    }

    fn read_key(&mut self) -> io::Result<Key> {
        self.state.lock().keys.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted key press")
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_print_and_read_back() {
        let mut backend = TestBackend::new(10, 3);
        backend.print("hi").unwrap();
        assert_eq!(backend.line(0), "hi");
        assert_eq!(backend.cursor(), (2, 0));
    }

    #[test]
    fn test_scroll_at_bottom() {
        let mut backend = TestBackend::new(10, 3);
        backend.print("a\nb\nc\n").unwrap();
        // Three newlines from row 0: the last one scrolls.
        assert_eq!(backend.scrolled(), 1);
        assert_eq!(backend.contents(), vec!["b", "c", ""]);
        assert_eq!(backend.cursor(), (0, 2));
    }

    #[test]
    fn test_wrap_matches_measure() {
        let mut backend = TestBackend::new(10, 5);
        let text = "0123456789abc";
        backend.print(text).unwrap();
        let adv = crate::wrap::measure_str(text, 0, 10, true);
        assert_eq!(backend.cursor(), (adv.col, adv.rows));
        assert_eq!(backend.line(0), "0123456789");
        assert_eq!(backend.line(1), "abc");
    }

    #[test]
    fn test_wide_char_occupies_two_cells() {
        let mut backend = TestBackend::new(10, 3);
        backend.print("你x").unwrap();
        assert_eq!(backend.cursor(), (3, 0));
        assert_eq!(backend.line(0), "你x");
    }

    #[test]
    fn test_clear_line() {
        let mut backend = TestBackend::new(10, 3);
        backend.print("abc").unwrap();
        backend.move_cursor(0, 0).unwrap();
        backend.clear_line().unwrap();
        assert_eq!(backend.line(0), "");
    }

    #[test]
    fn test_scripted_keys() {
        let backend = TestBackend::new(10, 3);
        backend.push_keys("ab");
        backend.push_key(Key::Enter);
        let mut b = backend.clone();
        assert_eq!(b.read_key().unwrap(), Key::Char('a'));
        assert_eq!(b.read_key().unwrap(), Key::Char('b'));
        assert_eq!(b.read_key().unwrap(), Key::Enter);
        assert!(b.read_key().is_err());
    }
}
