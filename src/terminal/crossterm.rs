//! Real terminal device backed by crossterm.

use super::{Backend, Key, Viewport};
use crate::style::Color;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    queue,
    style::{Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, BufRead, Stdout, Write};

/// Crossterm-based [`Backend`] writing to stdout.
///
/// ANSI terminals expose no addressing for scrollback, so the buffer and
/// the viewport coincide: `buffer_size()` is the window size and the
/// viewport starts at row 0. Color registers are shadowed locally and
/// emitted as escape sequences per change, which reproduces the legacy
/// per-call color switching model over the modern wire format.
pub struct CrosstermBackend {
    stdout: Stdout,
    raw_mode: bool,
    cursor_visible: bool,
    fg: Color,
    bg: Color,
}

impl CrosstermBackend {
    /// Create a backend over stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            raw_mode: false,
            cursor_visible: true,
            fg: Color::Default,
            bg: Color::Default,
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for CrosstermBackend {
    fn buffer_size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn viewport(&self) -> io::Result<Viewport> {
        let (_, rows) = terminal::size()?;
        Ok(Viewport {
            top: 0,
            height: rows,
        })
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        // The query round-trips through the device; pending output must be
        // on screen first or the answer is stale.
        self.stdout.flush()?;
        cursor::position()
    }

    fn move_cursor(&mut self, col: u16, row: u16) -> io::Result<()> {
        queue!(self.stdout, cursor::MoveTo(col, row))
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        if !self.cursor_visible {
            queue!(self.stdout, cursor::Show)?;
            self.cursor_visible = true;
        }
        Ok(())
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        if self.cursor_visible {
            queue!(self.stdout, cursor::Hide)?;
            self.cursor_visible = false;
        }
        Ok(())
    }

    fn print(&mut self, text: &str) -> io::Result<()> {
        if self.raw_mode {
            // Raw mode does no output post-processing; LF alone would move
            // down without returning to column 0.
            let mut rest = text;
            while let Some(i) = rest.find('\n') {
                queue!(self.stdout, Print(&rest[..i]), Print("\r\n"))?;
                rest = &rest[i + 1..];
            }
            queue!(self.stdout, Print(rest))
        } else {
            queue!(self.stdout, Print(text))
        }
    }

    fn clear_line(&mut self) -> io::Result<()> {
        queue!(self.stdout, Clear(ClearType::CurrentLine))
    }

    fn foreground(&self) -> Color {
        self.fg
    }

    fn background(&self) -> Color {
        self.bg
    }

    fn set_foreground(&mut self, color: Color) -> io::Result<()> {
        if self.fg != color {
            queue!(self.stdout, SetForegroundColor(color.to_crossterm()))?;
            self.fg = color;
        }
        Ok(())
    }

    fn set_background(&mut self, color: Color) -> io::Result<()> {
        if self.bg != color {
            queue!(self.stdout, SetBackgroundColor(color.to_crossterm()))?;
            self.bg = color;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }

    fn escape_processing(&self) -> bool {
        true
    }

    fn enter_raw_mode(&mut self) -> io::Result<()> {
        if !self.raw_mode {
            terminal::enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn leave_raw_mode(&mut self) -> io::Result<()> {
        if self.raw_mode {
            terminal::disable_raw_mode()?;
            self.raw_mode = false;
        }
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<String> {
        self.stdout.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        // The device already echoed the terminator; the caller gets the
        // bare line.
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn read_key(&mut self) -> io::Result<Key> {
        self.stdout.flush()?;
        loop {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Press {
                    continue;
                }
                return Ok(match code {
                    KeyCode::Char(c) => Key::Char(c),
                    KeyCode::Enter => Key::Enter,
                    KeyCode::Backspace => Key::Backspace,
                    KeyCode::Esc => Key::Esc,
                    _ => Key::Other,
                });
            }
        }
    }
}
