//! Line input with pinned-footer consistency.
//!
//! Three read modes, all holding the session lock for their duration and
//! re-rendering the pinned footer once the input line completes:
//!
//! - [`Session::read_line`]: cooked-mode read delegated to the device,
//!   which echoes and line-edits itself.
//! - [`Session::read_line_masked`]: raw mode; every keystroke echoes a
//!   substitute character, backspace erases, Enter terminates.
//! - [`Session::read_line_hidden`]: raw mode, no echo at all.
//!
//! Plus [`Session::confirm`], a y/n prompt that keeps looping until the
//! user confirms a visible choice with Enter.

use crate::error::Result;
use crate::session::{Inner, Session};
use crate::style::{parse, Color, Segment};
use crate::terminal::Key;
use crate::wrap;
use std::io;
use tracing::trace;

impl Session {
    /// Read one line in cooked mode.
    ///
    /// The footer (if pinned) is cleared before the device starts echoing
    /// and re-rendered after the line completes; the scroll shift is
    /// re-derived from the echoed line's wrap count.
    pub fn read_line(&self) -> Result<String> {
        self.lock().read_cooked()
    }

    /// Read one line in raw mode, echoing `mask` per keystroke.
    pub fn read_line_masked(&self, mask: char) -> Result<String> {
        self.lock().read_raw(Some(mask))
    }

    /// Read one line in raw mode with no echo.
    pub fn read_line_hidden(&self) -> Result<String> {
        self.lock().read_raw(None)
    }

    /// Ask a yes/no question and loop until the user confirms a choice.
    ///
    /// `y`/`Y` echoes `Yes`, `n`/`N` echoes `No` (each replacing the
    /// previous echo), Backspace clears it, and Enter accepts only when a
    /// choice is showing. With nothing echoed, Enter is ignored and the
    /// loop continues.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        self.lock().confirm(prompt, None)
    }

    /// [`confirm`](Self::confirm) with a default: Enter on an empty echo
    /// accepts `default` (echoing it first).
    pub fn confirm_or(&self, prompt: &str, default: Option<bool>) -> Result<bool> {
        self.lock().confirm(prompt, default)
    }
}

impl Inner {
    pub(crate) fn read_cooked(&mut self) -> Result<String> {
        if !self.positioning() {
            self.backend_mut().flush()?;
            return Ok(self.backend_mut().read_line()?);
        }

        let (width, height) = self.backend_mut().buffer_size()?;
        let (cx, cy) = self.backend_mut().cursor_position()?;
        if self.has_pin() {
            self.clear_pin_rows(cy, height)?;
            self.backend_mut().move_cursor(cx, cy)?;
        }
        self.backend_mut().flush()?;

        let line = self.backend_mut().read_line()?;
        self.finish_input(&line, cx, cy, width, height)?;
        Ok(line)
    }

    pub(crate) fn read_raw(&mut self, mask: Option<char>) -> Result<String> {
        if !self.positioning() {
            self.backend_mut().enter_raw_mode()?;
            let result = self.raw_input_loop(mask);
            let _ = self.backend_mut().leave_raw_mode();
            let _ = self.backend_mut().flush();
            return result;
        }

        let (width, height) = self.backend_mut().buffer_size()?;
        let (cx, cy) = self.backend_mut().cursor_position()?;
        if self.has_pin() {
            self.clear_pin_rows(cy, height)?;
            self.backend_mut().move_cursor(cx, cy)?;
        }
        self.backend_mut().flush()?;

        self.backend_mut().enter_raw_mode()?;
        let result = self.raw_input_loop(mask);
        // Raw mode is always left, even when the read failed.
        let _ = self.backend_mut().leave_raw_mode();
        let line = result?;

        let echoed = match mask {
            Some(m) => m.to_string().repeat(line.chars().count()),
            None => String::new(),
        };
        self.finish_input(&echoed, cx, cy, width, height)?;
        Ok(line)
    }

    fn raw_input_loop(&mut self, mask: Option<char>) -> Result<String> {
        let mut buf = String::new();
        loop {
            match self.backend_mut().read_key()? {
                Key::Char(c) => {
                    buf.push(c);
                    if let Some(m) = mask {
                        let echo = m.to_string();
                        self.backend_mut().print(&echo)?;
                        self.backend_mut().flush()?;
                    }
                }
                Key::Backspace => {
                    if buf.pop().is_some() && mask.is_some() {
                        // Erase one echoed cell; an echo that wrapped rows
                        // is left as-is, matching the legacy reader.
                        self.backend_mut().print("\u{8} \u{8}")?;
                        self.backend_mut().flush()?;
                    }
                }
                Key::Enter => {
                    self.backend_mut().print("\n")?;
                    return Ok(buf);
                }
                Key::Esc | Key::Other => {}
            }
        }
    }

    /// Shift accounting and footer re-render after an input line
    /// completed: the echo plus its terminator behave exactly like a log
    /// write that started at `(cx, cy)`.
    fn finish_input(
        &mut self,
        echoed: &str,
        cx: u16,
        cy: u16,
        width: u16,
        height: u16,
    ) -> Result<()> {
        let (ex, ey) = self.backend_mut().cursor_position()?;
        let escapes = self.backend_mut().escape_processing();
        let adv = wrap::measure_str(echoed, cx, width, escapes);
        // The echo can only have scrolled when it ended on the last row;
        // mid-buffer gaps are a deferred end-of-line wrap, not a scroll.
        let predicted = i64::from(cy) + i64::from(adv.rows) + 1;
        let delta = if ey + 1 < height {
            0
        } else {
            (predicted - i64::from(ey)).max(0)
        };
        if delta > 0 {
            self.add_shift(delta);
            trace!(delta, "input echo reached the last row; shift advanced");
        }
        let footer_delta = self.redraw_pin(width, height)?;
        let final_row = (i64::from(ey) - footer_delta).max(0) as u16;
        self.backend_mut().move_cursor(ex, final_row)?;
        self.backend_mut().flush()?;
        Ok(())
    }

    pub(crate) fn confirm(&mut self, prompt: &str, default: Option<bool>) -> Result<bool> {
        let prompt_seg = parse(prompt);

        if !self.positioning() {
            self.emit_segment(&prompt_seg)?;
            self.backend_mut().flush()?;
            self.backend_mut().enter_raw_mode()?;
            let result = self.confirm_loop(default);
            let _ = self.backend_mut().leave_raw_mode();
            let _ = self.backend_mut().flush();
            return result;
        }

        let (width, height) = self.backend_mut().buffer_size()?;
        let (cx, cy) = self.backend_mut().cursor_position()?;
        if self.has_pin() {
            self.clear_pin_rows(cy, height)?;
            self.backend_mut().move_cursor(cx, cy)?;
        }
        self.emit_segment(&prompt_seg)?;
        self.backend_mut().flush()?;

        self.backend_mut().enter_raw_mode()?;
        let result = self.confirm_loop(default);
        let _ = self.backend_mut().leave_raw_mode();
        let answer = result?;

        // The final screen line is the prompt plus the confirmed echo;
        // account for it like a write that began at (cx, cy).
        let echoed = format!("{}{}", prompt_seg.text, echo_text(answer));
        self.finish_input(&echoed, cx, cy, width, height)?;
        Ok(answer)
    }

    fn confirm_loop(&mut self, default: Option<bool>) -> Result<bool> {
        let mut shown: Option<bool> = None;
        loop {
            match self.backend_mut().read_key()? {
                Key::Char('y' | 'Y') => {
                    self.replace_echo(shown, Some(true))?;
                    shown = Some(true);
                }
                Key::Char('n' | 'N') => {
                    self.replace_echo(shown, Some(false))?;
                    shown = Some(false);
                }
                Key::Backspace => {
                    self.replace_echo(shown, None)?;
                    shown = None;
                }
                Key::Enter => {
                    if let Some(answer) = shown.or(default) {
                        if shown.is_none() {
                            self.replace_echo(None, Some(answer))?;
                        }
                        self.backend_mut().print("\n")?;
                        self.backend_mut().flush()?;
                        return Ok(answer);
                    }
                    // No visible choice: keep looping.
                }
                Key::Char(_) | Key::Esc | Key::Other => {}
            }
            self.backend_mut().flush()?;
        }
    }

    /// Replace the currently echoed choice in place.
    fn replace_echo(&mut self, old: Option<bool>, new: Option<bool>) -> io::Result<()> {
        for _ in 0..old.map_or(0, |b| echo_text(b).len()) {
            self.backend_mut().print("\u{8} \u{8}")?;
        }
        if let Some(answer) = new {
            let seg = Segment::colored(
                echo_text(answer),
                if answer {
                    Color::BrightGreen
                } else {
                    Color::BrightRed
                },
            );
            self.emit_segment(&seg)?;
        }
        Ok(())
    }
}

fn echo_text(answer: bool) -> &'static str {
    if answer {
        "Yes"
    } else {
        "No"
    }
}
