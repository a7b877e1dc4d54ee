//! The writer engine: every screen mutation funnels through here.
//!
//! A [`Session`] owns the terminal device, the scroll-shift counter, and
//! the pinned footer state behind one process-wide mutex. Every public
//! operation acquires the lock for its entire duration: the device has a
//! single cursor and a single pair of color registers, so serialization is
//! mandatory and global. Operations are totally ordered by lock
//! acquisition; the critical section is bounded by terminal I/O latency
//! only.
//!
//! The hard problem lives in the write path: once output reaches the last
//! buffer row the device silently clamps the cursor while the buffer
//! scrolls underneath it. The engine reconstructs how many rows scrolled
//! from the only signal available, the gap between where the cursor
//! *should* have ended (starting row + predicted wraps + terminator) and
//! where the device reports it, then advances the shift counter so every
//! caller-held [`Position`] stays resolvable.
//!
//! # Example
//!
//! ```no_run
//! use inkline::session::Session;
//!
//! let session = Session::new();
//! session.write_line(&["G`ready"]).unwrap();
//! let (begin, _) = session.write_line(&["working..."]).unwrap();
//! session.write_line(&["more output"]).unwrap();
//! // Overwrite the earlier line, wherever it has scrolled to.
//! session.try_write_to(&begin, &["working... ", "G`done"]).unwrap();
//! ```

use crate::error::{Error, Result};
use crate::position::{Position, Resolved};
use crate::style::{parse, Segment};
use crate::terminal::{Backend, CrosstermBackend};
use crate::wrap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use tracing::{debug, trace};

/// Footer content callback: returns one string per footer line, each run
/// through the color microsyntax independently. Invoked inside the session
/// lock; it must not write to the terminal itself.
pub type PinProvider = Box<dyn Fn() -> Vec<String> + Send>;

/// Per-call segment list; writes are almost always a handful of runs.
type SegmentList = SmallVec<[Segment; 4]>;

/// Pinned footer state.
struct PinState {
    provider: Option<PinProvider>,
    /// Rows the footer occupied at its last render, re-measured every time.
    /// This is the authoritative height used to clear it; a stale height
    /// over- or under-erases when content changes length between renders.
    height: u16,
}

impl Default for PinState {
    fn default() -> Self {
        Self {
            provider: None,
            height: 0,
        }
    }
}

pub(crate) struct Inner {
    backend: Box<dyn Backend>,
    shift: i64,
    pin: PinState,
    /// False when the device cannot report a buffer size; position and pin
    /// operations become no-ops and writes degrade to sequential output.
    positioning: bool,
    colors: bool,
}

/// Handle to a terminal session. Cheap to clone; all clones share the same
/// lock, shift counter, and pin state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session over the real terminal (stdout via crossterm).
    ///
    /// Colors are disabled when `NO_COLOR` is set or stdout is not a
    /// terminal. If the buffer size cannot be determined (output detached
    /// from any terminal), positioning is unsupported and every
    /// position/pin operation becomes a no-op returning default values.
    #[must_use]
    pub fn new() -> Self {
        let colors = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self::build(Box::new(CrosstermBackend::new()), colors)
    }

    /// A session over a caller-supplied device.
    pub fn with_backend(backend: impl Backend + 'static) -> Self {
        Self::build(Box::new(backend), true)
    }

    fn build(backend: Box<dyn Backend>, colors: bool) -> Self {
        let positioning = backend.buffer_size().is_ok();
        if !positioning {
            debug!("buffer size unavailable; position tracking disabled");
        }
        Self {
            inner: Arc::new(Mutex::new(Inner {
                backend,
                shift: 0,
                pin: PinState::default(),
                positioning,
                colors,
            })),
        }
    }

    /// Write at the cursor without a line terminator. Each value is parsed
    /// through the color microsyntax. Returns the begin and end positions
    /// of the written span.
    pub fn write<S: AsRef<str>>(&self, values: &[S]) -> Result<(Position, Position)> {
        self.inner.lock().write_segments(&parse_all(values), false)
    }

    /// Write at the cursor followed by a line terminator.
    ///
    /// An empty slice emits just the terminator.
    pub fn write_line<S: AsRef<str>>(&self, values: &[S]) -> Result<(Position, Position)> {
        self.inner.lock().write_segments(&parse_all(values), true)
    }

    /// Write pre-parsed segments at the cursor.
    pub fn write_segments(
        &self,
        segments: &[Segment],
        newline: bool,
    ) -> Result<(Position, Position)> {
        self.inner.lock().write_segments(segments, newline)
    }

    /// Write at a previously captured position.
    ///
    /// Fails with [`Error::OutOfBuffer`] when the position currently
    /// resolves outside the addressable buffer. The live cursor is restored
    /// afterwards, so the append point is unaffected.
    pub fn write_to<S: AsRef<str>>(&self, pos: &Position, values: &[S]) -> Result<Position> {
        self.inner
            .lock()
            .write_to_segments(pos, &parse_all(values), false)
    }

    /// [`write_to`](Self::write_to), swallowing the out-of-range condition.
    ///
    /// Returns `Ok(None)` when the position is unreachable; device errors
    /// still propagate.
    pub fn try_write_to<S: AsRef<str>>(
        &self,
        pos: &Position,
        values: &[S],
    ) -> Result<Option<Position>> {
        swallow_out_of_range(self.write_to(pos, values))
    }

    /// Like [`write_to`](Self::write_to), but additionally fails with
    /// [`Error::OutOfViewport`] when the row is buffered but scrolled out
    /// of the visible window.
    pub fn write_to_visible<S: AsRef<str>>(
        &self,
        pos: &Position,
        values: &[S],
    ) -> Result<Position> {
        self.inner
            .lock()
            .write_to_segments(pos, &parse_all(values), true)
    }

    /// [`write_to_visible`](Self::write_to_visible), swallowing both
    /// out-of-range conditions. Animations use this to skip frames instead
    /// of corrupting unrelated screen regions.
    pub fn try_write_to_visible<S: AsRef<str>>(
        &self,
        pos: &Position,
        values: &[S],
    ) -> Result<Option<Position>> {
        swallow_out_of_range(self.write_to_visible(pos, values))
    }

    /// Snapshot the live cursor as a logical position.
    pub fn cursor(&self) -> Result<Position> {
        let mut inner = self.inner.lock();
        if !inner.positioning {
            return Ok(Position::ORIGIN);
        }
        let (col, row) = inner.backend.cursor_position()?;
        Ok(Position::new(col, i32::from(row), inner.shift))
    }

    /// Cumulative rows scrolled off the top since the session started.
    #[must_use]
    pub fn shift(&self) -> i64 {
        self.inner.lock().shift
    }

    /// Buffer dimensions, or `None` when positioning is unsupported.
    #[must_use]
    pub fn buffer_size(&self) -> Option<(u16, u16)> {
        let inner = self.inner.lock();
        if inner.positioning {
            inner.backend.buffer_size().ok()
        } else {
            None
        }
    }

    /// Whether color codes are emitted to the device.
    #[must_use]
    pub fn colors_enabled(&self) -> bool {
        self.inner.lock().colors
    }

    /// Force color emission on or off (overrides detection).
    pub fn set_colors_enabled(&self, enabled: bool) {
        self.inner.lock().colors = enabled;
    }

    /// Install (or replace) the pinned footer and render it immediately.
    ///
    /// The provider is called inside the session lock after every log
    /// write; see [`PinProvider`]. A no-op when positioning is unsupported.
    pub fn pin<F>(&self, provider: F) -> Result<()>
    where
        F: Fn() -> Vec<String> + Send + 'static,
    {
        self.inner.lock().set_pin(Some(Box::new(provider)))
    }

    /// Pin static footer content.
    pub fn pin_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<()> {
        let owned: Vec<String> = lines.iter().map(|s| s.as_ref().to_string()).collect();
        self.pin(move || owned.clone())
    }

    /// Re-render the footer without new log output (e.g. after a timer
    /// tick changed what the provider returns). A no-op when nothing is
    /// pinned.
    pub fn refresh_pin(&self) -> Result<()> {
        self.inner.lock().refresh_pin()
    }

    /// Erase the footer and discard the provider.
    pub fn unpin(&self) -> Result<()> {
        self.inner.lock().set_pin(None)
    }

    /// Whether a footer is currently pinned.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.inner.lock().pin.provider.is_some()
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Inner> {
        self.inner.lock()
    }
}

fn parse_all<S: AsRef<str>>(values: &[S]) -> SegmentList {
    values.iter().map(|s| parse(s.as_ref())).collect()
}

fn swallow_out_of_range(result: Result<Position>) -> Result<Option<Position>> {
    match result {
        Ok(pos) => Ok(Some(pos)),
        Err(e) if e.is_out_of_range() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Clamp a (possibly negative) row into the range a [`Position`] stores.
fn to_top(row: i64) -> i32 {
    row.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn to_row(row: i64) -> u16 {
    row.clamp(0, i64::from(u16::MAX)) as u16
}

impl Inner {
    /// Write `segments` at the live cursor; the heart of the engine.
    pub(crate) fn write_segments(
        &mut self,
        segments: &[Segment],
        newline: bool,
    ) -> Result<(Position, Position)> {
        if !self.positioning {
            self.emit_segments(segments)?;
            if newline {
                self.backend.print("\n")?;
            }
            self.backend.flush()?;
            return Ok((Position::ORIGIN, Position::ORIGIN));
        }

        let (width, height) = self.backend.buffer_size()?;
        let (cx, cy) = self.backend.cursor_position()?;
        self.backend.hide_cursor()?;
        let result = self.write_at_cursor_locked(segments, newline, width, height, cx, cy);
        // Cursor visibility is restored on every exit path so a failed
        // write never leaves the cursor permanently hidden.
        let _ = self.backend.show_cursor();
        let _ = self.backend.flush();
        result
    }

    fn write_at_cursor_locked(
        &mut self,
        segments: &[Segment],
        newline: bool,
        width: u16,
        height: u16,
        cx: u16,
        cy: u16,
    ) -> Result<(Position, Position)> {
        if self.pin.provider.is_some() {
            self.clear_pin_rows(cy, height)?;
            self.backend.move_cursor(cx, cy)?;
        }

        self.emit_segments(segments)?;
        if newline {
            self.backend.print("\n")?;
        }
        let (ex, ey) = self.backend.cursor_position()?;

        let delta = self.account_scroll(segments, cx, cy, ey, width, height, newline);
        let footer_delta = self.redraw_pin(width, height)?;
        let end_row = i64::from(ey) - footer_delta;
        self.backend.move_cursor(ex, to_row(end_row))?;

        let begin = Position::new(cx, to_top(i64::from(cy) - delta - footer_delta), self.shift);
        let end = Position::new(ex, to_top(end_row), self.shift);
        Ok((begin, end))
    }

    /// Write `segments` at a previously captured position.
    pub(crate) fn write_to_segments(
        &mut self,
        pos: &Position,
        segments: &[Segment],
        viewport_only: bool,
    ) -> Result<Position> {
        if !self.positioning {
            return Ok(Position::ORIGIN);
        }

        let (width, height) = self.backend.buffer_size()?;
        let row = match pos.resolve(self.shift, height) {
            Resolved::Reachable(row) => row,
            Resolved::Unreachable => {
                let row = pos.current_row(self.shift);
                trace!(row, "position resolves outside the buffer");
                return Err(Error::OutOfBuffer { row });
            }
        };
        if viewport_only {
            let vp = self.backend.viewport()?;
            if row < vp.top || u32::from(row) >= u32::from(vp.top) + u32::from(vp.height) {
                trace!(row, "position resolves outside the viewport");
                return Err(Error::OutOfViewport { row: i64::from(row) });
            }
        }

        let (cx, cy) = self.backend.cursor_position()?;
        self.backend.hide_cursor()?;
        let result = self.write_to_locked(segments, pos.left, row, width, height, cx, cy);
        let _ = self.backend.show_cursor();
        let _ = self.backend.flush();
        result
    }

    fn write_to_locked(
        &mut self,
        segments: &[Segment],
        left: u16,
        row: u16,
        width: u16,
        height: u16,
        cx: u16,
        cy: u16,
    ) -> Result<Position> {
        if self.pin.provider.is_some() {
            self.clear_pin_rows(cy, height)?;
        }

        let left = left.min(width.saturating_sub(1));
        self.backend.move_cursor(left, row)?;
        self.emit_segments(segments)?;
        let (ex, ey) = self.backend.cursor_position()?;

        let delta = self.account_scroll(segments, left, row, ey, width, height, false);

        // Re-establish the log cursor (shifted if the write scrolled)
        // before the footer goes back underneath it.
        let log_row = to_row(i64::from(cy) - delta);
        self.backend.move_cursor(cx, log_row)?;
        let footer_delta = self.redraw_pin(width, height)?;
        self.backend
            .move_cursor(cx, to_row(i64::from(log_row) - footer_delta))?;

        Ok(Position::new(
            ex,
            to_top(i64::from(ey) - footer_delta),
            self.shift,
        ))
    }

    /// Derive how many rows scrolled from the gap between the predicted
    /// and the observed end row, and advance the shift counter.
    ///
    /// `predicted = begin_row + wrap_rows + terminator`; the device clamps
    /// the cursor at the last row, so any shortfall is exactly the number
    /// of rows that scrolled off the top. The counter advances only when
    /// the cursor ended on the last buffer row: anywhere else no scroll
    /// can have happened, and a predicted/observed gap means the device
    /// defers its end-of-line wrap (ANSI terminals park the cursor on the
    /// last column until the next glyph arrives).
    fn account_scroll(
        &mut self,
        segments: &[Segment],
        begin_col: u16,
        begin_row: u16,
        end_row: u16,
        width: u16,
        height: u16,
        newline: bool,
    ) -> i64 {
        if end_row + 1 < height {
            return 0;
        }
        let adv = wrap::measure(segments, begin_col, width, self.backend.escape_processing());
        let predicted =
            i64::from(begin_row) + i64::from(adv.rows) + i64::from(u8::from(newline));
        let delta = (predicted - i64::from(end_row)).max(0);
        if delta > 0 {
            self.shift += delta;
            trace!(
                delta,
                shift = self.shift,
                "output reached the last row; shift advanced"
            );
        }
        delta
    }

    /// Emit runs one at a time: save the device's current attribute
    /// register(s), set the run's, print, restore. Adjacent runs may carry
    /// different colors and the device has only one current-attribute
    /// register, so this cannot be batched.
    pub(crate) fn emit_segments(&mut self, segments: &[Segment]) -> io::Result<()> {
        for seg in segments {
            self.emit_segment(seg)?;
        }
        Ok(())
    }

    pub(crate) fn emit_segment(&mut self, seg: &Segment) -> io::Result<()> {
        let fg = if self.colors { seg.fg } else { None };
        let bg = if self.colors { seg.bg } else { None };
        let saved_fg = fg.map(|_| self.backend.foreground());
        let saved_bg = bg.map(|_| self.backend.background());
        if let Some(color) = fg {
            self.backend.set_foreground(color)?;
        }
        if let Some(color) = bg {
            self.backend.set_background(color)?;
        }
        self.backend.print(&seg.text)?;
        if let Some(color) = saved_bg {
            self.backend.set_background(color)?;
        }
        if let Some(color) = saved_fg {
            self.backend.set_foreground(color)?;
        }
        Ok(())
    }

    /// Blank the rows the footer occupied at its last render. The footer
    /// always sits immediately below `log_row`; its recorded height is the
    /// authoritative extent.
    pub(crate) fn clear_pin_rows(&mut self, log_row: u16, height: u16) -> io::Result<()> {
        let max_top = height - 1;
        let bottom = log_row.saturating_add(self.pin.height).min(max_top);
        for row in (log_row + 1)..=bottom {
            self.backend.move_cursor(0, row)?;
            self.backend.clear_line()?;
        }
        Ok(())
    }

    /// Render the footer below the current cursor and re-measure its
    /// height. Returns the rows scrolled by the render itself (the footer
    /// gets the same last-row overflow treatment as log writes).
    pub(crate) fn redraw_pin(&mut self, width: u16, height: u16) -> Result<i64> {
        let lines = match &self.pin.provider {
            Some(provider) => provider(),
            None => return Ok(0),
        };

        let escapes = self.backend.escape_processing();
        let (_, cy) = self.backend.cursor_position()?;
        let mut rows_consumed: u16 = 0;
        for line in &lines {
            let seg = parse(line);
            self.backend.print("\n")?;
            rows_consumed = rows_consumed
                .saturating_add(1)
                .saturating_add(wrap::measure_str(&seg.text, 0, width, escapes).rows);
            self.emit_segment(&seg)?;
        }
        let (_, ey) = self.backend.cursor_position()?;

        // Same last-row gate as log writes: the footer can only have
        // scrolled the buffer when its render ended on the last row.
        let predicted = i64::from(cy) + i64::from(rows_consumed);
        let delta = if ey + 1 < height {
            0
        } else {
            (predicted - i64::from(ey)).max(0)
        };
        if delta > 0 {
            self.shift += delta;
            trace!(delta, shift = self.shift, "footer render scrolled the buffer");
        }
        self.pin.height = rows_consumed;
        trace!(height = rows_consumed, "footer redrawn");
        Ok(delta)
    }

    /// Install, replace, or (with `None`) tear down the footer.
    fn set_pin(&mut self, provider: Option<PinProvider>) -> Result<()> {
        if !self.positioning {
            return Ok(());
        }
        let (width, height) = self.backend.buffer_size()?;
        let (cx, cy) = self.backend.cursor_position()?;
        self.backend.hide_cursor()?;
        let result = self.set_pin_locked(provider, width, height, cx, cy);
        let _ = self.backend.show_cursor();
        let _ = self.backend.flush();
        result
    }

    fn set_pin_locked(
        &mut self,
        provider: Option<PinProvider>,
        width: u16,
        height: u16,
        cx: u16,
        cy: u16,
    ) -> Result<()> {
        self.clear_pin_rows(cy, height)?;
        self.pin.provider = provider;
        if self.pin.provider.is_none() {
            self.pin.height = 0;
            self.backend.move_cursor(cx, cy)?;
            return Ok(());
        }
        self.backend.move_cursor(cx, cy)?;
        let delta = self.redraw_pin(width, height)?;
        self.backend.move_cursor(cx, to_row(i64::from(cy) - delta))?;
        Ok(())
    }

    /// Re-render in place; see [`Session::refresh_pin`].
    fn refresh_pin(&mut self) -> Result<()> {
        if !self.positioning || self.pin.provider.is_none() {
            return Ok(());
        }
        let (width, height) = self.backend.buffer_size()?;
        let (cx, cy) = self.backend.cursor_position()?;
        self.backend.hide_cursor()?;
        let result = (|| -> Result<()> {
            self.clear_pin_rows(cy, height)?;
            self.backend.move_cursor(cx, cy)?;
            let delta = self.redraw_pin(width, height)?;
            self.backend.move_cursor(cx, to_row(i64::from(cy) - delta))?;
            Ok(())
        })();
        let _ = self.backend.show_cursor();
        let _ = self.backend.flush();
        result
    }

    pub(crate) fn positioning(&self) -> bool {
        self.positioning
    }

    pub(crate) fn add_shift(&mut self, delta: i64) {
        self.shift += delta;
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    pub(crate) fn has_pin(&self) -> bool {
        self.pin.provider.is_some()
    }

    pub(crate) fn colors(&self) -> bool {
        self.colors
    }
}
