//! Scroll-stable logical screen positions.
//!
//! A terminal only exposes absolute rows `0..buffer_height`; once output
//! reaches the bottom row the buffer scrolls and every previously observed
//! coordinate silently goes stale. A [`Position`] pairs the physical row it
//! had *at creation time* with the session's scroll shift at that moment,
//! so its current physical row can always be recomputed:
//!
//! ```text
//! current_row = initial_top + shift_at_creation - current_shift
//! ```
//!
//! Resolution is a pure function of the value and the current shift; the
//! row is recomputed on every use, never mutated. A position whose computed
//! row falls outside the buffer is [`Resolved::Unreachable`]; that is a
//! property of the current buffer, not an error in the value, and the same
//! position becomes reachable again if the buffer height grows.
//!
//! Positions are cheap, `Copy`, and may outlive any number of subsequent
//! writes.

/// A caller-held handle to a screen location that stays resolvable across
/// buffer scrolling.
///
/// Returned by every write operation (begin/end pair) and by
/// [`Session::cursor`](crate::session::Session::cursor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Zero-based column, stable for the life of the value.
    pub left: u16,
    /// Physical row the position had at creation time. May be negative
    /// when the location had already scrolled off during the very write
    /// that produced it.
    pub initial_top: i32,
    /// The session's scroll shift at creation time.
    pub shift_at_creation: i64,
}

/// Outcome of resolving a [`Position`] against the current shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The position currently maps to this physical row.
    Reachable(u16),
    /// The computed row falls outside the addressable buffer.
    Unreachable,
}

impl Position {
    /// A position at the buffer origin with zero shift. Used as the default
    /// return value when positioning is unsupported.
    pub const ORIGIN: Self = Self {
        left: 0,
        initial_top: 0,
        shift_at_creation: 0,
    };

    /// Construct from a live physical coordinate and the current shift.
    #[must_use]
    pub const fn new(left: u16, top: i32, shift: i64) -> Self {
        Self {
            left,
            initial_top: top,
            shift_at_creation: shift,
        }
    }

    /// The row this position maps to under `current_shift`, unclamped.
    ///
    /// Negative values mean the location has scrolled off the top.
    #[must_use]
    pub const fn current_row(&self, current_shift: i64) -> i64 {
        self.initial_top as i64 + self.shift_at_creation - current_shift
    }

    /// Resolve against the current shift and buffer height.
    #[must_use]
    pub fn resolve(&self, current_shift: i64, buffer_height: u16) -> Resolved {
        let row = self.current_row(current_shift);
        if (0..i64::from(buffer_height)).contains(&row) {
            Resolved::Reachable(row as u16)
        } else {
            Resolved::Unreachable
        }
    }

    /// Resolve and additionally require the row to lie inside the visible
    /// window `[viewport_top, viewport_top + viewport_height)`.
    ///
    /// Used by viewport-constrained writes so animations can skip frames
    /// for locations that are buffered but scrolled out of sight.
    #[must_use]
    pub fn resolve_visible(
        &self,
        current_shift: i64,
        buffer_height: u16,
        viewport_top: u16,
        viewport_height: u16,
    ) -> Resolved {
        match self.resolve(current_shift, buffer_height) {
            Resolved::Reachable(row)
                if row >= viewport_top
                    && u32::from(row) < u32::from(viewport_top) + u32::from(viewport_height) =>
            {
                Resolved::Reachable(row)
            }
            _ => Resolved::Unreachable,
        }
    }
}

impl Resolved {
    /// True if the position currently maps into the buffer.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        matches!(self, Resolved::Reachable(_))
    }
}
