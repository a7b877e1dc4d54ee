//! Line-wrap prediction for terminal output.
//!
//! The writer engine must know how many physical rows a piece of text will
//! consume *before* trusting the cursor coordinates the device reports,
//! because once output reaches the last buffer row the device silently
//! clamps the cursor instead of advancing it. [`measure`] walks the text
//! with a virtual column and counts the rows the real device would consume.
//!
//! The model here must exactly mirror the device's wrapping behavior; the
//! [`TestBackend`](crate::terminal::TestBackend) implements the same rules
//! independently, and the equivalence is property-tested. Any mismatch
//! silently desynchronizes logical positions from physical rows.
//!
//! Rules:
//!
//! - printable characters advance the column by their cell width
//!   (wide characters by 2, via `unicode-width`); a wide character that no
//!   longer fits on the current row wraps before being placed
//! - `\n` resets the column and counts one row
//! - `\r` resets the column without counting
//! - `\t` advances to the next multiple-of-8 tab stop
//! - `\b` retreats one column, never below 0
//! - escape sequences (CSI through the final byte, OSC through `BEL`/`ST`)
//!   are zero-width when the device interprets escapes, otherwise the
//!   introducer occupies one cell
//! - reaching the buffer width counts one row and wraps the column to 0

use crate::style::Segment;
use unicode_width::UnicodeWidthChar;

/// Tab stops every 8 columns, matching classic console behavior.
const TAB_STOP: u16 = 8;

/// Result of measuring a piece of text: rows consumed beyond the starting
/// row, and the column the cursor ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advance {
    /// Additional physical rows consumed (soft wraps plus `\n` count).
    pub rows: u16,
    /// Final virtual column.
    pub col: u16,
}

/// Measure how many additional rows a sequence of segments consumes when
/// written starting at `start_col` on a buffer `width` columns wide.
///
/// `escapes` states whether the device interprets escape sequences (true
/// for VT-style terminals, false for a legacy device printing them as
/// glyphs).
#[must_use]
pub fn measure(segments: &[Segment], start_col: u16, width: u16, escapes: bool) -> Advance {
    let mut adv = Advance {
        rows: 0,
        col: start_col,
    };
    for seg in segments {
        adv = measure_str(&seg.text, adv.col, width, escapes).accumulate(adv.rows);
    }
    adv
}

/// Measure a single string. See [`measure`].
#[must_use]
pub fn measure_str(text: &str, start_col: u16, width: u16, escapes: bool) -> Advance {
    debug_assert!(width > 0, "buffer width must be positive");
    let mut rows: u16 = 0;
    let mut col = start_col;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                rows = rows.saturating_add(1);
                col = 0;
            }
            '\r' => col = 0,
            '\t' => {
                col = (col / TAB_STOP + 1).saturating_mul(TAB_STOP);
            }
            '\u{8}' => col = col.saturating_sub(1),
            '\u{1b}' if escapes => skip_escape(&mut chars),
            _ => {
                let w = cell_width(c);
                // A wide glyph that does not fit wraps before placement.
                if w > 1 && col + w > width {
                    rows = rows.saturating_add(1);
                    col = 0;
                }
                col = col.saturating_add(w);
            }
        }
        if col >= width {
            rows = rows.saturating_add(col / width);
            col %= width;
        }
    }

    Advance { rows, col }
}

impl Advance {
    fn accumulate(self, prior_rows: u16) -> Self {
        Self {
            rows: prior_rows.saturating_add(self.rows),
            col: self.col,
        }
    }
}

/// Cell width of a printable character.
///
/// Zero-width characters (combining marks, unassigned controls) occupy no
/// cell. `ESC` only reaches here when escape processing is off, where a
/// legacy device prints it as one glyph.
fn cell_width(c: char) -> u16 {
    if c == '\u{1b}' {
        return 1;
    }
    UnicodeWidthChar::width(c).unwrap_or(0) as u16
}

/// Skip an escape sequence as a zero-width unit.
///
/// CSI (`ESC [`) runs through parameter bytes `0x30..=0x3F`, intermediate
/// bytes `0x20..=0x2F`, and one final byte `0x40..=0x7E`. OSC (`ESC ]`)
/// runs through `BEL` or `ESC \`. Any other introducer consumes a single
/// following byte.
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
