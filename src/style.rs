//! Colors, attributed segments, and the inline color microsyntax.
//!
//! A [`Segment`] is the atomic unit the writer engine emits: a span of text
//! with an optional foreground and background color. Segments are produced
//! per call by [`parse`] and consumed once; they are never retained by the
//! engine.
//!
//! # Microsyntax
//!
//! A string handed to the high-level write APIs may begin with up to two
//! one-letter color codes followed by a backtick:
//!
//! - `"R`error"`: foreground bright red
//! - `"Yn`warn"`: background bright yellow, foreground black
//! - `` "`R`literal" ``: a bare leading backtick escapes the rest verbatim
//!
//! Lowercase letters select the base colors, uppercase the bright variants:
//! `n` black, `r` red, `g` green, `y` yellow, `b` blue, `m` magenta, `c`
//! cyan, `w` white (the base white is the legacy console "gray"; `N` is
//! dark gray). Any string that does not match the pattern is passed through
//! unchanged, so plain text never needs escaping.
//!
//! # Example
//!
//! ```
//! use inkline::style::{parse, Color};
//!
//! let seg = parse("R`disk full");
//! assert_eq!(seg.text, "disk full");
//! assert_eq!(seg.fg, Some(Color::BrightRed));
//! assert_eq!(seg.bg, None);
//!
//! let plain = parse("hello");
//! assert_eq!(plain.text, "hello");
//! assert_eq!(plain.fg, None);
//! ```

/// A terminal color: the 16 classic console colors plus the terminal's
/// own default attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's configured default color.
    #[default]
    Default,
    /// Black.
    Black,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Blue.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// White (the legacy console "gray").
    White,
    /// Bright black (dark gray).
    BrightBlack,
    /// Bright red.
    BrightRed,
    /// Bright green.
    BrightGreen,
    /// Bright yellow.
    BrightYellow,
    /// Bright blue.
    BrightBlue,
    /// Bright magenta.
    BrightMagenta,
    /// Bright cyan.
    BrightCyan,
    /// Bright white.
    BrightWhite,
}

impl Color {
    /// Convert to the crossterm color type.
    #[must_use]
    pub const fn to_crossterm(self) -> crossterm::style::Color {
        use crossterm::style::Color as C;
        match self {
            Color::Default => C::Reset,
            Color::Black => C::Black,
            Color::Red => C::DarkRed,
            Color::Green => C::DarkGreen,
            Color::Yellow => C::DarkYellow,
            Color::Blue => C::DarkBlue,
            Color::Magenta => C::DarkMagenta,
            Color::Cyan => C::DarkCyan,
            Color::White => C::Grey,
            Color::BrightBlack => C::DarkGrey,
            Color::BrightRed => C::Red,
            Color::BrightGreen => C::Green,
            Color::BrightYellow => C::Yellow,
            Color::BrightBlue => C::Blue,
            Color::BrightMagenta => C::Magenta,
            Color::BrightCyan => C::Cyan,
            Color::BrightWhite => C::White,
        }
    }

    /// The microsyntax code letter for this color, if it has one.
    ///
    /// [`Color::Default`] has no code; it is expressed by omitting the code
    /// entirely.
    #[must_use]
    pub const fn code(self) -> Option<char> {
        Some(match self {
            Color::Default => return None,
            Color::Black => 'n',
            Color::Red => 'r',
            Color::Green => 'g',
            Color::Yellow => 'y',
            Color::Blue => 'b',
            Color::Magenta => 'm',
            Color::Cyan => 'c',
            Color::White => 'w',
            Color::BrightBlack => 'N',
            Color::BrightRed => 'R',
            Color::BrightGreen => 'G',
            Color::BrightYellow => 'Y',
            Color::BrightBlue => 'B',
            Color::BrightMagenta => 'M',
            Color::BrightCyan => 'C',
            Color::BrightWhite => 'W',
        })
    }

    /// Look up a color from its microsyntax code letter.
    #[must_use]
    pub const fn from_code(c: char) -> Option<Self> {
        Some(match c {
            'n' => Color::Black,
            'r' => Color::Red,
            'g' => Color::Green,
            'y' => Color::Yellow,
            'b' => Color::Blue,
            'm' => Color::Magenta,
            'c' => Color::Cyan,
            'w' => Color::White,
            'N' => Color::BrightBlack,
            'R' => Color::BrightRed,
            'G' => Color::BrightGreen,
            'Y' => Color::BrightYellow,
            'B' => Color::BrightBlue,
            'M' => Color::BrightMagenta,
            'C' => Color::BrightCyan,
            'W' => Color::BrightWhite,
            _ => return None,
        })
    }
}

/// A span of text with optional foreground and background colors.
///
/// The atomic unit written to the terminal. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// The text to emit.
    pub text: String,
    /// Foreground color, or `None` for the terminal's current attribute.
    pub fg: Option<Color>,
    /// Background color, or `None` for the terminal's current attribute.
    pub bg: Option<Color>,
}

impl Segment {
    /// An uncolored segment.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: None,
            bg: None,
        }
    }

    /// A segment with a foreground color.
    #[must_use]
    pub fn colored(text: impl Into<String>, fg: Color) -> Self {
        Self {
            text: text.into(),
            fg: Some(fg),
            bg: None,
        }
    }

    /// True if the segment carries no color at all.
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.fg.is_none() && self.bg.is_none()
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        parse(s)
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        parse(&s)
    }
}

/// Parse the inline color microsyntax into a [`Segment`].
///
/// - `"<fg>`text"`: one code letter sets the foreground.
/// - `"<bg><fg>`text"`: two code letters set background then foreground.
/// - `` "`text" ``: a bare leading backtick escapes the rest verbatim.
/// - Anything else is returned uncolored and unmodified.
///
/// An invalid code letter before the backtick makes the whole string
/// literal, so unknown prefixes degrade to plain text rather than being
/// swallowed.
#[must_use]
pub fn parse(input: &str) -> Segment {
    let mut chars = input.chars();
    match (chars.next(), chars.next(), chars.next()) {
        // Bare backtick: escape hatch for literal leading characters.
        (Some('`'), _, _) => Segment::plain(&input[1..]),
        // One code letter: foreground.
        (Some(f), Some('`'), _) => match Color::from_code(f) {
            Some(fg) => Segment {
                text: input[f.len_utf8() + 1..].to_string(),
                fg: Some(fg),
                bg: None,
            },
            None => Segment::plain(input),
        },
        // Two code letters: background then foreground.
        (Some(b), Some(f), Some('`')) => match (Color::from_code(b), Color::from_code(f)) {
            (Some(bg), Some(fg)) => Segment {
                text: input[b.len_utf8() + f.len_utf8() + 1..].to_string(),
                fg: Some(fg),
                bg: Some(bg),
            },
            _ => Segment::plain(input),
        },
        _ => Segment::plain(input),
    }
}

/// Render a [`Segment`] back into microsyntax form.
///
/// Inverse of [`parse`] for segments it can produce: `render(&parse(s)) == s`
/// for any `s` that does not begin with a color code or backtick.
#[must_use]
pub fn render(seg: &Segment) -> String {
    let mut out = String::with_capacity(seg.text.len() + 3);
    match (seg.bg.and_then(Color::code), seg.fg.and_then(Color::code)) {
        (Some(b), Some(f)) => {
            out.push(b);
            out.push(f);
            out.push('`');
        }
        (None, Some(f)) => {
            out.push(f);
            out.push('`');
        }
        // A background without a foreground has no one-letter form; emit
        // the foreground slot as base white to keep the background.
        (Some(b), None) => {
            out.push(b);
            out.push('w');
            out.push('`');
        }
        (None, None) => {
            // Escape text that would otherwise re-parse as a code.
            if seg.text.starts_with('`') || parse(&seg.text) != Segment::plain(seg.text.as_str()) {
                out.push('`');
            }
        }
    }
    out.push_str(&seg.text);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let seg = parse("hello world");
        assert_eq!(seg, Segment::plain("hello world"));
    }

    #[test]
    fn test_parse_foreground() {
        let seg = parse("R`alert");
        assert_eq!(seg.text, "alert");
        assert_eq!(seg.fg, Some(Color::BrightRed));
        assert_eq!(seg.bg, None);
    }

    #[test]
    fn test_parse_background_and_foreground() {
        let seg = parse("Yn`caution");
        assert_eq!(seg.text, "caution");
        assert_eq!(seg.bg, Some(Color::BrightYellow));
        assert_eq!(seg.fg, Some(Color::Black));
    }

    #[test]
    fn test_parse_escaped_backtick() {
        let seg = parse("`R`not a code");
        assert_eq!(seg, Segment::plain("R`not a code"));
    }

    #[test]
    fn test_parse_invalid_code_is_literal() {
        assert_eq!(parse("Z`text"), Segment::plain("Z`text"));
        assert_eq!(parse("xY`text"), Segment::plain("xY`text"));
    }

    #[test]
    fn test_parse_empty_and_short() {
        assert_eq!(parse(""), Segment::plain(""));
        assert_eq!(parse("R"), Segment::plain("R"));
        assert_eq!(parse("R`"), Segment::colored("", Color::BrightRed));
    }

    #[test]
    fn test_render_round_trip() {
        for s in ["R`text", "Yn`text", "plain", "", "g`", "wW`x"] {
            assert_eq!(render(&parse(s)), s, "round-trip failed for {s:?}");
        }
    }

    #[test]
    fn test_render_escapes_code_like_text() {
        let seg = Segment::plain("R`text");
        assert_eq!(render(&seg), "`R`text");
        assert_eq!(parse(&render(&seg)), seg);
    }

    #[test]
    fn test_color_code_round_trip() {
        for c in [
            Color::Black,
            Color::Red,
            Color::White,
            Color::BrightBlack,
            Color::BrightWhite,
        ] {
            let code = c.code().expect("non-default colors have codes");
            assert_eq!(Color::from_code(code), Some(c));
        }
        assert_eq!(Color::Default.code(), None);
    }
}
