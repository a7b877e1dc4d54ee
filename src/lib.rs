//! # inkline
//!
//! A line-oriented terminal writer with three capabilities a plain
//! stdout-based logger cannot offer:
//!
//! - **Colorized output** described by a compact inline microsyntax
//!   (`"R`error"`, `"Yn`warning"`), parsed by [`style::parse`].
//! - **Scroll-stable logical positions**: every write returns
//!   [`Position`] handles that stay resolvable (and rewritable) after
//!   the buffer has scrolled, via the session's scroll-shift counter.
//! - **A pinned footer region** re-rendered beneath freshly appended log
//!   output on every write, without ever corrupting emitted lines.
//!
//! This is *not* a TUI framework: there is no layout engine, no
//! compositing, no diffing renderer. Every write is an immediate,
//! synchronous mutation of the real terminal, serialized through one
//! session lock.
//!
//! # Quick start
//!
//! ```no_run
//! use inkline::{Session, SpinnerStyle};
//! use inkline::animation::Animation;
//! use std::time::Duration;
//!
//! let session = Session::new();
//!
//! // Colored log lines.
//! session.write_line(&["G`ok:", " service started"]).unwrap();
//!
//! // A live footer that follows the log.
//! session.pin_lines(&["", "W`--- press q to quit ---"]).unwrap();
//! session.write_line(&["more output scrolls above the footer"]).unwrap();
//!
//! // Rewrite an earlier line, wherever it scrolled to.
//! let (begin, _) = session.write_line(&["downloading..."]).unwrap();
//! session.write_line(&["unrelated output"]).unwrap();
//! session.try_write_to(&begin, &["downloading... ", "G`done"]).unwrap();
//!
//! // An inline spinner that skips frames once scrolled out of view.
//! session.write(&["working "]).unwrap();
//! let spin = Animation::spinner(&session, SpinnerStyle::Dots, Duration::from_millis(80)).unwrap();
//! // ...
//! spin.stop();
//! session.unpin().unwrap();
//! ```
//!
//! # Architecture
//!
//! Everything funnels through the [`session::Session`] writer engine; see
//! that module for the scroll-reconstruction algorithm. [`wrap`] predicts
//! line wrapping, [`position`] holds the logical-position math, and
//! [`terminal`] is the device seam ([`terminal::CrosstermBackend`] for the
//! real terminal, [`terminal::TestBackend`] for tests).

pub mod animation;
pub mod error;
pub mod input;
pub mod position;
pub mod session;
pub mod style;
pub mod terminal;
pub mod wrap;

pub use animation::{Animation, SpinnerStyle};
pub use error::{Error, Result};
pub use position::{Position, Resolved};
pub use session::Session;
pub use style::{Color, Segment};
pub use terminal::{Backend, CrosstermBackend, Key, TestBackend, Viewport};
