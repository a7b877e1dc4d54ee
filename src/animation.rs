//! Inline animations built on the position API.
//!
//! Animations are ordinary consumers of the engine: they capture the
//! position where their first frame was written and overwrite it on every
//! tick via [`Session::try_write_to_visible`], silently skipping frames
//! whose cell has scrolled out of the visible window. They never corrupt
//! unrelated screen regions and never block log output; each frame write
//! serializes on the session lock like any other operation.
//!
//! Cancellation is cooperative: the worker checks a stop flag at its delay
//! point between writes.
//!
//! # Example
//!
//! ```no_run
//! use inkline::animation::{Animation, SpinnerStyle};
//! use inkline::session::Session;
//! use std::time::Duration;
//!
//! let session = Session::new();
//! session.write(&["fetching "]).unwrap();
//! let spinner =
//!     Animation::spinner(&session, SpinnerStyle::Dots, Duration::from_millis(80)).unwrap();
//! // ... do work; log writes keep flowing underneath ...
//! spinner.stop();
//! session.write_line(&["G`done"]).unwrap();
//! ```

use crate::error::Result;
use crate::session::Session;
use crate::style;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// Spinner frame tables.
#[derive(Debug, Clone, Copy, Default)]
pub enum SpinnerStyle {
    /// Braille dots: ⣾ ⣽ ⣻ ⢿ ⡿ ⣟ ⣯ ⣷
    #[default]
    Dots,
    /// Line: - \ | /
    Line,
    /// Circle: ◐ ◓ ◑ ◒
    Circle,
    /// Arrow: ← ↖ ↑ ↗ → ↘ ↓ ↙
    Arrow,
    /// Bouncing bar: [=   ] [ =  ] [  = ] [   =]
    BouncingBar,
}

impl SpinnerStyle {
    /// The frames for this style.
    #[must_use]
    pub const fn frames(&self) -> &'static [&'static str] {
        match self {
            SpinnerStyle::Dots => &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"],
            SpinnerStyle::Line => &["-", "\\", "|", "/"],
            SpinnerStyle::Circle => &["◐", "◓", "◑", "◒"],
            SpinnerStyle::Arrow => &["←", "↖", "↑", "↗", "→", "↘", "↓", "↙"],
            SpinnerStyle::BouncingBar => {
                &["[=   ]", "[ =  ]", "[  = ]", "[   =]", "[  = ]", "[ =  ]"]
            }
        }
    }
}

/// A running inline animation.
///
/// Dropping the handle stops the worker and blanks the frame cells.
pub struct Animation {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Animation {
    /// Start a spinner at the current cursor.
    pub fn spinner(session: &Session, style: SpinnerStyle, interval: Duration) -> Result<Self> {
        Self::cycle(
            session,
            style.frames().iter().map(|f| (*f).to_string()).collect(),
            interval,
        )
    }

    /// Start a trailing-ellipsis animation at the current cursor.
    pub fn ellipsis(session: &Session, interval: Duration) -> Result<Self> {
        Self::cycle(
            session,
            vec![
                String::new(),
                ".".to_string(),
                "..".to_string(),
                "...".to_string(),
            ],
            interval,
        )
    }

    /// Start a custom frame cycle at the current cursor.
    ///
    /// Frames may carry color microsyntax. They are padded to a common
    /// display width so a shorter frame fully overwrites a longer one.
    ///
    /// # Panics
    ///
    /// Panics if `frames` is empty.
    pub fn cycle(session: &Session, frames: Vec<String>, interval: Duration) -> Result<Self> {
        assert!(!frames.is_empty(), "an animation needs at least one frame");

        let width = frames
            .iter()
            .map(|f| UnicodeWidthStr::width(style::parse(f).text.as_str()))
            .max()
            .unwrap_or(0);
        let frames: Vec<String> = frames
            .into_iter()
            .map(|f| {
                let pad = width - UnicodeWidthStr::width(style::parse(&f).text.as_str());
                f + &" ".repeat(pad)
            })
            .collect();

        let (begin, _) = session.write(&[frames[0].as_str()])?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let session = session.clone();
        let handle = thread::spawn(move || {
            let mut tick = 1_usize;
            loop {
                thread::sleep(interval);
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                let frame = &frames[tick % frames.len()];
                // Skipped frames (scrolled-out position) are fine; a
                // device error ends the animation.
                if session.try_write_to_visible(&begin, &[frame.as_str()]).is_err() {
                    return;
                }
                tick += 1;
            }
            let blank = " ".repeat(width);
            let _ = session.try_write_to(&begin, &[blank.as_str()]);
        });

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the animation and blank its cells, joining the worker.
    pub fn stop(mut self) {
        self.halt();
    }

    /// True while the worker is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn halt(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::terminal::TestBackend;

    #[test]
    fn test_spinner_writes_and_erases_frame() {
        let backend = TestBackend::new(20, 5);
        let session = Session::with_backend(backend.clone());
        session.write(&["task "]).unwrap();
        let spinner =
            Animation::spinner(&session, SpinnerStyle::Line, Duration::from_millis(1)).unwrap();
        assert!(backend.line(0).starts_with("task "));
        thread::sleep(Duration::from_millis(20));
        spinner.stop();
        // The frame cell is blanked on the way out.
        assert_eq!(backend.line(0), "task");
    }

    #[test]
    fn test_frames_padded_to_common_width() {
        let backend = TestBackend::new(20, 5);
        let session = Session::with_backend(backend.clone());
        let anim = Animation::cycle(
            &session,
            vec!["..".to_string(), ".".to_string()],
            Duration::from_millis(1),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(15));
        anim.stop();
        assert_eq!(backend.line(0), "");
    }

    #[test]
    fn test_scrolled_out_spinner_skips_frames() {
        let backend = TestBackend::new(10, 3);
        let session = Session::with_backend(backend.clone());
        let spinner =
            Animation::spinner(&session, SpinnerStyle::Line, Duration::from_millis(1)).unwrap();
        // Scroll the spinner's row off the top; subsequent frames must be
        // skipped without disturbing the log.
        for i in 0..5 {
            session.write_line(&[format!("line {i}")]).unwrap();
        }
        thread::sleep(Duration::from_millis(10));
        spinner.stop();
        assert_eq!(backend.line(1), "line 4");
    }
}
