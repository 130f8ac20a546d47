//! termgrid — terminal session and emulation engine.
//!
//! termgrid turns a raw byte stream produced by a shell into a bounded
//! 2-D character grid with cursor tracking and scrollback, while relaying
//! user keystrokes back to whichever producer is active. A [`Session`]
//! either bridges a real child process (stdout/stderr readers plus a
//! stdin writer) or runs the built-in command interpreter when no process
//! is attached; both feed the same [`Emulator`].
//!
//! The emulator is deliberately minimal: newline, carriage return,
//! backspace, and tab, with every other control byte stripped. Rendering,
//! theming, and layout belong to the embedding application, which polls
//! the grid through the session's accessors and receives change
//! notifications through its [`TerminalListener`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use termgrid::{Config, NullListener, Session};
//!
//! let config = Config::default();
//! let session = Session::interpreter(80, 24, &config, Arc::new(NullListener))?;
//! session.write(b"echo hello\n");
//! # session.finish();
//! # Ok::<(), termgrid::SessionError>(())
//! ```

pub mod config;
pub mod core;

pub use crate::config::{Config, ConfigError};
pub use crate::core::emulator::Emulator;
pub use crate::core::screen::{Cell, ScreenBuffer, Style, StyleFlags};
pub use crate::core::session::{
    NullListener, Session, SessionError, SessionState, TerminalListener,
};
