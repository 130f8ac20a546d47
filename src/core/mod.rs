//! Core terminal engine components.
//!
//! This module contains the terminal session and emulation logic:
//!
//! - **screen**: cell grid, packed styles, and scrollback
//! - **emulator**: control-byte state machine feeding the screen
//! - **interp**: built-in command table for sessions without a process
//! - **session**: session lifecycle, input queue, and process bridging
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Emulator
//! │   └── ScreenBuffer (cell grid + scrollback)
//! └── input queue ─> interpreter worker  -or-  child stdio threads
//! ```

pub mod emulator;
pub mod interp;
pub mod screen;
pub mod session;
