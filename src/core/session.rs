//! Session management.
//!
//! A session is the unit of terminal identity: one emulator plus the I/O
//! source that feeds it. At construction it commits to one of two modes:
//!
//! - **Interpreter mode**: no real process. One worker thread pulls lines
//!   from the input queue and dispatches them to the built-in command
//!   table.
//! - **Process-bridge mode**: a caller-supplied child process. Three
//!   threads bridge its stdio: stdout and stderr readers feed the
//!   emulator, a stdin writer drains the input queue.
//!
//! Both modes share the same public surface; callers never branch on the
//! mode. Everything downstream of a successful constructor degrades into
//! terminal output or silent thread exit instead of errors.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use super::emulator::Emulator;
use super::interp::{self, InterpContext};
use crate::config::Config;

/// Change notifications pushed to the presentation layer.
///
/// `on_text_changed` and `on_session_finished` fire today; the remaining
/// hooks are contract surface for emulator features (title, clipboard,
/// bell, palette) that currently have no producer.
pub trait TerminalListener: Send + Sync {
    fn on_text_changed(&self) {}
    fn on_session_finished(&self) {}
    fn on_title_changed(&self, _title: &str) {}
    fn on_clipboard(&self, _text: &str) {}
    fn on_bell(&self) {}
    fn on_colors_changed(&self) {}
}

/// Listener that ignores every notification.
pub struct NullListener;

impl TerminalListener for NullListener {}

#[derive(Error, Debug)]
pub enum SessionError {
    /// The supplied child process was not built with piped stdio.
    #[error("child process is missing a piped {0} stream")]
    MissingStream(&'static str),

    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Running,
    Finished,
}

enum Mode {
    Interpreter { cwd: Arc<Mutex<PathBuf>> },
    ProcessBridge,
}

/// State shared with the session's worker threads.
struct SessionShared {
    running: AtomicBool,
    finished: AtomicBool,
    listener: Arc<dyn TerminalListener>,
    input: Mutex<Option<Sender<String>>>,
    child: Mutex<Option<Child>>,
}

impl SessionShared {
    fn new(
        listener: Arc<dyn TerminalListener>,
        input: Sender<String>,
        child: Option<Child>,
    ) -> Self {
        Self {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            listener,
            input: Mutex::new(Some(input)),
            child: Mutex::new(child),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One-shot shutdown: stops the worker loops, closes the input queue,
    /// kills the child so blocked reads unblock, and fires the finished
    /// callback. Safe to race from any number of threads; the swap makes
    /// the side effects exactly-once.
    fn teardown(&self) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        self.input.lock().take();
        if let Some(mut child) = self.child.lock().take() {
            if let Err(err) = child.kill() {
                debug!(%err, "child already exited");
            }
            let _ = child.wait();
        }
        info!("session finished");
        self.listener.on_session_finished();
    }
}

/// A terminal session: one emulator plus its byte producer.
pub struct Session {
    emulator: Arc<Mutex<Emulator>>,
    shared: Arc<SessionShared>,
    mode: Mode,
    threads: Vec<JoinHandle<()>>,
}

impl Session {
    /// Start a session backed by the built-in command interpreter.
    pub fn interpreter(
        cols: u16,
        rows: u16,
        config: &Config,
        listener: Arc<dyn TerminalListener>,
    ) -> Result<Self, SessionError> {
        let emulator = Arc::new(Mutex::new(Emulator::new(cols, rows, config.scrollback_limit)));
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(SessionShared::new(listener, tx, None));

        let start_dir = config
            .start_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        let ctx = InterpContext::new(start_dir, &config.user, &config.host);
        let cwd = ctx.shared_cwd();

        let worker = spawn_interpreter(rx, ctx, Arc::clone(&emulator), Arc::clone(&shared))?;
        info!(cols, rows, "interpreter session started");
        Ok(Self {
            emulator,
            shared,
            mode: Mode::Interpreter { cwd },
            threads: vec![worker],
        })
    }

    /// Start a session bridging an already-started child process. The
    /// child must have been spawned with piped stdin, stdout, and stderr.
    pub fn process_bridge(
        cols: u16,
        rows: u16,
        config: &Config,
        mut child: Child,
        listener: Arc<dyn TerminalListener>,
    ) -> Result<Self, SessionError> {
        let stdin = child
            .stdin
            .take()
            .ok_or(SessionError::MissingStream("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(SessionError::MissingStream("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SessionError::MissingStream("stderr"))?;

        let emulator = Arc::new(Mutex::new(Emulator::new(cols, rows, config.scrollback_limit)));
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(SessionShared::new(listener, tx, Some(child)));

        let threads = vec![
            spawn_reader(
                "stdout",
                stdout,
                Arc::clone(&emulator),
                Arc::clone(&shared),
                true,
            )?,
            spawn_reader(
                "stderr",
                stderr,
                Arc::clone(&emulator),
                Arc::clone(&shared),
                false,
            )?,
            spawn_writer(rx, stdin, Arc::clone(&shared))?,
        ];
        info!(cols, rows, "process-bridge session started");
        Ok(Self {
            emulator,
            shared,
            mode: Mode::ProcessBridge,
            threads,
        })
    }

    /// Queue user input for the active producer. This is the single input
    /// path for both modes; empty (after trimming) input is dropped, as is
    /// anything written after the session finished.
    pub fn write(&self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(tx) = self.shared.input.lock().as_ref() {
            let _ = tx.send(trimmed.to_string());
        }
    }

    /// Apply a window-size change to the grid.
    pub fn update_size(&self, cols: u16, rows: u16) {
        self.emulator.lock().update_size(cols, rows);
        if matches!(self.mode, Mode::ProcessBridge) {
            // Known limitation: the new size is not signalled to the
            // child; plain pipes have no window-size channel.
            debug!(cols, rows, "window resize not propagated to child process");
        }
    }

    /// Terminate the session. Idempotent and callable from any thread;
    /// the finished callback fires exactly once.
    pub fn finish(&self) {
        self.shared.teardown();
    }

    pub fn state(&self) -> SessionState {
        if self.shared.finished.load(Ordering::SeqCst) {
            SessionState::Finished
        } else if self.shared.is_running() {
            SessionState::Running
        } else {
            SessionState::Initializing
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state() == SessionState::Finished
    }

    /// Run a closure against the emulator under its lock. For presentation
    /// layers that need more than the convenience accessors below.
    pub fn with_emulator<R>(&self, f: impl FnOnce(&Emulator) -> R) -> R {
        f(&self.emulator.lock())
    }

    /// Terminal geometry as `(cols, rows)`.
    pub fn size(&self) -> (u16, u16) {
        let emu = self.emulator.lock();
        (emu.cols(), emu.rows())
    }

    /// Cursor position as `(row, col)`.
    pub fn cursor(&self) -> (u16, u16) {
        self.emulator.lock().cursor()
    }

    /// Snapshot of the visible grid, one string per row.
    pub fn lines(&self) -> Vec<String> {
        let emu = self.emulator.lock();
        (0..emu.rows()).map(|r| emu.row_text(r)).collect()
    }

    /// Interpreter working directory; `None` in process-bridge mode.
    pub fn cwd(&self) -> Option<PathBuf> {
        match &self.mode {
            Mode::Interpreter { cwd } => Some(cwd.lock().clone()),
            Mode::ProcessBridge => None,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.teardown();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Interpreter-mode worker: drain the input queue, dispatch built-ins,
/// render output and the next prompt.
fn spawn_interpreter(
    input: Receiver<String>,
    mut ctx: InterpContext,
    emulator: Arc<Mutex<Emulator>>,
    shared: Arc<SessionShared>,
) -> Result<JoinHandle<()>, SessionError> {
    thread::Builder::new()
        .name("termgrid-interp".to_string())
        .spawn(move || {
            emulator.lock().append(interp::prompt(&ctx).as_bytes());
            shared.listener.on_text_changed();

            while shared.is_running() {
                let Ok(line) = input.recv() else { break };

                // `clear` resets the grid itself; built-ins only return text.
                let name = line.split_whitespace().next().unwrap_or("");
                if name.eq_ignore_ascii_case("clear") {
                    let mut emu = emulator.lock();
                    emu.append(line.as_bytes());
                    emu.clear();
                    emu.append(interp::prompt(&ctx).as_bytes());
                    drop(emu);
                    shared.listener.on_text_changed();
                    continue;
                }

                let output = interp::dispatch(&mut ctx, &line);
                let mut emu = emulator.lock();
                emu.append(line.as_bytes());
                if !output.is_empty() {
                    emu.append(b"\r\n");
                    // Built-ins separate lines with bare newlines; the
                    // emulator needs the carriage return as well.
                    emu.append(output.replace('\n', "\r\n").as_bytes());
                }
                emu.append(b"\r\n");
                emu.append(interp::prompt(&ctx).as_bytes());
                drop(emu);
                shared.listener.on_text_changed();
            }
            debug!("interpreter worker exiting");
        })
        .map_err(|source| SessionError::ThreadSpawn {
            name: "interpreter",
            source,
        })
}

/// Bridge-mode reader: forward stream bytes into the emulator until EOF,
/// read error, or shutdown. The stdout reader additionally drives the
/// session to `Finished` when its stream ends.
fn spawn_reader(
    name: &'static str,
    mut stream: impl Read + Send + 'static,
    emulator: Arc<Mutex<Emulator>>,
    shared: Arc<SessionShared>,
    drives_finish: bool,
) -> Result<JoinHandle<()>, SessionError> {
    thread::Builder::new()
        .name(format!("termgrid-{name}"))
        .spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                if !shared.is_running() {
                    break;
                }
                match stream.read(&mut buf) {
                    Ok(0) => {
                        debug!(stream = name, "end of stream");
                        break;
                    }
                    Ok(n) => {
                        emulator.lock().append(&buf[..n]);
                        shared.listener.on_text_changed();
                    }
                    Err(err) => {
                        debug!(stream = name, %err, "read failed");
                        break;
                    }
                }
            }
            if drives_finish {
                shared.teardown();
            }
        })
        .map_err(|source| SessionError::ThreadSpawn { name, source })
}

/// Bridge-mode writer: copy queued input lines to the child's stdin.
fn spawn_writer(
    input: Receiver<String>,
    mut stdin: ChildStdin,
    shared: Arc<SessionShared>,
) -> Result<JoinHandle<()>, SessionError> {
    thread::Builder::new()
        .name("termgrid-stdin".to_string())
        .spawn(move || {
            while shared.is_running() {
                let Ok(line) = input.recv() else { break };
                let write = stdin
                    .write_all(line.as_bytes())
                    .and_then(|()| stdin.write_all(b"\n"))
                    .and_then(|()| stdin.flush());
                if let Err(err) = write {
                    debug!(%err, "stdin write failed");
                    break;
                }
            }
            debug!("stdin writer exiting");
        })
        .map_err(|source| SessionError::ThreadSpawn {
            name: "stdin-writer",
            source,
        })
}
