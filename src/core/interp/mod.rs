//! Built-in command interpreter.
//!
//! When a session has no real process attached it runs this simulated
//! shell instead: a static table of named built-ins covering filesystem
//! operations, navigation, text display, process/memory/disk facsimiles,
//! and a simulated package manager.
//!
//! Every built-in is synchronous and returns formatted text. Errors are
//! part of that text (`"ls: x: No such file or directory"`), never `Err`,
//! because whatever a built-in produces is simply terminal output.

mod fs;
mod pkg;
mod sys;

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared interpreter state: the working directory plus the identity used
/// by the prompt and the facsimile commands.
pub struct InterpContext {
    cwd: Arc<Mutex<PathBuf>>,
    home: PathBuf,
    pub user: String,
    pub host: String,
    /// Simulated package database, seeded with a base system.
    pub(crate) packages: BTreeSet<String>,
}

impl InterpContext {
    pub fn new(start_dir: PathBuf, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            cwd: Arc::new(Mutex::new(start_dir.clone())),
            home: start_dir,
            user: user.into(),
            host: host.into(),
            packages: ["base-files", "bash", "coreutils"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn cwd(&self) -> PathBuf {
        self.cwd.lock().clone()
    }

    pub(crate) fn set_cwd(&self, path: PathBuf) {
        *self.cwd.lock() = path;
    }

    pub(crate) fn home(&self) -> &Path {
        &self.home
    }

    /// Handle to the working directory, shared with the owning session.
    pub(crate) fn shared_cwd(&self) -> Arc<Mutex<PathBuf>> {
        Arc::clone(&self.cwd)
    }
}

/// One built-in: already-tokenized arguments in, formatted text out.
pub type Builtin = fn(&mut InterpContext, &[&str]) -> String;

/// The command table. Lookup is case-insensitive; keep entries sorted.
///
/// `clear` returns nothing here — the session loop resets the grid itself
/// when it sees the name, since built-ins only produce text.
pub const BUILTINS: &[(&str, Builtin)] = &[
    ("apt", pkg::apt),
    ("cat", fs::cat),
    ("cd", cd),
    ("clear", clear),
    ("cp", fs::cp),
    ("df", sys::df),
    ("echo", echo),
    ("find", fs::find),
    ("free", sys::free),
    ("grep", fs::grep),
    ("head", fs::head),
    ("help", help),
    ("hostname", sys::hostname),
    ("ls", fs::ls),
    ("mkdir", fs::mkdir),
    ("mv", fs::mv),
    ("ps", sys::ps),
    ("pwd", pwd),
    ("rm", fs::rm),
    ("tail", fs::tail),
    ("touch", fs::touch),
    ("uname", sys::uname),
    ("wc", fs::wc),
    ("whoami", sys::whoami),
];

pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, f)| *f)
}

/// Tokenize a line and run the matching built-in. Empty input produces
/// empty output; an unknown command produces a `Command not found` line.
pub fn dispatch(ctx: &mut InterpContext, line: &str) -> String {
    let mut tokens = line.split_whitespace();
    let Some(name) = tokens.next() else {
        return String::new();
    };
    let args: Vec<&str> = tokens.collect();
    match lookup(name) {
        Some(builtin) => builtin(ctx, &args),
        None => format!("Command not found: {name}"),
    }
}

/// Prompt of the form `user@host:leaf-of-cwd❯ `.
pub fn prompt(ctx: &InterpContext) -> String {
    let cwd = ctx.cwd();
    let leaf = cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    format!("{}@{}:{}❯ ", ctx.user, ctx.host, leaf)
}

/// Resolve a path argument: absolute if it starts with `/`, otherwise
/// relative to the working directory, with `.`/`..` folded lexically.
pub(crate) fn resolve(cwd: &Path, arg: &str) -> PathBuf {
    let raw = if arg.starts_with('/') {
        PathBuf::from(arg)
    } else {
        cwd.join(arg)
    };
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn cd(ctx: &mut InterpContext, args: &[&str]) -> String {
    let target = match args.first() {
        Some(arg) => resolve(&ctx.cwd(), arg),
        None => ctx.home().to_path_buf(),
    };
    let shown = args.first().copied().unwrap_or("~");
    match std::fs::metadata(&target) {
        Ok(meta) if meta.is_dir() => {
            ctx.set_cwd(target);
            String::new()
        }
        Ok(_) => format!("cd: {shown}: Not a directory"),
        Err(_) => format!("cd: {shown}: No such directory"),
    }
}

fn pwd(ctx: &mut InterpContext, _args: &[&str]) -> String {
    ctx.cwd().display().to_string()
}

fn echo(_ctx: &mut InterpContext, args: &[&str]) -> String {
    args.join(" ")
}

// Screen reset lives in the session loop; the table entry exists so the
// name resolves and shows up in `help`.
fn clear(_ctx: &mut InterpContext, _args: &[&str]) -> String {
    String::new()
}

fn help(_ctx: &mut InterpContext, _args: &[&str]) -> String {
    let names: Vec<&str> = BUILTINS.iter().map(|(n, _)| *n).collect();
    format!("Available commands: {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> InterpContext {
        InterpContext::new(dir.path().to_path_buf(), "alice", "box")
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup("ls").is_some());
        assert!(lookup("LS").is_some());
        assert!(lookup("Echo").is_some());
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn unknown_command_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "frobnicate"), "Command not found: frobnicate");
    }

    #[test]
    fn empty_line_produces_no_output() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "   "), "");
    }

    #[test]
    fn echo_joins_arguments() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "echo hello   world"), "hello world");
    }

    #[test]
    fn cd_changes_directory_and_pwd_reports_it() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "cd sub"), "");
        assert_eq!(ctx.cwd(), dir.path().join("sub"));
        assert_eq!(dispatch(&mut ctx, "pwd"), dir.path().join("sub").display().to_string());
    }

    #[test]
    fn cd_missing_directory_is_an_error_line() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let out = dispatch(&mut ctx, "cd nonexistent");
        assert!(out.contains("No such directory"), "{out}");
        assert_eq!(ctx.cwd(), dir.path());
    }

    #[test]
    fn cd_to_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), "x").unwrap();
        let mut ctx = context(&dir);
        assert!(dispatch(&mut ctx, "cd f").contains("Not a directory"));
    }

    #[test]
    fn cd_without_args_returns_home() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "cd sub");
        assert_eq!(dispatch(&mut ctx, "cd"), "");
        assert_eq!(ctx.cwd(), dir.path());
    }

    #[test]
    fn resolve_handles_dot_and_dotdot() {
        let cwd = Path::new("/a/b");
        assert_eq!(resolve(cwd, "c"), PathBuf::from("/a/b/c"));
        assert_eq!(resolve(cwd, "./c/../d"), PathBuf::from("/a/b/d"));
        assert_eq!(resolve(cwd, "/x/./y"), PathBuf::from("/x/y"));
        assert_eq!(resolve(cwd, ".."), PathBuf::from("/a"));
    }

    #[test]
    fn prompt_shows_cwd_leaf() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("projects")).unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "cd projects");
        let p = prompt(&ctx);
        assert!(p.starts_with("alice@box:projects"), "{p}");
        assert!(p.ends_with("❯ "));
    }

    #[test]
    fn help_lists_the_table() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let out = dispatch(&mut ctx, "help");
        assert!(out.contains("ls"));
        assert!(out.contains("apt"));
    }
}
