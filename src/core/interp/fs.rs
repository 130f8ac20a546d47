//! Filesystem built-ins.
//!
//! These operate on the real filesystem relative to the interpreter's
//! working directory. Failures come back as POSIX-style error text using
//! the path exactly as the user typed it.

use std::fs;
use std::io;
use std::path::Path;

use super::{resolve, InterpContext};

fn io_error(cmd: &str, shown: &str, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => format!("{cmd}: {shown}: No such file or directory"),
        io::ErrorKind::PermissionDenied => format!("{cmd}: {shown}: Permission denied"),
        _ => format!("{cmd}: {shown}: {err}"),
    }
}

/// Arguments minus leading `-` flags.
fn operands<'a>(args: &[&'a str]) -> Vec<&'a str> {
    args.iter().filter(|a| !a.starts_with('-')).copied().collect()
}

pub(super) fn ls(ctx: &mut InterpContext, args: &[&str]) -> String {
    let shown = operands(args).first().copied().unwrap_or(".");
    let path = resolve(&ctx.cwd(), shown);
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(err) => return io_error("ls", shown, &err),
    };
    if meta.is_file() {
        return shown.to_string();
    }
    let entries = match fs::read_dir(&path) {
        Ok(entries) => entries,
        Err(err) => return io_error("ls", shown, &err),
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.join("  ")
}

pub(super) fn cat(ctx: &mut InterpContext, args: &[&str]) -> String {
    if args.is_empty() {
        return "cat: missing operand".to_string();
    }
    let mut out = Vec::new();
    for arg in args {
        match fs::read_to_string(resolve(&ctx.cwd(), arg)) {
            Ok(text) => out.push(text.trim_end_matches('\n').to_string()),
            Err(err) => out.push(io_error("cat", arg, &err)),
        }
    }
    out.join("\n")
}

pub(super) fn mkdir(ctx: &mut InterpContext, args: &[&str]) -> String {
    if args.is_empty() {
        return "mkdir: missing operand".to_string();
    }
    let mut out = Vec::new();
    for arg in args {
        if let Err(err) = fs::create_dir(resolve(&ctx.cwd(), arg)) {
            let reason = match err.kind() {
                io::ErrorKind::AlreadyExists => "File exists".to_string(),
                io::ErrorKind::NotFound => "No such file or directory".to_string(),
                _ => err.to_string(),
            };
            out.push(format!("mkdir: cannot create directory '{arg}': {reason}"));
        }
    }
    out.join("\n")
}

pub(super) fn rm(ctx: &mut InterpContext, args: &[&str]) -> String {
    let recursive = args
        .iter()
        .any(|a| matches!(*a, "-r" | "-R" | "-rf" | "-fr"));
    let paths = operands(args);
    if paths.is_empty() {
        return "rm: missing operand".to_string();
    }
    let mut out = Vec::new();
    for arg in paths {
        let path = resolve(&ctx.cwd(), arg);
        let result = match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                if recursive {
                    fs::remove_dir_all(&path)
                } else {
                    out.push(format!("rm: cannot remove '{arg}': Is a directory"));
                    continue;
                }
            }
            Ok(_) => fs::remove_file(&path),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            let reason = match err.kind() {
                io::ErrorKind::NotFound => "No such file or directory".to_string(),
                _ => err.to_string(),
            };
            out.push(format!("rm: cannot remove '{arg}': {reason}"));
        }
    }
    out.join("\n")
}

pub(super) fn cp(ctx: &mut InterpContext, args: &[&str]) -> String {
    transfer(ctx, args, "cp", "copy", |from, to| {
        fs::copy(from, to).map(|_| ())
    })
}

pub(super) fn mv(ctx: &mut InterpContext, args: &[&str]) -> String {
    transfer(ctx, args, "mv", "move", |from, to| fs::rename(from, to))
}

/// Shared shape of `cp` and `mv`: sources plus one destination, where a
/// directory destination receives the source's file name.
fn transfer(
    ctx: &mut InterpContext,
    args: &[&str],
    cmd: &str,
    verb: &str,
    op: impl Fn(&Path, &Path) -> io::Result<()>,
) -> String {
    let paths = operands(args);
    if paths.len() < 2 {
        return format!("{cmd}: missing file operand");
    }
    let (sources, dest) = paths.split_at(paths.len() - 1);
    let dest_path = resolve(&ctx.cwd(), dest[0]);
    let mut out = Vec::new();
    for src in sources {
        let from = resolve(&ctx.cwd(), src);
        if !from.exists() {
            out.push(format!("{cmd}: cannot stat '{src}': No such file or directory"));
            continue;
        }
        let to = if dest_path.is_dir() {
            match from.file_name() {
                Some(name) => dest_path.join(name),
                None => dest_path.clone(),
            }
        } else {
            dest_path.clone()
        };
        if let Err(err) = op(&from, &to) {
            out.push(format!("{cmd}: cannot {verb} '{src}' to '{}': {err}", dest[0]));
        }
    }
    out.join("\n")
}

pub(super) fn touch(ctx: &mut InterpContext, args: &[&str]) -> String {
    if args.is_empty() {
        return "touch: missing file operand".to_string();
    }
    let mut out = Vec::new();
    for arg in args {
        let open = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(resolve(&ctx.cwd(), arg));
        if let Err(err) = open {
            let reason = match err.kind() {
                io::ErrorKind::NotFound => "No such file or directory".to_string(),
                _ => err.to_string(),
            };
            out.push(format!("touch: cannot touch '{arg}': {reason}"));
        }
    }
    out.join("\n")
}

pub(super) fn grep(ctx: &mut InterpContext, args: &[&str]) -> String {
    let Some((pattern, files)) = args.split_first() else {
        return "usage: grep <pattern> <file>...".to_string();
    };
    if files.is_empty() {
        return "usage: grep <pattern> <file>...".to_string();
    }
    let mut out = Vec::new();
    for file in files {
        match fs::read_to_string(resolve(&ctx.cwd(), file)) {
            Ok(text) => {
                for line in text.lines().filter(|l| l.contains(pattern)) {
                    if files.len() > 1 {
                        out.push(format!("{file}:{line}"));
                    } else {
                        out.push(line.to_string());
                    }
                }
            }
            Err(err) => out.push(io_error("grep", file, &err)),
        }
    }
    out.join("\n")
}

pub(super) fn find(ctx: &mut InterpContext, args: &[&str]) -> String {
    let mut start = ".";
    let mut pattern = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "-name" {
            pattern = iter.next().copied();
        } else {
            start = arg;
        }
    }
    let root = resolve(&ctx.cwd(), start);
    if !root.exists() {
        return format!("find: '{start}': No such file or directory");
    }
    let mut out = Vec::new();
    walk(&root, start, pattern, &mut out);
    out.join("\n")
}

fn walk(path: &Path, shown: &str, pattern: Option<&str>, out: &mut Vec<String>) {
    let leaf = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let matches = match (pattern, &leaf) {
        (None, _) => true,
        (Some(p), Some(leaf)) => leaf == p,
        (Some(_), None) => false,
    };
    if matches {
        out.push(shown.to_string());
    }
    if path.is_dir() {
        let mut entries: Vec<_> = match fs::read_dir(path) {
            Ok(entries) => entries.filter_map(|e| e.ok()).collect(),
            Err(_) => return,
        };
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            walk(&entry.path(), &format!("{shown}/{name}"), pattern, out);
        }
    }
}

/// Parse an optional `-n N` and return `(count, files)`.
fn line_limit<'a>(args: &[&'a str], default: usize) -> (usize, Vec<&'a str>) {
    let mut count = default;
    let mut files = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "-n" {
            if let Some(n) = iter.next().and_then(|v| v.parse().ok()) {
                count = n;
            }
        } else if !arg.starts_with('-') {
            files.push(*arg);
        }
    }
    (count, files)
}

pub(super) fn head(ctx: &mut InterpContext, args: &[&str]) -> String {
    let (count, files) = line_limit(args, 10);
    if files.is_empty() {
        return "head: missing operand".to_string();
    }
    let mut out = Vec::new();
    for file in files {
        match fs::read_to_string(resolve(&ctx.cwd(), file)) {
            Ok(text) => out.extend(text.lines().take(count).map(str::to_string)),
            Err(err) => out.push(match err.kind() {
                io::ErrorKind::NotFound => {
                    format!("head: cannot open '{file}' for reading: No such file or directory")
                }
                _ => format!("head: cannot open '{file}' for reading: {err}"),
            }),
        }
    }
    out.join("\n")
}

pub(super) fn tail(ctx: &mut InterpContext, args: &[&str]) -> String {
    let (count, files) = line_limit(args, 10);
    if files.is_empty() {
        return "tail: missing operand".to_string();
    }
    let mut out = Vec::new();
    for file in files {
        match fs::read_to_string(resolve(&ctx.cwd(), file)) {
            Ok(text) => {
                let lines: Vec<&str> = text.lines().collect();
                let skip = lines.len().saturating_sub(count);
                out.extend(lines[skip..].iter().map(|l| l.to_string()));
            }
            Err(err) => out.push(match err.kind() {
                io::ErrorKind::NotFound => {
                    format!("tail: cannot open '{file}' for reading: No such file or directory")
                }
                _ => format!("tail: cannot open '{file}' for reading: {err}"),
            }),
        }
    }
    out.join("\n")
}

pub(super) fn wc(ctx: &mut InterpContext, args: &[&str]) -> String {
    let files = operands(args);
    if files.is_empty() {
        return "wc: missing operand".to_string();
    }
    let mut out = Vec::new();
    for file in files {
        match fs::read_to_string(resolve(&ctx.cwd(), file)) {
            Ok(text) => {
                let lines = text.lines().count();
                let words = text.split_whitespace().count();
                out.push(format!("{:>7} {:>7} {:>7} {}", lines, words, text.len(), file));
            }
            Err(err) => out.push(io_error("wc", file, &err)),
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::super::{dispatch, InterpContext};
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> InterpContext {
        InterpContext::new(dir.path().to_path_buf(), "alice", "box")
    }

    #[test]
    fn mkdir_then_ls_shows_the_directory() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "mkdir foo"), "");
        assert!(dispatch(&mut ctx, "ls").contains("foo"));
    }

    #[test]
    fn mkdir_existing_reports_file_exists() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "mkdir foo");
        let out = dispatch(&mut ctx, "mkdir foo");
        assert_eq!(out, "mkdir: cannot create directory 'foo': File exists");
    }

    #[test]
    fn ls_missing_path_is_posix_error_text() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(
            dispatch(&mut ctx, "ls nope"),
            "ls: nope: No such file or directory"
        );
    }

    #[test]
    fn ls_sorts_entries() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "touch b a c");
        assert_eq!(dispatch(&mut ctx, "ls"), "a  b  c");
    }

    #[test]
    fn cat_reads_file_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), "one\ntwo\n").unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "cat f"), "one\ntwo");
        assert_eq!(
            dispatch(&mut ctx, "cat missing"),
            "cat: missing: No such file or directory"
        );
    }

    #[test]
    fn rm_requires_recursive_for_directories() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "mkdir d");
        assert_eq!(dispatch(&mut ctx, "rm d"), "rm: cannot remove 'd': Is a directory");
        assert_eq!(dispatch(&mut ctx, "rm -r d"), "");
        assert!(!dir.path().join("d").exists());
    }

    #[test]
    fn cp_into_directory_keeps_file_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), "data").unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "mkdir d");
        assert_eq!(dispatch(&mut ctx, "cp f d"), "");
        assert_eq!(std::fs::read_to_string(dir.path().join("d/f")).unwrap(), "data");
    }

    #[test]
    fn mv_renames_and_removes_source() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("old"), "data").unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "mv old new"), "");
        assert!(!dir.path().join("old").exists());
        assert!(dir.path().join("new").exists());
    }

    #[test]
    fn mv_missing_source_cannot_stat() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(
            dispatch(&mut ctx, "mv ghost new"),
            "mv: cannot stat 'ghost': No such file or directory"
        );
    }

    #[test]
    fn grep_prefixes_file_names_for_multiple_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a"), "hit here\nmiss\n").unwrap();
        std::fs::write(dir.path().join("b"), "another hit\n").unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "grep hit a"), "hit here");
        let out = dispatch(&mut ctx, "grep hit a b");
        assert_eq!(out, "a:hit here\nb:another hit");
    }

    #[test]
    fn find_walks_recursively_and_filters_by_name() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("x/y")).unwrap();
        std::fs::write(dir.path().join("x/y/target"), "").unwrap();
        let mut ctx = context(&dir);
        let out = dispatch(&mut ctx, "find . -name target");
        assert_eq!(out, "./x/y/target");
        let all = dispatch(&mut ctx, "find x");
        assert!(all.contains("x/y"));
        assert!(all.contains("x/y/target"));
    }

    #[test]
    fn head_and_tail_honor_line_count() {
        let dir = TempDir::new().unwrap();
        let body: String = (1..=20).map(|i| format!("line{i}\n")).collect();
        std::fs::write(dir.path().join("f"), body).unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "head -n 2 f"), "line1\nline2");
        assert_eq!(dispatch(&mut ctx, "tail -n 2 f"), "line19\nline20");
        assert_eq!(dispatch(&mut ctx, "head f").lines().count(), 10);
    }

    #[test]
    fn wc_counts_lines_words_bytes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), "a b\nc\n").unwrap();
        let mut ctx = context(&dir);
        let out = dispatch(&mut ctx, "wc f");
        assert_eq!(out.split_whitespace().collect::<Vec<_>>(), vec!["2", "3", "6", "f"]);
    }
}
