//! Simulated package manager.
//!
//! `apt` maintains a package set in the interpreter context and prints
//! apt-flavored output. Nothing is downloaded and nothing touches disk;
//! install/remove just mutate the set so `list` stays coherent within a
//! session.

use super::InterpContext;

/// Packages `search` can "find" beyond whatever is already installed.
const CATALOG: &[&str] = &["curl", "git", "htop", "nano", "python3", "vim", "wget"];

pub(super) fn apt(ctx: &mut InterpContext, args: &[&str]) -> String {
    let Some((sub, rest)) = args.split_first() else {
        return "apt: missing subcommand (update, upgrade, install, remove, list, search)"
            .to_string();
    };
    match sub.to_ascii_lowercase().as_str() {
        "update" => concat!(
            "Reading package lists... Done\n",
            "Building dependency tree... Done\n",
            "All packages are up to date.",
        )
        .to_string(),
        "upgrade" => concat!(
            "Reading package lists... Done\n",
            "Building dependency tree... Done\n",
            "0 upgraded, 0 newly installed, 0 to remove and 0 not upgraded.",
        )
        .to_string(),
        "install" => install(ctx, rest),
        "remove" => remove(ctx, rest),
        "list" => ctx
            .packages
            .iter()
            .map(|p| format!("{p}/stable 1.0 [installed]"))
            .collect::<Vec<_>>()
            .join("\n"),
        "search" => search(ctx, rest),
        other => format!("apt: unknown subcommand '{other}'"),
    }
}

fn install(ctx: &mut InterpContext, packages: &[&str]) -> String {
    if packages.is_empty() {
        return "apt install: missing package name".to_string();
    }
    let mut out = vec!["Reading package lists... Done".to_string()];
    for pkg in packages {
        if ctx.packages.contains(*pkg) {
            out.push(format!("{pkg} is already the newest version."));
        } else {
            ctx.packages.insert(pkg.to_string());
            out.push(format!("Setting up {pkg}... Done"));
        }
    }
    out.join("\n")
}

fn remove(ctx: &mut InterpContext, packages: &[&str]) -> String {
    if packages.is_empty() {
        return "apt remove: missing package name".to_string();
    }
    let mut out = Vec::new();
    for pkg in packages {
        if ctx.packages.remove(*pkg) {
            out.push(format!("Removing {pkg}... Done"));
        } else {
            out.push(format!("apt remove: package '{pkg}' is not installed"));
        }
    }
    out.join("\n")
}

fn search(ctx: &mut InterpContext, terms: &[&str]) -> String {
    let Some(term) = terms.first() else {
        return "apt search: missing search term".to_string();
    };
    let mut names: Vec<&str> = CATALOG
        .iter()
        .copied()
        .chain(ctx.packages.iter().map(String::as_str))
        .filter(|name| name.contains(term))
        .collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        return format!("apt search: no packages matching '{term}'");
    }
    names
        .into_iter()
        .map(|name| {
            let state = if ctx.packages.contains(name) {
                " [installed]"
            } else {
                ""
            };
            format!("{name}/stable 1.0{state}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::super::{dispatch, InterpContext};
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> InterpContext {
        InterpContext::new(dir.path().to_path_buf(), "alice", "box")
    }

    #[test]
    fn install_adds_to_list() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        let out = dispatch(&mut ctx, "apt install vim");
        assert!(out.contains("Setting up vim... Done"));
        assert!(dispatch(&mut ctx, "apt list").contains("vim/stable"));
    }

    #[test]
    fn install_twice_is_already_newest() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        dispatch(&mut ctx, "apt install vim");
        assert!(dispatch(&mut ctx, "apt install vim").contains("already the newest"));
    }

    #[test]
    fn remove_unknown_package_is_an_error_line() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert!(dispatch(&mut ctx, "apt remove vim").contains("is not installed"));
        dispatch(&mut ctx, "apt install vim");
        assert!(dispatch(&mut ctx, "apt remove vim").contains("Removing vim... Done"));
    }

    #[test]
    fn search_marks_installed_packages() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(dispatch(&mut ctx, "apt search vim"), "vim/stable 1.0");
        dispatch(&mut ctx, "apt install vim");
        assert_eq!(dispatch(&mut ctx, "apt search vim"), "vim/stable 1.0 [installed]");
    }

    #[test]
    fn missing_subcommand_prints_usage() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert!(dispatch(&mut ctx, "apt").contains("missing subcommand"));
    }
}
