//! System-information facsimiles.
//!
//! `ps`, `free`, and `df` print fixed tables shaped like the real tools;
//! they exist so the simulated shell feels inhabited, not to report real
//! state. Identity commands answer from the interpreter context.

use super::InterpContext;

pub(super) fn whoami(ctx: &mut InterpContext, _args: &[&str]) -> String {
    ctx.user.clone()
}

pub(super) fn hostname(ctx: &mut InterpContext, _args: &[&str]) -> String {
    ctx.host.clone()
}

pub(super) fn uname(_ctx: &mut InterpContext, args: &[&str]) -> String {
    if args.contains(&"-a") {
        "Linux termgrid 6.1.0 #1 SMP PREEMPT_DYNAMIC x86_64 GNU/Linux".to_string()
    } else if args.contains(&"-r") {
        "6.1.0".to_string()
    } else {
        "Linux".to_string()
    }
}

pub(super) fn ps(_ctx: &mut InterpContext, _args: &[&str]) -> String {
    concat!(
        "  PID TTY          TIME CMD\n",
        "    1 pts/0    00:00:00 init\n",
        "   27 pts/0    00:00:02 shell\n",
        "   64 pts/0    00:00:00 ps",
    )
    .to_string()
}

pub(super) fn free(_ctx: &mut InterpContext, _args: &[&str]) -> String {
    concat!(
        "               total        used        free      shared  buff/cache   available\n",
        "Mem:         8046508     2651340     3214168       84612     2181000     5123820\n",
        "Swap:        2097148           0     2097148",
    )
    .to_string()
}

pub(super) fn df(_ctx: &mut InterpContext, _args: &[&str]) -> String {
    concat!(
        "Filesystem     1K-blocks     Used Available Use% Mounted on\n",
        "/dev/root       61202244 18714312  39346672  33% /\n",
        "tmpfs            4023252        0   4023252   0% /dev/shm",
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::super::{dispatch, InterpContext};
    use tempfile::TempDir;

    #[test]
    fn identity_commands_answer_from_context() {
        let dir = TempDir::new().unwrap();
        let mut ctx = InterpContext::new(dir.path().to_path_buf(), "alice", "box");
        assert_eq!(dispatch(&mut ctx, "whoami"), "alice");
        assert_eq!(dispatch(&mut ctx, "hostname"), "box");
    }

    #[test]
    fn uname_variants() {
        let dir = TempDir::new().unwrap();
        let mut ctx = InterpContext::new(dir.path().to_path_buf(), "alice", "box");
        assert_eq!(dispatch(&mut ctx, "uname"), "Linux");
        assert_eq!(dispatch(&mut ctx, "uname -r"), "6.1.0");
        assert!(dispatch(&mut ctx, "uname -a").contains("x86_64"));
    }

    #[test]
    fn tables_have_headers() {
        let dir = TempDir::new().unwrap();
        let mut ctx = InterpContext::new(dir.path().to_path_buf(), "alice", "box");
        assert!(dispatch(&mut ctx, "ps").starts_with("  PID TTY"));
        assert!(dispatch(&mut ctx, "free").contains("Mem:"));
        assert!(dispatch(&mut ctx, "df").starts_with("Filesystem"));
    }
}
