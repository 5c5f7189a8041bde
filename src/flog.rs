use crate::wutil::write_all_to_fd;
use libc::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

#[rustfmt::skip::macros(category)]
pub mod categories {
    use std::sync::atomic::AtomicBool;

    pub struct category_t {
        pub name: &'static str,
        pub description: &'static str,
        pub enabled: AtomicBool,
    }

    /// Macro to declare a static variable identified by $var,
    /// with the given name and description, and optionally enabled by default.
    macro_rules! declare_category {
        (
            ($var:ident, $name:literal, $description:literal, $enabled:expr)
        ) => {
            pub static $var: category_t = category_t {
                name: $name,
                description: $description,
                enabled: AtomicBool::new($enabled),
            };
        };
        (
            ($var:ident, $name:expr, $description:expr)
        ) => {
            declare_category!(($var, $name, $description, false));
        };
    }

    /// Macro to extract the variable name for a category.
    macro_rules! category_name {
        (($var:ident, $name:literal, $description:literal, $enabled:expr)) => {
            $var
        };
        (($var:ident, $name:literal, $description:literal)) => {
            $var
        };
    }

    macro_rules! categories {
        (
            // A repetition of categories, separated by semicolons.
            $($cats:tt);*

            // Allow trailing semicolon.
            $(;)?
        ) => {
            $(
                declare_category!($cats);
            )*

            pub fn all_categories() -> Vec<&'static category_t> {
                vec![
                    $(
                        & category_name!($cats),
                    )*
                ]
            }
        };
    }

    categories!(
        (error, "error", "Serious unexpected errors (on by default)", true);

        (warning, "warning", "Warnings (on by default)", true);

        (exec, "exec", "Launching external commands");

        (exec_fork, "exec-fork", "Calls to fork()");

        (exec_job_status, "exec-job-status", "Jobs changing status");

        (proc_job_run, "proc-job-run", "Jobs getting started or continued");

        (proc_reap, "proc-reap", "Reaping child processes");

        (proc_pgroup, "proc-pgroup", "Process groups");

        (signal, "signal", "Delivery and handling of signals");

        (reader, "reader", "Reading and dispatching input lines");

        (builtin, "builtin", "Running builtin commands");
    );
}

/// Write to our FLOG file.
pub fn flog_impl(s: &str) {
    let fd = get_flog_file_fd();
    if fd < 0 {
        return;
    }
    let _ = write_all_to_fd(s.as_bytes(), fd);
}

/// The entry point for flogging.
#[macro_export]
macro_rules! FLOG {
    ($category:ident, $($elem:expr),+ $(,)*) => {
        if $crate::flog::categories::$category.enabled.load(std::sync::atomic::Ordering::Relaxed) {
            let mut vs: Vec<String> = vec![format!("{}:", $crate::flog::categories::$category.name)];
            $(
                {
                   vs.push($elem.to_string())
                }
            )+
            // We don't use locking here so we have to append our own newline to avoid multiple writes.
            let mut v = vs.join(" ");
            v.push('\n');
            $crate::flog::flog_impl(&v);
        }
    };
}

#[macro_export]
macro_rules! FLOGF {
    ($category:ident, $fmt: expr, $($elem:expr),+ $(,)*) => {
        $crate::flog::FLOG!($category, format!($fmt, $($elem),*))
    }
}

pub use {FLOG, FLOGF};

/// Match `name` against a pattern where `*` stands for any run of characters.
fn wildcard_match(name: &str, pattern: &str) -> bool {
    let Some(star) = pattern.find('*') else {
        return name == pattern;
    };
    let (prefix, rest) = (&pattern[..star], &pattern[star + 1..]);
    let Some(tail) = name.strip_prefix(prefix) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    tail.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(tail.len()))
        .any(|idx| wildcard_match(&tail[idx..], rest))
}

/// For each category, if its name matches the wildcard, set its enabled to the given sense.
/// Return false if nothing matched.
fn apply_one_wildcard(wc: &str, sense: bool) -> bool {
    let mut match_found = false;
    for cat in categories::all_categories() {
        if wildcard_match(cat.name, wc) {
            cat.enabled.store(sense, Ordering::Relaxed);
            match_found = true;
        }
    }
    if !match_found {
        FLOG!(warning, "Failed to match debug category:", wc);
    }
    match_found
}

/// Set the active flog categories according to the given comma-separated wildcards.
/// A leading `-` disables the matching categories instead.
pub fn activate_flog_categories_by_pattern(wc: &str) {
    // Normalize underscores to dashes, allowing the user to be sloppy.
    let wc = wc.replace('_', "-");
    for s in wc.split(',').filter(|s| !s.is_empty()) {
        if let Some(negated) = s.strip_prefix('-') {
            apply_one_wildcard(negated, false);
        } else {
            apply_one_wildcard(s, true);
        }
    }
}

/// The flog output fd. Defaults to stderr. A value < 0 disables flog.
static FLOG_FD: AtomicI32 = AtomicI32::new(libc::STDERR_FILENO);

pub fn set_flog_file_fd(fd: c_int) {
    FLOG_FD.store(fd, Ordering::Relaxed);
}

#[inline]
pub fn get_flog_file_fd() -> c_int {
    FLOG_FD.load(Ordering::Relaxed)
}
