//! Process-wide constants and helpers used by most parts of tsh.

use once_cell::sync::OnceCell;

/// The name of this program, as used in diagnostics.
pub static PROGRAM_NAME: OnceCell<&'static str> = OnceCell::new();

/// The program name used when none has been set, for example inside tests.
pub const DEFAULT_PROGRAM_NAME: &str = "tsh";

pub fn program_name() -> &'static str {
    PROGRAM_NAME.get().copied().unwrap_or(DEFAULT_PROGRAM_NAME)
}

/// The prompt emitted before every line, unless prompting is disabled.
pub const PROMPT: &str = "tsh> ";

/// Exits without invoking destructors (via _exit), useful for code after fork.
pub fn exit_without_destructors(code: libc::c_int) -> ! {
    unsafe { libc::_exit(code) };
}

