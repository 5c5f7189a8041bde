// The stuff that happens after fork.
// Everything in this module must be async-signal safe.
// That means no locking, no allocating, no freeing memory, etc!
use super::flog_safe::{print_safe, FLOG_SAFE};
use crate::common::exit_without_destructors;
use crate::null_terminated_array::OwningNullTerminatedArray;
use crate::signal::signal_reset_handlers;
use libc::pid_t;
use std::ffi::CStr;
use std::time::Duration;

/// The number of times to try to call fork() before giving up.
const FORK_LAPS: usize = 5;

/// How long to sleep between attempts to call fork().
const FORK_SLEEP_TIME: Duration = Duration::from_millis(1);

/// Report the error code for a failed setpgid call.
fn report_setpgid_error(err: i32, is_parent: bool, pid: pid_t, argv0: &CStr) {
    FLOG_SAFE!(
        warning,
        "Could not move ",
        if is_parent { "child " } else { "self " },
        pid,
        " ('",
        argv0,
        "') into its own process group"
    );
    match err {
        libc::EACCES => FLOG_SAFE!(warning, "setpgid: Process ", pid, " has already exec'd"),
        libc::EPERM => FLOG_SAFE!(warning, "setpgid: Process ", pid, " is a session leader"),
        libc::ESRCH => FLOG_SAFE!(warning, "setpgid: Process ID ", pid, " does not match"),
        _ => FLOG_SAFE!(warning, "setpgid: Unknown error number ", err),
    }
}

/// Put `pid` into a new process group whose id is its own pid.
/// Both the parent and the child call this, so that the group exists before either of them
/// relies on it. Return 0 on success, or the value of errno on failure.
pub fn execute_setpgid(pid: pid_t, is_parent: bool, argv0: &CStr) -> i32 {
    loop {
        if unsafe { libc::setpgid(pid, pid) } == 0 {
            return 0;
        }
        let err = errno::errno().0;
        if err == libc::EACCES && is_parent {
            // The child has already called exec() after moving itself. This is a benign race.
            return 0;
        } else if err == libc::EINTR {
            continue;
        }
        #[cfg(any(target_os = "freebsd", target_os = "macos"))]
        if err == libc::ESRCH && is_parent {
            // Some kernels do not consider an exited, unreaped child to exist for setpgid().
            return 0;
        }
        report_setpgid_error(err, is_parent, pid, argv0);
        return err;
    }
}

/// Prepare the signal state of a forked child: set the handlers back to the defaults, then
/// restore the mask from before the launch. Signals held while blocked get the default action.
pub fn child_setup_process(sigmask: Option<&libc::sigset_t>) {
    signal_reset_handlers();
    if let Some(sigmask) = sigmask {
        unsafe { libc::sigprocmask(libc::SIG_SETMASK, sigmask, std::ptr::null_mut()) };
    }
}

/// This function is a wrapper around fork. If the fork calls fails with EAGAIN, it is retried
/// FORK_LAPS times, with a very slight delay between each lap. If fork fails even then, the process
/// will exit with an error message.
pub fn execute_fork() -> pid_t {
    let mut err = 0;
    for i in 0..FORK_LAPS {
        let pid = unsafe { libc::fork() };
        if pid >= 0 {
            return pid;
        }
        err = errno::errno().0;
        if err != libc::EAGAIN {
            break;
        }
        // Don't sleep on the final lap
        if i != FORK_LAPS - 1 {
            std::thread::sleep(FORK_SLEEP_TIME);
        }
    }

    match err {
        libc::EAGAIN => {
            print_safe!("fork: Out of resources. Check RLIMIT_NPROC and pid_max.");
        }
        libc::ENOMEM => {
            print_safe!("fork: Out of memory.");
        }
        _ => {
            print_safe!("fork: Unknown error number ", err);
        }
    }
    exit_without_destructors(1)
}

/// Replace the child's image with `path`, or report and exit. Never returns.
pub fn child_exec(
    path: &CStr,
    argv: &OwningNullTerminatedArray,
    envp: &OwningNullTerminatedArray,
) -> ! {
    unsafe { libc::execve(path.as_ptr(), argv.get(), envp.get()) };
    let err = errno::errno().0;
    let argv0 = argv.first().unwrap_or(path);
    FLOG_SAFE!(exec, "execve('", path, "') failed with errno ", err);
    print_safe!(argv0, ": Command not found");
    exit_without_destructors(1)
}
