use std::num::NonZeroI32;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use crate::common::exit_without_destructors;
use crate::fork_exec::flog_safe::print_safe;
use crate::nix::getpid;
use crate::wutil::fatal_os_error;
use bitflags::bitflags;
use errno::{errno, set_errno};
use nix::sys::signal::{sigprocmask, SigSet, SigmaskHow};

/// Store the "main" pid. This allows us to reliably determine if we are in a forked child.
static MAIN_PID: AtomicI32 = AtomicI32::new(0);

/// A signal may arrive after fork() but before the child has reset its handlers. In that event
/// the child must not record it as if it were the shell: reset the disposition and re-raise.
/// Return whether we re-raised the signal.
fn reraise_if_forked_child(sig: i32) -> bool {
    if getpid() == MAIN_PID.load(Ordering::Relaxed) {
        return false;
    }

    // Safety: signal() and raise() are async-signal-safe.
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
        libc::raise(sig);
    }
    true
}

bitflags! {
    /// Job control events recorded by the signal handler and not yet applied to the job table.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PendingSignals: u8 {
        /// SIGCHLD: at least one child changed state.
        const CHILD = 1 << 0;
        /// SIGINT: the user asked to interrupt the foreground job.
        const INTERRUPT = 1 << 1;
        /// SIGTSTP: the user asked to stop the foreground job.
        const STOP = 1 << 2;
    }
}

static PENDING: AtomicU8 = AtomicU8::new(0);

/// Record events as pending. Async-signal-safe.
pub fn signal_post(events: PendingSignals) {
    PENDING.fetch_or(events.bits(), Ordering::SeqCst);
}

/// Take and clear every pending event.
pub fn signal_take_pending() -> PendingSignals {
    PendingSignals::from_bits_truncate(PENDING.swap(0, Ordering::SeqCst))
}

/// The single signal handler. It never touches the job table; it only records what happened.
extern "C" fn tsh_signal_handler(sig: i32, _info: *mut libc::siginfo_t, _context: *mut libc::c_void) {
    // Ensure we preserve errno.
    let saved_errno = errno();

    if reraise_if_forked_child(sig) {
        set_errno(saved_errno);
        return;
    }

    match sig {
        libc::SIGCHLD => signal_post(PendingSignals::CHILD),
        libc::SIGINT => signal_post(PendingSignals::INTERRUPT),
        libc::SIGTSTP => signal_post(PendingSignals::STOP),
        libc::SIGQUIT | libc::SIGTERM => {
            print_safe!(
                "Terminating after receipt of ",
                Signal::new(sig).name(),
                " signal"
            );
            exit_without_destructors(1);
        }
        _ => {}
    }

    set_errno(saved_errno);
}

// Wrapper around sigaction which treats failure as fatal.
fn sigaction(sig: i32, act: &libc::sigaction) {
    if unsafe { libc::sigaction(sig, act, std::ptr::null_mut()) } != 0 {
        fatal_os_error("sigaction");
    }
}

/// Install the shell's handlers.
pub fn signal_set_handlers() {
    // Mark our main pid.
    MAIN_PID.store(getpid(), Ordering::Relaxed);

    let mut act: libc::sigaction = unsafe { std::mem::zeroed() };
    unsafe { libc::sigemptyset(&mut act.sa_mask) };

    // Ignore SIGPIPE. Failed writes are detected and reported by the output streams.
    act.sa_flags = 0;
    act.sa_sigaction = libc::SIG_IGN;
    sigaction(libc::SIGPIPE, &act);

    // None of these should interrupt restartable syscalls, in particular the read of the next line.
    act.sa_sigaction = tsh_signal_handler as usize;
    act.sa_flags = libc::SA_SIGINFO | libc::SA_RESTART;
    for sig in [
        libc::SIGCHLD,
        libc::SIGINT,
        libc::SIGTSTP,
        libc::SIGQUIT,
        libc::SIGTERM,
    ] {
        sigaction(sig, &act);
    }
}

/// Set all signal handlers to SIG_DFL.
/// This is called after fork - it should be async signal safe.
pub fn signal_reset_handlers() {
    let mut act: libc::sigaction = unsafe { std::mem::zeroed() };
    unsafe { libc::sigemptyset(&mut act.sa_mask) };
    act.sa_flags = 0;
    act.sa_sigaction = libc::SIG_DFL;

    for data in SIGNAL_TABLE.iter() {
        if matches!(data.signal.code(), libc::SIGKILL | libc::SIGSTOP) {
            continue;
        }
        if data.signal == libc::SIGHUP {
            // If we were run via nohup, leave it ignored for our children too.
            let mut oact: libc::sigaction = unsafe { std::mem::zeroed() };
            unsafe { libc::sigaction(libc::SIGHUP, std::ptr::null(), &mut oact) };
            if oact.sa_sigaction == libc::SIG_IGN {
                continue;
            }
        }
        unsafe {
            libc::sigaction(data.signal.code(), &act, std::ptr::null_mut());
        };
    }
}

/// Ensure we did not inherit any blocked signals.
pub fn signal_unblock_all() {
    if sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None).is_err() {
        fatal_os_error("sigprocmask");
    }
}

/// The signals whose handlers may touch job state: child changes, interrupt, and stop.
pub fn job_control_sigset() -> SigSet {
    let mut set = SigSet::empty();
    set.add(nix::sys::signal::SIGCHLD);
    set.add(nix::sys::signal::SIGINT);
    set.add(nix::sys::signal::SIGTSTP);
    set
}

/// Blocks the job control signals for as long as it lives, restoring the previous mask on drop.
/// Failing to change the mask is fatal: without it the job table cannot be kept consistent.
pub struct SignalBlock {
    previous: SigSet,
}

impl SignalBlock {
    pub fn job_control() -> SignalBlock {
        let mut previous = SigSet::empty();
        if sigprocmask(
            SigmaskHow::SIG_BLOCK,
            Some(&job_control_sigset()),
            Some(&mut previous),
        )
        .is_err()
        {
            fatal_os_error("sigprocmask");
        }
        SignalBlock { previous }
    }

    /// The mask that was in effect before this block.
    pub fn previous(&self) -> &SigSet {
        &self.previous
    }

    /// Atomically restore the previous mask and sleep until a signal is handled, then block
    /// again. A signal that arrived while blocked is delivered immediately, so no wakeup is lost.
    pub fn suspend(&self) {
        // sigsuspend always returns -1 with EINTR.
        unsafe { libc::sigsuspend(self.previous.as_ref()) };
    }
}

impl Drop for SignalBlock {
    fn drop(&mut self) {
        if sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.previous), None).is_err() {
            fatal_os_error("sigprocmask");
        }
    }
}

/// An entry in the table used to convert between signal names and signal ids.
struct LookupEntry {
    signal: Signal,
    name: &'static str,
}

impl LookupEntry {
    const fn new(signal: i32, name: &'static str) -> Self {
        Self {
            signal: Signal::new(signal),
            name,
        }
    }
}

#[rustfmt::skip]
const SIGNAL_TABLE : &[LookupEntry] = &[
    LookupEntry::new(libc::SIGHUP,    "SIGHUP"),
    LookupEntry::new(libc::SIGINT,    "SIGINT"),
    LookupEntry::new(libc::SIGQUIT,   "SIGQUIT"),
    LookupEntry::new(libc::SIGKILL,   "SIGKILL"),
    LookupEntry::new(libc::SIGUSR1,   "SIGUSR1"),
    LookupEntry::new(libc::SIGUSR2,   "SIGUSR2"),
    LookupEntry::new(libc::SIGSEGV,   "SIGSEGV"),
    LookupEntry::new(libc::SIGPIPE,   "SIGPIPE"),
    LookupEntry::new(libc::SIGALRM,   "SIGALRM"),
    LookupEntry::new(libc::SIGTERM,   "SIGTERM"),
    LookupEntry::new(libc::SIGCHLD,   "SIGCHLD"),
    LookupEntry::new(libc::SIGCONT,   "SIGCONT"),
    LookupEntry::new(libc::SIGSTOP,   "SIGSTOP"),
    LookupEntry::new(libc::SIGTSTP,   "SIGTSTP"),
    LookupEntry::new(libc::SIGTTIN,   "SIGTTIN"),
    LookupEntry::new(libc::SIGTTOU,   "SIGTTOU"),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
/// A wrapper around the system signal code.
pub struct Signal(NonZeroI32);

impl Signal {
    /// Creates a new `Signal` to represent the passed system signal code `sig`.
    /// Panics if `sig` is zero.
    pub const fn new(sig: i32) -> Self {
        match NonZeroI32::new(sig) {
            None => panic!("Invalid zero signal value!"),
            Some(result) => Signal(result),
        }
    }

    fn get_lookup_entry(&self) -> Option<&'static LookupEntry> {
        SIGNAL_TABLE
            .iter()
            .find(|entry| entry.signal == self.code())
    }

    /// Get the name of the signal, like "SIGTSTP". This is async-signal-safe.
    pub fn name(&self) -> &'static str {
        match self.get_lookup_entry() {
            Some(entry) => entry.name,
            None => "Unknown",
        }
    }

    pub fn code(&self) -> i32 {
        self.0.into()
    }
}

// Allow signals to be compared against i32.
impl PartialEq<i32> for Signal {
    fn eq(&self, other: &i32) -> bool {
        self.code() == *other
    }
}

impl From<Signal> for i32 {
    fn from(value: Signal) -> Self {
        value.code()
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
