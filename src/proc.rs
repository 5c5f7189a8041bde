//! Process status, process-group signalling, and the job state machine driven by reaped child
//! statuses and by the interactive interrupt and stop requests.

use crate::flog::{FLOG, FLOGF};
use crate::io::OutputStream;
use crate::job_table::{JobState, JobTable};
use crate::signal::{signal_take_pending, PendingSignals, Signal, SignalBlock};
use libc::{
    SIGCONT, SIGHUP, SIGINT, SIGSTOP, SIGTSTP, WCONTINUED, WEXITSTATUS, WIFCONTINUED, WIFEXITED,
    WIFSIGNALED, WIFSTOPPED, WNOHANG, WSTOPSIG, WTERMSIG, WUNTRACED,
};
use std::num::NonZeroU32;

/// A type-safe equivalent to [`libc::pid_t`], always positive.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Pid(NonZeroU32);

impl Pid {
    /// Return None for pids below 1, which never name a single process.
    #[inline(always)]
    pub fn new(pid: libc::pid_t) -> Option<Self> {
        u32::try_from(pid).ok().and_then(NonZeroU32::new).map(Pid)
    }
    #[inline(always)]
    pub fn get(&self) -> libc::pid_t {
        self.0.get() as libc::pid_t
    }
}

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.get(), f)
    }
}

/// The status of a child as reported by waitpid().
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcStatus(i32);

impl ProcStatus {
    /// Encode a return value `ret` and signal `sig` into a status value like waitpid() does.
    /// The return status is in the upper byte.
    const fn w_exitcode(ret: i32, sig: i32) -> i32 {
        (ret << 8) | sig
    }

    /// Construct from a status returned from a waitpid call.
    pub fn from_waitpid(status: i32) -> ProcStatus {
        ProcStatus(status)
    }

    /// Construct directly from an exit code.
    pub fn from_exit_code(ret: u8) -> ProcStatus {
        ProcStatus(Self::w_exitcode(i32::from(ret), 0))
    }

    /// Construct the status of a process killed by `signal`.
    pub fn from_signal(signal: Signal) -> ProcStatus {
        ProcStatus(Self::w_exitcode(0, signal.code()))
    }

    /// Construct the status of a process stopped by `signal`.
    pub fn from_stop_signal(signal: Signal) -> ProcStatus {
        ProcStatus(Self::w_exitcode(signal.code(), 0x7f))
    }

    /// Construct the status of a process resumed by SIGCONT.
    pub fn continued_status() -> ProcStatus {
        ProcStatus(0xffff)
    }

    /// Return if we are stopped (as in SIGSTOP).
    pub fn stopped(&self) -> bool {
        WIFSTOPPED(self.0)
    }

    /// Return if we are continued (as in SIGCONT).
    pub fn continued(&self) -> bool {
        WIFCONTINUED(self.0)
    }

    /// Return if we exited normally (not a signal).
    pub fn normal_exited(&self) -> bool {
        WIFEXITED(self.0)
    }

    /// Return if we exited because of a signal.
    pub fn signal_exited(&self) -> bool {
        WIFSIGNALED(self.0)
    }

    /// The signal that killed the process, if it was killed by one.
    pub fn signal_code(&self) -> Option<libc::c_int> {
        self.signal_exited().then(|| WTERMSIG(self.0))
    }

    /// The signal that stopped the process, if it is stopped.
    pub fn stop_signal(&self) -> Option<libc::c_int> {
        self.stopped().then(|| WSTOPSIG(self.0))
    }

    /// The exit code, if the process exited normally.
    pub fn exit_code(&self) -> Option<u8> {
        if !self.normal_exited() {
            return None;
        }
        u8::try_from(WEXITSTATUS(self.0)).ok()
    }
}

/// Sends signals to whole process groups.
pub trait Signaller {
    fn signal_group(&mut self, pgid: Pid, sig: Signal) -> nix::Result<()>;
}

/// The real thing, via killpg(2).
#[derive(Default)]
pub struct KillpgSignaller;

impl Signaller for KillpgSignaller {
    fn signal_group(&mut self, pgid: Pid, sig: Signal) -> nix::Result<()> {
        let sig = nix::sys::signal::Signal::try_from(sig.code())?;
        nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid.get()), sig)
    }
}

/// Send `sig` to the group led by `pgid`, logging failures.
pub fn signal_job(signaller: &mut dyn Signaller, pgid: Pid, sig: Signal) -> nix::Result<()> {
    FLOG!(proc_pgroup, "Sending", sig, "to group", pgid);
    let res = signaller.signal_group(pgid, sig);
    if let Err(err) = res {
        FLOGF!(proc_pgroup, "killpg({}, {}) failed: {}", pgid, sig, err);
    }
    res
}

fn stop_notice(out: &mut OutputStream, jobs: &JobTable, pid: Pid, sig: libc::c_int) {
    if let Some(job) = jobs.find_by_pid(pid.get()) {
        out.appendln(format!(
            "Job [{}] ({}) stopped by signal {}",
            job.job_id(),
            pid,
            sig
        ));
    }
}

/// Apply one status change reported by waitpid() to the job table.
pub fn handle_child_status(
    jobs: &mut JobTable,
    pid: Pid,
    status: ProcStatus,
    out: &mut OutputStream,
) {
    if jobs.find_by_pid(pid.get()).is_none() {
        FLOG!(proc_reap, "Reaped untracked child", pid);
        return;
    }

    if let Some(sig) = status.stop_signal() {
        // An interactive stop has already been announced.
        let already_stopped = jobs
            .find_by_pid(pid.get())
            .is_some_and(|job| job.is_stopped());
        if !already_stopped {
            stop_notice(out, jobs, pid, sig);
            jobs.set_state(pid.get(), JobState::Stopped);
        }
        FLOG!(proc_reap, "Child", pid, "stopped by signal", sig);
    } else if status.continued() {
        let was_stopped = jobs
            .find_by_pid(pid.get())
            .is_some_and(|job| job.is_stopped());
        if was_stopped {
            jobs.set_state(pid.get(), JobState::Background);
        }
        FLOG!(proc_reap, "Child", pid, "continued");
    } else if let Some(sig) = status.signal_code() {
        if let Some(job) = jobs.find_by_pid(pid.get()) {
            out.appendln(format!(
                "Job [{}] ({}) terminated by signal {}",
                job.job_id(),
                pid,
                sig
            ));
        }
        jobs.remove(pid.get());
        FLOG!(proc_reap, "Child", pid, "killed by signal", sig);
    } else if let Some(code) = status.exit_code() {
        jobs.remove(pid.get());
        FLOG!(proc_reap, "Child", pid, "exited with status", code);
    }
}

/// Reap every child whose state has changed, without blocking.
/// Return the number of status changes applied.
pub fn reap_children(jobs: &mut JobTable, out: &mut OutputStream) -> usize {
    let mut count = 0;
    loop {
        let mut status: libc::c_int = 0;
        let ret = unsafe { libc::waitpid(-1, &mut status, WNOHANG | WUNTRACED | WCONTINUED) };
        if ret == 0 {
            // Children exist but none has anything to report.
            break;
        }
        if ret < 0 {
            let err = errno::errno().0;
            if err == libc::EINTR {
                continue;
            }
            if err != libc::ECHILD {
                FLOG!(proc_reap, "waitpid failed:", crate::wutil::strerror(err));
            }
            break;
        }
        let Some(pid) = Pid::new(ret) else {
            break;
        };
        handle_child_status(jobs, pid, ProcStatus::from_waitpid(status), out);
        count += 1;
    }
    count
}

/// The user asked to interrupt: forward SIGINT to the foreground group. The job is removed later,
/// when the reaper sees the child actually die.
pub fn handle_interrupt_request(jobs: &JobTable, signaller: &mut dyn Signaller) {
    let Some(pgid) = Pid::new(jobs.foreground_pid()) else {
        FLOG!(signal, "SIGINT with no foreground job");
        return;
    };
    let _ = signal_job(signaller, pgid, Signal::new(SIGINT));
}

/// The user asked to stop: mark the foreground job stopped, announce it, and stop its group.
pub fn handle_stop_request(
    jobs: &mut JobTable,
    signaller: &mut dyn Signaller,
    out: &mut OutputStream,
) {
    let Some(pgid) = Pid::new(jobs.foreground_pid()) else {
        FLOG!(signal, "SIGTSTP with no foreground job");
        return;
    };
    stop_notice(out, jobs, pgid, SIGTSTP);
    jobs.set_state(pgid.get(), JobState::Stopped);
    let _ = signal_job(signaller, pgid, Signal::new(SIGSTOP));
}

/// Apply a set of recorded signal events. Child changes are applied first so that a stop or
/// interrupt request never targets a job that has already gone.
pub fn apply_pending_signals(
    events: PendingSignals,
    jobs: &mut JobTable,
    signaller: &mut dyn Signaller,
    out: &mut OutputStream,
) {
    if events.is_empty() {
        return;
    }
    FLOG!(signal, "Applying", format!("{:?}", events));
    if events.contains(PendingSignals::CHILD) {
        reap_children(jobs, out);
    }
    if events.contains(PendingSignals::STOP) {
        handle_stop_request(jobs, signaller, out);
    }
    if events.contains(PendingSignals::INTERRUPT) {
        handle_interrupt_request(jobs, signaller);
    }
}

/// Take whatever the signal handler has recorded and apply it.
pub fn process_pending_signals(
    jobs: &mut JobTable,
    signaller: &mut dyn Signaller,
    out: &mut OutputStream,
) {
    apply_pending_signals(signal_take_pending(), jobs, signaller, out);
}

/// Block until `pid` is no longer the foreground job: it was reaped, stopped, or moved to the
/// background. Returns immediately if it is not the foreground job now.
pub fn wait_for_foreground(
    pid: Pid,
    jobs: &mut JobTable,
    signaller: &mut dyn Signaller,
    out: &mut OutputStream,
) {
    FLOG!(proc_job_run, "Waiting for foreground job", pid);
    let block = SignalBlock::job_control();
    loop {
        process_pending_signals(jobs, signaller, out);
        if jobs.foreground_pid() != pid.get() {
            break;
        }
        block.suspend();
    }
    FLOG!(proc_job_run, "Done waiting for", pid);
}

/// Print the stopped jobs that would be abandoned by exiting.
pub fn print_exit_warning_for_jobs(jobs: &JobTable, out: &mut OutputStream) {
    out.appendln("There are stopped jobs:");
    for job in jobs.stopped_jobs() {
        out.appendln(job.to_string());
    }
    out.appendln("A second attempt to quit will hang them up.");
}

/// Send SIGHUP to every stopped job, and SIGCONT so that it can act on it.
pub fn hup_stopped_jobs(jobs: &JobTable, signaller: &mut dyn Signaller) {
    for job in jobs.stopped_jobs() {
        let _ = signal_job(signaller, job.pid(), Signal::new(SIGHUP));
        let _ = signal_job(signaller, job.pid(), Signal::new(SIGCONT));
    }
}
