//! Implementation of the fg builtin.

use super::prelude::*;
use crate::job_table::JobState;
use crate::proc::{signal_job, wait_for_foreground};
use crate::signal::Signal;

/// Builtin for putting a job in the foreground and waiting for it.
pub fn fg(shell: &mut Shell, streams: &mut IoStreams, argv: &[String]) -> c_int {
    let cmd = &argv[0];
    let pid = match resolve_job_target(&shell.jobs, streams, argv) {
        Ok(pid) => pid,
        Err(status) => return status,
    };

    // Status changes of this job are only applied by the wait below.
    if let Err(err) = signal_job(shell.signaller.as_mut(), pid, Signal::new(libc::SIGCONT)) {
        streams
            .err
            .appendln(format!("{}: Could not continue job ({}): {}", cmd, pid, err.desc()));
        return STATUS_CMD_ERROR;
    }
    shell.jobs.set_state(pid.get(), JobState::Foreground);
    FLOG!(proc_job_run, "Continued job", pid, "in the foreground");

    wait_for_foreground(pid, &mut shell.jobs, shell.signaller.as_mut(), streams.out);
    STATUS_CMD_OK
}
