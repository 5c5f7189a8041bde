// Implementation of the bg builtin.

use super::prelude::*;
use crate::job_table::JobState;
use crate::proc::signal_job;
use crate::signal::Signal;

/// Builtin for continuing a stopped job in the background.
pub fn bg(shell: &mut Shell, streams: &mut IoStreams, argv: &[String]) -> c_int {
    let cmd = &argv[0];
    let pid = match resolve_job_target(&shell.jobs, streams, argv) {
        Ok(pid) => pid,
        Err(status) => return status,
    };

    if let Err(err) = signal_job(shell.signaller.as_mut(), pid, Signal::new(libc::SIGCONT)) {
        streams
            .err
            .appendln(format!("{}: Could not continue job ({}): {}", cmd, pid, err.desc()));
        return STATUS_CMD_ERROR;
    }
    shell.jobs.set_state(pid.get(), JobState::Background);

    let Some(job) = shell.jobs.find_by_pid(pid.get()) else {
        return STATUS_CMD_ERROR;
    };
    FLOG!(proc_job_run, "Continued job", job.job_id(), "in the background");
    streams.out.appendln(format!(
        "[{}] ({}) {}",
        job.job_id(),
        pid,
        job.command_line()
    ));
    STATUS_CMD_OK
}
