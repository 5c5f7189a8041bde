// Functions for executing the jobs builtin.

use super::prelude::*;

/// Print one line per job, in table order.
pub fn jobs(shell: &mut Shell, streams: &mut IoStreams, _argv: &[String]) -> c_int {
    for job in shell.jobs.list() {
        streams.out.appendln(job.to_string());
    }
    STATUS_CMD_OK
}
