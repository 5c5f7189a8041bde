// Implementation of the quit builtin.

use super::prelude::*;
use crate::proc::{hup_stopped_jobs, print_exit_warning_for_jobs};

/// Ask the shell to exit. With stopped jobs around, the first attempt only warns; a second
/// attempt in a row hangs the stopped jobs up and exits.
pub fn quit(shell: &mut Shell, streams: &mut IoStreams, _argv: &[String]) -> c_int {
    let has_stopped = shell.jobs.stopped_jobs().next().is_some();
    if has_stopped && !shell.exit_warning_shown {
        print_exit_warning_for_jobs(&shell.jobs, streams.out);
        shell.exit_warning_shown = true;
        return STATUS_CMD_ERROR;
    }
    if has_stopped {
        hup_stopped_jobs(&shell.jobs, shell.signaller.as_mut());
    }
    shell.request_exit(STATUS_CMD_OK);
    STATUS_CMD_OK
}
