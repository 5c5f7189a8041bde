//! The state of one shell: its jobs and how it signals them, and the evaluation of one line.

use crate::builtins::shared::{
    builtin_run, Builtin, STATUS_CMD_ERROR, STATUS_CMD_OK, STATUS_INVALID_ARGS,
};
use crate::common::program_name;
use crate::exec::exec_job;
use crate::flog::FLOG;
use crate::io::{IoStreams, OutputStream};
use crate::job_table::JobTable;
use crate::proc::{process_pending_signals, KillpgSignaller, Signaller};
use crate::tokenizer::parse_command_line;
use libc::c_int;

pub struct Shell {
    /// The jobs this shell has launched and not yet seen finish.
    pub jobs: JobTable,
    /// How job control signals reach process groups.
    pub signaller: Box<dyn Signaller>,
    /// Print additional diagnostics, such as every job added to the table.
    pub verbose: bool,
    /// Set when `quit` has refused because of stopped jobs. Any other command clears it.
    pub exit_warning_shown: bool,
    exit_requested: Option<c_int>,
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(JobTable::new(), Box::new(KillpgSignaller))
    }
}

impl Shell {
    pub fn new(jobs: JobTable, signaller: Box<dyn Signaller>) -> Self {
        Shell {
            jobs,
            signaller,
            verbose: false,
            exit_warning_shown: false,
            exit_requested: None,
        }
    }

    /// The status to exit with, once something has asked the shell to exit.
    pub fn exit_requested(&self) -> Option<c_int> {
        self.exit_requested
    }

    pub fn request_exit(&mut self, status: c_int) {
        FLOG!(reader, "Exit requested with status", status);
        self.exit_requested = Some(status);
    }

    /// Apply job control events recorded by the signal handler since the last call.
    pub fn process_pending_signals(&mut self, out: &mut OutputStream) {
        process_pending_signals(&mut self.jobs, self.signaller.as_mut(), out);
    }

    /// Evaluate one input line: run a builtin, or launch an external command and, in the
    /// foreground case, wait for it. Return the status of the command.
    pub fn eval(&mut self, line: &str, streams: &mut IoStreams) -> c_int {
        let command_line = line.trim_end_matches(['\n', '\r']);
        let parsed = match parse_command_line(command_line) {
            Ok(parsed) => parsed,
            Err(err) => {
                streams.err.appendln(format!("{}: {}", program_name(), err));
                return STATUS_INVALID_ARGS;
            }
        };
        let Some(cmd) = parsed.argv.first() else {
            return STATUS_CMD_OK;
        };

        let builtin = Builtin::from_name(cmd);
        if builtin != Some(Builtin::Quit) {
            self.exit_warning_shown = false;
        }
        if let Some(builtin) = builtin {
            return builtin_run(builtin, self, streams, &parsed.argv);
        }

        match exec_job(self, streams, &parsed.argv, parsed.background, command_line) {
            Ok(()) => STATUS_CMD_OK,
            Err(err) => {
                streams.err.appendln(format!("{}: {}", program_name(), err));
                STATUS_CMD_ERROR
            }
        }
    }
}
