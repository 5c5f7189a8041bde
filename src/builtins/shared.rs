use crate::flog::FLOG;
use crate::io::IoStreams;
use crate::job_table::JobTable;
use crate::proc::Pid;
use crate::shell::Shell;
use libc::c_int;

/// The status code used for normal exit in a command.
pub const STATUS_CMD_OK: c_int = 0;

/// The status code used for failure exit in a command (but not if the args were invalid).
pub const STATUS_CMD_ERROR: c_int = 1;

/// The status code used for invalid arguments given to a command. This is distinct from valid
/// arguments that might result in a command failure. An invalid args condition is something
/// like a missing or malformed job specifier.
pub const STATUS_INVALID_ARGS: c_int = 2;

/// The closed set of commands the shell runs itself instead of forking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Quit,
    Jobs,
    Bg,
    Fg,
}

impl Builtin {
    /// Look up a builtin by its exact name.
    pub fn from_name(name: &str) -> Option<Builtin> {
        match name {
            "quit" => Some(Builtin::Quit),
            "jobs" => Some(Builtin::Jobs),
            "bg" => Some(Builtin::Bg),
            "fg" => Some(Builtin::Fg),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Quit => "quit",
            Builtin::Jobs => "jobs",
            Builtin::Bg => "bg",
            Builtin::Fg => "fg",
        }
    }
}

/// Run `builtin` with `argv`, where `argv[0]` is the builtin's own name.
pub fn builtin_run(
    builtin: Builtin,
    shell: &mut Shell,
    streams: &mut IoStreams,
    argv: &[String],
) -> c_int {
    FLOG!(builtin, "Running", builtin.name(), "with", argv.len(), "arguments");
    let status = match builtin {
        Builtin::Quit => super::quit::quit(shell, streams, argv),
        Builtin::Jobs => super::jobs::jobs(shell, streams, argv),
        Builtin::Bg => super::bg::bg(shell, streams, argv),
        Builtin::Fg => super::fg::fg(shell, streams, argv),
    };
    // A failed write to our own output is reported as a failure of the builtin.
    if status == STATUS_CMD_OK {
        return streams.out.flush_and_check_error();
    }
    status
}

/// How a `bg` or `fg` argument names its job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobSpec {
    /// `%<job_id>`
    JobId(i64),
    /// A bare process id.
    Pid(i64),
}

/// Parse a job specifier. Return None if it is neither `%` followed by digits nor all digits.
pub fn parse_job_spec(arg: &str) -> Option<JobSpec> {
    fn digits(s: &str) -> Option<i64> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Absurdly long numbers name nothing; saturate so that lookup reports them as missing.
        Some(s.parse().unwrap_or(i64::MAX))
    }
    match arg.strip_prefix('%') {
        Some(id) => digits(id).map(JobSpec::JobId),
        None => digits(arg).map(JobSpec::Pid),
    }
}

/// Resolve the job named by `argv[1]` to its pid, printing the reason on failure.
/// Return the status to fail with if it cannot be resolved.
pub fn resolve_job_target(
    jobs: &JobTable,
    streams: &mut IoStreams,
    argv: &[String],
) -> Result<Pid, c_int> {
    let cmd = argv.first().map_or("", String::as_str);
    let Some(spec) = argv.get(1).and_then(|arg| parse_job_spec(arg)) else {
        streams
            .err
            .appendln(format!("{} command requires PID or %jobid argument", cmd));
        return Err(STATUS_INVALID_ARGS);
    };
    let job = match spec {
        JobSpec::JobId(id) => jobs.find_by_job_id(id).ok_or_else(|| {
            streams.err.appendln(format!("%{}: No such job", id));
        }),
        JobSpec::Pid(pid) => libc::pid_t::try_from(pid)
            .ok()
            .and_then(|pid| jobs.find_by_pid(pid))
            .ok_or_else(|| {
                streams.err.appendln(format!("({}): No such process", pid));
            }),
    };
    job.map(|job| job.pid()).map_err(|()| STATUS_CMD_ERROR)
}
