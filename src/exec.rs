//! Launching external commands as jobs.

use crate::flog::{FLOG, FLOGF};
use crate::fork_exec::postfork::{
    child_exec, child_setup_process, execute_fork, execute_setpgid,
};
use crate::io::IoStreams;
use crate::job_table::JobState;
use crate::nix::getpid;
use crate::null_terminated_array::OwningNullTerminatedArray;
use crate::path::resolve_command;
use crate::proc::{wait_for_foreground, Pid};
use crate::shell::Shell;
use crate::signal::SignalBlock;
use std::ffi::CString;
use std::fmt;
use std::os::unix::ffi::OsStrExt;

/// Errors found before anything is forked. The command is not run.
#[derive(Debug, PartialEq, Eq)]
pub enum LaunchError {
    EmptyCommand,
    /// An argument contains a NUL byte and cannot be passed to exec.
    NulInArgument(String),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::EmptyCommand => f.write_str("empty command"),
            LaunchError::NulInArgument(arg) => {
                write!(f, "{}: argument contains a NUL byte", arg.escape_debug())
            }
        }
    }
}

impl std::error::Error for LaunchError {}

/// Everything the child needs, built before fork so that the child does not allocate.
struct ExecImage {
    path: CString,
    argv: OwningNullTerminatedArray,
    envp: OwningNullTerminatedArray,
}

impl ExecImage {
    fn new(argv: &[String]) -> Result<Self, LaunchError> {
        let cmd = argv.first().ok_or(LaunchError::EmptyCommand)?;
        let nul_error = || {
            let bad = argv.iter().find(|arg| arg.contains('\0')).unwrap_or(cmd);
            LaunchError::NulInArgument(bad.clone())
        };
        let path = resolve_command(cmd);
        FLOG!(exec, "Resolved", cmd, "to", path.display());
        Ok(ExecImage {
            path: CString::new(path.as_os_str().as_bytes()).map_err(|_| nul_error())?,
            argv: OwningNullTerminatedArray::from_strs(argv).map_err(|_| nul_error())?,
            envp: OwningNullTerminatedArray::from_environment(),
        })
    }
}

/// Run `argv` as a new job in its own process group.
///
/// The job control signals stay blocked from before the fork until the job is in the table, so
/// a child that changes state immediately can never be reaped before it is known. A foreground
/// job is waited for before returning; a background job is acknowledged on `streams.out`.
pub fn exec_job(
    shell: &mut Shell,
    streams: &mut IoStreams,
    argv: &[String],
    background: bool,
    command_line: &str,
) -> Result<(), LaunchError> {
    let image = ExecImage::new(argv)?;
    let argv0 = image.argv.first().unwrap_or(image.path.as_c_str());

    let block = SignalBlock::job_control();
    let pid = execute_fork();
    if pid == 0 {
        // This is the child process.
        execute_setpgid(getpid(), false, argv0);
        child_setup_process(Some(block.previous().as_ref()));
        child_exec(&image.path, &image.argv, &image.envp);
    }

    FLOGF!(exec_fork, "Forked pid {} for '{}'", pid, command_line);
    execute_setpgid(pid, true, argv0);

    let state = if background {
        JobState::Background
    } else {
        JobState::Foreground
    };
    let added = shell.jobs.add(pid, state, command_line);
    match added {
        Ok(job_id) => {
            if shell.verbose {
                streams
                    .out
                    .appendln(format!("Added job [{}] {} {}", job_id, pid, command_line));
            }
        }
        Err(err) => {
            streams.out.appendln(err.to_string());
        }
    }
    drop(block);

    let (Ok(job_id), Some(pid)) = (added, Pid::new(pid)) else {
        return Ok(());
    };
    if background {
        streams
            .out
            .appendln(format!("[{}] ({}) {}", job_id, pid, command_line));
    } else {
        wait_for_foreground(pid, &mut shell.jobs, shell.signaller.as_mut(), streams.out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_image_rejects_nul() {
        let argv = vec!["echo".to_string(), "a\0b".to_string()];
        match ExecImage::new(&argv) {
            Err(LaunchError::NulInArgument(arg)) => assert_eq!(arg, "a\0b"),
            _ => panic!("expected a NUL error"),
        }
    }

    #[test]
    fn test_exec_image_empty() {
        assert!(matches!(ExecImage::new(&[]), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn test_exec_image_resolves_path() {
        let argv = vec!["sh".to_string(), "-c".to_string(), "true".to_string()];
        let image = ExecImage::new(&argv).unwrap();
        assert!(image.path.to_bytes().ends_with(b"/sh"));
        assert_eq!(image.argv.len(), 3);
        assert_eq!(image.argv.first().unwrap().to_bytes(), b"sh");
    }
}
