//! End-to-end runs of the tsh binary with a piped stdin and no prompt.

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Long enough for the shell to have forked and registered a job.
const SETTLE: Duration = Duration::from_millis(500);

fn spawn_tsh(args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_tsh"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start tsh")
}

fn send(child: &mut Child, input: &str) {
    let stdin = child.stdin.as_mut().expect("stdin is piped");
    stdin.write_all(input.as_bytes()).unwrap();
    stdin.flush().unwrap();
}

fn signal_shell(child: &Child, sig: Signal) {
    kill(Pid::from_raw(child.id() as i32), sig).unwrap();
}

/// Close stdin and collect the exit status and everything written to stdout.
fn finish(mut child: Child) -> (i32, String) {
    drop(child.stdin.take());
    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

fn run_tsh(input: &str) -> (i32, String) {
    let mut child = spawn_tsh(&["-p"]);
    send(&mut child, input);
    finish(child)
}

/// The pid in a line like `[1] (1234) ...`.
fn pid_in(line: &str) -> i32 {
    let start = line.find('(').unwrap() + 1;
    let end = line.find(')').unwrap();
    line[start..end].parse().unwrap()
}

#[test]
fn test_foreground_command_runs() {
    let (status, out) = run_tsh("/bin/echo hello 'big world'\njobs\n");
    assert_eq!(status, 0);
    // The job is gone once it has exited, without any notice.
    assert_eq!(out, "hello big world\n");
}

#[test]
fn test_command_not_found() {
    let (status, out) = run_tsh("/no/such/command arg\n");
    assert_eq!(status, 0);
    assert_eq!(out, "/no/such/command: Command not found\n");
}

#[test]
fn test_background_ack_and_listing() {
    let (status, out) = run_tsh("/bin/sleep 1 &\njobs\n");
    assert_eq!(status, 0);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2, "{}", out);
    let pid = pid_in(lines[0]);
    assert_eq!(lines[0], format!("[1] ({}) /bin/sleep 1 &", pid));
    assert_eq!(lines[1], format!("[1] ({}) Running /bin/sleep 1 &", pid));
}

#[test]
fn test_verbose_reports_added_jobs() {
    let mut child = spawn_tsh(&["-p", "-v"]);
    send(&mut child, "/bin/sleep 1 &\n");
    let (status, out) = finish(child);
    assert_eq!(status, 0);
    let lines: Vec<&str> = out.lines().collect();
    let pid = pid_in(lines[1]);
    assert_eq!(lines[0], format!("Added job [1] {} /bin/sleep 1 &", pid));
}

#[test]
fn test_bad_job_targets() {
    let (status, out) = run_tsh("fg %7\nbg\nbg 99999999\n");
    assert_eq!(status, 0);
    assert_eq!(
        out,
        "%7: No such job\n\
         bg command requires PID or %jobid argument\n\
         (99999999): No such process\n"
    );
}

#[test]
fn test_too_many_jobs() {
    let input = "/bin/sleep 1 &\n".repeat(17);
    let (status, out) = run_tsh(&input);
    assert_eq!(status, 0);
    assert_eq!(out.matches("/bin/sleep 1 &\n").count(), 16);
    assert!(out.ends_with("Tried to create too many jobs\n"), "{}", out);
}

#[test]
fn test_stop_then_resume_in_background() {
    let mut child = spawn_tsh(&["-p"]);
    send(&mut child, "/bin/sleep 2\n");
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGTSTP);
    send(&mut child, "jobs\nbg %1\njobs\n");
    let (status, out) = finish(child);
    assert_eq!(status, 0);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4, "{}", out);
    let pid = pid_in(lines[0]);
    assert_eq!(lines[0], format!("Job [1] ({}) stopped by signal 20", pid));
    assert_eq!(lines[1], format!("[1] ({}) Stopped /bin/sleep 2", pid));
    assert_eq!(lines[2], format!("[1] ({}) /bin/sleep 2", pid));
    assert_eq!(lines[3], format!("[1] ({}) Running /bin/sleep 2", pid));
}

#[test]
fn test_interrupt_foreground_job() {
    let mut child = spawn_tsh(&["-p"]);
    send(&mut child, "/bin/sleep 5\n");
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGINT);
    send(&mut child, "jobs\n");
    let (status, out) = finish(child);
    assert_eq!(status, 0);
    let pid = pid_in(&out);
    assert_eq!(out, format!("Job [1] ({}) terminated by signal 2\n", pid));
}

#[test]
fn test_quit_hangs_up_stopped_jobs() {
    let mut child = spawn_tsh(&["-p"]);
    send(&mut child, "/bin/sleep 5\n");
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGTSTP);
    send(&mut child, "quit\nquit\n");
    let (status, out) = finish(child);
    assert_eq!(status, 0);
    let pid = pid_in(&out);
    assert_eq!(
        out,
        format!(
            "Job [1] ({pid}) stopped by signal 20\n\
             There are stopped jobs:\n\
             [1] ({pid}) Stopped /bin/sleep 5\n\
             A second attempt to quit will hang them up.\n"
        )
    );
}

#[test]
fn test_sigquit_terminates_shell() {
    let mut child = spawn_tsh(&["-p"]);
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGQUIT);
    let (status, out) = finish(child);
    assert_eq!(status, 1);
    assert_eq!(out, "Terminating after receipt of SIGQUIT signal\n");
}

#[test]
fn test_usage() {
    let (status, out) = finish(spawn_tsh(&["-h"]));
    assert_eq!(status, 1);
    assert!(out.starts_with("Usage: tsh [-hvp]\n"), "{}", out);

    let (status, out) = finish(spawn_tsh(&["-x"]));
    assert_eq!(status, 1);
    assert!(out.starts_with("tsh: invalid option -- -x\n"), "{}", out);

    let (status, out) = finish(spawn_tsh(&["--print-debug-categories"]));
    assert_eq!(status, 0);
    assert!(out.lines().any(|line| line.starts_with("proc-reap ")), "{}", out);
}

#[test]
fn test_all_finished_children_are_reaped() {
    let (status, out) = run_tsh(
        "/bin/sleep 0.2 &\n/bin/sleep 0.2 &\n/bin/sleep 0.2 &\n/bin/sleep 1\njobs\n",
    );
    assert_eq!(status, 0);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3, "{}", out);
    for (idx, line) in lines.iter().enumerate() {
        let pid = pid_in(line);
        assert_eq!(*line, format!("[{}] ({}) /bin/sleep 0.2 &", idx + 1, pid));
    }
}

#[test]
fn test_fg_waits_for_background_job() {
    let start = Instant::now();
    let (status, out) = run_tsh("/bin/sleep 1 &\nfg %1\njobs\n");
    assert_eq!(status, 0);
    assert!(start.elapsed() >= Duration::from_millis(900));
    // Nothing is listed: fg returned only after the job exited.
    let pid = pid_in(&out);
    assert_eq!(out, format!("[1] ({}) /bin/sleep 1 &\n", pid));
}

#[test]
fn test_fg_resumes_stopped_job_then_interrupt() {
    let mut child = spawn_tsh(&["-p"]);
    send(&mut child, "/bin/sleep 5\n");
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGTSTP);
    send(&mut child, "fg %1\n");
    sleep(SETTLE);
    signal_shell(&child, Signal::SIGINT);
    send(&mut child, "jobs\n");
    let (status, out) = finish(child);
    assert_eq!(status, 0);
    let pid = pid_in(&out);
    assert_eq!(
        out,
        format!(
            "Job [1] ({pid}) stopped by signal 20\n\
             Job [1] ({pid}) terminated by signal 2\n"
        )
    );
}
