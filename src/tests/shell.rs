use crate::builtins::shared::{STATUS_CMD_OK, STATUS_INVALID_ARGS};
use crate::job_table::JobState;
use crate::tests::prelude::*;

#[test]
fn test_blank_lines_do_nothing() {
    let mut t = TestShell::new();
    assert_eq!(t.eval(""), STATUS_CMD_OK);
    assert_eq!(t.eval("   \t \n"), STATUS_CMD_OK);
    assert_eq!(t.take_out(), "");
    assert_eq!(t.take_err(), "");
    assert!(t.shell.jobs.is_empty());
}

#[test]
fn test_unbalanced_quotes_are_reported() {
    let mut t = TestShell::new();
    assert_eq!(t.eval("echo 'oops\n"), STATUS_INVALID_ARGS);
    assert_eq!(
        t.take_err(),
        "tsh: Unexpected end of string, quotes are not balanced\n"
    );
    assert!(t.shell.jobs.is_empty());
}

#[test]
fn test_builtins_ignore_background_marker() {
    let mut t = TestShell::new();
    t.shell
        .jobs
        .add(4242, JobState::Background, "sleep 100 &")
        .unwrap();
    assert_eq!(t.eval("jobs &\n"), STATUS_CMD_OK);
    assert_eq!(t.take_out(), "[1] (4242) Running sleep 100 &\n");
    assert_eq!(t.shell.jobs.len(), 1);
}

#[test]
fn test_quoted_builtin_name_is_a_builtin() {
    let mut t = TestShell::new();
    assert_eq!(t.eval("'quit'"), STATUS_CMD_OK);
    assert_eq!(t.shell.exit_requested(), Some(0));
}
