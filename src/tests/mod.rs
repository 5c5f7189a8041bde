mod shell;
mod tokenizer;

pub mod prelude {
    use crate::io::{IoStreams, OutputStream, StringOutputStream};
    use crate::job_table::JobTable;
    use crate::proc::{Pid, Signaller};
    use crate::shell::Shell;
    use crate::signal::{signal_reset_handlers, Signal};
    use libc::c_int;
    use once_cell::sync::OnceCell;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub use serial_test::serial;

    pub fn test_init() {
        static DONE: OnceCell<()> = OnceCell::new();
        DONE.get_or_init(|| {
            // Set default signal handlers, so we can ctrl-C out of this.
            signal_reset_handlers();
        });
    }

    /// A signaller which records what it was asked to send instead of sending it.
    /// Clones share the record, so a test can keep one while the shell owns another.
    #[derive(Clone, Default)]
    pub struct RecordingSignaller {
        sent: Rc<RefCell<Vec<(libc::pid_t, c_int)>>>,
        fail_with: Option<nix::errno::Errno>,
    }

    impl RecordingSignaller {
        pub fn new() -> Self {
            Self::default()
        }

        /// A signaller whose every send fails with `err`, after recording it.
        pub fn failing(err: nix::errno::Errno) -> Self {
            RecordingSignaller {
                fail_with: Some(err),
                ..Default::default()
            }
        }

        /// Every (pgid, signal) pair sent so far.
        pub fn sent(&self) -> Vec<(libc::pid_t, c_int)> {
            self.sent.borrow().clone()
        }
    }

    impl Signaller for RecordingSignaller {
        fn signal_group(&mut self, pgid: Pid, sig: Signal) -> nix::Result<()> {
            self.sent.borrow_mut().push((pgid.get(), sig.code()));
            match self.fail_with {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    pub fn string_stream() -> OutputStream {
        OutputStream::String(StringOutputStream::new())
    }

    /// A shell with a recording signaller and string streams.
    pub struct TestShell {
        pub shell: Shell,
        pub signals: RecordingSignaller,
        pub out: OutputStream,
        pub err: OutputStream,
    }

    impl TestShell {
        pub fn new() -> TestShell {
            Self::with_signaller(RecordingSignaller::new())
        }

        pub fn with_signaller(signals: RecordingSignaller) -> TestShell {
            TestShell {
                shell: Shell::new(JobTable::new(), Box::new(signals.clone())),
                signals,
                out: string_stream(),
                err: string_stream(),
            }
        }

        pub fn eval(&mut self, line: &str) -> c_int {
            let mut streams = IoStreams::new(&mut self.out, &mut self.err);
            self.shell.eval(line, &mut streams)
        }

        /// Return and clear what was written to the output stream.
        pub fn take_out(&mut self) -> String {
            let contents = self.out.contents().to_owned();
            self.out.clear();
            contents
        }

        /// Return and clear what was written to the error stream.
        pub fn take_err(&mut self) -> String {
            let contents = self.err.contents().to_owned();
            self.err.clear();
            contents
        }
    }
}
