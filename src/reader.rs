//! The read-eval loop.

use crate::common::PROMPT;
use crate::flog::FLOG;
use crate::io::IoStreams;
use crate::shell::Shell;
use libc::c_int;
use std::io::BufRead;

/// Options for the read-eval loop.
#[derive(Clone, Copy, Debug)]
pub struct ReaderConfig {
    /// Print the prompt before reading each line.
    pub emit_prompt: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig { emit_prompt: true }
    }
}

/// Read lines from `input` and evaluate them until end of input or until a builtin asks the
/// shell to exit. Return the status the shell should exit with: 0 at end of input, 1 if reading
/// failed.
pub fn reader_read(
    shell: &mut Shell,
    mut input: impl BufRead,
    streams: &mut IoStreams,
    config: ReaderConfig,
) -> c_int {
    let mut buf = Vec::new();
    loop {
        // Report background jobs that changed state while we were busy.
        shell.process_pending_signals(streams.out);
        if config.emit_prompt {
            streams.out.append(PROMPT);
        }

        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => {
                FLOG!(reader, "End of input");
                return 0;
            }
            Ok(_) => {}
            Err(err) => {
                streams.err.appendln(format!("read: {}", err));
                return 1;
            }
        }

        // Anything that arrived while reading, in particular a ctrl-C typed at the prompt, is
        // applied now while there is no foreground job, so it cannot hit the job this line starts.
        shell.process_pending_signals(streams.out);

        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        FLOG!(reader, "Read line:", line.trim_end());
        let status = shell.eval(&line, streams);
        FLOG!(reader, "Status", status);
        if let Some(status) = shell.exit_requested() {
            return status;
        }
    }
}
