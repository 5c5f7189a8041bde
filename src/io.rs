//! Output streams used by builtins and by job notices.

use crate::builtins::shared::{STATUS_CMD_ERROR, STATUS_CMD_OK};
use crate::wutil::{perror, write_all_to_fd};
use libc::EPIPE;
use std::os::fd::RawFd;

pub enum OutputStream {
    Fd(FdOutputStream),
    String(StringOutputStream),
}

impl OutputStream {
    /// Return any internally buffered contents.
    /// Only a string stream buffers; an fd stream writes through immediately and returns "".
    pub fn contents(&self) -> &str {
        match self {
            OutputStream::String(stream) => stream.contents(),
            OutputStream::Fd(_) => "",
        }
    }

    /// Return a status code reflecting whether any write failed.
    pub fn flush_and_check_error(&mut self) -> libc::c_int {
        match self {
            OutputStream::Fd(stream) => stream.flush_and_check_error(),
            OutputStream::String(_) => STATUS_CMD_OK,
        }
    }

    pub fn append<Str: AsRef<str>>(&mut self, s: Str) -> bool {
        let s = s.as_ref();
        match self {
            OutputStream::Fd(stream) => stream.append(s),
            OutputStream::String(stream) => stream.append(s),
        }
    }

    /// Append with a trailing newline, in a single write.
    pub fn appendln(&mut self, s: impl Into<String>) -> bool {
        let mut s = s.into();
        s.push('\n');
        self.append(s)
    }

    /// Discard buffered contents of a string stream.
    pub fn clear(&mut self) {
        if let OutputStream::String(stream) = self {
            stream.contents.clear();
        }
    }
}

/// An output stream which writes to an fd.
/// Note the fd may be something like stdout; there is no ownership implied here.
pub struct FdOutputStream {
    fd: RawFd,
    errored: bool,
}

impl FdOutputStream {
    /// Construct from a file descriptor, which must be nonegative.
    pub fn new(fd: RawFd) -> Self {
        assert!(fd >= 0, "Invalid fd");
        FdOutputStream { fd, errored: false }
    }

    fn append(&mut self, s: &str) -> bool {
        if self.errored {
            return false;
        }
        if !write_all_to_fd(s.as_bytes(), self.fd) {
            if errno::errno().0 != EPIPE {
                perror("write");
            }
            self.errored = true;
        }
        !self.errored
    }

    fn flush_and_check_error(&mut self) -> libc::c_int {
        if self.errored {
            STATUS_CMD_ERROR
        } else {
            STATUS_CMD_OK
        }
    }
}

/// A simple output stream which buffers into a string.
#[derive(Default)]
pub struct StringOutputStream {
    contents: String,
}

impl StringOutputStream {
    pub fn new() -> Self {
        Default::default()
    }
    fn append(&mut self, s: &str) -> bool {
        self.contents.push_str(s);
        true
    }
    fn contents(&self) -> &str {
        &self.contents
    }
}

/// The output and error streams for one evaluation.
pub struct IoStreams<'a> {
    pub out: &'a mut OutputStream,
    pub err: &'a mut OutputStream,
}

impl<'a> IoStreams<'a> {
    pub fn new(out: &'a mut OutputStream, err: &'a mut OutputStream) -> Self {
        IoStreams { out, err }
    }
}
