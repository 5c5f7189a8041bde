//! Output that is safe to produce between fork() and exec(), and from inside signal handlers.
//! Nothing here allocates or takes a lock.

use std::ffi::CStr;

const LINE_CAPACITY: usize = 256;

/// A fixed-size line buffer living on the stack. Text beyond the capacity is dropped; the
/// trailing newline is always kept so that a truncated line is still a line.
pub struct SafeLine {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl SafeLine {
    pub const fn new() -> Self {
        SafeLine {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        // Reserve one byte for the newline.
        let room = LINE_CAPACITY - 1 - self.len;
        let amt = bytes.len().min(room);
        self.buf[self.len..self.len + amt].copy_from_slice(&bytes[..amt]);
        self.len += amt;
    }

    pub fn push_int(&mut self, val: i64) {
        let mut digits = [0u8; 20];
        let mut cursor = digits.len();
        let mut rest = val.unsigned_abs();
        loop {
            cursor -= 1;
            digits[cursor] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        if val < 0 {
            self.push_bytes(b"-");
        }
        self.push_bytes(&digits[cursor..]);
    }

    /// Terminate the line and write it with a single write(2). Errors are ignored: there is
    /// nobody left to report them to.
    pub fn finish(mut self, fd: i32) {
        if fd < 0 {
            return;
        }
        self.buf[self.len] = b'\n';
        self.len += 1;
        unsafe {
            let _ = libc::write(fd, self.buf.as_ptr().cast(), self.len);
        }
    }

    #[cfg(test)]
    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Values which can be appended to a [`SafeLine`] without allocating.
pub trait SafeDisplay {
    fn append_to(&self, line: &mut SafeLine);
}

impl SafeDisplay for &str {
    fn append_to(&self, line: &mut SafeLine) {
        line.push_bytes(self.as_bytes());
    }
}

impl SafeDisplay for &CStr {
    fn append_to(&self, line: &mut SafeLine) {
        line.push_bytes(self.to_bytes());
    }
}

impl SafeDisplay for i32 {
    fn append_to(&self, line: &mut SafeLine) {
        line.push_int(i64::from(*self));
    }
}


/// Variant of FLOG which is async-safe to use after fork().
/// The arguments are NOT space-separated. Embed real spaces in your literals.
macro_rules! FLOG_SAFE {
    ($category:ident, $($elem:expr),+ $(,)*) => {
        if crate::flog::categories::$category
            .enabled
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            #[allow(unused_imports)]
            use crate::fork_exec::flog_safe::{SafeDisplay, SafeLine};
            let mut line = SafeLine::new();
            line.push_bytes(crate::flog::categories::$category.name.as_bytes());
            line.push_bytes(b": ");
            $(
                SafeDisplay::append_to(&$elem, &mut line);
            )+
            line.finish(crate::flog::get_flog_file_fd());
        }
    };
}

/// Print a user-visible line to stdout, async-signal-safely.
macro_rules! print_safe {
    ($($elem:expr),+ $(,)*) => {{
        #[allow(unused_imports)]
        use crate::fork_exec::flog_safe::{SafeDisplay, SafeLine};
        let mut line = SafeLine::new();
        $(
            SafeDisplay::append_to(&$elem, &mut line);
        )+
        line.finish(libc::STDOUT_FILENO);
    }};
}

pub(crate) use {print_safe, FLOG_SAFE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_int() {
        for x in [-1024i64, -1, 0, 7, 65536, i64::MIN, i64::MAX] {
            let mut line = SafeLine::new();
            line.push_int(x);
            assert_eq!(line.as_bytes(), x.to_string().as_bytes());
        }
    }

    #[test]
    fn test_mixed_line() {
        let mut line = SafeLine::new();
        let cmd = CStr::from_bytes_with_nul(b"./nope\0").unwrap();
        cmd.append_to(&mut line);
        ": Command not found".append_to(&mut line);
        assert_eq!(line.as_bytes(), b"./nope: Command not found");
    }

    #[test]
    fn test_truncation_keeps_room_for_newline() {
        let mut line = SafeLine::new();
        let long = [b'x'; 400];
        line.push_bytes(&long);
        assert_eq!(line.as_bytes().len(), LINE_CAPACITY - 1);
        line.push_int(12);
        assert_eq!(line.as_bytes().len(), LINE_CAPACITY - 1);
    }
}
