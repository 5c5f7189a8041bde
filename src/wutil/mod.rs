//! Wrappers around raw file descriptor output and errno reporting.

use errno::errno;
use std::ffi::CStr;
use std::io::Write;
use std::os::fd::{BorrowedFd, RawFd};

/// Write a slice to a file descriptor. This does NOT retry on EINTR or short writes.
pub fn write_to_fd(input: &[u8], fd: RawFd) -> nix::Result<usize> {
    nix::unistd::write(unsafe { BorrowedFd::borrow_raw(fd) }, input)
}

/// Write the whole slice to `fd`, looping over short writes and EINTR.
/// Return false if a write failed for another reason.
pub fn write_all_to_fd(mut input: &[u8], fd: RawFd) -> bool {
    while !input.is_empty() {
        match write_to_fd(input, fd) {
            Ok(amt) => {
                assert!(amt <= input.len(), "Wrote more than requested");
                input = &input[amt..];
            }
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => return false,
        }
    }
    true
}

/// Return the strerror() text for an errno value.
pub fn strerror(err: i32) -> String {
    let slice = unsafe {
        let msg = libc::strerror(err);
        CStr::from_ptr(msg).to_bytes()
    };
    String::from_utf8_lossy(slice).into_owned()
}

/// Print `s: <description of errno>` to stderr, like perror(3).
pub fn perror(s: &str) {
    let e = errno().0;
    let mut stderr = std::io::stderr().lock();
    if !s.is_empty() {
        let _ = write!(stderr, "{s}: ");
    }
    let _ = stderr.write_all(strerror(e).as_bytes());
    let _ = stderr.write_all(b"\n");
}

/// Report a failed OS primitive and terminate. Used for the unrecoverable cases where the shell
/// can no longer keep its job table consistent.
pub fn fatal_os_error(s: &str) -> ! {
    perror(s);
    std::process::exit(1)
}
