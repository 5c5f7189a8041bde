//! Safe wrappers around various libc functions that we might want to reuse across modules.

pub fn getpid() -> i32 {
    unsafe { libc::getpid() }
}
