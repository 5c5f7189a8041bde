use std::ffi::{c_char, CStr, CString, NulError, OsString};
use std::os::unix::ffi::OsStrExt;
use std::ptr;

/// The null-terminated array of NUL-terminated strings consumed by execve, owning its strings.
///
/// The pointer table points into each CString's own heap buffer, which does not move when the
/// CString itself is moved, so the table stays valid for the lifetime of the array.
pub struct OwningNullTerminatedArray {
    strings: Vec<CString>,
    pointers: Vec<*const c_char>,
}

impl OwningNullTerminatedArray {
    /// Construct, taking ownership of a list of strings.
    pub fn new(strings: Vec<CString>) -> Self {
        let pointers = strings
            .iter()
            .map(|s| s.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        OwningNullTerminatedArray { strings, pointers }
    }

    /// Construct from Rust strings, failing if any contains an interior NUL.
    pub fn from_strs<S: AsRef<str>>(strs: &[S]) -> Result<Self, NulError> {
        let strings = strs
            .iter()
            .map(|s| CString::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(strings))
    }

    /// Snapshot the environment of the calling process as `NAME=value` strings.
    /// Entries that cannot be represented (interior NUL) are skipped.
    pub fn from_environment() -> Self {
        let strings = std::env::vars_os()
            .filter_map(|(name, value)| {
                let mut entry = OsString::with_capacity(name.len() + value.len() + 1);
                entry.push(&name);
                entry.push("=");
                entry.push(&value);
                CString::new(entry.as_bytes()).ok()
            })
            .collect();
        Self::new(strings)
    }

    /// Return the list of pointers, appropriate for envp or argv.
    pub fn get(&self) -> *const *const c_char {
        debug_assert!(self.pointers.last().is_some_and(|p| p.is_null()));
        self.pointers.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn first(&self) -> Option<&CStr> {
        self.strings.first().map(|s| s.as_c_str())
    }
}

#[cfg(test)]
mod tests {
    use super::OwningNullTerminatedArray;
    use std::ffi::{CStr, CString};
    use std::ptr;

    #[test]
    fn test_owning_null_terminated_array() {
        let owned_strs = vec![CString::new("foo").unwrap(), CString::new("bar").unwrap()];
        let arr = OwningNullTerminatedArray::new(owned_strs);
        let ptr = arr.get();
        unsafe {
            assert_eq!(CStr::from_ptr(*ptr).to_str().unwrap(), "foo");
            assert_eq!(CStr::from_ptr(*ptr.add(1)).to_str().unwrap(), "bar");
            assert_eq!(*ptr.add(2), ptr::null());
        }
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.first().map(|s| s.to_str().unwrap()), Some("foo"));
    }

    #[test]
    fn test_array_survives_move() {
        let arr = OwningNullTerminatedArray::from_strs(&["/bin/sleep", "1"]).unwrap();
        let moved = Box::new(arr);
        let ptr = moved.get();
        unsafe {
            assert_eq!(CStr::from_ptr(*ptr.add(1)).to_str().unwrap(), "1");
        }
    }

    #[test]
    fn test_interior_nul_rejected() {
        assert!(OwningNullTerminatedArray::from_strs(&["ec\0ho"]).is_err());
    }

    #[test]
    fn test_empty_array() {
        let arr = OwningNullTerminatedArray::new(vec![]);
        assert!(arr.is_empty());
        unsafe { assert_eq!(*arr.get(), ptr::null()) };
    }
}
