// A module concerned with the exec side of fork/exec: the async-signal safe code which runs in
// between fork and exec, and the output it is allowed to produce.

pub mod flog_safe;
pub mod postfork;
