#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(unknown_lints)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::new_without_default)]
#![allow(clippy::uninlined_format_args)]

pub mod builtins;
pub mod common;
pub mod exec;
pub mod flog;
pub mod fork_exec;
pub mod getopt;
pub mod io;
pub mod job_table;
pub mod nix;
pub mod null_terminated_array;
pub mod path;
pub mod proc;
pub mod reader;
pub mod shell;
pub mod signal;
pub mod tokenizer;
pub mod wutil;

#[cfg(test)]
mod tests;
