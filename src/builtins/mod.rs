pub mod shared;

pub mod bg;
pub mod fg;
pub mod jobs;
pub mod quit;

mod prelude {
    pub use super::shared::*;
    pub use libc::c_int;

    #[allow(unused_imports)]
    pub(crate) use crate::{
        flog::{FLOG, FLOGF},
        io::IoStreams,
        shell::Shell,
    };
}
