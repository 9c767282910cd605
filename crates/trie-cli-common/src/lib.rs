//! Helpers shared by the `maketrie` and `findoverlaps` binaries.

mod logging;

pub use logging::{init_logging, LogArgs, LogFormat};
