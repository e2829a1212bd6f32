//! Library side of the `dili` binary: logging setup and report assembly.

pub mod logging;
pub mod replay;
pub mod report;
