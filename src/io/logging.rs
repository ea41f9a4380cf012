//! Logger setup for the command-line tool

use crate::io::error::Result;
use flexi_logger::{Logger, LoggerHandle};

/// Start logging to stderr with a `flexi_logger` specification such as
/// `info` or `biasplane=debug`
///
/// Keep the returned handle alive for as long as logging is needed.
///
/// # Errors
///
/// Returns an error if the specification cannot be parsed or a logger is
/// already installed
pub fn init_logging(spec: &str) -> Result<LoggerHandle> {
    let handle = Logger::try_with_str(spec)?.log_to_stderr().start()?;
    Ok(handle)
}
