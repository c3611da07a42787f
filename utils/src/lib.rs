//! Shared utilities for grantgov.

pub mod logging;
pub mod time;

pub use logging::{init_tracing, LogFormat, UnknownLogFormat};
pub use time::format_duration;
