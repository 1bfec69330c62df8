//! Standardized logging utility for Madrona.
//!
//! This module provides the `mlog!` macro which ensures all plain-stderr
//! logs follow the `YYYY-MM-DD HH:MM:SS [MODULE] Message` format.
//! Structured logging goes through `tracing`; `mlog!` is for the handful
//! of protocol-level traces that must survive any subscriber filtering.

#[macro_export]
macro_rules! mlog {
    ($module:expr, $($arg:tt)*) => {{
        let now = chrono::Local::now();
        eprintln!("{} [{}] {}",
            now.format("%Y-%m-%d %H:%M:%S"),
            $module,
            format!($($arg)*)
        );
    }};
}

/// Standardized module identifiers
pub const MAIN: &str = "MAIN";
pub const SHELL: &str = "SHELL";
pub const WINDOW: &str = "WINDOW";
pub const OUTPUT: &str = "OUTPUT";
pub const RENDER: &str = "RENDER";
pub const STATE: &str = "STATE";
