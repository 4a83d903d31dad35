#![deny(missing_docs)]
//! Shared logging utilities for the mediaharvest workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a thread-local "current target" label that the macros prefix to every
//! message, and a minimal test initializer for the global logger.

use std::cell::RefCell;

thread_local! {
    /// Label of the target whose run is active on this thread, e.g. `tag:sunset`.
    static CURRENT_TARGET: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Marks `label` as the target being harvested on the current thread.
/// Call once before a target's run starts.
pub fn set_current_target(label: impl Into<String>) {
    let label = label.into();
    CURRENT_TARGET.with(|v| *v.borrow_mut() = Some(label));
}

/// Clears the current target label for this thread.
pub fn clear_current_target() {
    CURRENT_TARGET.with(|v| *v.borrow_mut() = None);
}

/// Returns the current target label, if a run is active on this thread.
pub fn current_target() -> Option<String> {
    CURRENT_TARGET.with(|v| v.borrow().clone())
}

/// Formats the `[label] ` prefix used by the logging macros.
/// Returns an empty string outside of a target's run.
#[doc(hidden)]
pub fn target_prefix() -> String {
    CURRENT_TARGET.with(|v| match v.borrow().as_deref() {
        Some(label) => format!("[{label}] "),
        None => String::new(),
    })
}

#[doc(hidden)]
pub use log as __log;

/// Logs a trace-level message, prefixed with the current target.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::target_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message, prefixed with the current target.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::target_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message, prefixed with the current target.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::target_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message, prefixed with the current target.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::target_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message, prefixed with the current target.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::target_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
