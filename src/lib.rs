/// Macro for prefixed status logging to stderr.
///
/// Lines are emitted when stderr is a terminal, or unconditionally when
/// running under GitHub Actions (where stderr is a pipe but progress
/// output still needs to reach the job log).
///
/// Usage:
/// ```ignore
/// log_status!("deps", "Deployed CUDA");
/// log_status!("publish", "Created tag {}", tag);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr())
            || $crate::env::running_in_actions()
        {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Callers can write `ortci::sdk` instead of `ortci::core::sdk`
pub use self::core::*;
pub use self::utils::*;
