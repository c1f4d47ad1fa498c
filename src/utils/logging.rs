//! Logging macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! The listener logs every message it receives, which is noisy on a busy
//! broker. Each module decides whether its diagnostics reach the `log`
//! facade:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info, log_warn, log_error};
//!
//! log_info!("stored sample for cook {}", cook_id);
//! ```
//! Level filtering still applies on top through `RUST_LOG`.

/// Conditional `log::debug!`. Requires `ENABLE_LOGS` in the calling module.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Conditional `log::info!`. Requires `ENABLE_LOGS` in the calling module.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional `log::warn!`. Requires `ENABLE_LOGS` in the calling module.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional `log::error!`. Requires `ENABLE_LOGS` in the calling module.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
