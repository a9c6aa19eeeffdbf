//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.
//! Crates using them must depend on `routesync-core-types` for the
//! canonical event names.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use routesync_core::log_op_start;
/// log_op_start!("reconcile");
/// log_op_start!("reconcile", desired = 3);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use routesync_core::log_op_end;
/// log_op_end!("reconcile", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// The error is converted into `RsError` to obtain its kind and stable code.
///
/// # Example
///
/// ```
/// # use routesync_core::{log_op_error, errors::StoreError};
/// log_op_error!("load_baseline", StoreError::EmptyPath, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::RsError;
        let rs_err: RsError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rs_err.kind(),
            err_code = rs_err.code(),
            error = %rs_err,
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::RsError;
        let rs_err: RsError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = routesync_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?rs_err.kind(),
            err_code = rs_err.code(),
            error = %rs_err,
            $($field)*
        );
    }};
}
