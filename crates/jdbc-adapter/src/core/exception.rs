//! Translation of driver failures into the adapter error taxonomy.

use tracing::debug;

use crate::error::{AdapterError, DriverError};

/// Translate a driver error raised while running `sql`.
///
/// Platform-level errors are handed back unchanged as
/// [`AdapterError::Native`]: wrapping them would disguise driver bugs and
/// infrastructure faults as statement errors. Everything else becomes
/// [`AdapterError::StatementInvalid`] with a `"<class>: <message>: <sql>"`
/// message, the original error as its source and its stack frames attached.
pub fn translate_exception(err: DriverError, sql: &str) -> AdapterError {
    if err.is_native() {
        return AdapterError::Native(err);
    }

    let message = format!("{}: {}: {}", err.class_name, message_text(&err), sql);

    AdapterError::StatementInvalid {
        message,
        sql: sql.to_string(),
        stack: err.backtrace.clone(),
        source: err,
    }
}

/// Decode the driver message, re-encoding it if it is not valid UTF-8.
fn message_text(err: &DriverError) -> String {
    match std::str::from_utf8(&err.message) {
        Ok(text) => text.to_string(),
        Err(e) => {
            debug!(
                "Driver message from {} is not valid UTF-8 ({}), re-encoding",
                err.class_name, e
            );
            err.message_lossy().into_owned()
        }
    }
}
