//! Error handling for the FFI layer.
//!
//! This module provides C-compatible error types and conversion from matrix
//! engine errors. Every error handed to a caller is also recorded as the
//! calling thread's last error, readable through `dmatrix_last_error`.

use crate::matrix::MatrixError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

/// Error codes for FFI functions.
///
/// These codes are stable and can be matched in C code.
/// Codes 1-99 map to matrix engine error kinds.
/// Codes 100+ are FFI-specific errors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DMatrixErrorCode {
    /// No error
    Ok = 0,
    /// Shape, length or type mismatch in the arguments
    Argument = 1,
    /// File missing, unreadable, unwritable or malformed
    Io = 2,
    /// Matrix structure rejected by the engine
    Library = 3,
    /// Requested info field is not set
    NotFound = 4,

    // FFI-specific errors (100+)
    /// Null pointer passed
    NullPointer = 100,
    /// Invalid UTF-8 string
    InvalidUtf8 = 101,
    /// JSON parse error
    JsonParse = 102,
    /// Invalid handle
    InvalidHandle = 103,
    /// Unknown error
    Unknown = 255,
}

/// Error structure returned via out-parameter.
///
/// # Memory Ownership
///
/// The `message` field is owned by the FFI layer when non-null.
/// Call `dmatrix_error_free()` to release the message memory.
#[repr(C)]
pub struct DMatrixError {
    /// Error code
    pub code: DMatrixErrorCode,
    /// Error message (NULL if code == Ok)
    pub message: *mut c_char,
}

thread_local! {
    static LAST_ERROR: RefCell<CString> = RefCell::new(CString::default());
}

impl DMatrixError {
    /// Create a success result (no error).
    pub fn ok() -> Self {
        Self {
            code: DMatrixErrorCode::Ok,
            message: std::ptr::null_mut(),
        }
    }

    fn new(code: DMatrixErrorCode, msg: String) -> Self {
        let message = CString::new(msg.replace('\0', "\u{FFFD}")).unwrap_or_default();
        LAST_ERROR.with(|last| *last.borrow_mut() = message.clone());
        Self {
            code,
            message: message.into_raw(),
        }
    }

    /// Create an error from a matrix engine error.
    pub fn from_matrix_error(e: MatrixError) -> Self {
        let code = error_code_from_matrix(&e);
        log::warn!("{e}");
        Self::new(code, e.to_string())
    }

    /// Create an argument error detected by the bridge itself.
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::new(DMatrixErrorCode::Argument, msg.into())
    }

    /// Create a null pointer error.
    pub fn null_pointer(param: &str) -> Self {
        Self::new(
            DMatrixErrorCode::NullPointer,
            format!("null pointer passed for parameter: {param}"),
        )
    }

    /// Create an invalid UTF-8 error.
    pub fn invalid_utf8(context: &str) -> Self {
        Self::new(
            DMatrixErrorCode::InvalidUtf8,
            format!("invalid UTF-8 in {context}"),
        )
    }

    /// Create a JSON parse error.
    pub fn json_parse(e: serde_json::Error) -> Self {
        Self::new(DMatrixErrorCode::JsonParse, format!("JSON parse error: {e}"))
    }

    /// Create a JSON serialization error.
    pub fn json_serialize(e: serde_json::Error) -> Self {
        Self::new(
            DMatrixErrorCode::JsonParse,
            format!("JSON serialization error: {e}"),
        )
    }

    /// Create an invalid handle error.
    pub fn invalid_handle() -> Self {
        Self::new(
            DMatrixErrorCode::InvalidHandle,
            "invalid or null handle".to_string(),
        )
    }
}

/// Convert a matrix engine error to an FFI error code.
fn error_code_from_matrix(e: &MatrixError) -> DMatrixErrorCode {
    match e {
        MatrixError::Argument { .. } => DMatrixErrorCode::Argument,
        MatrixError::Io { .. } | MatrixError::Format { .. } | MatrixError::Bincode { .. } => {
            DMatrixErrorCode::Io
        }
        #[cfg(feature = "csv")]
        MatrixError::Csv { .. } => DMatrixErrorCode::Io,
        MatrixError::Library { .. } => DMatrixErrorCode::Library,
        MatrixError::NotFound { .. } => DMatrixErrorCode::NotFound,
    }
}

/// Free error message memory.
///
/// Safe to call with NULL error or NULL message.
///
/// # Safety
///
/// The error pointer must be valid or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_error_free(error: *mut DMatrixError) {
    if error.is_null() {
        return;
    }
    unsafe {
        let err = &mut *error;
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
            err.message = std::ptr::null_mut();
        }
    }
}

/// Message of the most recent error raised on the calling thread.
///
/// # Returns
///
/// Pointer to a thread-local string, empty if no error has occurred yet.
/// Valid until the next failing call on the same thread. Do not free.
#[unsafe(no_mangle)]
pub extern "C" fn dmatrix_last_error() -> *const c_char {
    LAST_ERROR.with(|last| last.borrow().as_ptr())
}
