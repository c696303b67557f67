//! State query functions (shape, non-missing count, summary).

use crate::error::DMatrixError;
use crate::handle::DMatrixHandle;
use crate::util::{set_error, set_error_null, set_ok, string_to_cstr};
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::c_char;

/// Matrix summary serialized for FFI.
#[derive(Debug, Serialize)]
struct SummaryJson {
    num_row: u64,
    num_col: u64,
    num_non_missing: u64,
    info_fields: Vec<&'static str>,
}

/// Get the number of rows.
///
/// # Returns
///
/// Row count on success, 0 on error (check error->code to distinguish
/// from an empty matrix).
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_num_row(handle: *mut DMatrixHandle, error: *mut DMatrixError) -> u64 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    unsafe { set_ok(error) };
    handle.as_ref().num_row() as u64
}

/// Get the number of columns.
///
/// # Returns
///
/// Column count on success, 0 on error.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_num_col(handle: *mut DMatrixHandle, error: *mut DMatrixError) -> u64 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    unsafe { set_ok(error) };
    handle.as_ref().num_col() as u64
}

/// Get the number of stored (non-missing) cells.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_num_non_missing(
    handle: *mut DMatrixHandle,
    error: *mut DMatrixError,
) -> u64 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    unsafe { set_ok(error) };
    handle.as_ref().num_non_missing() as u64
}

/// Describe a matrix as JSON.
///
/// # Returns
///
/// JSON string on success, NULL on failure.
/// Caller must free with `dmatrix_string_free()`.
///
/// # JSON Schema
///
/// ```json
/// {
///   "num_row": 100,
///   "num_col": 8,
///   "num_non_missing": 640,
///   "info_fields": ["label", "weight", "group_ptr"]
/// }
/// ```
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_describe(
    handle: *mut DMatrixHandle,
    error: *mut DMatrixError,
) -> *mut c_char {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error_null(error, DMatrixError::invalid_handle()) },
    };

    let dmat = handle.as_ref();
    let summary = SummaryJson {
        num_row: dmat.num_row() as u64,
        num_col: dmat.num_col() as u64,
        num_non_missing: dmat.num_non_missing() as u64,
        info_fields: dmat.info().set_fields(),
    };
    match serde_json::to_string(&summary) {
        Ok(json) => {
            unsafe { set_ok(error) };
            string_to_cstr(json)
        }
        Err(e) => unsafe { set_error_null(error, DMatrixError::json_serialize(e)) },
    }
}

/// Number of matrix handles currently alive in this process.
///
/// Useful for leak checks in host runtimes: every create or slice call adds
/// one, every `dmatrix_free` removes one.
#[unsafe(no_mangle)]
pub extern "C" fn dmatrix_live_handles() -> u64 {
    DMatrixHandle::live_count() as u64
}

/// Free a string returned by the library.
///
/// # Safety
///
/// The pointer must have been returned by a dmatrix function, or be NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(s));
    }
}
