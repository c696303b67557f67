//! Binary serialization of a matrix to disk.

use crate::error::DMatrixError;
use crate::handle::DMatrixHandle;
use crate::util::{cstr_to_string, set_error, set_ok};
use std::os::raw::c_char;
use std::path::Path;

/// Save a matrix and all of its set info fields in binary form.
///
/// The file can be loaded back with `dmatrix_create_from_file`, which
/// recognizes the binary format automatically.
///
/// # Parameters
///
/// - `handle`: Valid matrix handle
/// - `path`: Destination path (UTF-8, null-terminated)
/// - `silent`: Non-zero to keep the save summary out of info-level logs
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `path` must be a valid null-terminated UTF-8 string
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_save_binary(
    handle: *mut DMatrixHandle,
    path: *const c_char,
    silent: i32,
    error: *mut DMatrixError,
) -> i32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    let path = match unsafe { cstr_to_string(path, "path") } {
        Ok(p) => p,
        Err(e) => return unsafe { set_error(error, e) },
    };

    match handle.as_ref().save_binary(Path::new(&path), silent != 0) {
        Ok(()) => {
            unsafe { set_ok(error) };
            1
        }
        Err(e) => unsafe { set_error(error, DMatrixError::from_matrix_error(e)) },
    }
}
