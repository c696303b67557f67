//! Row subsetting.

use crate::error::DMatrixError;
use crate::handle::DMatrixHandle;
use crate::lifecycle::handle_result;
use crate::util::{set_error_null, slice_from_raw};
use libc::size_t;

/// Create a new matrix holding the selected rows.
///
/// Rows appear in the order given and may repeat. Labels, weights, label
/// bounds and base margins follow their rows; feature weights are copied.
/// Matrices carrying query groups cannot be sliced.
///
/// # Parameters
///
/// - `handle`: Valid matrix handle
/// - `rows`, `len`: Row indices, each below the row count
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// New handle on success, NULL on failure. The source handle is unchanged.
///
/// # Ownership
///
/// Caller owns the returned handle. Must call `dmatrix_free()` to free.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `rows` must point to `len` integers, or be NULL if `len` is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_slice(
    handle: *mut DMatrixHandle,
    rows: *const i32,
    len: size_t,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error_null(error, DMatrixError::invalid_handle()) },
    };

    let rows = match unsafe { slice_from_raw(rows, len, "rows") } {
        Ok(r) => r,
        Err(e) => return unsafe { set_error_null(error, e) },
    };
    let rows: Vec<usize> = match rows.iter().map(|&r| usize::try_from(r)).collect() {
        Ok(r) => r,
        Err(_) => {
            return unsafe {
                set_error_null(error, DMatrixError::argument("row indices must be non-negative"))
            };
        }
    };

    unsafe { handle_result(handle.as_ref().slice(&rows), error) }
}
