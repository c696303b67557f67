//! Info field accessors (label, weight, base_margin, groups, ...).

use crate::error::DMatrixError;
use crate::handle::DMatrixHandle;
use crate::matrix::{FloatField, UIntField};
use crate::util::{cstr_to_string, free_raw, set_error, set_error_null, set_ok, slice_from_raw, vec_into_raw};
use libc::size_t;
use std::os::raw::c_char;

/// Set a float info field.
///
/// # Parameters
///
/// - `handle`: Valid matrix handle
/// - `field`: One of `label`, `weight`, `base_margin`, `label_lower_bound`,
///   `label_upper_bound`, `feature_weights`
/// - `values`, `len`: Field values. Per-row fields need one value per row,
///   `base_margin` a multiple of the row count, `feature_weights` one value
///   per column
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `field` must be a valid null-terminated UTF-8 string
/// - `values` must point to `len` floats, or be NULL if `len` is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_set_float_info(
    handle: *mut DMatrixHandle,
    field: *const c_char,
    values: *const f32,
    len: size_t,
    error: *mut DMatrixError,
) -> i32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    let field = match unsafe { cstr_to_string(field, "field") } {
        Ok(f) => f,
        Err(e) => return unsafe { set_error(error, e) },
    };
    let values = match unsafe { slice_from_raw(values, len, "values") } {
        Ok(v) => v,
        Err(e) => return unsafe { set_error(error, e) },
    };

    let result = field
        .parse::<FloatField>()
        .and_then(|f| handle.as_mut().set_float_info(f, values));
    match result {
        Ok(()) => {
            unsafe { set_ok(error) };
            1
        }
        Err(e) => unsafe { set_error(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Set an unsigned integer info field.
///
/// The only writable field is `group`, which takes query group sizes and
/// behaves exactly like `dmatrix_set_group`.
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `field` must be a valid null-terminated UTF-8 string
/// - `values` must point to `len` integers, or be NULL if `len` is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_set_uint_info(
    handle: *mut DMatrixHandle,
    field: *const c_char,
    values: *const u32,
    len: size_t,
    error: *mut DMatrixError,
) -> i32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    let field = match unsafe { cstr_to_string(field, "field") } {
        Ok(f) => f,
        Err(e) => return unsafe { set_error(error, e) },
    };
    let values = match unsafe { slice_from_raw(values, len, "values") } {
        Ok(v) => v,
        Err(e) => return unsafe { set_error(error, e) },
    };

    let result = field
        .parse::<UIntField>()
        .and_then(|f| handle.as_mut().set_uint_info(f, values));
    match result {
        Ok(()) => {
            unsafe { set_ok(error) };
            1
        }
        Err(e) => unsafe { set_error(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Set query groups from their sizes.
///
/// The sizes must sum to the number of rows.
///
/// # Returns
///
/// 1 on success, 0 on failure.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `sizes` must point to `len` integers, or be NULL if `len` is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_set_group(
    handle: *mut DMatrixHandle,
    sizes: *const u32,
    len: size_t,
    error: *mut DMatrixError,
) -> i32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error(error, DMatrixError::invalid_handle()) },
    };

    let sizes = match unsafe { slice_from_raw(sizes, len, "sizes") } {
        Ok(s) => s,
        Err(e) => return unsafe { set_error(error, e) },
    };

    match handle.as_mut().set_group(sizes) {
        Ok(()) => {
            unsafe { set_ok(error) };
            1
        }
        Err(e) => unsafe { set_error(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Copy out a float info field.
///
/// # Parameters
///
/// - `handle`: Valid matrix handle
/// - `field`: Field name (see `dmatrix_set_float_info`)
/// - `out_len`: Out-parameter for the number of values (must not be NULL)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Pointer to a copy of the values, NULL on failure or when the field is
/// empty. Caller must free with `dmatrix_free_float_array()`. A field that
/// was never set fails with `DMatrixErrorCode::NotFound`.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `field` must be a valid null-terminated UTF-8 string
/// - `out_len` must be a valid pointer
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_get_float_info(
    handle: *mut DMatrixHandle,
    field: *const c_char,
    out_len: *mut u64,
    error: *mut DMatrixError,
) -> *mut f32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error_null(error, DMatrixError::invalid_handle()) },
    };

    let Some(out_len) = (unsafe { out_len.as_mut() }) else {
        return unsafe { set_error_null(error, DMatrixError::null_pointer("out_len")) };
    };
    *out_len = 0;

    let field = match unsafe { cstr_to_string(field, "field") } {
        Ok(f) => f,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let field = match field.parse::<FloatField>() {
        Ok(f) => f,
        Err(e) => return unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) },
    };
    match handle.as_ref().get_float_info(field) {
        Ok(values) => {
            unsafe { set_ok(error) };
            vec_into_raw(values.to_vec(), out_len)
        }
        Err(e) => unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Copy out an unsigned integer info field.
///
/// The only readable field is `group_ptr`: the cumulative query group
/// boundaries, starting at 0 and ending at the row count.
///
/// # Returns
///
/// Pointer to a copy of the values, NULL on failure. Caller must free with
/// `dmatrix_free_uint_array()`.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `field` must be a valid null-terminated UTF-8 string
/// - `out_len` must be a valid pointer
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_get_uint_info(
    handle: *mut DMatrixHandle,
    field: *const c_char,
    out_len: *mut u64,
    error: *mut DMatrixError,
) -> *mut u32 {
    let handle = match unsafe { DMatrixHandle::from_ptr_mut(handle) } {
        Some(h) => h,
        None => return unsafe { set_error_null(error, DMatrixError::invalid_handle()) },
    };

    let Some(out_len) = (unsafe { out_len.as_mut() }) else {
        return unsafe { set_error_null(error, DMatrixError::null_pointer("out_len")) };
    };
    *out_len = 0;

    let field = match unsafe { cstr_to_string(field, "field") } {
        Ok(f) => f,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let field = match field.parse::<UIntField>() {
        Ok(f) => f,
        Err(e) => return unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) },
    };
    match handle.as_ref().get_uint_info(field) {
        Ok(values) => {
            unsafe { set_ok(error) };
            vec_into_raw(values.to_vec(), out_len)
        }
        Err(e) => unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Free a buffer returned by `dmatrix_get_float_info`.
///
/// # Safety
///
/// `ptr` must be NULL or a pointer returned by `dmatrix_get_float_info`
/// together with its reported length, not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_free_float_array(ptr: *mut f32, len: u64) {
    unsafe { free_raw(ptr, len) }
}

/// Free a buffer returned by `dmatrix_get_uint_info`.
///
/// # Safety
///
/// `ptr` must be NULL or a pointer returned by `dmatrix_get_uint_info`
/// together with its reported length, not yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_free_uint_array(ptr: *mut u32, len: u64) {
    unsafe { free_raw(ptr, len) }
}
