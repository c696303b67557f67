//! Utility functions for FFI operations.

use crate::error::DMatrixError;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Convert a C string to a Rust String.
///
/// Returns an error if the pointer is null or contains invalid UTF-8.
///
/// # Safety
///
/// The caller must ensure `ptr` is either null or points to a valid
/// null-terminated C string.
pub unsafe fn cstr_to_string(ptr: *const c_char, param_name: &str) -> Result<String, DMatrixError> {
    if ptr.is_null() {
        return Err(DMatrixError::null_pointer(param_name));
    }

    let cstr = unsafe { CStr::from_ptr(ptr) };
    match cstr.to_str() {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(DMatrixError::invalid_utf8(param_name)),
    }
}

/// Convert an optional C string to an Option<String>.
///
/// Returns None if the pointer is null, Ok(Some(String)) if valid,
/// or an error if the string contains invalid UTF-8.
///
/// # Safety
///
/// The caller must ensure `ptr` is either null or points to a valid
/// null-terminated C string.
pub unsafe fn cstr_to_option_string(
    ptr: *const c_char,
    param_name: &str,
) -> Result<Option<String>, DMatrixError> {
    if ptr.is_null() {
        return Ok(None);
    }

    let cstr = unsafe { CStr::from_ptr(ptr) };
    match cstr.to_str() {
        Ok(s) => Ok(Some(s.to_string())),
        Err(_) => Err(DMatrixError::invalid_utf8(param_name)),
    }
}

/// Borrow a caller buffer as a slice.
///
/// A null pointer is accepted only when `len` is 0.
///
/// # Safety
///
/// When non-null, `ptr` must point to at least `len` initialized elements
/// that stay valid and unmodified for `'a`.
pub unsafe fn slice_from_raw<'a, T>(
    ptr: *const T,
    len: usize,
    param_name: &str,
) -> Result<&'a [T], DMatrixError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(DMatrixError::null_pointer(param_name));
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Hand a copied buffer to the caller as a raw pointer.
///
/// The length goes to `out_len`; the pointer must be released with the
/// matching `dmatrix_free_*_array` function. Empty buffers yield null.
pub fn vec_into_raw<T>(values: Vec<T>, out_len: &mut u64) -> *mut T {
    *out_len = values.len() as u64;
    if values.is_empty() {
        return std::ptr::null_mut();
    }
    Box::into_raw(values.into_boxed_slice()) as *mut T
}

/// Reclaim a buffer produced by [`vec_into_raw`].
///
/// # Safety
///
/// `ptr` must be null or come from `vec_into_raw` with the same `len`,
/// and must not have been freed already.
pub unsafe fn free_raw<T>(ptr: *mut T, len: u64) {
    if ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { drop(Box::from_raw(slice)) };
}

/// Convert a Rust string to a C string, returning an owned pointer.
///
/// The caller is responsible for freeing the returned pointer with `dmatrix_string_free`.
/// Returns null if the string contains internal null bytes.
pub fn string_to_cstr(s: String) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Set an error in the out-parameter and return a default value.
///
/// # Safety
///
/// The caller must ensure `error` is either null or a valid pointer.
pub unsafe fn set_error<T: Default>(error: *mut DMatrixError, err: DMatrixError) -> T {
    if let Some(e) = unsafe { error.as_mut() } {
        *e = err;
    } else {
        let mut err = err;
        unsafe { crate::error::dmatrix_error_free(&mut err) };
    }
    T::default()
}

/// Set an error in the out-parameter and return null.
///
/// # Safety
///
/// The caller must ensure `error` is either null or a valid pointer.
pub unsafe fn set_error_null<T>(error: *mut DMatrixError, err: DMatrixError) -> *mut T {
    unsafe { set_error::<()>(error, err) };
    std::ptr::null_mut()
}

/// Set success in the out-parameter error.
///
/// # Safety
///
/// The caller must ensure `error` is either null or a valid pointer.
pub unsafe fn set_ok(error: *mut DMatrixError) {
    if let Some(e) = unsafe { error.as_mut() } {
        *e = DMatrixError::ok();
    }
}
