//! C FFI bindings for gradient-boosting data matrices.
//!
//! This crate exposes the matrix-construction and data-access surface of a
//! boosting engine through a C-compatible interface, enabling use from
//! Crystal, Go, Ruby, Erlang NIF shims and other languages with C FFI support.
//! The engine itself lives in [`matrix`] and can be used directly from Rust.
//!
//! # Thread Safety
//!
//! `DMatrixHandle` may be moved between threads but must never be used from
//! two threads at once. All operations on one handle must be serialized by
//! the caller.
//!
//! # Memory Management
//!
//! - Handles returned by `dmatrix_create_*`/`dmatrix_slice` must be freed with `dmatrix_free`
//! - Arrays returned by `dmatrix_get_*_info` must be freed with the matching `dmatrix_free_*_array`
//! - Strings returned by functions must be freed with `dmatrix_string_free`
//! - Error messages must be freed with `dmatrix_error_free`
//!
//! # Logging
//!
//! Load and save summaries go through the `log` facade. Passing `silent`
//! demotes them from info to debug level; nothing is installed as a logger.
//!
//! # Feature Flags
//!
//! - `csv` (default): CSV text loading
//! - `parallel` (default): Multi-threaded conversion of large dense inputs

#![allow(clippy::missing_safety_doc)]

mod error;
mod handle;
mod info;
mod lifecycle;
pub mod matrix;
mod persist;
mod slice;
mod state;
mod util;

// Re-export all public FFI types and functions
pub use error::{DMatrixError, DMatrixErrorCode, dmatrix_error_free, dmatrix_last_error};
pub use handle::DMatrixHandle;
pub use info::{
    dmatrix_free_float_array, dmatrix_free_uint_array, dmatrix_get_float_info,
    dmatrix_get_uint_info, dmatrix_set_float_info, dmatrix_set_group, dmatrix_set_uint_info,
};
pub use lifecycle::{
    dmatrix_create_from_csc, dmatrix_create_from_csr, dmatrix_create_from_dense,
    dmatrix_create_from_dense_with_options, dmatrix_create_from_dt, dmatrix_create_from_file,
    dmatrix_create_from_file_with_options, dmatrix_create_from_mat, dmatrix_free,
};
pub use persist::dmatrix_save_binary;
pub use slice::dmatrix_slice;
pub use state::{
    dmatrix_describe, dmatrix_live_handles, dmatrix_num_col, dmatrix_num_non_missing,
    dmatrix_num_row, dmatrix_string_free,
};

use std::os::raw::c_char;

/// Library version string.
///
/// # Returns
///
/// Static string containing the version (e.g., "0.1.0").
/// Do not free this string.
#[unsafe(no_mangle)]
pub extern "C" fn dmatrix_version() -> *const c_char {
    // Include null terminator in the static string
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Feature flags bitmask.
///
/// # Returns
///
/// Bitmask indicating which features are compiled in:
/// - Bit 0 (0x01): `csv` - CSV text loading
/// - Bit 1 (0x02): `parallel` - Multi-threaded dense conversion
///
/// # Example
///
/// ```c
/// uint32_t features = dmatrix_features();
/// if (features & 0x01) { /* csv enabled */ }
/// if (features & 0x02) { /* parallel enabled */ }
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn dmatrix_features() -> u32 {
    let mut flags = 0u32;

    #[cfg(feature = "csv")]
    {
        flags |= 1 << 0;
    }

    #[cfg(feature = "parallel")]
    {
        flags |= 1 << 1;
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::ffi::{CStr, CString};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dense(data: &[f64], nrow: usize, ncol: usize) -> *mut DMatrixHandle {
        let mut error = DMatrixError::ok();
        let handle =
            unsafe { dmatrix_create_from_dense(data.as_ptr(), nrow, ncol, f32::NAN, &mut error) };
        assert_eq!(error.code, DMatrixErrorCode::Ok);
        assert!(!handle.is_null());
        handle
    }

    fn shape(handle: *mut DMatrixHandle) -> (u64, u64) {
        let mut error = DMatrixError::ok();
        let rows = unsafe { dmatrix_num_row(handle, &mut error) };
        let cols = unsafe { dmatrix_num_col(handle, &mut error) };
        assert_eq!(error.code, DMatrixErrorCode::Ok);
        (rows, cols)
    }

    fn get_float(handle: *mut DMatrixHandle, field: &str) -> Result<Vec<f32>, DMatrixErrorCode> {
        let field = CString::new(field).unwrap();
        let mut error = DMatrixError::ok();
        let mut len = 0u64;
        let ptr = unsafe { dmatrix_get_float_info(handle, field.as_ptr(), &mut len, &mut error) };
        if error.code != DMatrixErrorCode::Ok {
            let code = error.code;
            unsafe { dmatrix_error_free(&mut error) };
            return Err(code);
        }
        let values = if ptr.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(ptr, len as usize) }.to_vec()
        };
        unsafe { dmatrix_free_float_array(ptr, len) };
        Ok(values)
    }

    fn set_float(handle: *mut DMatrixHandle, field: &str, values: &[f32]) -> DMatrixErrorCode {
        let field = CString::new(field).unwrap();
        let mut error = DMatrixError::ok();
        unsafe {
            dmatrix_set_float_info(handle, field.as_ptr(), values.as_ptr(), values.len(), &mut error)
        };
        let code = error.code;
        unsafe { dmatrix_error_free(&mut error) };
        code
    }

    #[test]
    fn test_version() {
        let version = dmatrix_version();
        assert!(!version.is_null());
        let version_str = unsafe { CStr::from_ptr(version) };
        assert!(!version_str.to_str().unwrap().is_empty());
    }

    #[test]
    fn test_features() {
        let features = dmatrix_features();
        #[cfg(feature = "csv")]
        assert!(features & 0x01 != 0);
        #[cfg(feature = "parallel")]
        assert!(features & 0x02 != 0);
    }

    #[test]
    fn test_create_from_dense_and_free() {
        let handle = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        assert_eq!(shape(handle), (2, 2));
        assert!(dmatrix_live_handles() >= 1);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_create_from_mat_skips_missing() {
        let data = [1.0f32, -1.0, f32::NAN, 4.0, -1.0, 6.0];
        let mut error = DMatrixError::ok();
        let handle = unsafe { dmatrix_create_from_mat(data.as_ptr(), 2, 3, -1.0, &mut error) };
        assert!(!handle.is_null());
        assert_eq!(shape(handle), (2, 3));
        assert_eq!(unsafe { dmatrix_num_non_missing(handle, &mut error) }, 3);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_dense_shape_overflow() {
        let data = [1.0f32];
        let mut error = DMatrixError::ok();
        let handle =
            unsafe { dmatrix_create_from_mat(data.as_ptr(), usize::MAX, 2, f32::NAN, &mut error) };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_dense_with_options() {
        let data = [0.0f64, 1.0, 0.0, 2.0];
        let options = CString::new(r#"{"missing": 0.0, "nthread": 1}"#).unwrap();
        let mut error = DMatrixError::ok();
        let handle = unsafe {
            dmatrix_create_from_dense_with_options(data.as_ptr(), 2, 2, options.as_ptr(), &mut error)
        };
        assert!(!handle.is_null());
        assert_eq!(unsafe { dmatrix_num_non_missing(handle, &mut error) }, 2);
        unsafe { dmatrix_free(handle) };

        let bad = CString::new(r#"{"missing": "zero"}"#).unwrap();
        let handle = unsafe {
            dmatrix_create_from_dense_with_options(data.as_ptr(), 2, 2, bad.as_ptr(), &mut error)
        };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::JsonParse);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_csr_and_csc() {
        // [[1, _, 2], [_, 3, _]]
        let indptr = [0u64, 2, 3];
        let indices = [0u32, 2, 1];
        let values = [1.0f32, 2.0, 3.0];
        let mut error = DMatrixError::ok();
        let csr = unsafe {
            dmatrix_create_from_csr(
                indptr.as_ptr(),
                indptr.len(),
                indices.as_ptr(),
                indices.len(),
                values.as_ptr(),
                values.len(),
                0,
                &mut error,
            )
        };
        assert!(!csr.is_null());
        assert_eq!(shape(csr), (2, 3));

        let col_ptr = [0u64, 1, 2, 3];
        let row_idx = [0u32, 1, 0];
        let col_vals = [1.0f32, 3.0, 2.0];
        let csc = unsafe {
            dmatrix_create_from_csc(
                col_ptr.as_ptr(),
                col_ptr.len(),
                row_idx.as_ptr(),
                row_idx.len(),
                col_vals.as_ptr(),
                col_vals.len(),
                2,
                &mut error,
            )
        };
        assert!(!csc.is_null());
        assert_eq!(shape(csc), (2, 3));
        assert_eq!(unsafe { dmatrix_num_non_missing(csc, &mut error) }, 3);

        unsafe { dmatrix_free(csr) };
        unsafe { dmatrix_free(csc) };
    }

    #[test]
    fn test_csr_length_mismatch_rejected() {
        let indptr = [0u64, 2];
        let indices = [0u32, 1];
        let values = [1.0f32];
        let mut error = DMatrixError::ok();
        let handle = unsafe {
            dmatrix_create_from_csr(
                indptr.as_ptr(),
                indptr.len(),
                indices.as_ptr(),
                indices.len(),
                values.as_ptr(),
                values.len(),
                2,
                &mut error,
            )
        };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        let msg = unsafe { CStr::from_ptr(error.message) }.to_str().unwrap();
        assert!(msg.contains("indices"));
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_create_from_dt() {
        let ages = [31i32, i32::MIN, 45];
        let smoker = [1i8, 0, 0];
        let income = [5.5f64, 7.25, f64::NAN];
        let columns = [
            ages.as_ptr().cast::<std::ffi::c_void>(),
            smoker.as_ptr().cast(),
            income.as_ptr().cast(),
        ];
        let names = [
            CString::new("int32").unwrap(),
            CString::new("bool8").unwrap(),
            CString::new("float64").unwrap(),
        ];
        let stypes: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();

        let mut error = DMatrixError::ok();
        let handle =
            unsafe { dmatrix_create_from_dt(columns.as_ptr(), stypes.as_ptr(), 3, 3, &mut error) };
        assert!(!handle.is_null());
        assert_eq!(shape(handle), (3, 3));
        assert_eq!(unsafe { dmatrix_num_non_missing(handle, &mut error) }, 7);
        unsafe { dmatrix_free(handle) };

        let bad = [
            CString::new("int32").unwrap(),
            CString::new("str32").unwrap(),
            CString::new("float64").unwrap(),
        ];
        let stypes: Vec<*const c_char> = bad.iter().map(|n| n.as_ptr()).collect();
        let handle =
            unsafe { dmatrix_create_from_dt(columns.as_ptr(), stypes.as_ptr(), 3, 3, &mut error) };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_label_round_trip() {
        let handle = dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        assert_eq!(set_float(handle, "label", &[0.0, 1.0, 0.5]), DMatrixErrorCode::Ok);
        assert_eq!(get_float(handle, "label").unwrap(), vec![0.0, 1.0, 0.5]);

        // Wrong length leaves the previous value in place
        assert_eq!(set_float(handle, "label", &[1.0]), DMatrixErrorCode::Argument);
        assert_eq!(get_float(handle, "label").unwrap(), vec![0.0, 1.0, 0.5]);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_unset_and_unknown_fields() {
        let handle = dense(&[1.0, 2.0], 1, 2);
        assert_eq!(get_float(handle, "weight"), Err(DMatrixErrorCode::NotFound));
        assert_eq!(get_float(handle, "qid"), Err(DMatrixErrorCode::Argument));
        assert_eq!(set_float(handle, "qid", &[1.0]), DMatrixErrorCode::Argument);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_set_group() {
        let handle = dense(&[1.0, 2.0, 3.0, 4.0, 5.0], 5, 1);
        let mut error = DMatrixError::ok();

        let short = [2u32, 2];
        let ok = unsafe { dmatrix_set_group(handle, short.as_ptr(), short.len(), &mut error) };
        assert_eq!(ok, 0);
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        unsafe { dmatrix_error_free(&mut error) };

        let sizes = [2u32, 3];
        let ok = unsafe { dmatrix_set_group(handle, sizes.as_ptr(), sizes.len(), &mut error) };
        assert_eq!(ok, 1);
        assert_eq!(error.code, DMatrixErrorCode::Ok);

        let field = CString::new("group_ptr").unwrap();
        let mut len = 0u64;
        let ptr = unsafe { dmatrix_get_uint_info(handle, field.as_ptr(), &mut len, &mut error) };
        assert_eq!(len, 3);
        assert_eq!(unsafe { std::slice::from_raw_parts(ptr, 3) }, &[0, 2, 5]);
        unsafe { dmatrix_free_uint_array(ptr, len) };

        // `group` through set_uint_info behaves the same way
        let field = CString::new("group").unwrap();
        let sizes = [1u32, 1, 3];
        let ok = unsafe {
            dmatrix_set_uint_info(handle, field.as_ptr(), sizes.as_ptr(), sizes.len(), &mut error)
        };
        assert_eq!(ok, 1);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_slice() {
        let handle = dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        set_float(handle, "label", &[10.0, 20.0, 30.0]);

        let rows = [2i32, 0];
        let mut error = DMatrixError::ok();
        let sliced = unsafe { dmatrix_slice(handle, rows.as_ptr(), rows.len(), &mut error) };
        assert!(!sliced.is_null());
        assert_eq!(shape(sliced), (2, 2));
        assert_eq!(get_float(sliced, "label").unwrap(), vec![30.0, 10.0]);
        // Source is untouched
        assert_eq!(shape(handle), (3, 2));

        let bad = [0i32, 3];
        let none = unsafe { dmatrix_slice(handle, bad.as_ptr(), bad.len(), &mut error) };
        assert!(none.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        unsafe { dmatrix_error_free(&mut error) };

        let negative = [-1i32];
        let none = unsafe { dmatrix_slice(handle, negative.as_ptr(), 1, &mut error) };
        assert!(none.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Argument);
        unsafe { dmatrix_error_free(&mut error) };

        unsafe { dmatrix_free(sliced) };
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_save_binary_and_reload() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.buffer");
        let path_cstr = CString::new(path.to_str().unwrap()).unwrap();

        let handle = dense(&[1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 4, 2);
        set_float(handle, "label", &[1.0, 0.0, 1.0, 0.0]);
        set_float(handle, "weight", &[0.5, 1.0, 1.5, 2.0]);
        set_float(handle, "base_margin", &[0.1, 0.2, 0.3, 0.4]);
        let sizes = [3u32, 1];
        let mut error = DMatrixError::ok();
        unsafe { dmatrix_set_group(handle, sizes.as_ptr(), sizes.len(), &mut error) };

        let ok = unsafe { dmatrix_save_binary(handle, path_cstr.as_ptr(), 1, &mut error) };
        assert_eq!(ok, 1);
        assert_eq!(error.code, DMatrixErrorCode::Ok);

        let loaded = unsafe { dmatrix_create_from_file(path_cstr.as_ptr(), 1, &mut error) };
        assert!(!loaded.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Ok);
        assert_eq!(shape(loaded), (4, 2));
        assert_eq!(unsafe { dmatrix_num_non_missing(loaded, &mut error) }, 7);
        for field in ["label", "weight", "base_margin"] {
            assert_eq!(get_float(loaded, field), get_float(handle, field));
        }

        let desc = unsafe { dmatrix_describe(loaded, &mut error) };
        let json = unsafe { CStr::from_ptr(desc) }.to_str().unwrap();
        assert!(json.contains(r#""num_row":4"#));
        assert!(json.contains(r#""info_fields":["label","weight","base_margin","group_ptr"]"#));
        unsafe { dmatrix_string_free(desc) };

        unsafe { dmatrix_free(loaded) };
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_save_binary_unwritable() {
        let handle = dense(&[1.0], 1, 1);
        let path = CString::new("/nonexistent/dir/out.buffer").unwrap();
        let mut error = DMatrixError::ok();
        let ok = unsafe { dmatrix_save_binary(handle, path.as_ptr(), 1, &mut error) };
        assert_eq!(ok, 0);
        assert_eq!(error.code, DMatrixErrorCode::Io);
        unsafe { dmatrix_error_free(&mut error) };
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_save_binary_path_with_question_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run?1.buffer");
        let path_cstr = CString::new(path.to_str().unwrap()).unwrap();

        let handle = dense(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        set_float(handle, "label", &[0.0, 1.0]);
        let mut error = DMatrixError::ok();
        let ok = unsafe { dmatrix_save_binary(handle, path_cstr.as_ptr(), 1, &mut error) };
        assert_eq!(ok, 1);

        let loaded = unsafe { dmatrix_create_from_file(path_cstr.as_ptr(), 1, &mut error) };
        assert_eq!(error.code, DMatrixErrorCode::Ok);
        assert!(!loaded.is_null());
        assert_eq!(shape(loaded), (2, 2));
        assert_eq!(get_float(loaded, "label").unwrap(), vec![0.0, 1.0]);

        unsafe { dmatrix_free(loaded) };
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_corrupt_buffer_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.buffer");

        // Header claiming u64::MAX rows with no offsets, then seven unset info fields
        let mut bytes = b"DMXBIN01".to_vec();
        bytes.extend(u64::MAX.to_le_bytes());
        bytes.extend(2u64.to_le_bytes());
        for _ in 0..3 {
            bytes.extend(0u64.to_le_bytes());
        }
        bytes.extend([0u8; 7]);
        std::fs::write(&path, bytes).unwrap();

        let path_cstr = CString::new(path.to_str().unwrap()).unwrap();
        let mut error = DMatrixError::ok();
        let handle = unsafe { dmatrix_create_from_file(path_cstr.as_ptr(), 1, &mut error) };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Io);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_options_keys_checked_per_call() {
        let path = CString::new("/nonexistent/dir/train.txt").unwrap();
        let dense_only = CString::new(r#"{"missing": 0.0}"#).unwrap();
        let mut error = DMatrixError::ok();
        let handle = unsafe {
            dmatrix_create_from_file_with_options(path.as_ptr(), dense_only.as_ptr(), &mut error)
        };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::JsonParse);
        unsafe { dmatrix_error_free(&mut error) };

        let data = [1.0f64, 2.0];
        let file_only = CString::new(r#"{"format": "csv"}"#).unwrap();
        let handle = unsafe {
            dmatrix_create_from_dense_with_options(data.as_ptr(), 1, 2, file_only.as_ptr(), &mut error)
        };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::JsonParse);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_create_from_libsvm_file() {
        init_logging();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "1 0:1.5 3:2\n0 1:0.5\n").unwrap();
        let path_cstr = CString::new(path.to_str().unwrap()).unwrap();

        let mut error = DMatrixError::ok();
        let handle = unsafe { dmatrix_create_from_file(path_cstr.as_ptr(), 0, &mut error) };
        assert!(!handle.is_null());
        assert_eq!(shape(handle), (2, 4));
        assert_eq!(get_float(handle, "label").unwrap(), vec![1.0, 0.0]);
        unsafe { dmatrix_free(handle) };
    }

    #[cfg(feature = "csv")]
    #[test]
    fn test_create_from_csv_with_options() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        std::fs::write(&path, "1.5,2,0\n,4,1\n5,6,1\n").unwrap();
        let path_cstr = CString::new(path.to_str().unwrap()).unwrap();
        let options = CString::new(r#"{"format": "csv", "label_column": 2, "silent": true}"#).unwrap();

        let mut error = DMatrixError::ok();
        let handle = unsafe {
            dmatrix_create_from_file_with_options(path_cstr.as_ptr(), options.as_ptr(), &mut error)
        };
        assert!(!handle.is_null());
        assert_eq!(shape(handle), (3, 2));
        assert_eq!(unsafe { dmatrix_num_non_missing(handle, &mut error) }, 5);
        assert_eq!(get_float(handle, "label").unwrap(), vec![0.0, 1.0, 1.0]);
        unsafe { dmatrix_free(handle) };
    }

    #[test]
    fn test_missing_file() {
        let path = CString::new("/nonexistent/dir/train.txt").unwrap();
        let mut error = DMatrixError::ok();
        let handle = unsafe { dmatrix_create_from_file(path.as_ptr(), 1, &mut error) };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::Io);
        unsafe { dmatrix_error_free(&mut error) };
    }

    #[test]
    fn test_null_arguments() {
        let mut error = DMatrixError::ok();

        let rows = unsafe { dmatrix_num_row(std::ptr::null_mut(), &mut error) };
        assert_eq!(rows, 0);
        assert_eq!(error.code, DMatrixErrorCode::InvalidHandle);
        unsafe { dmatrix_error_free(&mut error) };

        let handle = unsafe { dmatrix_create_from_file(std::ptr::null(), 0, &mut error) };
        assert!(handle.is_null());
        assert_eq!(error.code, DMatrixErrorCode::NullPointer);
        let last = unsafe { CStr::from_ptr(dmatrix_last_error()) };
        assert_eq!(
            last.to_str().unwrap(),
            "null pointer passed for parameter: path"
        );
        unsafe { dmatrix_error_free(&mut error) };
        assert!(error.message.is_null());

        // A null error pointer is tolerated
        let handle =
            unsafe { dmatrix_create_from_mat(std::ptr::null(), 2, 2, 0.0, std::ptr::null_mut()) };
        assert!(handle.is_null());

        // Freeing NULL is a no-op
        unsafe { dmatrix_free(std::ptr::null_mut()) };
    }

    #[test]
    fn test_error_free() {
        let mut error = DMatrixError::ok();

        // error_free should handle null message gracefully
        unsafe { dmatrix_error_free(&mut error) };
        assert!(error.message.is_null());
        unsafe { dmatrix_error_free(std::ptr::null_mut()) };
    }

    proptest! {
        #[test]
        fn prop_dense_shape(nrow in 0usize..16, ncol in 1usize..8) {
            let data: Vec<f64> = (0..nrow * ncol).map(|i| i as f64).collect();
            let handle = dense(&data, nrow, ncol);
            prop_assert_eq!(shape(handle), (nrow as u64, ncol as u64));
            unsafe { dmatrix_free(handle) };
        }

        #[test]
        fn prop_label_round_trip(labels in prop::collection::vec(-1e6f32..1e6, 1..32)) {
            let data = vec![1.0f64; labels.len()];
            let handle = dense(&data, labels.len(), 1);
            prop_assert_eq!(set_float(handle, "label", &labels), DMatrixErrorCode::Ok);
            prop_assert_eq!(get_float(handle, "label").unwrap(), labels);
            unsafe { dmatrix_free(handle) };
        }

        #[test]
        fn prop_slice_row_count(
            (nrow, idx) in (1usize..20).prop_flat_map(|n| {
                (Just(n), prop::collection::vec(0..n as i32, 0..40))
            })
        ) {
            let data = vec![0.5f64; nrow * 2];
            let handle = dense(&data, nrow, 2);
            let mut error = DMatrixError::ok();
            let sliced = unsafe { dmatrix_slice(handle, idx.as_ptr(), idx.len(), &mut error) };
            prop_assert!(!sliced.is_null());
            prop_assert_eq!(shape(sliced).0, idx.len() as u64);
            unsafe { dmatrix_free(sliced) };
            unsafe { dmatrix_free(handle) };
        }
    }
}
