//! Lifecycle management functions (create from every source, free).

use crate::error::DMatrixError;
use crate::handle::DMatrixHandle;
use crate::matrix::{
    Column, ColumnType, DMatrix, DenseData, LoadOptions, MatrixResult, MatrixSource,
    check_sparse_lengths,
};
use crate::util::{cstr_to_option_string, cstr_to_string, set_error_null, set_ok, slice_from_raw};
use libc::size_t;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::os::raw::{c_char, c_void};

/// JSON schema for file loading options.
///
/// Keys that only apply to in-memory input are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOptionsJson {
    /// Log load summaries at debug level only
    #[serde(default)]
    silent: Option<bool>,
    /// File format: auto, libsvm, csv, binary
    #[serde(default)]
    format: Option<String>,
    /// CSV column holding the label
    #[serde(default)]
    label_column: Option<usize>,
}

impl FileOptionsJson {
    fn load_options(&self) -> MatrixResult<LoadOptions> {
        Ok(LoadOptions {
            silent: self.silent.unwrap_or(false),
            format: match &self.format {
                Some(f) => f.parse()?,
                None => Default::default(),
            },
            label_column: self.label_column,
        })
    }
}

/// JSON schema for dense input options.
///
/// JSON has no NaN, so an absent or null `missing` means NaN.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DenseOptionsJson {
    /// Value treated as missing in dense input
    #[serde(default)]
    missing: Option<f32>,
    /// Worker threads for large dense input (0 = all cores)
    #[serde(default)]
    nthread: Option<usize>,
}

impl DenseOptionsJson {
    fn missing(&self) -> f32 {
        self.missing.unwrap_or(f32::NAN)
    }
}

unsafe fn parse_options<T: Default + DeserializeOwned>(ptr: *const c_char) -> Result<T, DMatrixError> {
    match unsafe { cstr_to_option_string(ptr, "options_json") }? {
        Some(json) => serde_json::from_str(&json).map_err(DMatrixError::json_parse),
        None => Ok(T::default()),
    }
}

/// Wrap an engine result into a new handle or an error.
///
/// # Safety
///
/// `error` must be a valid pointer or NULL.
pub(crate) unsafe fn handle_result(
    result: MatrixResult<DMatrix>,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    match result {
        Ok(dmat) => {
            unsafe { set_ok(error) };
            Box::into_raw(DMatrixHandle::new(dmat))
        }
        Err(e) => unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) },
    }
}

/// Load a matrix from a LibSVM, CSV or binary file.
///
/// # Parameters
///
/// - `path`: File path (UTF-8, null-terminated). May carry a query such as
///   `train.csv?format=csv&label_column=0`; a file existing under the full
///   string is always read as-is
/// - `silent`: Non-zero to keep the load summary out of info-level logs
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Handle on success, NULL on failure.
///
/// # Ownership
///
/// Caller owns the returned handle. Must call `dmatrix_free()` to free.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_file(
    path: *const c_char,
    silent: i32,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let uri = match unsafe { cstr_to_string(path, "path") } {
        Ok(p) => p,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let options = LoadOptions {
        silent: silent != 0,
        ..Default::default()
    };
    unsafe { handle_result(DMatrix::load(&uri, &options), error) }
}

/// Load a matrix from a file with options (JSON configuration).
///
/// # Options JSON Schema
///
/// ```json
/// {
///   "silent": true,
///   "format": "auto",
///   "label_column": 0
/// }
/// ```
///
/// `format` is one of `auto`, `libsvm`, `csv`, `binary`. Query parameters on
/// the path override the JSON options. Dense-only keys such as `missing`
/// fail with `DMatrixErrorCode::JsonParse`.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string or NULL
/// - `options_json` must be a valid UTF-8 string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_file_with_options(
    path: *const c_char,
    options_json: *const c_char,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let uri = match unsafe { cstr_to_string(path, "path") } {
        Ok(p) => p,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let options = match unsafe { parse_options::<FileOptionsJson>(options_json) } {
        Ok(o) => o,
        Err(e) => return unsafe { set_error_null(error, e) },
    };
    let result = options
        .load_options()
        .and_then(|opts| DMatrix::load(&uri, &opts));
    unsafe { handle_result(result, error) }
}

/// Create a matrix from a row-major `float` buffer.
///
/// # Parameters
///
/// - `data`: `nrow * ncol` values, row-major
/// - `nrow`, `ncol`: Matrix shape
/// - `missing`: Value treated as absent (NaN is always absent)
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Handle on success, NULL on failure.
///
/// # Safety
///
/// - `data` must point to `nrow * ncol` floats, or be NULL if that is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_mat(
    data: *const f32,
    nrow: size_t,
    ncol: size_t,
    missing: f32,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let Some(len) = nrow.checked_mul(ncol) else {
        return unsafe { set_error_null(error, DMatrixError::argument("nrow * ncol overflows")) };
    };
    let data = match unsafe { slice_from_raw(data, len, "data") } {
        Ok(d) => d,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let source = MatrixSource::Dense {
        data: DenseData::F32(data),
        num_row: nrow,
        num_col: ncol,
        missing,
        nthread: 0,
    };
    unsafe { handle_result(DMatrix::create(source), error) }
}

/// Create a matrix from a row-major `double` buffer.
///
/// Values are narrowed to `float` before the missing-value check.
///
/// # Safety
///
/// - `data` must point to `nrow * ncol` doubles, or be NULL if that is 0
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_dense(
    data: *const f64,
    nrow: size_t,
    ncol: size_t,
    missing: f32,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    unsafe { create_from_dense(data, nrow, ncol, missing, 0, error) }
}

/// Create a matrix from a row-major `double` buffer with options (JSON configuration).
///
/// # Options JSON Schema
///
/// ```json
/// {
///   "missing": -999.0,
///   "nthread": 4
/// }
/// ```
///
/// File-only keys such as `format` fail with `DMatrixErrorCode::JsonParse`.
///
/// # Safety
///
/// - `data` must point to `nrow * ncol` doubles, or be NULL if that is 0
/// - `options_json` must be a valid UTF-8 string or NULL
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_dense_with_options(
    data: *const f64,
    nrow: size_t,
    ncol: size_t,
    options_json: *const c_char,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let options = match unsafe { parse_options::<DenseOptionsJson>(options_json) } {
        Ok(o) => o,
        Err(e) => return unsafe { set_error_null(error, e) },
    };
    let nthread = options.nthread.unwrap_or(0);
    unsafe { create_from_dense(data, nrow, ncol, options.missing(), nthread, error) }
}

unsafe fn create_from_dense(
    data: *const f64,
    nrow: size_t,
    ncol: size_t,
    missing: f32,
    nthread: usize,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let Some(len) = nrow.checked_mul(ncol) else {
        return unsafe { set_error_null(error, DMatrixError::argument("nrow * ncol overflows")) };
    };
    let data = match unsafe { slice_from_raw(data, len, "data") } {
        Ok(d) => d,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let source = MatrixSource::Dense {
        data: DenseData::F64(data),
        num_row: nrow,
        num_col: ncol,
        missing,
        nthread,
    };
    unsafe { handle_result(DMatrix::create(source), error) }
}

struct SparseArgs<'a> {
    indptr: &'a [u64],
    indices: &'a [u32],
    data: &'a [f32],
}

unsafe fn sparse_args<'a>(
    indptr: *const u64,
    nindptr: size_t,
    indices: *const u32,
    nindices: size_t,
    data: *const f32,
    ndata: size_t,
) -> Result<SparseArgs<'a>, DMatrixError> {
    let args = SparseArgs {
        indptr: unsafe { slice_from_raw(indptr, nindptr, "indptr") }?,
        indices: unsafe { slice_from_raw(indices, nindices, "indices") }?,
        data: unsafe { slice_from_raw(data, ndata, "data") }?,
    };
    check_sparse_lengths(args.indptr, args.indices, args.data)
        .map_err(DMatrixError::from_matrix_error)?;
    Ok(args)
}

/// Create a matrix from compressed sparse rows.
///
/// # Parameters
///
/// - `indptr`, `nindptr`: Row pointers (`nrow + 1` entries, starting at 0)
/// - `indices`, `nindices`: Column index of each stored value
/// - `data`, `ndata`: Stored values (NaN entries are dropped)
/// - `ncol`: Column count, or 0 to infer it from `indices`
/// - `error`: Out-parameter for error information
///
/// # Returns
///
/// Handle on success, NULL on failure. Mismatched lengths fail with
/// `DMatrixErrorCode::Argument` before the engine is called.
///
/// # Safety
///
/// - each buffer must hold the stated number of elements, or be NULL if 0
/// - `error` must be a valid pointer or NULL
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_csr(
    indptr: *const u64,
    nindptr: size_t,
    indices: *const u32,
    nindices: size_t,
    data: *const f32,
    ndata: size_t,
    ncol: size_t,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let args = match unsafe { sparse_args(indptr, nindptr, indices, nindices, data, ndata) } {
        Ok(a) => a,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let source = MatrixSource::Csr {
        indptr: args.indptr,
        indices: args.indices,
        data: args.data,
        num_col: ncol,
    };
    unsafe { handle_result(DMatrix::create(source), error) }
}

/// Create a matrix from compressed sparse columns.
///
/// Same layout as `dmatrix_create_from_csr` with rows and columns swapped:
/// `indptr` has `ncol + 1` entries and `indices` holds row indices. Pass
/// `nrow = 0` to infer the row count.
///
/// # Safety
///
/// - each buffer must hold the stated number of elements, or be NULL if 0
/// - `error` must be a valid pointer or NULL
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_csc(
    indptr: *const u64,
    nindptr: size_t,
    indices: *const u32,
    nindices: size_t,
    data: *const f32,
    ndata: size_t,
    nrow: size_t,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let args = match unsafe { sparse_args(indptr, nindptr, indices, nindices, data, ndata) } {
        Ok(a) => a,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let source = MatrixSource::Csc {
        indptr: args.indptr,
        indices: args.indices,
        data: args.data,
        num_row: nrow,
    };
    unsafe { handle_result(DMatrix::create(source), error) }
}

unsafe fn table_column<'a>(
    ptr: *const c_void,
    stype: ColumnType,
    nrow: usize,
) -> Result<Column<'a>, DMatrixError> {
    let name = "column data";
    Ok(match stype {
        ColumnType::Bool8 => Column::Bool8(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?),
        ColumnType::Int8 => Column::Int8(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?),
        ColumnType::Int16 => Column::Int16(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?),
        ColumnType::Int32 => Column::Int32(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?),
        ColumnType::Int64 => Column::Int64(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?),
        ColumnType::Float32 => {
            Column::Float32(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?)
        }
        ColumnType::Float64 => {
            Column::Float64(unsafe { slice_from_raw(ptr.cast(), nrow, name) }?)
        }
    })
}

/// Create a matrix from a column-oriented typed table.
///
/// # Parameters
///
/// - `columns`: `ncol` pointers, each to `nrow` values of its column type
/// - `stypes`: `ncol` type names: `bool8`, `int8`, `int16`, `int32`,
///   `int64`, `float32`, `float64`
/// - `nrow`, `ncol`: Table shape
/// - `error`: Out-parameter for error information
///
/// NaN and the integer minimum of each type mark missing cells.
///
/// # Safety
///
/// - `columns` and `stypes` must each hold `ncol` valid pointers
/// - each column must hold `nrow` elements of the declared type
/// - `error` must be a valid pointer or NULL
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_create_from_dt(
    columns: *const *const c_void,
    stypes: *const *const c_char,
    nrow: size_t,
    ncol: size_t,
    error: *mut DMatrixError,
) -> *mut DMatrixHandle {
    let column_ptrs = match unsafe { slice_from_raw(columns, ncol, "columns") } {
        Ok(c) => c,
        Err(e) => return unsafe { set_error_null(error, e) },
    };
    let stype_ptrs = match unsafe { slice_from_raw(stypes, ncol, "stypes") } {
        Ok(s) => s,
        Err(e) => return unsafe { set_error_null(error, e) },
    };

    let mut table = Vec::with_capacity(ncol);
    for (&ptr, &stype) in column_ptrs.iter().zip(stype_ptrs) {
        let stype = match unsafe { cstr_to_string(stype, "stypes") } {
            Ok(s) => s,
            Err(e) => return unsafe { set_error_null(error, e) },
        };
        let stype = match stype.parse::<ColumnType>() {
            Ok(t) => t,
            Err(e) => {
                return unsafe { set_error_null(error, DMatrixError::from_matrix_error(e)) };
            }
        };
        match unsafe { table_column(ptr, stype, nrow) } {
            Ok(column) => table.push(column),
            Err(e) => return unsafe { set_error_null(error, e) },
        }
    }

    let source = MatrixSource::Table {
        columns: table,
        num_row: nrow,
        num_col: ncol,
    };
    unsafe { handle_result(DMatrix::create(source), error) }
}

/// Free a matrix handle.
///
/// After this call, the handle is invalid and must not be used. Freeing the
/// same handle twice is undefined behavior.
///
/// # Parameters
///
/// - `handle`: Handle to free (safe to pass NULL)
///
/// # Safety
///
/// - `handle` must be a valid handle returned by a create or slice function,
///   or NULL
/// - The handle must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dmatrix_free(handle: *mut DMatrixHandle) {
    if handle.is_null() {
        return;
    }

    // Take ownership and drop
    unsafe {
        drop(Box::from_raw(handle));
    }
}
