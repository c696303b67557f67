//! Input formats a matrix can be built from.

use super::error::{MatrixError, MatrixResult};
use super::{CsrBuilder, DMatrix, binary, is_missing, text};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Rows above which dense conversion is split across worker threads.
#[cfg(feature = "parallel")]
const PARALLEL_ROW_THRESHOLD: usize = 1 << 16;

/// Row-major dense buffer in either float width.
#[derive(Debug, Clone, Copy)]
pub enum DenseData<'a> {
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl DenseData<'_> {
    pub fn len(&self) -> usize {
        match self {
            DenseData::F32(d) => d.len(),
            DenseData::F64(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool8,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl FromStr for ColumnType {
    type Err = MatrixError;

    fn from_str(s: &str) -> MatrixResult<Self> {
        match s {
            "bool8" => Ok(ColumnType::Bool8),
            "int8" => Ok(ColumnType::Int8),
            "int16" => Ok(ColumnType::Int16),
            "int32" => Ok(ColumnType::Int32),
            "int64" => Ok(ColumnType::Int64),
            "float32" => Ok(ColumnType::Float32),
            "float64" => Ok(ColumnType::Float64),
            other => Err(MatrixError::argument(format!(
                "unsupported column type `{other}`"
            ))),
        }
    }
}

/// A typed table column. Integer NA sentinels are the type's minimum value.
#[derive(Debug, Clone, Copy)]
pub enum Column<'a> {
    Bool8(&'a [i8]),
    Int8(&'a [i8]),
    Int16(&'a [i16]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
}

impl Column<'_> {
    pub fn len(&self) -> usize {
        match self {
            Column::Bool8(c) | Column::Int8(c) => c.len(),
            Column::Int16(c) => c.len(),
            Column::Int32(c) => c.len(),
            Column::Int64(c) => c.len(),
            Column::Float32(c) => c.len(),
            Column::Float64(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell value, or `None` when it holds the column's NA marker.
    fn get(&self, row: usize) -> Option<f32> {
        match self {
            Column::Bool8(c) => match c[row] {
                i8::MIN => None,
                v => Some(if v != 0 { 1.0 } else { 0.0 }),
            },
            Column::Int8(c) => (c[row] != i8::MIN).then(|| f32::from(c[row])),
            Column::Int16(c) => (c[row] != i16::MIN).then(|| f32::from(c[row])),
            Column::Int32(c) => (c[row] != i32::MIN).then(|| c[row] as f32),
            Column::Int64(c) => (c[row] != i64::MIN).then(|| c[row] as f32),
            Column::Float32(c) => (!c[row].is_nan()).then_some(c[row]),
            Column::Float64(c) => (!c[row].is_nan()).then(|| c[row] as f32),
        }
    }
}

/// On-disk format of a matrix file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Binary if the file starts with the binary magic, LibSVM otherwise.
    #[default]
    Auto,
    LibSvm,
    Csv,
    Binary,
}

impl FromStr for FileFormat {
    type Err = MatrixError;

    fn from_str(s: &str) -> MatrixResult<Self> {
        match s {
            "auto" => Ok(FileFormat::Auto),
            "libsvm" => Ok(FileFormat::LibSvm),
            "csv" => Ok(FileFormat::Csv),
            "binary" => Ok(FileFormat::Binary),
            other => Err(MatrixError::argument(format!("unknown file format `{other}`"))),
        }
    }
}

/// Options for loading a matrix from a file.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Log load summaries at debug level instead of info.
    pub silent: bool,
    pub format: FileFormat,
    /// CSV column holding the label, if any.
    pub label_column: Option<usize>,
}

/// Everything a matrix can be created from.
#[derive(Debug, Clone)]
pub enum MatrixSource<'a> {
    /// File path, optionally with `?format=...&label_column=...` query.
    File { uri: String, options: LoadOptions },
    /// Row-major dense values.
    Dense {
        data: DenseData<'a>,
        num_row: usize,
        num_col: usize,
        missing: f32,
        /// Worker threads for large inputs; 0 uses every core.
        nthread: usize,
    },
    /// Compressed sparse rows. `num_col == 0` infers it from the indices.
    Csr {
        indptr: &'a [u64],
        indices: &'a [u32],
        data: &'a [f32],
        num_col: usize,
    },
    /// Compressed sparse columns. `num_row == 0` infers it from the indices.
    Csc {
        indptr: &'a [u64],
        indices: &'a [u32],
        data: &'a [f32],
        num_row: usize,
    },
    /// Column-oriented typed table.
    Table {
        columns: Vec<Column<'a>>,
        num_row: usize,
        num_col: usize,
    },
}

pub(crate) fn build(source: MatrixSource<'_>) -> MatrixResult<DMatrix> {
    match source {
        MatrixSource::File { uri, options } => load_file(&uri, &options),
        MatrixSource::Dense {
            data,
            num_row,
            num_col,
            missing,
            nthread,
        } => {
            check_dense_shape(data.len(), num_row, num_col)?;
            match data {
                DenseData::F32(d) => from_dense(d, num_row, num_col, missing, nthread, |v| v),
                DenseData::F64(d) => {
                    from_dense(d, num_row, num_col, missing, nthread, |v| v as f32)
                }
            }
        }
        MatrixSource::Csr {
            indptr,
            indices,
            data,
            num_col,
        } => from_csr(indptr, indices, data, num_col),
        MatrixSource::Csc {
            indptr,
            indices,
            data,
            num_row,
        } => from_csc(indptr, indices, data, num_row),
        MatrixSource::Table {
            columns,
            num_row,
            num_col,
        } => from_table(&columns, num_row, num_col),
    }
}

fn check_dense_shape(len: usize, num_row: usize, num_col: usize) -> MatrixResult<()> {
    match num_row.checked_mul(num_col) {
        Some(n) if n == len => Ok(()),
        _ => Err(MatrixError::argument(format!(
            "dense buffer has {len} elements, expected {num_row}x{num_col}"
        ))),
    }
}

/// Check the length relationships of a compressed sparse triple.
pub fn check_sparse_lengths(indptr: &[u64], indices: &[u32], data: &[f32]) -> MatrixResult<()> {
    if indices.len() != data.len() {
        return Err(MatrixError::argument(format!(
            "indices has {} elements but data has {}",
            indices.len(),
            data.len()
        )));
    }
    match indptr.last() {
        None => Err(MatrixError::argument("indptr must have at least one element")),
        Some(&last) if last != data.len() as u64 => Err(MatrixError::argument(format!(
            "indptr ends at {last} but data has {} elements",
            data.len()
        ))),
        Some(_) => Ok(()),
    }
}

fn check_indptr(indptr: &[u64]) -> MatrixResult<()> {
    if indptr[0] != 0 {
        return Err(MatrixError::library("indptr must start at 0"));
    }
    if indptr.windows(2).any(|w| w[0] > w[1]) {
        return Err(MatrixError::library("indptr must be non-decreasing"));
    }
    Ok(())
}

fn dense_row<T: Copy>(row: &[T], missing: f32, cast: fn(T) -> f32) -> Vec<(u32, f32)> {
    row.iter()
        .enumerate()
        .map(|(c, &v)| (c as u32, cast(v)))
        .filter(|&(_, v)| !is_missing(v, missing))
        .collect()
}

#[cfg(feature = "parallel")]
fn dense_rows<T: Copy + Sync>(
    data: &[T],
    num_row: usize,
    num_col: usize,
    missing: f32,
    nthread: usize,
    cast: fn(T) -> f32,
) -> MatrixResult<Vec<Vec<(u32, f32)>>> {
    use rayon::prelude::*;

    if num_row < PARALLEL_ROW_THRESHOLD {
        return Ok(data
            .chunks(num_col)
            .map(|row| dense_row(row, missing, cast))
            .collect());
    }
    log::debug!("converting {num_row} dense rows in parallel (nthread={nthread})");
    let convert = || -> Vec<Vec<(u32, f32)>> {
        data.par_chunks(num_col)
            .map(|row| dense_row(row, missing, cast))
            .collect()
    };
    if nthread == 0 {
        return Ok(convert());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthread)
        .build()
        .map_err(|e| MatrixError::library(format!("failed to start worker pool: {e}")))?;
    Ok(pool.install(convert))
}

#[cfg(not(feature = "parallel"))]
fn dense_rows<T: Copy>(
    data: &[T],
    _num_row: usize,
    num_col: usize,
    missing: f32,
    _nthread: usize,
    cast: fn(T) -> f32,
) -> MatrixResult<Vec<Vec<(u32, f32)>>> {
    Ok(data
        .chunks(num_col)
        .map(|row| dense_row(row, missing, cast))
        .collect())
}

fn from_dense<T: Copy + Sync>(
    data: &[T],
    num_row: usize,
    num_col: usize,
    missing: f32,
    nthread: usize,
    cast: fn(T) -> f32,
) -> MatrixResult<DMatrix> {
    let mut builder = CsrBuilder::with_capacity(num_row, data.len());
    if num_col == 0 {
        for _ in 0..num_row {
            builder.push_row(std::iter::empty());
        }
        return builder.finish(0);
    }
    for row in dense_rows(data, num_row, num_col, missing, nthread, cast)? {
        builder.push_row(row);
    }
    builder.finish(num_col)
}

fn from_csr(indptr: &[u64], indices: &[u32], data: &[f32], num_col: usize) -> MatrixResult<DMatrix> {
    check_sparse_lengths(indptr, indices, data)?;
    check_indptr(indptr)?;
    let num_row = indptr.len() - 1;
    let mut builder = CsrBuilder::with_capacity(num_row, data.len());
    for w in indptr.windows(2) {
        let (start, end) = (w[0] as usize, w[1] as usize);
        builder.push_row(
            indices[start..end]
                .iter()
                .copied()
                .zip(data[start..end].iter().copied())
                .filter(|&(_, v)| !v.is_nan()),
        );
    }
    let num_col = if num_col == 0 {
        builder.inferred_cols()
    } else {
        num_col
    };
    builder.finish(num_col)
}

fn from_csc(indptr: &[u64], indices: &[u32], data: &[f32], num_row: usize) -> MatrixResult<DMatrix> {
    check_sparse_lengths(indptr, indices, data)?;
    check_indptr(indptr)?;
    let num_col = indptr.len() - 1;
    let num_row = if num_row == 0 {
        indices.iter().max().map_or(0, |&m| m as usize + 1)
    } else {
        num_row
    };
    if let Some(&bad) = indices.iter().find(|&&r| r as usize >= num_row) {
        return Err(MatrixError::library(format!(
            "row index {bad} out of range for {num_row} rows"
        )));
    }

    let mut rows: Vec<Vec<(u32, f32)>> = vec![Vec::new(); num_row];
    for (col, w) in indptr.windows(2).enumerate() {
        let (start, end) = (w[0] as usize, w[1] as usize);
        for (&r, &v) in indices[start..end].iter().zip(&data[start..end]) {
            if !v.is_nan() {
                rows[r as usize].push((col as u32, v));
            }
        }
    }
    let mut builder = CsrBuilder::with_capacity(num_row, data.len());
    for row in rows {
        builder.push_row(row);
    }
    builder.finish(num_col)
}

fn from_table(columns: &[Column<'_>], num_row: usize, num_col: usize) -> MatrixResult<DMatrix> {
    if columns.len() != num_col {
        return Err(MatrixError::argument(format!(
            "table has {} columns, expected {num_col}",
            columns.len()
        )));
    }
    if let Some((c, col)) = columns.iter().enumerate().find(|(_, col)| col.len() != num_row) {
        return Err(MatrixError::argument(format!(
            "column {c} has {} rows, expected {num_row}",
            col.len()
        )));
    }
    let mut builder = CsrBuilder::with_capacity(num_row, num_row * num_col);
    for r in 0..num_row {
        builder.push_row(
            columns
                .iter()
                .enumerate()
                .filter_map(|(c, col)| col.get(r).map(|v| (c as u32, v))),
        );
    }
    builder.finish(num_col)
}

/// Split `path?format=csv&label_column=0` into the path and any overrides.
///
/// A file that exists under the full string is taken literally, so paths
/// containing `?` round-trip through save and load.
fn parse_uri(uri: &str, options: &LoadOptions) -> MatrixResult<(PathBuf, LoadOptions)> {
    let mut options = options.clone();
    if Path::new(uri).is_file() {
        return Ok((PathBuf::from(uri), options));
    }
    let Some((path, query)) = uri.rsplit_once('?') else {
        return Ok((PathBuf::from(uri), options));
    };
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "format" => options.format = value.parse()?,
            "label_column" => {
                let col = value.parse::<usize>().map_err(|_| {
                    MatrixError::argument(format!("invalid label_column `{value}`"))
                })?;
                options.label_column = Some(col);
            }
            other => {
                return Err(MatrixError::argument(format!(
                    "unknown URI parameter `{other}`"
                )));
            }
        }
    }
    Ok((PathBuf::from(path), options))
}

fn sniff_binary(path: &Path) -> MatrixResult<bool> {
    let mut file = File::open(path).map_err(|e| MatrixError::io(path, e))?;
    let mut head = [0u8; binary::MAGIC.len()];
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => return Err(MatrixError::io(path, e)),
        }
    }
    Ok(filled == head.len() && &head == binary::MAGIC)
}

pub(crate) fn load_file(uri: &str, options: &LoadOptions) -> MatrixResult<DMatrix> {
    let (path, options) = parse_uri(uri, options)?;
    let dmat = match options.format {
        FileFormat::Binary => binary::load(&path)?,
        FileFormat::Auto if sniff_binary(&path)? => binary::load(&path)?,
        FileFormat::Csv => {
            let mut dmat = text::load_csv(&path, options.label_column)?;
            text::load_companions(&mut dmat, &path)?;
            dmat
        }
        FileFormat::Auto | FileFormat::LibSvm => {
            let mut dmat = text::load_libsvm(&path)?;
            text::load_companions(&mut dmat, &path)?;
            dmat
        }
    };

    let msg = format!(
        "{}x{} matrix with {} entries loaded from {}",
        dmat.num_row(),
        dmat.num_col(),
        dmat.num_non_missing(),
        path.display()
    );
    if options.silent {
        log::debug!("{msg}");
    } else {
        log::info!("{msg}");
    }
    Ok(dmat)
}
