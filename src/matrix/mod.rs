//! In-process data matrix engine.
//!
//! A [`DMatrix`] stores feature values row-wise in compressed sparse row
//! form together with a [`MetaInfo`] block of per-row metadata. Missing
//! cells are simply not stored, so dense and sparse inputs share one layout.
//!
//! Construction always goes through a [`MatrixSource`], a tagged union over
//! the supported input formats:
//!
//! ```
//! use dmatrix::matrix::{DMatrix, DenseData, MatrixSource};
//!
//! let data = [1.0f32, 2.0, 3.0, 4.0];
//! let dmat = DMatrix::create(MatrixSource::Dense {
//!     data: DenseData::F32(&data),
//!     num_row: 2,
//!     num_col: 2,
//!     missing: f32::NAN,
//!     nthread: 0,
//! })
//! .unwrap();
//! assert_eq!((dmat.num_row(), dmat.num_col()), (2, 2));
//! ```

mod binary;
mod error;
mod meta;
mod source;
mod text;

pub use error::{MatrixError, MatrixResult};
pub use meta::{FloatField, MetaInfo, UIntField};
pub use source::{
    Column, ColumnType, DenseData, FileFormat, LoadOptions, MatrixSource, check_sparse_lengths,
};

use std::path::Path;

/// A data matrix with attached metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DMatrix {
    num_row: usize,
    num_col: usize,
    offset: Vec<u64>,
    index: Vec<u32>,
    value: Vec<f32>,
    info: MetaInfo,
}

impl DMatrix {
    /// Build a matrix from any supported source.
    pub fn create(source: MatrixSource<'_>) -> MatrixResult<Self> {
        source::build(source)
    }

    /// Load a matrix from a file path or URI (`path?format=csv&label_column=0`).
    pub fn load(uri: &str, options: &LoadOptions) -> MatrixResult<Self> {
        source::load_file(uri, options)
    }

    /// Assemble a matrix from raw CSR arrays, checking their structure.
    pub(crate) fn from_csr_parts(
        num_row: usize,
        num_col: usize,
        offset: Vec<u64>,
        index: Vec<u32>,
        value: Vec<f32>,
    ) -> MatrixResult<Self> {
        let Some(expected) = num_row.checked_add(1) else {
            return Err(MatrixError::library(format!("row count {num_row} is out of range")));
        };
        if offset.len() != expected {
            return Err(MatrixError::library(format!(
                "row offsets have {} entries, expected {expected}",
                offset.len()
            )));
        }
        if offset.first() != Some(&0) {
            return Err(MatrixError::library("row offsets must start at 0"));
        }
        if offset.windows(2).any(|w| w[0] > w[1]) {
            return Err(MatrixError::library("row offsets must be non-decreasing"));
        }
        if index.len() != value.len() || offset[num_row] != value.len() as u64 {
            return Err(MatrixError::library(format!(
                "row offsets end at {} but {} values were supplied",
                offset[num_row],
                value.len()
            )));
        }
        if let Some(&bad) = index.iter().find(|&&c| c as usize >= num_col) {
            return Err(MatrixError::library(format!(
                "column index {bad} out of range for {num_col} columns"
            )));
        }
        Ok(Self {
            num_row,
            num_col,
            offset,
            index,
            value,
            info: MetaInfo::default(),
        })
    }

    pub fn num_row(&self) -> usize {
        self.num_row
    }

    pub fn num_col(&self) -> usize {
        self.num_col
    }

    /// Number of stored (non-missing) cells.
    pub fn num_non_missing(&self) -> usize {
        self.value.len()
    }

    pub fn info(&self) -> &MetaInfo {
        &self.info
    }

    /// Column indices and values of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= num_row()`.
    pub fn row(&self, row: usize) -> (&[u32], &[f32]) {
        let start = self.offset[row] as usize;
        let end = self.offset[row + 1] as usize;
        (&self.index[start..end], &self.value[start..end])
    }

    pub fn set_float_info(&mut self, field: FloatField, values: &[f32]) -> MatrixResult<()> {
        self.info
            .set_float(field, values, self.num_row, self.num_col)
    }

    pub fn get_float_info(&self, field: FloatField) -> MatrixResult<&[f32]> {
        self.info.get_float(field)
    }

    pub fn set_uint_info(&mut self, field: UIntField, values: &[u32]) -> MatrixResult<()> {
        self.info.set_uint(field, values, self.num_row)
    }

    pub fn get_uint_info(&self, field: UIntField) -> MatrixResult<&[u32]> {
        self.info.get_uint(field)
    }

    pub fn set_group(&mut self, sizes: &[u32]) -> MatrixResult<()> {
        self.info.set_group(sizes, self.num_row)
    }

    /// New matrix holding the given rows in the given order.
    ///
    /// Indices may repeat. The column count and per-row metadata follow the
    /// selected rows.
    pub fn slice(&self, rows: &[usize]) -> MatrixResult<Self> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.num_row) {
            return Err(MatrixError::argument(format!(
                "row index {bad} out of range for {} rows",
                self.num_row
            )));
        }
        let info = self.info.slice(rows, self.num_row)?;
        let mut builder = CsrBuilder::with_capacity(rows.len(), 0);
        for &r in rows {
            let (index, value) = self.row(r);
            builder.push_row(index.iter().copied().zip(value.iter().copied()));
        }
        let mut sliced = builder.finish(self.num_col)?;
        sliced.info = info;
        Ok(sliced)
    }

    /// Write the matrix and all set info fields to `path` in binary form.
    pub fn save_binary(&self, path: &Path, silent: bool) -> MatrixResult<()> {
        binary::save(self, path)?;
        let msg = format!(
            "{}x{} matrix with {} entries saved to {}",
            self.num_row,
            self.num_col,
            self.num_non_missing(),
            path.display()
        );
        if silent {
            log::debug!("{msg}");
        } else {
            log::info!("{msg}");
        }
        Ok(())
    }

    pub(crate) fn info_mut(&mut self) -> &mut MetaInfo {
        &mut self.info
    }
}

/// Incremental row-by-row CSR assembly.
pub(crate) struct CsrBuilder {
    offset: Vec<u64>,
    index: Vec<u32>,
    value: Vec<f32>,
    max_col: Option<u32>,
}

impl CsrBuilder {
    pub(crate) fn with_capacity(rows: usize, nnz: usize) -> Self {
        let mut offset = Vec::with_capacity(rows + 1);
        offset.push(0);
        Self {
            offset,
            index: Vec::with_capacity(nnz),
            value: Vec::with_capacity(nnz),
            max_col: None,
        }
    }

    pub(crate) fn push_row(&mut self, entries: impl IntoIterator<Item = (u32, f32)>) {
        for (col, val) in entries {
            self.max_col = Some(self.max_col.map_or(col, |m| m.max(col)));
            self.index.push(col);
            self.value.push(val);
        }
        self.offset.push(self.index.len() as u64);
    }

    /// Columns implied by the largest index seen.
    pub(crate) fn inferred_cols(&self) -> usize {
        self.max_col.map_or(0, |m| m as usize + 1)
    }

    pub(crate) fn finish(self, num_col: usize) -> MatrixResult<DMatrix> {
        let num_row = self.offset.len() - 1;
        DMatrix::from_csr_parts(num_row, num_col, self.offset, self.index, self.value)
    }
}

/// Whether a cell counts as missing. NaN is always missing.
#[inline]
pub(crate) fn is_missing(value: f32, missing: f32) -> bool {
    value.is_nan() || value == missing
}
