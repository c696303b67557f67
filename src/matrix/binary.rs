//! Binary matrix buffers: an 8-byte magic followed by a bincode body.

use super::error::{MatrixError, MatrixResult};
use super::meta::MetaInfo;
use super::DMatrix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub(crate) const MAGIC: &[u8; 8] = b"DMXBIN01";

#[derive(Serialize)]
struct BodyRef<'a> {
    num_row: u64,
    num_col: u64,
    offset: &'a [u64],
    index: &'a [u32],
    value: &'a [f32],
    info: &'a MetaInfo,
}

#[derive(Deserialize)]
struct Body {
    num_row: u64,
    num_col: u64,
    offset: Vec<u64>,
    index: Vec<u32>,
    value: Vec<f32>,
    info: MetaInfo,
}

pub(crate) fn save(dmat: &DMatrix, path: &Path) -> MatrixResult<()> {
    let file = File::create(path).map_err(|e| MatrixError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(MAGIC)
        .map_err(|e| MatrixError::io(path, e))?;
    let body = BodyRef {
        num_row: dmat.num_row as u64,
        num_col: dmat.num_col as u64,
        offset: &dmat.offset,
        index: &dmat.index,
        value: &dmat.value,
        info: &dmat.info,
    };
    bincode::serialize_into(&mut writer, &body)?;
    writer.flush().map_err(|e| MatrixError::io(path, e))
}

pub(crate) fn load(path: &Path) -> MatrixResult<DMatrix> {
    let file = File::open(path).map_err(|e| MatrixError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut magic = [0u8; MAGIC.len()];
    reader
        .read_exact(&mut magic)
        .map_err(|e| MatrixError::io(path, e))?;
    if &magic != MAGIC {
        return Err(MatrixError::format(path, 0, "not a binary matrix buffer"));
    }
    let body: Body = bincode::deserialize_from(&mut reader)?;
    let num_row = shape_field(body.num_row, "num_row", path)?;
    let num_col = shape_field(body.num_col, "num_col", path)?;
    let mut dmat = DMatrix::from_csr_parts(num_row, num_col, body.offset, body.index, body.value)
        .map_err(|e| e.in_file(path, 0))?;
    body.info
        .validate(num_row, num_col)
        .map_err(|e| e.in_file(path, 0))?;
    *dmat.info_mut() = body.info;
    Ok(dmat)
}

fn shape_field(value: u64, name: &str, path: &Path) -> MatrixResult<usize> {
    usize::try_from(value)
        .map_err(|_| MatrixError::format(path, 0, format!("{name} {value} is out of range")))
}
