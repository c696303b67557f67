//! Text loaders: LibSVM, CSV and the `.weight` / `.group` companion files.

use super::error::{MatrixError, MatrixResult};
use super::meta::FloatField;
use super::{CsrBuilder, DMatrix};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

fn open(path: &Path) -> MatrixResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| MatrixError::io(path, e))
}

fn parse_f32(token: &str, path: &Path, line: usize) -> MatrixResult<f32> {
    token
        .parse::<f32>()
        .map_err(|_| MatrixError::format(path, line, format!("invalid number `{token}`")))
}

fn parse_label(token: &str, path: &Path, line: usize) -> MatrixResult<f32> {
    let label = parse_f32(token, path, line)?;
    if !label.is_finite() {
        return Err(MatrixError::format(path, line, format!("label `{token}` is not finite")));
    }
    Ok(label)
}

/// Parse `label [qid:q] index:value ...` lines.
///
/// Blank lines and `#` comments are skipped. Consecutive rows sharing a
/// `qid` form one query group; either every row carries a `qid` or none does.
pub(crate) fn load_libsvm(path: &Path) -> MatrixResult<DMatrix> {
    let reader = open(path)?;
    let mut builder = CsrBuilder::with_capacity(0, 0);
    let mut labels = Vec::new();
    let mut qids: Vec<Option<u64>> = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.map_err(|e| MatrixError::io(path, e))?;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let label = match tokens.next() {
            Some(t) => parse_label(t, path, lineno)?,
            None => continue,
        };

        let mut qid = None;
        let mut entries = Vec::new();
        for token in tokens {
            let (key, value) = token.split_once(':').ok_or_else(|| {
                MatrixError::format(path, lineno, format!("expected `index:value`, got `{token}`"))
            })?;
            if key == "qid" {
                qid = Some(value.parse::<u64>().map_err(|_| {
                    MatrixError::format(path, lineno, format!("invalid qid `{value}`"))
                })?);
                continue;
            }
            let index = key.parse::<u32>().map_err(|_| {
                MatrixError::format(path, lineno, format!("invalid feature index `{key}`"))
            })?;
            entries.push((index, parse_f32(value, path, lineno)?));
        }
        entries.sort_by_key(|&(index, _)| index);
        builder.push_row(entries.into_iter().filter(|(_, v)| !v.is_nan()));
        labels.push(label);
        qids.push(qid);
    }

    let num_col = builder.inferred_cols();
    let mut dmat = builder.finish(num_col).map_err(|e| e.in_file(path, 0))?;
    dmat.set_float_info(FloatField::Label, &labels)
        .map_err(|e| e.in_file(path, 0))?;

    if qids.iter().any(Option::is_some) {
        if qids.iter().any(Option::is_none) {
            return Err(MatrixError::format(
                path,
                0,
                "qid must be given on every row or on none",
            ));
        }
        let mut sizes: Vec<u32> = Vec::new();
        let mut prev = None;
        for qid in qids {
            if qid == prev {
                if let Some(last) = sizes.last_mut() {
                    *last += 1;
                }
            } else {
                sizes.push(1);
                prev = qid;
            }
        }
        dmat.set_group(&sizes).map_err(|e| e.in_file(path, 0))?;
    }
    Ok(dmat)
}

/// Parse a headerless CSV file. Empty cells are missing.
#[cfg(feature = "csv")]
pub(crate) fn load_csv(path: &Path, label_column: Option<usize>) -> MatrixResult<DMatrix> {
    use csv::{ReaderBuilder, Trim};

    let file = File::open(path).map_err(|e| MatrixError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(file);

    let mut builder = CsrBuilder::with_capacity(0, 0);
    let mut labels = Vec::new();
    let mut width = None;

    for record in reader.records() {
        let record = record?;
        let lineno = record.position().map_or(0, |p| p.line() as usize);
        width.get_or_insert(record.len());
        if label_column.is_some_and(|c| c >= record.len()) {
            return Err(MatrixError::format(
                path,
                lineno,
                format!("label column out of range for {} fields", record.len()),
            ));
        }

        let mut entries = Vec::with_capacity(record.len());
        let mut col = 0u32;
        for (i, field) in record.iter().enumerate() {
            if Some(i) == label_column {
                labels.push(parse_label(field, path, lineno)?);
                continue;
            }
            if !field.is_empty() {
                let value = parse_f32(field, path, lineno)?;
                if !value.is_nan() {
                    entries.push((col, value));
                }
            }
            col += 1;
        }
        builder.push_row(entries);
    }

    let width = width.unwrap_or(0);
    let num_col = width.saturating_sub(usize::from(label_column.is_some()));
    let mut dmat = builder.finish(num_col).map_err(|e| e.in_file(path, 0))?;
    if label_column.is_some() {
        dmat.set_float_info(FloatField::Label, &labels)
            .map_err(|e| e.in_file(path, 0))?;
    }
    Ok(dmat)
}

#[cfg(not(feature = "csv"))]
pub(crate) fn load_csv(_path: &Path, _label_column: Option<usize>) -> MatrixResult<DMatrix> {
    Err(MatrixError::argument(
        "CSV support is not compiled in (enable the `csv` feature)",
    ))
}

fn companion(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn read_column<T: std::str::FromStr>(path: &Path) -> MatrixResult<Vec<T>> {
    let reader = open(path)?;
    let mut values = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MatrixError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        values.push(line.parse::<T>().map_err(|_| {
            MatrixError::format(path, lineno + 1, format!("invalid value `{line}`"))
        })?);
    }
    Ok(values)
}

/// Attach `<path>.weight` and `<path>.group` when they exist next to a text file.
pub(crate) fn load_companions(dmat: &mut DMatrix, path: &Path) -> MatrixResult<()> {
    let weight_path = companion(path, "weight");
    if weight_path.is_file() {
        log::debug!("loading weights from {}", weight_path.display());
        let weights: Vec<f32> = read_column(&weight_path)?;
        dmat.set_float_info(FloatField::Weight, &weights)
            .map_err(|e| e.in_file(&weight_path, 0))?;
    }
    let group_path = companion(path, "group");
    if group_path.is_file() {
        log::debug!("loading query groups from {}", group_path.display());
        let sizes: Vec<u32> = read_column(&group_path)?;
        dmat.set_group(&sizes)
            .map_err(|e| e.in_file(&group_path, 0))?;
    }
    Ok(())
}
