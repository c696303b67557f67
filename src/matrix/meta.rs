//! Per-row metadata ("info fields") attached to a matrix.

use super::error::{MatrixError, MatrixResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Float-valued info fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatField {
    Label,
    Weight,
    BaseMargin,
    LabelLowerBound,
    LabelUpperBound,
    FeatureWeights,
}

impl FloatField {
    pub const ALL: [FloatField; 6] = [
        FloatField::Label,
        FloatField::Weight,
        FloatField::BaseMargin,
        FloatField::LabelLowerBound,
        FloatField::LabelUpperBound,
        FloatField::FeatureWeights,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FloatField::Label => "label",
            FloatField::Weight => "weight",
            FloatField::BaseMargin => "base_margin",
            FloatField::LabelLowerBound => "label_lower_bound",
            FloatField::LabelUpperBound => "label_upper_bound",
            FloatField::FeatureWeights => "feature_weights",
        }
    }
}

impl FromStr for FloatField {
    type Err = MatrixError;

    fn from_str(s: &str) -> MatrixResult<Self> {
        FloatField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| MatrixError::argument(format!("unknown float info field `{s}`")))
    }
}

impl fmt::Display for FloatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unsigned-integer info fields.
///
/// `Group` is write-only and takes group sizes; `GroupPtr` is read-only and
/// yields the cumulative boundaries derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UIntField {
    Group,
    GroupPtr,
}

impl UIntField {
    pub fn name(self) -> &'static str {
        match self {
            UIntField::Group => "group",
            UIntField::GroupPtr => "group_ptr",
        }
    }
}

impl FromStr for UIntField {
    type Err = MatrixError;

    fn from_str(s: &str) -> MatrixResult<Self> {
        match s {
            "group" => Ok(UIntField::Group),
            "group_ptr" => Ok(UIntField::GroupPtr),
            _ => Err(MatrixError::argument(format!("unknown uint info field `{s}`"))),
        }
    }
}

impl fmt::Display for UIntField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata attached to a matrix. Unset fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaInfo {
    labels: Option<Vec<f32>>,
    weights: Option<Vec<f32>>,
    base_margin: Option<Vec<f32>>,
    label_lower_bound: Option<Vec<f32>>,
    label_upper_bound: Option<Vec<f32>>,
    feature_weights: Option<Vec<f32>>,
    group_ptr: Option<Vec<u32>>,
}

impl MetaInfo {
    fn slot(&self, field: FloatField) -> &Option<Vec<f32>> {
        match field {
            FloatField::Label => &self.labels,
            FloatField::Weight => &self.weights,
            FloatField::BaseMargin => &self.base_margin,
            FloatField::LabelLowerBound => &self.label_lower_bound,
            FloatField::LabelUpperBound => &self.label_upper_bound,
            FloatField::FeatureWeights => &self.feature_weights,
        }
    }

    fn slot_mut(&mut self, field: FloatField) -> &mut Option<Vec<f32>> {
        match field {
            FloatField::Label => &mut self.labels,
            FloatField::Weight => &mut self.weights,
            FloatField::BaseMargin => &mut self.base_margin,
            FloatField::LabelLowerBound => &mut self.label_lower_bound,
            FloatField::LabelUpperBound => &mut self.label_upper_bound,
            FloatField::FeatureWeights => &mut self.feature_weights,
        }
    }

    /// Replace a float field after checking its length against the matrix shape.
    pub fn set_float(
        &mut self,
        field: FloatField,
        values: &[f32],
        num_row: usize,
        num_col: usize,
    ) -> MatrixResult<()> {
        check_float(field, values, num_row, num_col)?;
        *self.slot_mut(field) = Some(values.to_vec());
        Ok(())
    }

    /// Check every set field against a `num_row` x `num_col` matrix.
    ///
    /// Used for metadata that did not go through the setters, such as a
    /// deserialized buffer.
    pub(crate) fn validate(&self, num_row: usize, num_col: usize) -> MatrixResult<()> {
        for field in FloatField::ALL {
            if let Some(values) = self.slot(field) {
                check_float(field, values, num_row, num_col)?;
            }
        }
        if let Some(ptr) = &self.group_ptr {
            let ok = ptr.first() == Some(&0)
                && ptr.windows(2).all(|w| w[0] <= w[1])
                && ptr.last().map(|&end| end as usize) == Some(num_row);
            if !ok {
                return Err(MatrixError::argument(format!(
                    "group_ptr must rise from 0 to the {num_row} rows"
                )));
            }
        }
        Ok(())
    }

    pub fn get_float(&self, field: FloatField) -> MatrixResult<&[f32]> {
        self.slot(field)
            .as_deref()
            .ok_or_else(|| MatrixError::not_found(field.name()))
    }

    pub fn set_uint(&mut self, field: UIntField, values: &[u32], num_row: usize) -> MatrixResult<()> {
        match field {
            UIntField::Group => self.set_group(values, num_row),
            UIntField::GroupPtr => Err(MatrixError::argument(
                "group_ptr is derived; set `group` sizes instead",
            )),
        }
    }

    pub fn get_uint(&self, field: UIntField) -> MatrixResult<&[u32]> {
        match field {
            UIntField::GroupPtr => self
                .group_ptr
                .as_deref()
                .ok_or_else(|| MatrixError::not_found(field.name())),
            UIntField::Group => Err(MatrixError::argument(
                "group is write-only; read `group_ptr` instead",
            )),
        }
    }

    /// Set query groups from their sizes. The sizes must cover every row exactly.
    pub fn set_group(&mut self, sizes: &[u32], num_row: usize) -> MatrixResult<()> {
        let total: u64 = sizes.iter().map(|&s| u64::from(s)).sum();
        if total != num_row as u64 {
            return Err(MatrixError::argument(format!(
                "group sizes sum to {total} but the matrix has {num_row} rows"
            )));
        }
        if total > u64::from(u32::MAX) {
            return Err(MatrixError::argument("query groups exceed u32 row range"));
        }
        let mut ptr = Vec::with_capacity(sizes.len() + 1);
        ptr.push(0u32);
        let mut acc = 0u32;
        for &size in sizes {
            acc += size;
            ptr.push(acc);
        }
        self.group_ptr = Some(ptr);
        Ok(())
    }

    pub fn has_groups(&self) -> bool {
        self.group_ptr.is_some()
    }

    /// Names of the fields currently set, in a stable order.
    pub fn set_fields(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = FloatField::ALL
            .into_iter()
            .filter(|f| self.slot(*f).is_some())
            .map(FloatField::name)
            .collect();
        if self.group_ptr.is_some() {
            names.push(UIntField::GroupPtr.name());
        }
        names
    }

    /// Metadata for a row subset taken in `rows` order.
    pub(crate) fn slice(&self, rows: &[usize], num_row: usize) -> MatrixResult<MetaInfo> {
        if self.has_groups() {
            return Err(MatrixError::argument(
                "cannot slice a matrix with query groups",
            ));
        }
        let pick = |v: &Option<Vec<f32>>| -> Option<Vec<f32>> {
            v.as_ref().map(|v| rows.iter().map(|&r| v[r]).collect())
        };
        let base_margin = match &self.base_margin {
            Some(margin) if num_row > 0 => {
                let width = margin.len() / num_row;
                log::debug!("slicing base_margin with {width} outputs per row");
                Some(
                    rows.iter()
                        .flat_map(|&r| margin[r * width..(r + 1) * width].iter().copied())
                        .collect(),
                )
            }
            other => other.clone(),
        };
        Ok(MetaInfo {
            labels: pick(&self.labels),
            weights: pick(&self.weights),
            base_margin,
            label_lower_bound: pick(&self.label_lower_bound),
            label_upper_bound: pick(&self.label_upper_bound),
            feature_weights: self.feature_weights.clone(),
            group_ptr: None,
        })
    }
}

fn check_float(field: FloatField, values: &[f32], num_row: usize, num_col: usize) -> MatrixResult<()> {
    match field {
        FloatField::BaseMargin => {
            let ok = if num_row == 0 {
                values.is_empty()
            } else {
                !values.is_empty() && values.len() % num_row == 0
            };
            if !ok {
                return Err(MatrixError::argument(format!(
                    "base_margin length {} is not a non-zero multiple of {num_row} rows",
                    values.len()
                )));
            }
        }
        FloatField::FeatureWeights => {
            check_len(field, values.len(), num_col, "columns")?;
            if values.iter().any(|w| !(*w >= 0.0)) {
                return Err(MatrixError::argument(
                    "feature_weights must be non-negative",
                ));
            }
        }
        FloatField::Label | FloatField::LabelLowerBound | FloatField::LabelUpperBound => {
            check_len(field, values.len(), num_row, "rows")?;
            if field == FloatField::Label && values.iter().any(|v| !v.is_finite()) {
                return Err(MatrixError::argument("label contains NaN or infinity"));
            }
        }
        FloatField::Weight => {
            check_len(field, values.len(), num_row, "rows")?;
            if values.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
                return Err(MatrixError::argument(
                    "weight must be finite and non-negative",
                ));
            }
        }
    }
    Ok(())
}

fn check_len(field: FloatField, actual: usize, expected: usize, unit: &str) -> MatrixResult<()> {
    if actual != expected {
        return Err(MatrixError::argument(format!(
            "{field} has {actual} values but the matrix has {expected} {unit}"
        )));
    }
    Ok(())
}
