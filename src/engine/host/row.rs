use crate::engine::errors::HostError;
use crate::engine::types::{ScalarValue, TypeTag};

/// Read access to one input row. Typed getters fail with `TypeMismatch` when
/// the stored value is not of the requested type; callers check `is_null` first.
pub trait RowAccessor {
    fn column_count(&self) -> usize;

    fn value(&self, idx: usize) -> Result<&ScalarValue, HostError>;

    fn is_null(&self, idx: usize) -> Result<bool, HostError> {
        Ok(self.value(idx)?.is_null())
    }

    fn get_timestamp(&self, idx: usize) -> Result<i64, HostError> {
        match self.value(idx)? {
            ScalarValue::Timestamp(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::Timestamp, other)),
        }
    }

    fn get_bigint(&self, idx: usize) -> Result<i64, HostError> {
        match self.value(idx)? {
            ScalarValue::BigInt(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::BigInt, other)),
        }
    }

    /// Unscaled value and scale.
    fn get_numeric(&self, idx: usize) -> Result<(i128, u8), HostError> {
        match self.value(idx)? {
            ScalarValue::Numeric { unscaled, scale } => Ok((*unscaled, *scale)),
            other => Err(mismatch(idx, TypeTag::Numeric, other)),
        }
    }

    fn get_int(&self, idx: usize) -> Result<i32, HostError> {
        match self.value(idx)? {
            ScalarValue::Int(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::Int, other)),
        }
    }

    fn get_date(&self, idx: usize) -> Result<i32, HostError> {
        match self.value(idx)? {
            ScalarValue::Date(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::Date, other)),
        }
    }

    fn get_smallint(&self, idx: usize) -> Result<i16, HostError> {
        match self.value(idx)? {
            ScalarValue::SmallInt(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::SmallInt, other)),
        }
    }

    fn get_float4(&self, idx: usize) -> Result<f32, HostError> {
        match self.value(idx)? {
            ScalarValue::Float4(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::Float4, other)),
        }
    }

    fn get_float8(&self, idx: usize) -> Result<f64, HostError> {
        match self.value(idx)? {
            ScalarValue::Float8(v) => Ok(*v),
            other => Err(mismatch(idx, TypeTag::Float8, other)),
        }
    }

    fn get_string(&self, idx: usize) -> Result<&str, HostError> {
        let value = self.value(idx)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(idx, TypeTag::VarChar, value))
    }
}

fn mismatch(index: usize, expected: TypeTag, found: &ScalarValue) -> HostError {
    HostError::TypeMismatch {
        index,
        expected,
        found: found
            .type_tag()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "NULL".to_string()),
    }
}

/// Row backed by an owned vector of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemRow {
    values: Vec<ScalarValue>,
}

impl MemRow {
    pub fn new(values: Vec<ScalarValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }
}

impl From<Vec<ScalarValue>> for MemRow {
    fn from(values: Vec<ScalarValue>) -> Self {
        Self::new(values)
    }
}

impl RowAccessor for MemRow {
    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn value(&self, idx: usize) -> Result<&ScalarValue, HostError> {
        self.values.get(idx).ok_or(HostError::ColumnOutOfBounds {
            index: idx,
            width: self.values.len(),
        })
    }
}

/// Output row buffer with a fixed number of slots.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    slots: Vec<ScalarValue>,
}

impl OutputRow {
    pub fn with_width(width: usize) -> Self {
        Self {
            slots: vec![ScalarValue::Null; width],
        }
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn set_null(&mut self, idx: usize) -> Result<(), HostError> {
        self.set(idx, ScalarValue::Null)
    }

    pub fn set(&mut self, idx: usize, value: ScalarValue) -> Result<(), HostError> {
        let width = self.slots.len();
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or(HostError::ColumnOutOfBounds { index: idx, width })?;
        *slot = value;
        Ok(())
    }

    /// Copy input column `in_idx` into output slot `out_idx`.
    pub fn copy_from(
        &mut self,
        input: &dyn RowAccessor,
        in_idx: usize,
        out_idx: usize,
    ) -> Result<(), HostError> {
        let value = input.value(in_idx)?.clone();
        self.set(out_idx, value)
    }

    pub fn get(&self, idx: usize) -> Option<&ScalarValue> {
        self.slots.get(idx)
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.slots
    }

    pub fn into_values(self) -> Vec<ScalarValue> {
        self.slots
    }
}

/// Destination for finished output rows.
pub trait RowStore {
    fn alloc(&mut self, width: usize) -> OutputRow {
        OutputRow::with_width(width)
    }

    fn put(&mut self, row: OutputRow) -> Result<(), HostError>;
}

#[derive(Debug, Default)]
pub struct VecRowStore {
    rows: Vec<OutputRow>,
}

impl VecRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }
}

impl RowStore for VecRowStore {
    fn put(&mut self, row: OutputRow) -> Result<(), HostError> {
        self.rows.push(row);
        Ok(())
    }
}
