use std::sync::Arc;

use arrow_array::builder::{
    BinaryBuilder, BooleanBuilder, Date32Builder, Decimal128Builder, DurationMicrosecondBuilder,
    Float32Builder, Float64Builder, Int16Builder, Int32Builder, Int64Builder, StringBuilder,
    Time64MicrosecondBuilder, TimestampMicrosecondBuilder,
};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_ipc::writer::{DictionaryTracker, IpcDataGenerator, IpcWriteOptions};
use arrow_schema::{ArrowError, DataType, Field, Schema, TimeUnit};

use crate::engine::host::OutputRow;
use crate::engine::types::{ColumnDesc, ScalarValue, TypeTag};
use crate::shared::response::render::{RenderError, Renderer, StreamingFormat};

type ArrowResult<T> = Result<T, ArrowError>;

const CONTINUATION_MARKER: u32 = 0xFFFF_FFFF;
const MAX_DECIMAL128_PRECISION: u8 = 38;

/// Arrow IPC stream: schema message, record batch messages, end-of-stream
/// marker.
pub struct ArrowRenderer {
    columns: Vec<ColumnDesc>,
    schema: Option<Arc<Schema>>,
    data_gen: IpcDataGenerator,
    dictionary_tracker: DictionaryTracker,
    write_options: IpcWriteOptions,
}

impl Default for ArrowRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrowRenderer {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            schema: None,
            data_gen: IpcDataGenerator::default(),
            dictionary_tracker: DictionaryTracker::new(true),
            write_options: IpcWriteOptions::default(),
        }
    }
}

impl Renderer for ArrowRenderer {
    fn streaming_format(&self) -> StreamingFormat {
        StreamingFormat::Arrow
    }

    fn stream_schema(
        &mut self,
        columns: &[ColumnDesc],
        out: &mut Vec<u8>,
    ) -> Result<(), RenderError> {
        out.clear();
        let schema = build_arrow_schema(columns);
        let encoded = self.data_gen.schema_to_bytes_with_dictionary_tracker(
            &schema,
            &mut self.dictionary_tracker,
            &self.write_options,
        );
        arrow_ipc::writer::write_message(&mut *out, encoded, &self.write_options)?;
        self.columns = columns.to_vec();
        self.schema = Some(schema);
        Ok(())
    }

    fn stream_batch(&mut self, rows: &[OutputRow], out: &mut Vec<u8>) -> Result<(), RenderError> {
        out.clear();
        let schema = self.schema.clone().ok_or_else(|| {
            ArrowError::InvalidArgumentError("record batch written before schema".into())
        })?;
        let batch = build_record_batch(schema, &self.columns, rows)?;
        let (dict_batches, record_data) = self.data_gen.encoded_batch(
            &batch,
            &mut self.dictionary_tracker,
            &self.write_options,
        )?;
        for encoded in dict_batches {
            arrow_ipc::writer::write_message(&mut *out, encoded, &self.write_options)?;
        }
        arrow_ipc::writer::write_message(&mut *out, record_data, &self.write_options)?;
        Ok(())
    }

    fn stream_end(&mut self, _row_count: usize, out: &mut Vec<u8>) -> Result<(), RenderError> {
        out.clear();
        out.extend_from_slice(&CONTINUATION_MARKER.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        Ok(())
    }
}

pub fn build_arrow_schema(columns: &[ColumnDesc]) -> Arc<Schema> {
    let fields = columns
        .iter()
        .map(|c| Field::new(&c.name, arrow_type(c), c.nullable))
        .collect::<Vec<_>>();
    Arc::new(Schema::new(fields))
}

fn arrow_type(column: &ColumnDesc) -> DataType {
    match column.type_tag {
        TypeTag::Boolean => DataType::Boolean,
        TypeTag::SmallInt => DataType::Int16,
        TypeTag::Int => DataType::Int32,
        TypeTag::BigInt => DataType::Int64,
        TypeTag::Float4 => DataType::Float32,
        TypeTag::Float8 => DataType::Float64,
        TypeTag::Numeric => {
            let (precision, scale) = decimal_shape(column);
            DataType::Decimal128(precision, scale)
        }
        TypeTag::Date => DataType::Date32,
        TypeTag::Time => DataType::Time64(TimeUnit::Microsecond),
        TypeTag::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        TypeTag::Interval => DataType::Duration(TimeUnit::Microsecond),
        TypeTag::VarChar | TypeTag::BpChar => DataType::Utf8,
        TypeTag::VarBinary => DataType::Binary,
    }
}

// Precision 0 means "unspecified" and maps to the widest decimal.
fn decimal_shape(column: &ColumnDesc) -> (u8, i8) {
    let precision = match u8::try_from(column.precision) {
        Ok(p) if (1..=MAX_DECIMAL128_PRECISION).contains(&p) => p,
        _ => MAX_DECIMAL128_PRECISION,
    };
    let scale = column.scale.min(u32::from(precision)) as i8;
    (precision, scale)
}

macro_rules! fill_column {
    ($builder:expr, $rows:expr, $idx:expr, $tag:expr, $pat:pat => $val:expr) => {{
        let mut builder = $builder;
        for row in $rows {
            match row.get($idx) {
                None | Some(ScalarValue::Null) => builder.append_null(),
                Some($pat) => builder.append_value($val),
                Some(other) => return Err(mismatch($idx, $tag, other)),
            }
        }
        Arc::new(builder.finish()) as ArrayRef
    }};
}

fn build_record_batch(
    schema: Arc<Schema>,
    columns: &[ColumnDesc],
    rows: &[OutputRow],
) -> ArrowResult<RecordBatch> {
    let n = rows.len();
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        let tag = column.type_tag;
        let array = match tag {
            TypeTag::Boolean => {
                fill_column!(BooleanBuilder::with_capacity(n), rows, idx, tag, ScalarValue::Boolean(v) => *v)
            }
            TypeTag::SmallInt => {
                fill_column!(Int16Builder::with_capacity(n), rows, idx, tag, ScalarValue::SmallInt(v) => *v)
            }
            TypeTag::Int => {
                fill_column!(Int32Builder::with_capacity(n), rows, idx, tag, ScalarValue::Int(v) => *v)
            }
            TypeTag::BigInt => {
                fill_column!(Int64Builder::with_capacity(n), rows, idx, tag, ScalarValue::BigInt(v) => *v)
            }
            TypeTag::Float4 => {
                fill_column!(Float32Builder::with_capacity(n), rows, idx, tag, ScalarValue::Float4(v) => *v)
            }
            TypeTag::Float8 => {
                fill_column!(Float64Builder::with_capacity(n), rows, idx, tag, ScalarValue::Float8(v) => *v)
            }
            TypeTag::Numeric => {
                let (precision, scale) = decimal_shape(column);
                let builder = Decimal128Builder::with_capacity(n)
                    .with_precision_and_scale(precision, scale)?;
                fill_column!(builder, rows, idx, tag, ScalarValue::Numeric { unscaled, .. } => *unscaled)
            }
            TypeTag::Date => {
                fill_column!(Date32Builder::with_capacity(n), rows, idx, tag, ScalarValue::Date(v) => *v)
            }
            TypeTag::Time => {
                fill_column!(Time64MicrosecondBuilder::with_capacity(n), rows, idx, tag, ScalarValue::Time(v) => *v)
            }
            TypeTag::Timestamp => {
                fill_column!(TimestampMicrosecondBuilder::with_capacity(n), rows, idx, tag, ScalarValue::Timestamp(v) => *v)
            }
            TypeTag::Interval => {
                fill_column!(DurationMicrosecondBuilder::with_capacity(n), rows, idx, tag, ScalarValue::Interval(v) => *v)
            }
            TypeTag::VarChar | TypeTag::BpChar => {
                fill_column!(StringBuilder::with_capacity(n, n * 16), rows, idx, tag, ScalarValue::VarChar(s) | ScalarValue::BpChar(s) => s.as_str())
            }
            TypeTag::VarBinary => {
                fill_column!(BinaryBuilder::with_capacity(n, n * 16), rows, idx, tag, ScalarValue::VarBinary(b) => b.as_slice())
            }
        };
        arrays.push(array);
    }
    RecordBatch::try_new(schema, arrays)
}

fn mismatch(idx: usize, expected: TypeTag, found: &ScalarValue) -> ArrowError {
    ArrowError::InvalidArgumentError(format!(
        "column {} declared {} but row holds {:?}",
        idx, expected, found
    ))
}
