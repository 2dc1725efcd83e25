use serde::Serialize;
use serde::ser::SerializeSeq;

use crate::engine::host::OutputRow;
use crate::engine::types::ColumnDesc;
use crate::shared::response::render::{RenderError, Renderer, StreamingFormat};

/// Newline-delimited JSON frames: one `schema`, one `row` per output row,
/// then `end`.
#[derive(Debug, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct SchemaFrame<'a> {
    #[serde(rename = "type")]
    frame_type: &'static str,
    columns: Vec<ColumnRef<'a>>,
}

#[derive(Serialize)]
struct ColumnRef<'a> {
    name: &'a str,
    logical_type: &'static str,
    nullable: bool,
}

#[derive(Serialize)]
struct RowFrame<'a> {
    #[serde(rename = "type")]
    frame_type: &'static str,
    values: RowValues<'a>,
}

// Serializes cells in column order without building an intermediate Vec.
struct RowValues<'a> {
    row: &'a OutputRow,
}

impl Serialize for RowValues<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let values = self.row.values();
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_json())?;
        }
        seq.end()
    }
}

#[derive(Serialize)]
struct EndFrame {
    #[serde(rename = "type")]
    frame_type: &'static str,
    row_count: usize,
}

impl Renderer for JsonRenderer {
    fn streaming_format(&self) -> StreamingFormat {
        StreamingFormat::Json
    }

    fn stream_schema(
        &mut self,
        columns: &[ColumnDesc],
        out: &mut Vec<u8>,
    ) -> Result<(), RenderError> {
        out.clear();
        let frame = SchemaFrame {
            frame_type: "schema",
            columns: columns
                .iter()
                .map(|c| ColumnRef {
                    name: c.name.as_str(),
                    logical_type: c.type_tag.as_str(),
                    nullable: c.nullable,
                })
                .collect(),
        };
        serde_json::to_writer(&mut *out, &frame)?;
        out.push(b'\n');
        Ok(())
    }

    fn stream_batch(&mut self, rows: &[OutputRow], out: &mut Vec<u8>) -> Result<(), RenderError> {
        out.clear();
        for row in rows {
            let frame = RowFrame {
                frame_type: "row",
                values: RowValues { row },
            };
            serde_json::to_writer(&mut *out, &frame)?;
            out.push(b'\n');
        }
        Ok(())
    }

    fn stream_end(&mut self, row_count: usize, out: &mut Vec<u8>) -> Result<(), RenderError> {
        out.clear();
        let frame = EndFrame {
            frame_type: "end",
            row_count,
        };
        serde_json::to_writer(&mut *out, &frame)?;
        out.push(b'\n');
        Ok(())
    }
}
