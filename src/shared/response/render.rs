use arrow_schema::ArrowError;
use thiserror::Error;

use crate::engine::host::OutputRow;
use crate::engine::types::ColumnDesc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingFormat {
    Json,
    Arrow,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow encoding failed: {0}")]
    Arrow(#[from] ArrowError),
}

/// Serializes pivot output for a given transport.
pub trait Renderer {
    fn streaming_format(&self) -> StreamingFormat;

    /// Encode the schema frame into `out`.
    fn stream_schema(&mut self, columns: &[ColumnDesc], out: &mut Vec<u8>)
    -> Result<(), RenderError>;

    /// Encode a batch of rows into `out`.
    fn stream_batch(&mut self, rows: &[OutputRow], out: &mut Vec<u8>) -> Result<(), RenderError>;

    /// Encode the terminal frame into `out`.
    fn stream_end(&mut self, row_count: usize, out: &mut Vec<u8>) -> Result<(), RenderError>;

    /// Schema, one batch and the terminal frame, concatenated.
    fn render(&mut self, columns: &[ColumnDesc], rows: &[OutputRow]) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        let mut frame = Vec::new();
        self.stream_schema(columns, &mut frame)?;
        buf.extend_from_slice(&frame);
        if !rows.is_empty() {
            self.stream_batch(rows, &mut frame)?;
            buf.extend_from_slice(&frame);
        }
        self.stream_end(rows.len(), &mut frame)?;
        buf.extend_from_slice(&frame);
        Ok(buf)
    }
}
