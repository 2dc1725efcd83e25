use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::errors::HostError;
use crate::engine::host::row::MemRow;
use crate::engine::types::{ColumnDesc, ScalarValue};

/// Open result of a catalog query.
pub trait CatalogCursor {
    fn schema(&self) -> &[ColumnDesc];

    /// Next row, or `None` at end of results.
    fn fetch(&mut self) -> Result<Option<MemRow>, HostError>;

    fn close(&mut self) {}
}

/// The host's facility for running SQL text during planning and session start.
pub trait CatalogClient: Send + Sync {
    fn open(&self, query: &str) -> Result<Box<dyn CatalogCursor + '_>, HostError>;
}

/// Fixed result set registered for one query text.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogResult {
    pub schema: Vec<ColumnDesc>,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl CatalogResult {
    pub fn new(schema: Vec<ColumnDesc>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { schema, rows }
    }
}

/// In-memory catalog keyed by trimmed query text. Counts executions so callers
/// can observe how often a query was run.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    results: HashMap<String, CatalogResult>,
    executions: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, query: &str, result: CatalogResult) -> Self {
        self.register(query, result);
        self
    }

    pub fn register(&mut self, query: &str, result: CatalogResult) {
        self.results.insert(query.trim().to_string(), result);
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::Relaxed)
    }
}

impl CatalogClient for StaticCatalog {
    fn open(&self, query: &str) -> Result<Box<dyn CatalogCursor + '_>, HostError> {
        let result = self
            .results
            .get(query.trim())
            .ok_or_else(|| HostError::UnknownQuery(query.to_string()))?;
        self.executions.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(StaticCursor {
            result,
            position: 0,
            closed: false,
        }))
    }
}

struct StaticCursor<'a> {
    result: &'a CatalogResult,
    position: usize,
    closed: bool,
}

impl CatalogCursor for StaticCursor<'_> {
    fn schema(&self) -> &[ColumnDesc] {
        &self.result.schema
    }

    fn fetch(&mut self) -> Result<Option<MemRow>, HostError> {
        if self.closed {
            return Err(HostError::Catalog("fetch on closed cursor".into()));
        }
        let Some(row) = self.result.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(MemRow::new(row.clone())))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
