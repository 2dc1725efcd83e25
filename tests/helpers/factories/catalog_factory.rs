use crate::engine::host::{CatalogResult, StaticCatalog};
use crate::engine::types::{ColumnDesc, ScalarValue, TypeTag};

use super::pivot_params_factory::STATUS_QUERY;

/// Catalog answering one query. Defaults to the status labels
/// `OPEN -> open_amt`, `CLOSED -> closed_amt`.
pub struct CatalogFactory {
    query: String,
    schema: Vec<ColumnDesc>,
    rows: Vec<Vec<ScalarValue>>,
}

impl CatalogFactory {
    pub fn new() -> Self {
        Self {
            query: STATUS_QUERY.to_string(),
            schema: vec![
                ColumnDesc::new("status", TypeTag::VarChar).with_length(16),
                ColumnDesc::new("label", TypeTag::VarChar).with_length(64),
            ],
            rows: vec![
                vec![ScalarValue::varchar("OPEN"), ScalarValue::varchar("open_amt")],
                vec![
                    ScalarValue::varchar("CLOSED"),
                    ScalarValue::varchar("closed_amt"),
                ],
            ],
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn with_schema(mut self, schema: Vec<ColumnDesc>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_rows(mut self, rows: Vec<Vec<ScalarValue>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_row(mut self, row: Vec<ScalarValue>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn create_result(self) -> CatalogResult {
        CatalogResult::new(self.schema, self.rows)
    }

    pub fn create(self) -> StaticCatalog {
        let query = self.query.clone();
        StaticCatalog::new().with_result(&query, self.create_result())
    }
}
