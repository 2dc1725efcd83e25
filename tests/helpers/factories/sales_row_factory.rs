use std::collections::HashMap;

use crate::engine::host::MemRow;
use crate::engine::types::{ColumnDesc, ScalarValue, TypeTag};

const COLUMNS: [&str; 3] = ["region", "status", "amount"];

/// Input rows of the sales layout `(region, status, amount)`.
pub struct SalesRowFactory {
    values: HashMap<String, ScalarValue>,
}

impl SalesRowFactory {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        values.insert("region".into(), ScalarValue::varchar("east"));
        values.insert("status".into(), ScalarValue::varchar("OPEN"));
        values.insert("amount".into(), ScalarValue::BigInt(10));
        Self { values }
    }

    pub fn schema() -> Vec<ColumnDesc> {
        vec![
            ColumnDesc::new("region", TypeTag::VarChar).with_length(32),
            ColumnDesc::new("status", TypeTag::VarChar).with_length(16),
            ColumnDesc::new("amount", TypeTag::BigInt),
        ]
    }

    pub fn with(mut self, column: &str, value: ScalarValue) -> Self {
        self.values.insert(column.to_string(), value);
        self
    }

    pub fn create(self) -> MemRow {
        let values = COLUMNS
            .iter()
            .map(|c| self.values.get(*c).cloned().unwrap_or(ScalarValue::Null))
            .collect::<Vec<_>>();
        MemRow::new(values)
    }

    /// Convenience for `(region, status, amount)` triples.
    pub fn rows(rows: &[(&str, Option<&str>, i64)]) -> Vec<MemRow> {
        rows.iter()
            .map(|(region, status, amount)| {
                Self::new()
                    .with("region", ScalarValue::varchar(*region))
                    .with(
                        "status",
                        status.map(ScalarValue::varchar).unwrap_or(ScalarValue::Null),
                    )
                    .with("amount", ScalarValue::BigInt(*amount))
                    .create()
            })
            .collect()
    }
}
