use std::collections::HashMap;

use crate::engine::host::{NamedParameters, ParameterValue};
use crate::engine::types::ScalarValue;

pub const STATUS_QUERY: &str = "select status, label from status_labels";

/// Named parameters for the sales layout: group by region (0), pivot on
/// status (1), value amount (2).
pub struct PivotParamsFactory {
    params: HashMap<String, ParameterValue>,
}

impl PivotParamsFactory {
    pub fn new() -> Self {
        let mut params = HashMap::new();
        params.insert("pivot_column".into(), ParameterValue::ColumnRef(1));
        params.insert(
            "group_columns".into(),
            ParameterValue::ColumnRefList(vec![0]),
        );
        params.insert("value_columns".into(), ParameterValue::ColumnRef(2));
        params.insert(
            "column_catalog_query".into(),
            ParameterValue::Constant(ScalarValue::varchar(STATUS_QUERY)),
        );
        Self { params }
    }

    pub fn with(mut self, name: &str, value: ParameterValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn with_query(self, query: &str) -> Self {
        self.with(
            "column_catalog_query",
            ParameterValue::Constant(ScalarValue::varchar(query)),
        )
    }

    pub fn without(mut self, name: &str) -> Self {
        self.params.remove(name);
        self
    }

    pub fn create(self) -> NamedParameters {
        let mut named = NamedParameters::new();
        for (name, value) in self.params {
            named.insert(&name, value);
        }
        named
    }
}
