use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::engine::host::{CatalogResult, MemRow, NamedParameters, ParameterValue, StaticCatalog};
use crate::engine::types::{ColumnDesc, ScalarValue};

#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("Failed to read session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parameter '{name}': {detail}")]
    Parameter { name: String, detail: String },

    #[error("{section} row {row}: {detail}")]
    Value {
        section: String,
        row: usize,
        detail: String,
    },
}

/// One pivot invocation as the harness reads it from disk.
///
/// ```json
/// {
///   "input_schema": [{"name": "region", "type_tag": "VarChar"}, ...],
///   "parameters": {"pivot_column": {"column": 1}, "group_columns": {"columns": [0]}, ...},
///   "catalog": {"select ...": {"schema": [...], "rows": [["OPEN", "open_amt"]]}},
///   "partitions": [[["east", "OPEN", 10]]]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SessionFile {
    pub input_schema: Vec<ColumnDesc>,
    pub parameters: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    pub catalog: BTreeMap<String, CatalogSpec>,
    #[serde(default)]
    pub partitions: Vec<Vec<Vec<JsonValue>>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSpec {
    Column(usize),
    Columns(Vec<usize>),
    Constant(JsonValue),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSpec {
    pub schema: Vec<ColumnDesc>,
    #[serde(default)]
    pub rows: Vec<Vec<JsonValue>>,
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self, SessionFileError> {
        let text = fs::read_to_string(path)?;
        let file = Self::from_json(&text)?;
        debug!(
            target: "pivot::session_file",
            path = %path.display(),
            partitions = file.partitions.len(),
            catalog_queries = file.catalog.len(),
            "Loaded session file"
        );
        Ok(file)
    }

    pub fn from_json(text: &str) -> Result<Self, SessionFileError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn named_parameters(&self) -> Result<NamedParameters, SessionFileError> {
        let mut params = NamedParameters::new();
        for (name, spec) in &self.parameters {
            let value = match spec {
                ParameterSpec::Column(idx) => ParameterValue::ColumnRef(*idx),
                ParameterSpec::Columns(list) => ParameterValue::ColumnRefList(list.clone()),
                ParameterSpec::Constant(value) => {
                    ParameterValue::Constant(constant_value(value).ok_or_else(|| {
                        SessionFileError::Parameter {
                            name: name.clone(),
                            detail: format!("unsupported constant {}", value),
                        }
                    })?)
                }
            };
            params.insert(name, value);
        }
        Ok(params)
    }

    pub fn catalog(&self) -> Result<StaticCatalog, SessionFileError> {
        let mut catalog = StaticCatalog::new();
        for (query, spec) in &self.catalog {
            let rows = spec
                .rows
                .iter()
                .enumerate()
                .map(|(idx, row)| convert_row(row, &spec.schema, query, idx))
                .collect::<Result<Vec<_>, _>>()?;
            catalog.register(query, CatalogResult::new(spec.schema.clone(), rows));
        }
        Ok(catalog)
    }

    pub fn partitions(&self) -> Result<Vec<Vec<MemRow>>, SessionFileError> {
        self.partitions
            .iter()
            .enumerate()
            .map(|(p, rows)| {
                let section = format!("partition {}", p);
                rows.iter()
                    .enumerate()
                    .map(|(idx, row)| {
                        convert_row(row, &self.input_schema, &section, idx).map(MemRow::new)
                    })
                    .collect()
            })
            .collect()
    }
}

fn constant_value(value: &JsonValue) -> Option<ScalarValue> {
    match value {
        JsonValue::Null => Some(ScalarValue::Null),
        JsonValue::Bool(b) => Some(ScalarValue::Boolean(*b)),
        JsonValue::String(s) => Some(ScalarValue::varchar(s.as_str())),
        JsonValue::Number(n) => n
            .as_i64()
            .map(ScalarValue::BigInt)
            .or_else(|| n.as_f64().map(ScalarValue::Float8)),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

fn convert_row(
    values: &[JsonValue],
    schema: &[ColumnDesc],
    section: &str,
    row: usize,
) -> Result<Vec<ScalarValue>, SessionFileError> {
    let fail = |detail: String| SessionFileError::Value {
        section: section.to_string(),
        row,
        detail,
    };
    if values.len() != schema.len() {
        return Err(fail(format!(
            "expected {} values, found {}",
            schema.len(),
            values.len()
        )));
    }
    values
        .iter()
        .zip(schema)
        .map(|(value, column)| {
            ScalarValue::from_json(value, column).ok_or_else(|| {
                fail(format!(
                    "{} is not a valid {} for column '{}'",
                    value, column.type_tag, column.name
                ))
            })
        })
        .collect()
}
