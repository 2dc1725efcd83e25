use crate::engine::errors::PivotError;
use crate::engine::host::{NamedParameters, ParameterKind, ParameterValue};
use crate::engine::pivot::key_encoder::ensure_supported;
use crate::engine::pivot::key_map::ColumnTypeMeta;
use crate::engine::types::ColumnDesc;

pub const PIVOT_COLUMN: &str = "pivot_column";
pub const GROUP_COLUMNS: &str = "group_columns";
pub const VALUE_COLUMNS: &str = "value_columns";
pub const CATALOG_QUERY: &str = "column_catalog_query";

/// Accepted spellings per parameter, canonical name first.
const PIVOT_COLUMN_NAMES: &[&str] = &[PIVOT_COLUMN, "pivotcol"];
const GROUP_COLUMNS_NAMES: &[&str] = &[GROUP_COLUMNS, "groupcol"];
const VALUE_COLUMNS_NAMES: &[&str] = &[VALUE_COLUMNS, "pivotval"];
const CATALOG_QUERY_NAMES: &[&str] = &[CATALOG_QUERY, "column_list"];

const COLUMN_KINDS: &[ParameterKind] = &[ParameterKind::ColumnRef, ParameterKind::ColumnRefList];

/// Validated named parameters of one `pivot` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotParameters {
    pub pivot_column: usize,
    pub group_columns: Vec<usize>,
    pub value_columns: Vec<usize>,
    pub catalog_query: String,
}

impl PivotParameters {
    /// Checks presence and parameter kind of every argument.
    pub fn from_named(params: &NamedParameters) -> Result<Self, PivotError> {
        let pivot = expect_kind(
            lookup(params, PIVOT_COLUMN_NAMES)?,
            PIVOT_COLUMN,
            COLUMN_KINDS,
        )?;
        let pivot_column = match pivot.column_indices().as_deref() {
            Some([idx]) => *idx,
            _ => {
                return Err(PivotError::parameter(format!(
                    "'{}' must be a single column reference",
                    PIVOT_COLUMN
                )));
            }
        };

        let group_columns = column_list(params, GROUP_COLUMNS_NAMES, GROUP_COLUMNS)?;
        let value_columns = column_list(params, VALUE_COLUMNS_NAMES, VALUE_COLUMNS)?;

        let query = expect_kind(
            lookup(params, CATALOG_QUERY_NAMES)?,
            CATALOG_QUERY,
            &[ParameterKind::Constant],
        )?;
        let catalog_query = match query.as_string() {
            Some(query) if !query.trim().is_empty() => query.trim().to_string(),
            _ => {
                return Err(PivotError::parameter(format!(
                    "'{}' must be a non-empty string",
                    CATALOG_QUERY
                )));
            }
        };

        Ok(Self {
            pivot_column,
            group_columns,
            value_columns,
            catalog_query,
        })
    }

    /// Checks every referenced column against the input schema.
    pub fn validate_against(&self, input_schema: &[ColumnDesc]) -> Result<(), PivotError> {
        let width = input_schema.len();
        let referenced = std::iter::once(self.pivot_column)
            .chain(self.group_columns.iter().copied())
            .chain(self.value_columns.iter().copied());
        for idx in referenced {
            if idx >= width {
                return Err(PivotError::parameter(format!(
                    "column reference {} is outside the input of {} columns",
                    idx, width
                )));
            }
        }
        ensure_supported(input_schema[self.pivot_column].type_tag)
    }

    pub fn value_column_count(&self) -> usize {
        self.value_columns.len()
    }

    pub fn value_column_descs<'a>(&self, input_schema: &'a [ColumnDesc]) -> Vec<&'a ColumnDesc> {
        self.value_columns
            .iter()
            .filter_map(|idx| input_schema.get(*idx))
            .collect()
    }

    pub fn value_column_metas(&self, input_schema: &[ColumnDesc]) -> Vec<ColumnTypeMeta> {
        self.value_column_descs(input_schema)
            .into_iter()
            .map(ColumnTypeMeta::from)
            .collect()
    }
}

fn lookup<'a>(
    params: &'a NamedParameters,
    names: &[&str],
) -> Result<&'a ParameterValue, PivotError> {
    names
        .iter()
        .find_map(|name| params.get(name))
        .ok_or_else(|| PivotError::parameter(format!("'{}' must be specified", names[0])))
}

fn expect_kind<'a>(
    value: &'a ParameterValue,
    canonical: &str,
    allowed: &[ParameterKind],
) -> Result<&'a ParameterValue, PivotError> {
    if allowed.contains(&value.kind()) {
        return Ok(value);
    }
    let expected: Vec<String> = allowed.iter().map(ToString::to_string).collect();
    Err(PivotError::parameter(format!(
        "'{}' must be a {}, got a {}",
        canonical,
        expected.join(" or "),
        value.kind()
    )))
}

fn column_list(
    params: &NamedParameters,
    names: &[&str],
    canonical: &str,
) -> Result<Vec<usize>, PivotError> {
    let value = expect_kind(lookup(params, names)?, canonical, COLUMN_KINDS)?;
    match value.column_indices() {
        Some(list) if !list.is_empty() => Ok(list),
        _ => Err(PivotError::parameter(format!(
            "'{}' must reference at least one column",
            canonical
        ))),
    }
}
