use std::collections::HashMap;
use std::fmt;

use crate::engine::types::ScalarValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    ColumnRef,
    ColumnRefList,
    Constant,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::ColumnRef => "column reference",
            ParameterKind::ColumnRefList => "column reference list",
            ParameterKind::Constant => "constant",
        };
        f.write_str(name)
    }
}

/// A named parameter as bound by the host planner.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    ColumnRef(usize),
    ColumnRefList(Vec<usize>),
    Constant(ScalarValue),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::ColumnRef(_) => ParameterKind::ColumnRef,
            ParameterValue::ColumnRefList(_) => ParameterKind::ColumnRefList,
            ParameterValue::Constant(_) => ParameterKind::Constant,
        }
    }

    /// Input column indices referenced by this parameter, in declaration order.
    /// Constants reference no columns.
    pub fn column_indices(&self) -> Option<Vec<usize>> {
        match self {
            ParameterValue::ColumnRef(idx) => Some(vec![*idx]),
            ParameterValue::ColumnRefList(list) => Some(list.clone()),
            ParameterValue::Constant(_) => None,
        }
    }

    /// String payload of a character constant.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            ParameterValue::Constant(value) => value.as_str(),
            _ => None,
        }
    }
}

/// Named parameters of one function invocation. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParameters {
    values: HashMap<String, ParameterValue>,
}

impl NamedParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: ParameterValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: ParameterValue) {
        self.values.insert(name.to_ascii_lowercase(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
