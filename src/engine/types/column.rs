use serde::{Deserialize, Serialize};

use super::TypeTag;

/// Schema of one column as the host describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub type_tag: TypeTag,
    #[serde(default)]
    pub length: u32,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub precision: u32,
    #[serde(default)]
    pub scale: u32,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            length: 0,
            nullable: true,
            precision: 0,
            scale: 0,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    pub fn with_precision_scale(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Same type, length, nullability, precision and scale under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
