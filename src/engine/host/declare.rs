use crate::engine::errors::HostError;
use crate::engine::types::ColumnDesc;

/// Plan-time schema declaration surface. Only the Describe phase may call it.
pub trait SchemaDeclarer {
    fn add_partition_by_column(&mut self, idx: usize);

    fn add_order_by_column(&mut self, idx: usize);

    /// Clone input column `idx` as the next output column; returns its output index.
    fn copy_column_schema(&mut self, idx: usize) -> Result<usize, HostError>;

    /// Append a new output column; returns its output index.
    fn add_output_column(&mut self, column: ColumnDesc) -> usize;

    fn set_global_partitioning(&mut self, enabled: bool);

    /// Request Start/Shutdown session phases around execution.
    fn enable_session_commands(&mut self);
}

/// Declaration collected for one Describe call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanDeclaration {
    input_schema: Vec<ColumnDesc>,
    pub partition_by: Vec<usize>,
    pub order_by: Vec<usize>,
    pub output_columns: Vec<ColumnDesc>,
    pub global_partitioning: bool,
    pub session_commands: bool,
}

impl PlanDeclaration {
    pub fn new(input_schema: Vec<ColumnDesc>) -> Self {
        Self {
            input_schema,
            ..Self::default()
        }
    }

    pub fn output_names(&self) -> Vec<&str> {
        self.output_columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl SchemaDeclarer for PlanDeclaration {
    fn add_partition_by_column(&mut self, idx: usize) {
        self.partition_by.push(idx);
    }

    fn add_order_by_column(&mut self, idx: usize) {
        self.order_by.push(idx);
    }

    fn copy_column_schema(&mut self, idx: usize) -> Result<usize, HostError> {
        let column = self
            .input_schema
            .get(idx)
            .cloned()
            .ok_or(HostError::ColumnOutOfBounds {
                index: idx,
                width: self.input_schema.len(),
            })?;
        Ok(self.add_output_column(column))
    }

    fn add_output_column(&mut self, column: ColumnDesc) -> usize {
        self.output_columns.push(column);
        self.output_columns.len() - 1
    }

    fn set_global_partitioning(&mut self, enabled: bool) {
        self.global_partitioning = enabled;
    }

    fn enable_session_commands(&mut self) {
        self.session_commands = true;
    }
}
