use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::engine::errors::PivotError;
use crate::engine::host::{MemRow, OutputRow, RowAccessor, SessionStore, VecRowStore};
use crate::engine::pivot::key_map::PivotKeyMap;
use crate::engine::pivot::parameters::PivotParameters;
use crate::engine::pivot::processor::RowPivotProcessor;
use crate::engine::types::ScalarValue;

/// Runs independent partitions in parallel, one processor per partition,
/// all reading the same frozen key map.
#[derive(Debug, Clone)]
pub struct PartitionedPivot {
    parameters: PivotParameters,
    key_map: Arc<PivotKeyMap>,
}

impl PartitionedPivot {
    pub fn new(parameters: PivotParameters, key_map: Arc<PivotKeyMap>) -> Self {
        Self {
            parameters,
            key_map,
        }
    }

    /// Restores the key map the way a remote worker receives it.
    pub fn from_session(
        parameters: PivotParameters,
        store: &dyn SessionStore,
    ) -> Result<Self, PivotError> {
        let key_map = PivotKeyMap::restore(store)?;
        Ok(Self::new(parameters, key_map))
    }

    pub fn key_map(&self) -> &Arc<PivotKeyMap> {
        &self.key_map
    }

    /// Output rows of every partition, in partition order. Rows inside a
    /// partition must be ordered by the group columns.
    pub fn run(&self, partitions: &[Vec<MemRow>]) -> Result<Vec<OutputRow>, PivotError> {
        info!(
            target: "pivot::partitioned",
            partitions = partitions.len(),
            "Running partitioned pivot"
        );
        let outputs = partitions
            .par_iter()
            .enumerate()
            .map(|(idx, rows)| self.run_partition(idx, rows))
            .collect::<Result<Vec<_>, PivotError>>()?;
        Ok(outputs.into_iter().flatten().collect())
    }

    fn run_partition(&self, idx: usize, rows: &[MemRow]) -> Result<Vec<OutputRow>, PivotError> {
        let mut processor = RowPivotProcessor::bind(&self.parameters, Arc::clone(&self.key_map))?;
        let mut out = VecRowStore::new();
        let mut current: Option<GroupKey> = None;

        for row in rows {
            let group = GroupKey::read(row, &self.parameters.group_columns)?;
            if current.as_ref().is_some_and(|c| *c != group) {
                processor.end_group(&mut out)?;
            }
            current = Some(group);
            processor.process(row)?;
        }
        processor.end_group(&mut out)?;

        debug!(
            target: "pivot::partitioned",
            partition = idx,
            input_rows = rows.len(),
            output_rows = out.len(),
            "Partition done"
        );
        Ok(out.into_rows())
    }
}

/// Group column values of one row. Floats compare by canonical bits, so a
/// NaN group stays one group and -0.0 joins 0.0.
#[derive(Debug, Clone)]
pub(crate) struct GroupKey(Vec<ScalarValue>);

impl GroupKey {
    pub(crate) fn read(row: &dyn RowAccessor, columns: &[usize]) -> Result<Self, PivotError> {
        let values = columns
            .iter()
            .map(|idx| row.value(*idx).cloned().map_err(PivotError::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(values))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| same_group_value(a, b))
    }
}

impl Eq for GroupKey {}

fn same_group_value(a: &ScalarValue, b: &ScalarValue) -> bool {
    match (a, b) {
        (ScalarValue::Float4(x), ScalarValue::Float4(y)) => {
            f64_bits(f64::from(*x)) == f64_bits(f64::from(*y))
        }
        (ScalarValue::Float8(x), ScalarValue::Float8(y)) => f64_bits(*x) == f64_bits(*y),
        _ => a == b,
    }
}

fn f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0u64
    } else {
        v.to_bits()
    }
}
