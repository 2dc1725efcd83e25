use std::sync::Arc;

use tracing::debug;

use crate::engine::errors::PivotError;
use crate::engine::host::{OutputRow, RowAccessor, RowStore};
use crate::engine::pivot::key_encoder::encode_key;
use crate::engine::pivot::key_map::PivotKeyMap;
use crate::engine::pivot::parameters::PivotParameters;

#[derive(Debug)]
enum GroupState {
    AwaitingFirstRow,
    Accumulating(OutputRow),
    Flushed,
}

/// Folds the rows of one group into a single wide output row.
///
/// Rows arrive partitioned and ordered by the group columns; the caller
/// marks each group boundary with `end_group`.
#[derive(Debug)]
pub struct RowPivotProcessor {
    pivot_column: usize,
    group_columns: Vec<usize>,
    value_columns: Vec<usize>,
    key_map: Arc<PivotKeyMap>,
    width: usize,
    state: GroupState,
    emitted: usize,
}

impl RowPivotProcessor {
    pub fn bind(parameters: &PivotParameters, key_map: Arc<PivotKeyMap>) -> Result<Self, PivotError> {
        let value_count = parameters.value_column_count();
        if key_map.value_columns().len() != value_count {
            return Err(PivotError::SessionState(format!(
                "session key map carries {} value columns, invocation has {}",
                key_map.value_columns().len(),
                value_count
            )));
        }
        let width = key_map
            .block_count()
            .checked_mul(value_count)
            .and_then(|n| n.checked_add(parameters.group_columns.len()))
            .ok_or_else(|| PivotError::schema("pivot output row width overflows"))?;

        Ok(Self {
            pivot_column: parameters.pivot_column,
            group_columns: parameters.group_columns.clone(),
            value_columns: parameters.value_columns.clone(),
            key_map,
            width,
            state: GroupState::AwaitingFirstRow,
            emitted: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn key_map(&self) -> &Arc<PivotKeyMap> {
        &self.key_map
    }

    /// Rows emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, GroupState::Accumulating(_))
    }

    pub fn pending_row(&self) -> Option<&OutputRow> {
        match &self.state {
            GroupState::Accumulating(row) => Some(row),
            _ => None,
        }
    }

    /// Folds one input row into the current group. A failing row leaves no
    /// partial write behind and drops the whole group.
    pub fn process(&mut self, row: &dyn RowAccessor) -> Result<(), PivotError> {
        let result = self.try_process(row);
        if result.is_err() {
            self.discard();
        }
        result
    }

    fn try_process(&mut self, row: &dyn RowAccessor) -> Result<(), PivotError> {
        let pivot = row.value(self.pivot_column)?;
        if pivot.is_null() {
            return Err(PivotError::NullPivotKey {
                column: self.pivot_column,
            });
        }
        let key = encode_key(pivot, self.key_map.pivot_column().type_tag)?;
        let offset = self
            .key_map
            .offset_of(&key)
            .ok_or(PivotError::PivotKeyNotFound { key })?;

        let group_count = self.group_columns.len();
        let value_count = self.value_columns.len();
        let start = offset
            .checked_mul(value_count)
            .and_then(|n| n.checked_add(group_count))
            .filter(|s| *s >= group_count && s + value_count <= self.width)
            .ok_or(PivotError::OffsetRange {
                slot: offset.saturating_mul(value_count).saturating_add(group_count),
                group_columns: group_count,
                width: self.width,
            })?;

        if !self.is_accumulating() {
            let mut fresh = OutputRow::with_width(self.width);
            for (slot, idx) in self.group_columns.iter().enumerate() {
                fresh.copy_from(row, *idx, slot)?;
            }
            self.state = GroupState::Accumulating(fresh);
        }
        if let GroupState::Accumulating(out) = &mut self.state {
            for (pos, idx) in self.value_columns.iter().enumerate() {
                out.copy_from(row, *idx, start + pos)?;
            }
        }
        Ok(())
    }

    /// Emits the accumulated row, if any. Returns whether a row was emitted.
    pub fn end_group(&mut self, store: &mut dyn RowStore) -> Result<bool, PivotError> {
        match std::mem::replace(&mut self.state, GroupState::Flushed) {
            GroupState::Accumulating(row) => {
                store.put(row)?;
                self.emitted += 1;
                debug!(
                    target: "pivot::processor",
                    emitted = self.emitted,
                    "Flushed pivot group"
                );
                Ok(true)
            }
            previous => {
                self.state = previous;
                Ok(false)
            }
        }
    }

    /// Drops any partially accumulated row without emitting it.
    pub fn discard(&mut self) -> bool {
        let dropped = self.is_accumulating();
        self.state = GroupState::AwaitingFirstRow;
        dropped
    }
}
