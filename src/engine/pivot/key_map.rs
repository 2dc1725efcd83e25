use std::sync::Arc;

use ahash::RandomState;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::errors::PivotError;
use crate::engine::host::{CatalogClient, SessionStore};
use crate::engine::pivot::key_encoder::{encode_key, ensure_supported};
use crate::engine::pivot::resolver::CatalogSnapshot;
use crate::engine::types::{ColumnDesc, TypeTag};
use crate::shared::storage_header::{BlobKind, MagicFile};

/// Type and length of a column, as carried in the session blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeMeta {
    pub type_tag: TypeTag,
    pub length: u32,
}

impl From<&ColumnDesc> for ColumnTypeMeta {
    fn from(column: &ColumnDesc) -> Self {
        Self {
            type_tag: column.type_tag,
            length: column.length,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct KeyMapWire {
    pivot_column: ColumnTypeMeta,
    value_columns: Vec<ColumnTypeMeta>,
    block_count: u64,
    entries: Vec<(String, u64)>,
}

/// Encoded pivot key -> ordinal offset of its output block.
///
/// Built once per session and frozen; workers share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PivotKeyMap {
    pivot_column: ColumnTypeMeta,
    value_columns: Vec<ColumnTypeMeta>,
    block_count: usize,
    entries: IndexMap<String, usize, RandomState>,
}

impl PartialEq for PivotKeyMap {
    fn eq(&self, other: &Self) -> bool {
        self.pivot_column == other.pivot_column
            && self.value_columns == other.value_columns
            && self.block_count == other.block_count
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a == b)
    }
}

impl MagicFile for PivotKeyMap {
    const MAGIC: [u8; 8] = BlobKind::PivotKeyMap.magic();
    const VERSION: u16 = 1;
}

impl PivotKeyMap {
    pub fn builder(
        pivot_column: ColumnTypeMeta,
        value_columns: Vec<ColumnTypeMeta>,
    ) -> PivotKeyMapBuilder {
        PivotKeyMapBuilder {
            map: PivotKeyMap {
                pivot_column,
                value_columns,
                block_count: 0,
                entries: IndexMap::with_hasher(RandomState::new()),
            },
            reject_duplicates: false,
        }
    }

    /// Runs the catalog query and assigns one ordinal per returned row.
    pub fn from_catalog(
        catalog: &dyn CatalogClient,
        query: &str,
        value_columns: Vec<ColumnTypeMeta>,
        reject_duplicates: bool,
    ) -> Result<Self, PivotError> {
        let mut cursor = catalog.open(query)?;
        let key_column = cursor
            .schema()
            .first()
            .cloned()
            .ok_or_else(|| PivotError::schema("catalog query returned no columns"))?;
        ensure_supported(key_column.type_tag)?;

        let mut builder = Self::builder(ColumnTypeMeta::from(&key_column), value_columns)
            .reject_duplicates(reject_duplicates);
        while let Some(row) = cursor.fetch()? {
            let value = row.values().first().ok_or_else(|| {
                PivotError::schema("catalog row is missing the pivot key column")
            })?;
            if value.is_null() {
                return Err(PivotError::schema("catalog query returned a NULL pivot key"));
            }
            builder.push(encode_key(value, key_column.type_tag)?)?;
        }
        cursor.close();
        builder.finish()
    }

    /// Builds from keys captured while the schema was resolved.
    pub fn from_snapshot(
        snapshot: &CatalogSnapshot,
        value_columns: Vec<ColumnTypeMeta>,
        reject_duplicates: bool,
    ) -> Result<Self, PivotError> {
        let mut builder =
            Self::builder(ColumnTypeMeta::from(&snapshot.key_column), value_columns)
                .reject_duplicates(reject_duplicates);
        for key in &snapshot.keys {
            builder.push(key.clone())?;
        }
        builder.finish()
    }

    pub fn offset_of(&self, key: &str) -> Option<usize> {
        self.entries.get(key).copied()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of key blocks in the output row; equals the catalog row count.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn pivot_column(&self) -> ColumnTypeMeta {
        self.pivot_column
    }

    pub fn value_columns(&self) -> &[ColumnTypeMeta] {
        &self.value_columns
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PivotError> {
        let wire = KeyMapWire {
            pivot_column: self.pivot_column,
            value_columns: self.value_columns.clone(),
            block_count: self.block_count as u64,
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), *v as u64))
                .collect(),
        };
        let payload = bincode::serialize(&wire)?;
        Self::frame(&payload).map_err(|e| PivotError::SessionState(e.to_string()))
    }

    pub fn from_bytes(blob: &[u8]) -> Result<Self, PivotError> {
        let payload =
            Self::unframe(blob).map_err(|e| PivotError::SessionState(e.to_string()))?;
        let wire: KeyMapWire = bincode::deserialize(payload)?;

        let block_count = usize::try_from(wire.block_count)
            .map_err(|_| PivotError::SessionState("block count overflows usize".into()))?;
        let mut entries = IndexMap::with_capacity_and_hasher(wire.entries.len(), RandomState::new());
        for (key, offset) in wire.entries {
            let offset = usize::try_from(offset)
                .ok()
                .filter(|o| *o < block_count)
                .ok_or_else(|| {
                    PivotError::SessionState(format!(
                        "offset {} for key '{}' outside {} blocks",
                        offset, key, block_count
                    ))
                })?;
            if entries.insert(key, offset).is_some() {
                return Err(PivotError::SessionState(
                    "duplicate key in session blob".into(),
                ));
            }
        }
        Ok(Self {
            pivot_column: wire.pivot_column,
            value_columns: wire.value_columns,
            block_count,
            entries,
        })
    }

    pub fn publish(&self, store: &dyn SessionStore) -> Result<(), PivotError> {
        let blob = self.to_bytes()?;
        debug!(
            target: "pivot::key_map",
            keys = self.len(),
            bytes = blob.len(),
            "Publishing pivot key map"
        );
        store.put(Bytes::from(blob));
        Ok(())
    }

    pub fn restore(store: &dyn SessionStore) -> Result<Arc<Self>, PivotError> {
        let blob = store
            .get()
            .ok_or_else(|| PivotError::SessionState("no pivot key map in session".into()))?;
        Ok(Arc::new(Self::from_bytes(&blob)?))
    }
}

pub struct PivotKeyMapBuilder {
    map: PivotKeyMap,
    reject_duplicates: bool,
}

impl PivotKeyMapBuilder {
    pub fn reject_duplicates(mut self, reject: bool) -> Self {
        self.reject_duplicates = reject;
        self
    }

    /// Appends the key of the next catalog row. Its ordinal is the row index,
    /// so a repeated key moves to the later block.
    pub fn push(&mut self, key: String) -> Result<(), PivotError> {
        let ordinal = self.map.block_count;
        if let Some(previous) = self.map.entries.get(&key) {
            if self.reject_duplicates {
                return Err(PivotError::schema(format!(
                    "duplicate pivot key '{}' in catalog rows {} and {}",
                    key, previous, ordinal
                )));
            }
            warn!(
                target: "pivot::key_map",
                previous = *previous,
                ordinal,
                "Duplicate pivot key {:?}; later catalog row wins",
                key
            );
        }
        self.map.entries.insert(key, ordinal);
        self.map.block_count += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<PivotKeyMap, PivotError> {
        if self.map.block_count == 0 {
            return Err(PivotError::schema("catalog query returned no pivot keys"));
        }
        debug!(
            target: "pivot::key_map",
            keys = self.map.len(),
            blocks = self.map.block_count,
            "Built pivot key map"
        );
        Ok(self.map)
    }
}
