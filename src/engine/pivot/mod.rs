//! The `pivot` table transform: turns long key/value rows into one wide row
//! per group, with output columns discovered from a catalog query.

pub mod key_encoder;
pub mod key_map;
pub mod lifecycle;
pub mod parameters;
pub mod partitioned;
pub mod processor;
pub mod resolver;

pub use key_encoder::encode_key;
pub use key_map::{ColumnTypeMeta, PivotKeyMap};
pub use lifecycle::{Phase, PivotSession};
pub use parameters::PivotParameters;
pub use partitioned::PartitionedPivot;
pub use processor::RowPivotProcessor;
pub use resolver::{CatalogSnapshot, DescribeOutcome, describe};

#[cfg(test)]
mod key_map_test;
#[cfg(test)]
mod resolver_test;
