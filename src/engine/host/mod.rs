//! Interfaces the pivot transform consumes from the host database, together
//! with in-memory implementations used by the command-line harness and tests.

mod catalog;
mod declare;
mod parameters;
mod row;
mod session_store;

pub use catalog::{CatalogClient, CatalogCursor, CatalogResult, StaticCatalog};
pub use declare::{PlanDeclaration, SchemaDeclarer};
pub use parameters::{NamedParameters, ParameterKind, ParameterValue};
pub use row::{MemRow, OutputRow, RowAccessor, RowStore, VecRowStore};
pub use session_store::{MemorySessionStore, SessionStore};
