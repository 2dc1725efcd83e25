use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::command::session_file::{SessionFile, SessionFileError};
use crate::engine::errors::PivotError;
use crate::engine::host::{
    CatalogClient, MemRow, MemorySessionStore, OutputRow, PlanDeclaration, RowStore,
    SessionStore, VecRowStore,
};
use crate::engine::pivot::partitioned::GroupKey;
use crate::engine::pivot::{PartitionedPivot, PivotSession};
use crate::engine::types::ColumnDesc;
use crate::shared::config::PivotConfig;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    File(#[from] SessionFileError),

    #[error(transparent)]
    Pivot(#[from] PivotError),
}

/// Declared output schema and the rows emitted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub columns: Vec<ColumnDesc>,
    pub rows: Vec<OutputRow>,
}

/// Drives one invocation end to end. A single partition runs on the
/// session's own processor; several partitions run on workers that restore
/// the key map from the session store.
pub fn run_session(file: &SessionFile, config: PivotConfig) -> Result<RunOutput, RunError> {
    let catalog: Arc<dyn CatalogClient> = Arc::new(file.catalog()?);
    let partitions = file.partitions()?;
    let store = Arc::new(MemorySessionStore::new());
    let mut session = PivotSession::new(
        catalog,
        store.clone(),
        config,
        file.named_parameters()?,
        file.input_schema.clone(),
    );

    let result = drive(&mut session, store.as_ref(), &file.input_schema, &partitions);
    if result.is_err() {
        if let Err(e) = session.abort() {
            debug!(target: "pivot::run", error = %e, "Abort skipped");
        }
    }
    session.destroy()?;
    Ok(result?)
}

fn drive(
    session: &mut PivotSession,
    store: &dyn SessionStore,
    input_schema: &[ColumnDesc],
    partitions: &[Vec<MemRow>],
) -> Result<RunOutput, PivotError> {
    let mut plan = PlanDeclaration::new(input_schema.to_vec());
    let parameters = session.describe(&mut plan)?.parameters.clone();
    session.create()?;
    let key_map = session.start()?;

    let mut out = VecRowStore::new();
    match partitions {
        [single] => {
            let mut current: Option<GroupKey> = None;
            for row in single {
                let group = GroupKey::read(row, &parameters.group_columns)?;
                if current.as_ref().is_some_and(|c| *c != group) {
                    session.end_group(&mut out)?;
                }
                current = Some(group);
                session.process(row)?;
            }
        }
        _ => {
            let workers = PartitionedPivot::from_session(parameters, store)?;
            for row in workers.run(partitions)? {
                out.put(row)?;
            }
        }
    }
    session.finalize(&mut out)?;
    session.shutdown()?;

    info!(
        target: "pivot::run",
        keys = key_map.len(),
        partitions = partitions.len(),
        output_columns = plan.output_columns.len(),
        output_rows = out.len(),
        "Pivot session complete"
    );
    Ok(RunOutput {
        columns: plan.output_columns,
        rows: out.into_rows(),
    })
}
