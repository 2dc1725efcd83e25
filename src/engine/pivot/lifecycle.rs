use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::errors::PivotError;
use crate::engine::host::{
    CatalogClient, NamedParameters, RowAccessor, RowStore, SchemaDeclarer, SessionStore,
};
use crate::engine::pivot::key_map::PivotKeyMap;
use crate::engine::pivot::parameters::PivotParameters;
use crate::engine::pivot::processor::RowPivotProcessor;
use crate::engine::pivot::resolver::{DescribeOutcome, describe};
use crate::engine::types::ColumnDesc;
use crate::shared::config::PivotConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    New,
    Described,
    Created,
    Started,
    Finalized,
    ShutDown,
    Aborted,
    Destroyed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::New => "new",
            Phase::Described => "described",
            Phase::Created => "created",
            Phase::Started => "started",
            Phase::Finalized => "finalized",
            Phase::ShutDown => "shut down",
            Phase::Aborted => "aborted",
            Phase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Drives one pivot invocation through the host's fixed phase order:
/// Describe, Create, Start, process*, Finalize, Shutdown or Abort, Destroy.
pub struct PivotSession {
    catalog: Arc<dyn CatalogClient>,
    store: Arc<dyn SessionStore>,
    config: PivotConfig,
    params: NamedParameters,
    input_schema: Vec<ColumnDesc>,
    phase: Phase,
    failed: bool,
    described: Option<DescribeOutcome>,
    parameters: Option<PivotParameters>,
    processor: Option<RowPivotProcessor>,
}

impl PivotSession {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        store: Arc<dyn SessionStore>,
        config: PivotConfig,
        params: NamedParameters,
        input_schema: Vec<ColumnDesc>,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
            params,
            input_schema,
            phase: Phase::New,
            failed: false,
            described: None,
            parameters: None,
            processor: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn processor(&self) -> Option<&RowPivotProcessor> {
        self.processor.as_ref()
    }

    pub fn describe(
        &mut self,
        declarer: &mut dyn SchemaDeclarer,
    ) -> Result<&DescribeOutcome, PivotError> {
        self.expect_phase("describe", &[Phase::New])?;
        let outcome = describe(
            &self.params,
            &self.input_schema,
            self.catalog.as_ref(),
            declarer,
            &self.config,
        );
        let outcome = self.track(outcome)?;
        self.transition(Phase::Described);
        let outcome: &DescribeOutcome = self.described.insert(outcome);
        Ok(outcome)
    }

    pub fn create(&mut self) -> Result<(), PivotError> {
        self.expect_phase("create", &[Phase::Described])?;
        let parameters = self.track(PivotParameters::from_named(&self.params))?;
        self.parameters = Some(parameters);
        self.transition(Phase::Created);
        Ok(())
    }

    /// Builds the key map, publishes it to the session store, then binds the
    /// processor to the copy restored from the store.
    pub fn start(&mut self) -> Result<Arc<PivotKeyMap>, PivotError> {
        self.expect_phase("start", &[Phase::Created])?;
        let result = self.build_and_bind();
        let key_map = self.track(result)?;
        self.transition(Phase::Started);
        Ok(key_map)
    }

    fn build_and_bind(&mut self) -> Result<Arc<PivotKeyMap>, PivotError> {
        let parameters = PivotParameters::from_named(&self.params)?;
        let value_columns = parameters.value_column_metas(&self.input_schema);
        let reject = self.config.reject_duplicate_keys;

        let snapshot = self
            .described
            .as_ref()
            .map(|d| &d.snapshot)
            .filter(|_| self.config.reuse_describe_snapshot);
        let key_map = match snapshot {
            Some(snapshot) => {
                debug!(target: "pivot::lifecycle", "Building key map from describe snapshot");
                PivotKeyMap::from_snapshot(snapshot, value_columns, reject)?
            }
            None => {
                debug!(target: "pivot::lifecycle", "Re-running catalog query for key map");
                PivotKeyMap::from_catalog(
                    self.catalog.as_ref(),
                    &parameters.catalog_query,
                    value_columns,
                    reject,
                )?
            }
        };
        key_map.publish(self.store.as_ref())?;

        let shared = PivotKeyMap::restore(self.store.as_ref())?;
        let bound = self.parameters.as_ref().unwrap_or(&parameters);
        self.processor = Some(RowPivotProcessor::bind(bound, Arc::clone(&shared))?);
        Ok(shared)
    }

    pub fn process(&mut self, row: &dyn RowAccessor) -> Result<(), PivotError> {
        self.expect_phase("process", &[Phase::Started])?;
        let result = self.bound_processor()?.process(row);
        self.track(result)
    }

    /// Marks a group boundary. Returns whether a row was emitted.
    pub fn end_group(&mut self, out: &mut dyn RowStore) -> Result<bool, PivotError> {
        self.expect_phase("end_group", &[Phase::Started])?;
        let result = self.bound_processor()?.end_group(out);
        self.track(result)
    }

    /// Emits the last group.
    pub fn finalize(&mut self, out: &mut dyn RowStore) -> Result<bool, PivotError> {
        self.expect_phase("finalize", &[Phase::Started])?;
        let result = self.bound_processor()?.end_group(out);
        let emitted = self.track(result)?;
        self.transition(Phase::Finalized);
        Ok(emitted)
    }

    pub fn shutdown(&mut self) -> Result<(), PivotError> {
        self.expect_phase("shutdown", &[Phase::Finalized])?;
        self.transition(Phase::ShutDown);
        Ok(())
    }

    /// Releases any partially accumulated row without emitting it.
    pub fn abort(&mut self) -> Result<(), PivotError> {
        if matches!(self.phase, Phase::Destroyed | Phase::Aborted) {
            return Err(self.out_of_order("abort"));
        }
        if let Some(processor) = self.processor.as_mut() {
            if processor.discard() {
                debug!(target: "pivot::lifecycle", "Dropped partial pivot row on abort");
            }
        }
        self.transition(Phase::Aborted);
        Ok(())
    }

    pub fn destroy(&mut self) -> Result<(), PivotError> {
        if self.phase == Phase::Destroyed {
            return Err(self.out_of_order("destroy"));
        }
        self.processor = None;
        self.described = None;
        self.transition(Phase::Destroyed);
        Ok(())
    }

    fn bound_processor(&mut self) -> Result<&mut RowPivotProcessor, PivotError> {
        self.processor
            .as_mut()
            .ok_or_else(|| PivotError::lifecycle("no processor bound to session"))
    }

    fn expect_phase(&self, call: &str, allowed: &[Phase]) -> Result<(), PivotError> {
        if self.failed {
            return Err(PivotError::lifecycle(format!(
                "{} after a failure; only abort or destroy are accepted",
                call
            )));
        }
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(self.out_of_order(call))
        }
    }

    fn out_of_order(&self, call: &str) -> PivotError {
        PivotError::lifecycle(format!("{} not allowed in phase '{}'", call, self.phase))
    }

    fn track<T>(&mut self, result: Result<T, PivotError>) -> Result<T, PivotError> {
        if let Err(e) = &result {
            e.log_error();
            self.failed = true;
        }
        result
    }

    fn transition(&mut self, next: Phase) {
        info!(
            target: "pivot::lifecycle",
            from = %self.phase,
            to = %next,
            "Pivot session phase change"
        );
        self.phase = next;
    }
}
