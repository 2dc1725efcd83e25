//! Command-line harness: loads a session description and drives one pivot
//! invocation through the in-memory host.

pub mod run;
pub mod session_file;

pub use run::{RunError, RunOutput, run_session};
pub use session_file::{CatalogSpec, ParameterSpec, SessionFile, SessionFileError};

#[cfg(test)]
mod run_test;
