pub mod errors;
pub mod functions;
pub mod host;
pub mod pivot;
pub mod types;

pub use errors::*;
