//! The two thin ingestion façades (spec §2 component 3): a mutation system
//! keyed by mutator identity, and an export system keyed by connection name.

pub mod export;
pub mod mutation;

pub use export::{ConnectionDriver, DriverError, ExportSystem, LogDriver};
pub use mutation::{InstantiationError, MutationSystem};
