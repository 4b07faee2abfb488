//! Mutation reconciliation core for a Kubernetes-style admission and audit
//! controller, plus its schema-conflict detector and the parallel, simpler
//! export-connection reconciler.
//!
//! This crate owns the in-memory systems and reconcile algorithms described
//! in the design; everything that talks to the cluster directly (the
//! resource-server client, the watch/work-queue machinery) is the real `kube`
//! crate, injected at the edges rather than reimplemented here.

pub mod aggregator;
pub mod channel;
pub mod config;
pub mod error;
pub mod identity;
pub mod pod;
pub mod reconcile;
pub mod schema;
pub mod status;
pub mod systems;

pub use config::Config;
pub use error::Error;
