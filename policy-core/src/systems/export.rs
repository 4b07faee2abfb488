//! The export system (spec §2 component 3, §4.4) and its driver seam.
//!
//! **[SUPPLEMENT]**: the spec treats `UpsertConnection`/`CloseConnection`/
//! `Publish` as calls against an opaque sink named by `Connection.spec.driver`
//! (spec §3 "Driver identifier", §4.4 step 4: `UpsertConnection(ctx, cfg, name,
//! driver)`). We give that sink a concrete shape -- a small [`ConnectionDriver`]
//! trait, dispatched to by name through a driver registry, with [`LogDriver`]
//! registered under `"log"` as the one driver this core ships out of the box,
//! so the export system is exercisable end-to-end without a real external
//! destination.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

/// A named external destination for exported events. Implementations own
/// whatever transport they need (HTTP client, message-queue producer, ...);
/// this core only calls `upsert`/`close`/`publish` at the points spec §4.4
/// names.
pub trait ConnectionDriver: Send + Sync {
    fn upsert(&self, name: &str, config: &serde_json::Value) -> Result<(), DriverError>;
    fn close(&self, name: &str) -> Result<(), DriverError>;
    fn publish(&self, name: &str, payload: &serde_json::Value) -> Result<(), DriverError>;
}

/// Writes every call through `tracing`, at `info` for success and a message
/// carrying the connection name throughout -- enough to exercise the export
/// system in tests and in a cluster with no real sink configured yet.
pub struct LogDriver;

impl ConnectionDriver for LogDriver {
    fn upsert(&self, name: &str, config: &serde_json::Value) -> Result<(), DriverError> {
        tracing::info!(connection = name, %config, "upserting connection");
        Ok(())
    }

    fn close(&self, name: &str) -> Result<(), DriverError> {
        tracing::info!(connection = name, "closing connection");
        Ok(())
    }

    fn publish(&self, name: &str, payload: &serde_json::Value) -> Result<(), DriverError> {
        tracing::info!(connection = name, %payload, "publishing event");
        Ok(())
    }
}

/// Façade over a name-keyed registry of [`ConnectionDriver`]s, dispatched to
/// by the `driver` identifier named on the source `Connection` (spec §3, §4.4
/// step 4) rather than a single hardcoded sink -- a cluster can register
/// `"log"`, `"slack"`, `"pubsub"`, ... and this system routes each call to
/// whichever one the `Connection` actually names.
pub struct ExportSystem {
    drivers: HashMap<String, Arc<dyn ConnectionDriver>>,
    /// (driver, name) most recently upserted successfully, if any -- lets
    /// `close_connection` dispatch to the same driver it upserted with (the
    /// caller only ever passes `name`, per spec §4.4's `CloseConnection(name)`)
    /// and be a no-op when nothing was ever upserted (mirrors spec §8's
    /// round-trip law "UpsertConnection; CloseConnection is idempotent across
    /// repeats").
    upserted: Mutex<Option<(String, String)>>,
}

impl ExportSystem {
    /// Builds an export system over an explicit driver registry, keyed by the
    /// identifier `Connection.spec.driver` is expected to name.
    pub fn new(drivers: HashMap<String, Arc<dyn ConnectionDriver>>) -> Self {
        Self {
            drivers,
            upserted: Mutex::new(None),
        }
    }

    /// Convenience constructor for a single registered driver, e.g. the
    /// default `"log"` -> [`LogDriver`] wiring this core ships with.
    pub fn single(driver_name: impl Into<String>, driver: Arc<dyn ConnectionDriver>) -> Self {
        let mut drivers = HashMap::new();
        drivers.insert(driver_name.into(), driver);
        Self::new(drivers)
    }

    fn lookup(&self, driver: &str) -> Result<Arc<dyn ConnectionDriver>, DriverError> {
        self.drivers
            .get(driver)
            .cloned()
            .ok_or_else(|| DriverError(format!("no driver registered for {driver:?}")))
    }

    pub fn upsert_connection(&self, driver: &str, name: &str, config: &serde_json::Value) -> Result<(), DriverError> {
        self.lookup(driver)?.upsert(name, config)?;
        *self.upserted.lock() = Some((driver.to_string(), name.to_string()));
        Ok(())
    }

    pub fn close_connection(&self, name: &str) -> Result<(), DriverError> {
        let driver_name = match self.upserted.lock().as_ref() {
            Some((driver_name, upserted_name)) if upserted_name == name => driver_name.clone(),
            _ => return Ok(()),
        };
        self.lookup(&driver_name)?.close(name)?;
        *self.upserted.lock() = None;
        Ok(())
    }

    pub fn publish(&self, driver: &str, name: &str, payload: &serde_json::Value) -> Result<(), DriverError> {
        self.lookup(driver)?.publish(name, payload)
    }
}
