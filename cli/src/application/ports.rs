//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::domain::{
    AttrsyncConfig, ConnectionError, EntityHandle, FieldApplyError, Inventory, LoadError,
    LogLine, Progress, RawTable,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Everything needed to open a platform session.
#[derive(Clone)]
pub struct ConnectionParams {
    /// Host name or address of the management endpoint, e.g. `vc01.lab`.
    pub host: String,
    pub user: String,
    pub password: String,
    /// Verify the server certificate. `false` accepts any certificate.
    pub verify_tls: bool,
    /// Per-request timeout. `None` lets a hung call stall the run.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ── Platform Port Traits ──────────────────────────────────────────────────────

/// Opens sessions against the virtualization platform.
#[allow(async_fn_in_trait)]
pub trait PlatformConnector {
    type Session: PlatformSession;

    /// Connect and authenticate.
    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Session, ConnectionError>;
}

/// Read access to the datacenter/folder/machine hierarchy.
#[allow(async_fn_in_trait)]
pub trait InventorySource {
    /// Fetch the current inventory tree, datacenters in platform order.
    async fn inventory(&self) -> Result<Inventory>;
}

/// Custom-attribute mutation on a single machine.
#[allow(async_fn_in_trait)]
pub trait AttributeWriter {
    /// Assign `value` to the custom attribute `key` on `entity`.
    async fn set_custom_value(
        &self,
        entity: &EntityHandle,
        key: &str,
        value: &str,
    ) -> Result<(), FieldApplyError>;
}

/// Session teardown.
#[allow(async_fn_in_trait)]
pub trait SessionRelease {
    /// Log out and release the session. Consumes the session so it cannot be
    /// used afterwards.
    async fn disconnect(self) -> Result<()>;
}

/// Composite trait — any type implementing all three sub-traits is a `PlatformSession`.
pub trait PlatformSession: InventorySource + AttributeWriter + SessionRelease {}

/// Blanket implementation: any type implementing all three sub-traits is a `PlatformSession`.
impl<T> PlatformSession for T where T: InventorySource + AttributeWriter + SessionRelease {}

// ── Tabular Input Port ────────────────────────────────────────────────────────

/// Reads a spreadsheet-like file into header + string cells.
pub trait TableSource {
    /// Read the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] if the file cannot be opened or parsed.
    fn read_table(&self, path: &Path) -> Result<RawTable, LoadError>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait SyncReporter {
    /// Emit an in-progress step message (connecting, loading, ...).
    fn step(&self, message: &str);
    /// Emit a warning that is not part of the run log.
    fn warn(&self, message: &str);
    /// Emit one run-log line.
    fn log(&self, line: &LogLine);
    /// Report rows processed so far.
    fn progress(&self, progress: Progress);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if none is stored.
    fn load(&self) -> Result<AttrsyncConfig>;
    /// Persist the configuration.
    fn save(&self, config: &AttrsyncConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
