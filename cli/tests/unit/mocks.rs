//! Shared fakes for unit tests.
//!
//! [`FakeState`] is an in-memory vCenter: a fixed inventory, a custom-attribute
//! table, and counters for every port call. [`FakeConnector`] and
//! [`FakeSession`] share one state so a test can inspect it after the session
//! has been consumed by `disconnect`.

#![allow(dead_code, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use attrsync_cli::application::ports::{
    AttributeWriter, ConnectionParams, InventorySource, PlatformConnector, SessionRelease,
    SyncReporter, TableSource,
};
use attrsync_cli::application::services::sync::CancelToken;
use attrsync_cli::domain::{
    ConnectionError, ContainerNode, Datacenter, EntityHandle, FieldApplyError, Inventory,
    LoadError, LogLine, Progress, RawTable,
};

// ── Inventory builders ────────────────────────────────────────────────────────

pub fn vm(id: &str, name: &str) -> ContainerNode {
    ContainerNode::machine(id, name)
}

pub fn folder(name: &str, children: Vec<ContainerNode>) -> ContainerNode {
    ContainerNode::folder(name, children)
}

pub fn datacenter(name: &str, children: Vec<ContainerNode>) -> Datacenter {
    Datacenter {
        name: name.to_string(),
        vm_folder: folder("vm", children),
    }
}

pub fn inventory(datacenters: Vec<Datacenter>) -> Inventory {
    Inventory::new(datacenters)
}

/// One datacenter holding only `web01` (id `vm-1`).
pub fn web01_only() -> Inventory {
    inventory(vec![datacenter("DC1", vec![vm("vm-1", "web01")])])
}

// ── Platform fake ─────────────────────────────────────────────────────────────

/// One `set_custom_value` call as seen by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCall {
    pub entity_id: String,
    pub key: String,
    pub value: String,
}

#[derive(Default)]
pub struct FakeState {
    pub inventory: Inventory,
    /// Attribute keys the platform rejects.
    pub failing_keys: HashSet<String>,
    /// When set, every inventory fetch fails with this message.
    pub inventory_error: Option<String>,
    pub set_calls: RefCell<Vec<SetCall>>,
    /// `(entity id, key) -> value` after all successful calls.
    pub attributes: RefCell<HashMap<(String, String), String>>,
    pub connects: Cell<usize>,
    pub fetches: Cell<usize>,
    pub disconnects: Cell<usize>,
}

impl FakeState {
    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            inventory,
            ..Self::default()
        }
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn attribute(&self, entity_id: &str, key: &str) -> Option<String> {
        self.attributes
            .borrow()
            .get(&(entity_id.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys_set(&self) -> Vec<String> {
        self.set_calls
            .borrow()
            .iter()
            .map(|c| c.key.clone())
            .collect()
    }
}

pub struct FakeSession {
    pub state: Rc<FakeState>,
}

impl InventorySource for FakeSession {
    async fn inventory(&self) -> Result<Inventory> {
        self.state.fetches.set(self.state.fetches.get() + 1);
        if let Some(msg) = &self.state.inventory_error {
            anyhow::bail!("{msg}");
        }
        Ok(self.state.inventory.clone())
    }
}

impl AttributeWriter for FakeSession {
    async fn set_custom_value(
        &self,
        entity: &EntityHandle,
        key: &str,
        value: &str,
    ) -> Result<(), FieldApplyError> {
        self.state.set_calls.borrow_mut().push(SetCall {
            entity_id: entity.id.clone(),
            key: key.to_string(),
            value: value.to_string(),
        });
        if self.state.failing_keys.contains(key) {
            return Err(FieldApplyError::new(format!(
                "The attribute '{key}' does not exist"
            )));
        }
        self.state
            .attributes
            .borrow_mut()
            .insert((entity.id.clone(), key.to_string()), value.to_string());
        Ok(())
    }
}

impl SessionRelease for FakeSession {
    async fn disconnect(self) -> Result<()> {
        self.state.disconnects.set(self.state.disconnects.get() + 1);
        Ok(())
    }
}

pub struct FakeConnector {
    pub state: Rc<FakeState>,
    /// When set, `connect` fails with this cause.
    pub refuse: Option<String>,
}

impl FakeConnector {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Rc::new(state),
            refuse: None,
        }
    }

    pub fn refusing(cause: &str) -> Self {
        Self {
            state: Rc::new(FakeState::default()),
            refuse: Some(cause.to_string()),
        }
    }

    /// A session sharing this connector's state, for driving `run_rows` directly.
    pub fn session(&self) -> FakeSession {
        FakeSession {
            state: Rc::clone(&self.state),
        }
    }
}

impl PlatformConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, params: &ConnectionParams) -> Result<FakeSession, ConnectionError> {
        self.state.connects.set(self.state.connects.get() + 1);
        if let Some(cause) = &self.refuse {
            return Err(ConnectionError {
                host: params.host.clone(),
                cause: cause.clone(),
            });
        }
        Ok(self.session())
    }
}

pub fn params() -> ConnectionParams {
    ConnectionParams {
        host: "vc01.lab".to_string(),
        user: "administrator@vsphere.local".to_string(),
        password: "secret".to_string(),
        verify_tls: false,
        timeout: None,
    }
}

// ── Table fake ────────────────────────────────────────────────────────────────

/// Serves a fixed table regardless of path.
pub struct StaticTable(pub Result<RawTable, LoadError>);

impl StaticTable {
    pub fn new(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self(Ok(RawTable {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
        }))
    }
}

impl TableSource for StaticTable {
    fn read_table(&self, _path: &Path) -> Result<RawTable, LoadError> {
        self.0.clone()
    }
}

// ── Reporter fake ─────────────────────────────────────────────────────────────

/// Records everything reported, optionally cancelling a token once a given
/// number of rows has been processed.
#[derive(Default)]
pub struct RecordingReporter {
    pub steps: RefCell<Vec<String>>,
    pub warnings: RefCell<Vec<String>>,
    pub lines: RefCell<Vec<LogLine>>,
    pub progress: RefCell<Vec<Progress>>,
    cancel_at: Option<(usize, CancelToken)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling_after(rows: usize, token: CancelToken) -> Self {
        Self {
            cancel_at: Some((rows, token)),
            ..Self::default()
        }
    }

    /// The run log rendered the way the terminal shows it.
    pub fn rendered(&self) -> Vec<String> {
        self.lines.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.rendered().iter().filter(|l| l.contains(needle)).count()
    }

    pub fn last_progress(&self) -> Option<Progress> {
        self.progress.borrow().last().copied()
    }
}

impl SyncReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.borrow_mut().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn log(&self, line: &LogLine) {
        self.lines.borrow_mut().push(line.clone());
    }

    fn progress(&self, progress: Progress) {
        self.progress.borrow_mut().push(progress);
        if let Some((rows, token)) = &self.cancel_at {
            if progress.current >= *rows {
                token.cancel();
            }
        }
    }
}
