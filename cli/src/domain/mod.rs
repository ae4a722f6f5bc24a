//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod inventory;
pub mod outcome;
pub mod row;

pub use config::{AttrsyncConfig, RefreshPolicy, validate_config_key, validate_config_value};
pub use error::{ConfigError, ConnectionError, FieldApplyError, LoadError, SyncError};
pub use inventory::{ContainerNode, Datacenter, EntityHandle, Inventory};
pub use outcome::{
    ApplyOutcome, FieldOutcome, LogLine, Progress, RowOutcome, RowReport, RunSummary,
};
pub use row::{
    AttributeRow, DEFAULT_IDENTIFIER_COLUMN, MachineEntry, RawTable, TableInspection,
    attribute_headers, rows_from_table,
};
