//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: spreadsheet reading, the
//! vCenter SOAP gateway, and configuration persistence.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod table;
pub mod vsphere;
