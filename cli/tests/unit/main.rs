//! Unit tests for the attrsync CLI
//!
//! These tests use in-memory fakes for the platform and run fast without
//! external I/O.

mod mocks;
mod sync_service;
