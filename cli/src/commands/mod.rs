//! Command implementations

pub mod apply;
pub mod config;
pub mod inspect;
pub mod version;
