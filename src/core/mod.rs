//! Storage plumbing shared by every catalog module: connections, the write
//! broker, schema DDL, configuration and the error type.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod pool;
pub mod schemas;
pub mod store;
pub mod time;
pub mod version;
