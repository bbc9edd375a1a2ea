//! Blog-post HTTP API on PostgreSQL with a read-through cache and
//! operational probes.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
