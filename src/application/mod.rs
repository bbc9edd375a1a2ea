//! Application services layer.

pub mod error;
pub mod host;
pub mod pagination;
pub mod posts;
pub mod probes;
pub mod repos;
pub mod users;
