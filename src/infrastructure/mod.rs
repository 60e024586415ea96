pub mod config;
pub mod fetch;
pub mod sink;
pub mod snapshot_store;
