// Persistent storage
pub mod config_store;
