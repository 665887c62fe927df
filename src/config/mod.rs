//! Restore configuration

mod types;

pub use types::{RestoreConfig, RestoreConfigBuilder};
