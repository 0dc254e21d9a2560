//! satprep-store: persistence collaborators.
//!
//! Implements the `Store` trait over local files, process memory, and an
//! HTTP document service, plus the configuration that selects between them.

pub mod config;
pub mod file;
pub mod http;
pub mod memory;

pub use config::{create_store, load_config, load_config_from, SatprepConfig, StoreConfig};
pub use file::FileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
