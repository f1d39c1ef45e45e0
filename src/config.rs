//! Server configuration.

use std::path::PathBuf;

use crate::stub::Stub;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default directory auto-loaded for stub definitions at startup.
pub const DEFAULT_STUBS_DIR: &str = "stubs";

/// Configuration for a [`MockServer`](crate::MockServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP listener binds to.
    pub port: u16,

    /// Directory tree of stub definition files loaded before startup.
    pub stubs_dir: PathBuf,

    /// Stubs registered programmatically before startup.
    pub stubs: Vec<Stub>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            stubs_dir: PathBuf::from(DEFAULT_STUBS_DIR),
            stubs: Vec::new(),
        }
    }
}
