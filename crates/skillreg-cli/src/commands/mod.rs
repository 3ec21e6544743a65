//! Command implementations for skillreg-cli

pub mod check;
pub mod migrate;
pub mod publish;
pub mod run;

pub use check::run_check;
pub use migrate::run_migrate;
pub use publish::run_publish;
pub use run::run_merge;

use std::path::Path;

use skillreg_core::RegistryConfig;
use skillreg_fs::NormalizedPath;

use crate::error::Result;

/// Hold the registry's sidecar lock for the whole load-modify-save cycle.
pub fn lock_registry(registry: &NormalizedPath) -> Result<skillreg_fs::io::FileLock> {
    Ok(skillreg_fs::io::lock_exclusive(registry)?)
}

/// Load the configuration file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<RegistryConfig> {
    let path = path.map(NormalizedPath::new);
    Ok(RegistryConfig::load_or_default(path.as_ref())?)
}
