//! Host platform utility functions

use std::{env, path::PathBuf};
use thiserror::Error;

/// Name of the environment variable pointing at the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "NAV_SW_ROOT";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("The software root environment variable ({}) is not set", SW_ROOT_ENV_VAR)]
    SwRootNotSet,
}

/// Get the root directory of the software tree, which contains the `params` and `sessions`
/// directories.
pub fn get_nav_sw_root() -> Result<PathBuf, HostError> {
    env::var_os(SW_ROOT_ENV_VAR)
        .map(PathBuf::from)
        .ok_or(HostError::SwRootNotSet)
}
