pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::BootConfig;
pub use core::{context::BootContext, supervisor::BootSupervisor};
pub use utils::error::{BootError, Result};
