#[cfg(feature = "cli")]
pub mod cli;
pub mod deployment;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Preset};
pub use deployment::DeploymentConfig;
