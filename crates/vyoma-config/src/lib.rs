pub mod config;
pub mod env;
pub mod error;
pub mod loader;
pub mod resolve;
pub mod validate;

pub use config::{ConfigLayer, LocatorStrategy, ReportFormat, RunConfig, ScanMode};
pub use env::{env_layer, variables_set, EnvSource, ProcessEnv};
pub use error::ConfigError;
pub use loader::load_file_layer;
pub use resolve::{resolve, resolve_layers, ResolvedLayers};
