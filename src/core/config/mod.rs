pub mod data;
pub mod io;
pub mod keys;
pub mod orchestrator;

pub use data::{Config, Settings};
pub use io::ConfigError;
pub use keys::{ConfigKey, SettingError};
pub use orchestrator::ConfigOrchestrator;
