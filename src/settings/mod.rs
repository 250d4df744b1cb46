// Client configuration: file, environment overrides and defaults.

pub mod error;
pub mod store;
pub mod types;

pub use error::SettingsError;
pub use store::ConfigStore;
pub use types::ClientConfig;
