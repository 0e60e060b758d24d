#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use context::AppContext;
pub use toml_config::AppConfig;
