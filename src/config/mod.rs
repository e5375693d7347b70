// Configuration management module
// TOML settings under the application directory, environment overrides and interactive setup

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, LlmConfig, OllamaConfig, RetrievalConfig, WebSearchConfig, mask_secret,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}
