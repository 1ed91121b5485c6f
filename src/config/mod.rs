// Configuration management module
// Settings come from an optional config.toml next to the program; the API key comes from the environment

pub mod settings;


pub use settings::{
    API_KEY_VAR, ApiKey, BASE_DIR_VAR, Config, ConfigError, DocumentsConfig, GeminiConfig,
    RetrievalConfig, ServerConfig,
};
