#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;

/// Environment variable holding the Gemini API credential
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Environment variable overriding the directory the program resolves `data/` and
/// `chroma_db/` against
pub const BASE_DIR_VAR: &str = "LEGAL_RAG_BASE_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";
const MAX_EMBEDDING_BATCH_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
    #[serde(skip)]
    pub api_key: ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub batch_size: u32,
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/".to_string(),
            chat_model: "gemini-2.0-flash-exp".to_string(),
            embedding_model: "embedding-001".to_string(),
            batch_size: MAX_EMBEDDING_BATCH_SIZE,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the model as context
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory holding the PDF files, relative to the base directory
    pub data_dir: String,
    /// Directory of the persisted vector database, relative to the base directory
    pub vector_dir: String,
    /// PDF file names inside `data_dir`, loaded in this order
    pub files: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            vector_dir: "chroma_db".to_string(),
            files: vec![
                "UUD45_SatuNaskah.pdf".to_string(),
                "UU Nomor 6 Tahun 2023.pdf".to_string(),
                "UU Nomor 30 Tahun 2002.pdf".to_string(),
                "UU Nomor 3 Tahun 2025.pdf".to_string(),
            ],
        }
    }
}

/// API credential; never printed
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} tidak ditemukan. Pastikan Anda sudah membuat file .env.")]
    MissingApiKey(&'static str),
    #[error("Could not determine the program directory")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid batch size: {0} (must be between 1 and 100)")]
    InvalidBatchSize(u32),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid chunk size: {0} (must be between 100 and 8000)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid top_k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),
    #[error("No PDF documents configured")]
    NoDocuments,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            gemini: GeminiConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
            documents: DocumentsConfig::default(),
            base_dir: PathBuf::new(),
            api_key: ApiKey::default(),
        }
    }
}

impl Config {
    /// Build the startup configuration from the process environment.
    ///
    /// Resolves the base directory, loads `.env` files, reads the optional
    /// `config.toml` and requires [`API_KEY_VAR`] to be set.
    #[inline]
    pub fn from_env() -> Result<Self> {
        let base_dir = Self::resolve_base_dir()?;

        // Values already present in the environment win over .env entries
        dotenvy::dotenv().ok();
        dotenvy::from_path(base_dir.join(".env")).ok();

        let api_key = std::env::var(API_KEY_VAR).ok();
        Self::resolve(&base_dir, api_key)
    }

    /// Load `config.toml` from `base_dir` and attach the API credential
    #[inline]
    pub fn resolve<P: AsRef<Path>>(base_dir: P, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(ApiKey::new)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;

        let mut config = Self::load(base_dir)?;
        config.api_key = api_key;

        info!(
            "Configuration loaded from {} ({} documents, store at {})",
            config.base_dir.display(),
            config.documents.files.len(),
            config.vector_database_path().display()
        );
        Ok(config)
    }

    /// Load non-secret settings from `config.toml` in `base_dir`, falling back to defaults
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            debug!("No {} found, using defaults", config_path.display());
            return Ok(Self {
                base_dir: base_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = base_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(BASE_DIR_VAR) {
            return Ok(PathBuf::from(dir));
        }

        let exe = std::env::current_exe()?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gemini.validate()?;
        self.chunking.validate()?;

        if !(1..=50).contains(&self.retrieval.top_k) {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }

        self.server.socket_addr()?;

        if self.documents.files.is_empty() {
            return Err(ConfigError::NoDocuments);
        }

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(&self.documents.data_dir)
    }

    /// Absolute paths of the configured PDF files, in load order
    #[inline]
    pub fn pdf_files(&self) -> Vec<PathBuf> {
        let data_dir = self.data_dir();
        self.documents
            .files
            .iter()
            .map(|name| data_dir.join(name))
            .collect()
    }

    /// Get the path for the vector database directory
    #[inline]
    pub fn vector_database_path(&self) -> PathBuf {
        self.base_dir.join(&self.documents.vector_dir)
    }

    #[inline]
    pub fn gemini_url(&self) -> Result<Url, ConfigError> {
        self.gemini.endpoint_url()
    }
}

impl GeminiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.endpoint_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > MAX_EMBEDDING_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|_| ConfigError::InvalidUrl(self.endpoint.clone()))
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidBindAddress(addr))
    }
}
