use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(
        config.gemini.endpoint,
        "https://generativelanguage.googleapis.com/"
    );
    assert_eq!(config.gemini.chat_model, "gemini-2.0-flash-exp");
    assert_eq!(config.gemini.embedding_model, "embedding-001");
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.documents.files.len(), 4);
    assert_eq!(config.documents.vector_dir, "chroma_db");
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.gemini.endpoint = "ftp://example.com".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.gemini.endpoint = "not a url".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidUrl(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.gemini.chat_model = "  ".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.gemini.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.gemini.batch_size = 101;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.server.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.chunking.chunk_overlap = 1000;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::OverlapTooLarge(1000, 1000))
    ));

    let mut invalid_config = config;
    invalid_config.documents.files.clear();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::NoDocuments)
    ));
}

#[test]
fn paths_are_relative_to_base_dir() {
    let config = Config {
        base_dir: PathBuf::from("/srv/legal"),
        ..Config::default()
    };

    assert_eq!(config.data_dir(), PathBuf::from("/srv/legal/data"));
    assert_eq!(
        config.vector_database_path(),
        PathBuf::from("/srv/legal/chroma_db")
    );

    let files = config.pdf_files();
    assert_eq!(files.len(), 4);
    assert_eq!(
        files[0],
        PathBuf::from("/srv/legal/data/UUD45_SatuNaskah.pdf")
    );
    assert_eq!(
        files[3],
        PathBuf::from("/srv/legal/data/UU Nomor 3 Tahun 2025.pdf")
    );
}

#[test]
fn missing_api_key_names_the_variable() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let err = Config::resolve(temp_dir.path(), None).expect_err("should require api key");
    let message = format!("{err:#}");
    assert!(message.contains("GOOGLE_API_KEY"), "got: {message}");

    let err = Config::resolve(temp_dir.path(), Some("   ".to_string()))
        .expect_err("blank api key should be rejected");
    assert!(format!("{err:#}").contains("GOOGLE_API_KEY"));
}

#[test]
fn resolve_with_api_key() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::resolve(temp_dir.path(), Some("secret-key".to_string()))
        .expect("should resolve config");
    assert_eq!(config.api_key.expose(), "secret-key");
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn api_key_is_redacted_in_debug_output() {
    let config = Config {
        api_key: ApiKey::new("super-secret"),
        ..Config::default()
    };

    let debug = format!("{config:?}");
    assert!(!debug.contains("super-secret"));
    assert!(debug.contains("ApiKey(***)"));
}

#[test]
fn load_missing_config_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");
    assert_eq!(config.gemini, GeminiConfig::default());
    assert_eq!(config.base_dir, temp_dir.path());
}

#[test]
fn load_partial_config_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        r#"
            [retrieval]
            top_k = 5

            [server]
            port = 9000
        "#,
    )
    .expect("should write config file");

    let config = Config::load(temp_dir.path()).expect("should load config");
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.chunking, ChunkingConfig::default());
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[chunking]\nchunk_size = 500\nchunk_overlap = 600\n",
    )
    .expect("should write config file");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn socket_addr() {
    let server = ServerConfig::default();
    let addr = server.socket_addr().expect("default bind address is valid");
    assert_eq!(addr.port(), 8501);

    let server = ServerConfig {
        host: "not an ip".to_string(),
        port: 80,
    };
    assert!(matches!(
        server.socket_addr(),
        Err(ConfigError::InvalidBindAddress(_))
    ));
}
