//! Integration tests for qanda-core infrastructure

use qanda_core::{
    config_error, generation_error, storage_error, validation_error, LogFormat, LoggingConfig,
    QandaConfig, QandaError,
};

#[test]
fn test_error_handling() {
    let error = validation_error!("Question cannot be empty", "question", "test_component");

    match &error {
        QandaError::Validation {
            message,
            field,
            context,
        } => {
            assert_eq!(message, "Question cannot be empty");
            assert_eq!(field.as_deref(), Some("question"));
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Validation error"),
    }
    assert!(error.is_client_error());

    // Should not panic without a subscriber
    error.log();

    let generation = generation_error!("quota exceeded", "test", "gemini", "gemini-pro-latest");
    assert!(!generation.is_client_error());
    assert_eq!(generation.to_string(), "Generation error: quota exceeded");
    assert_eq!(generation.cause(), "quota exceeded");

    let storage = storage_error!(
        "disk full",
        "test",
        std::io::Error::new(std::io::ErrorKind::Other, "disk full")
    );
    assert!(std::error::Error::source(&storage).is_some());

    let config = config_error!("Invalid config", "test");
    let context = config.context().unwrap();
    assert_eq!(context.recovery_suggestions.len(), 2);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = QandaConfig::default();
    config.llm.model = "gemini-2.5-flash".to_string();
    config.server.port = 8080;
    config.logging.format = LogFormat::Json;
    config.save_to_file(&path).unwrap();

    let loaded = QandaConfig::load(Some(&path)).unwrap();
    assert_eq!(loaded.llm.model, "gemini-2.5-flash");
    assert_eq!(loaded.server.port, 8080);
    assert_eq!(loaded.server.history_limit, 15);
    assert_eq!(loaded.logging.format, LogFormat::Json);
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qanda.toml");
    std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

    let config = QandaConfig::from_file(&path).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.llm.model, "gemini-pro-latest");
    assert_eq!(config.storage.database_url, "sqlite:queries.db");
    config.validate().unwrap();
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    assert!(matches!(
        QandaConfig::from_file(&path),
        Err(QandaError::Config { .. })
    ));
}

#[test]
fn test_config_validation() {
    let mut config = QandaConfig::default();
    assert!(config.validate().is_ok());

    config.storage.database_url = "postgres://localhost/db".to_string();
    assert!(config.validate().is_err());

    let mut config = QandaConfig::default();
    config.llm.base_url = "generativelanguage.googleapis.com".to_string();
    assert!(config.validate().is_err());

    let mut config = QandaConfig::default();
    config.server.history_limit = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        filter_directives: vec!["qanda_core=debug".to_string()],
        ..LoggingConfig::default()
    };

    // A global subscriber can only be installed once per process
    let first = qanda_core::init_logging(&config);
    let second = qanda_core::init_logging(&config);
    assert!(first.is_ok());
    assert!(second.is_err());
}
