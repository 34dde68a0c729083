//! Configuration loading tests

use aisle_core::config::{Config, ConfigManager, DEFAULT_MAX_ITERATIONS};
use std::fs;
use tempfile::TempDir;

mod config_manager_tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let manager = ConfigManager::with_path(path.clone()).unwrap();
        let config = manager.config();
        assert_eq!(manager.config_path(), path.as_path());
        assert_eq!(config.server.bind, "127.0.0.1:8787");
        assert_eq!(config.server.secret_env.as_deref(), Some("AISLE_ASSISTANT_SECRET"));
        assert_eq!(config.provider.provider_type, "anthropic");
        assert_eq!(config.assistant.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.assistant.event_buffer, 32);
        assert!(config.data.fixtures.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"
secret = "s3cret"

[provider]
provider_type = "openai"
model = "gpt-4o-mini"

[assistant]
max_iterations = 4

[data]
fixtures = "/srv/aisle/fixtures.json"
"#,
        )
        .unwrap();

        let config = ConfigManager::with_path(path).unwrap().into_config();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.get_secret().as_deref(), Some("s3cret"));
        assert_eq!(config.provider.provider_type, "openai");
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.assistant.max_iterations, 4);
        assert_eq!(config.assistant.event_buffer, 32);
        assert_eq!(
            config.data.fixtures.as_deref(),
            Some(std::path::Path::new("/srv/aisle/fixtures.json"))
        );
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nbind = ").unwrap();

        let err = ConfigManager::with_path(path).err().unwrap();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[assistant]\nmax_iterations = 0\n").unwrap();

        let err = ConfigManager::with_path(path).err().unwrap();
        assert!(err.to_string().contains("max_iterations must be at least 1"));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.assistant.system_prompt = Some("Be brief.".to_string());

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.assistant.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(parsed.server.bind, config.server.bind);
    }
}

mod secret_tests {
    use super::*;

    #[test]
    fn test_secret_from_named_env() {
        let mut config = Config::default();
        config.server.secret_env = Some("AISLE_TEST_SECRET_FROM_ENV".to_string());
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("AISLE_TEST_SECRET_FROM_ENV", "from-env") };

        assert_eq!(config.server.get_secret().as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_secret_is_none() {
        let mut config = Config::default();
        config.server.secret = Some(String::new());
        config.server.secret_env = Some("AISLE_TEST_SECRET_UNSET".to_string());

        assert_eq!(config.server.get_secret(), None);
    }
}
