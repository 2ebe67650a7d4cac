use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub listen_addr: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_connections: u32,
}

impl Settings {
    /// Defaults, then an optional `quiz.toml`, then the environment (`.env` included).
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_environment(Environment::default())
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("listen_addr", "0.0.0.0:8080")?
            .set_default("max_connections", 5)?
            .add_source(File::with_name("quiz").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(source))
    }

    #[test]
    fn defaults_apply_when_only_db_path_is_set() {
        let settings = Settings::from_environment(env(&[("DB_PATH", "quiz.db")])).unwrap();
        assert_eq!(settings.db_path, "quiz.db");
        assert_eq!(settings.listen_addr, "0.0.0.0:8080");
        assert_eq!(settings.max_connections, 5);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_environment(env(&[
            ("DB_PATH", "/tmp/quiz.db"),
            ("LISTEN_ADDR", "127.0.0.1:3000"),
            ("MAX_CONNECTIONS", "12"),
        ]))
        .unwrap();
        assert_eq!(settings.listen_addr, "127.0.0.1:3000");
        assert_eq!(settings.max_connections, 12);
    }

    #[test]
    fn db_path_is_required() {
        assert!(Settings::from_environment(env(&[])).is_err());
    }
}
