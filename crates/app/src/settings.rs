//! Application settings, read from `config/fuelbook.toml` (optional) and
//! `FUELBOOK__*` environment variables, e.g. `FUELBOOK__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/fuelbook";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `memory` or the path of a SQLite file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Sqlite(value)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false))
            .add_source(
                Environment::with_prefix("FUELBOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(raw: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_config_has_no_server() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
    }

    #[test]
    fn database_is_memory_or_a_path() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = "memory"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.database, Database::Memory);
        assert_eq!(server.bind, None);

        let settings = parse(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 8080
            database = "./fuelbook.db"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.database, Database::Sqlite("./fuelbook.db".to_string()));
        assert_eq!(server.port, 8080);
    }
}
