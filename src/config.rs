use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "TECHTEST_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file, `sqlite://` urls are accepted as well as `:memory:`.
    pub database_location: PathBuf,
    pub host:              IpAddr,
    pub port:              u16,
    /// `tracing_subscriber::EnvFilter` directives, `RUST_LOG` takes precedence.
    pub log_filter:        String,
}

impl Config {
    pub fn default_as_string() -> Result<String> {
        Ok(toml::to_string(&Self::default())?)
    }

    pub fn read_config() -> Result<Self> {
        Self::read_config_from(DEFAULT_CONFIG_FILE)
    }

    pub fn read_config_from(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::figment(path).extract()?)
    }

    /// Defaults, then the toml file, then `TECHTEST_*` variables and finally
    /// `DATABASE_URL`.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().filter_map(|key| {
                key.as_str()
                    .eq_ignore_ascii_case("database_url")
                    .then(|| "database_location".into())
            }))
    }

    pub fn database_path(&self) -> PathBuf {
        let location = self.database_location.to_string_lossy();
        match location
            .strip_prefix("sqlite://")
            .or_else(|| location.strip_prefix("sqlite:"))
        {
            Some(path) => PathBuf::from(path),
            None => self.database_location.clone(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_location: PathBuf::from("techtest.db"),
            host:              IpAddr::from([127, 0, 0, 1]),
            port:              8000,
            log_filter:        "info".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_without_file_or_environment() {
        Jail::expect_with(|_jail| {
            let config = Config::read_config().unwrap();
            assert_eq!(config.host, Config::default().host);
            assert_eq!(config.port, 8000);
            assert_eq!(config.log_filter, "info");
            Ok(())
        });
    }

    #[test]
    fn file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                port = 9000
                log_filter = "debug"
                database_location = "from-file.db"
                "#,
            )?;
            jail.set_env("TECHTEST_PORT", "9100");

            let config = Config::read_config().unwrap();
            assert_eq!(config.port, 9100);
            assert_eq!(config.log_filter, "debug");
            assert_eq!(config.database_location, PathBuf::from("from-file.db"));

            jail.set_env("DATABASE_URL", "sqlite://from-env.db");
            let config = Config::read_config().unwrap();
            assert_eq!(config.database_path(), PathBuf::from("from-env.db"));
            Ok(())
        });
    }

    #[test]
    fn database_path_strips_url_scheme() {
        let mut config = Config::default();
        assert_eq!(config.database_path(), PathBuf::from("techtest.db"));
        config.database_location = PathBuf::from("sqlite:data/app.db");
        assert_eq!(config.database_path(), PathBuf::from("data/app.db"));
        config.database_location = PathBuf::from(":memory:");
        assert_eq!(config.database_path(), PathBuf::from(":memory:"));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = Config::default_as_string().unwrap();
        assert!(rendered.contains("port = 8000"));
        assert!(rendered.contains("host = \"127.0.0.1\""));
    }
}
