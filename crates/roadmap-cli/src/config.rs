//! Configuration file management for roadmap.
//!
//! Provides a TOML-based config file at `~/.config/roadmap/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use roadmap_db::config::{DATABASE_URL_ENV, DbConfig};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the roadmap config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/roadmap` or `~/.config/roadmap`,
/// never the platform-specific `dirs::config_dir()`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("roadmap");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("roadmap")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Write the config file, creating parent dirs as needed. The file holds a
/// database URL that may carry a password, so it is made owner-only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct RoadmapConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl RoadmapConfig {
    /// Resolve configuration.
    ///
    /// - DB URL: `cli_db_url` > `ROADMAP_DATABASE_URL` env > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Server: config file `[server]` > `127.0.0.1:3000`; CLI overrides are
    ///   applied by [`RoadmapConfig::with_server_overrides`].
    ///
    /// A missing config file is fine; an unreadable or malformed one is an
    /// error.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file_config = if path.exists() {
            Some(load_config()?)
        } else {
            None
        };

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        tracing::debug!(config_file = %path.display(), "resolved database url");

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server: file_config.map(|cfg| cfg.server).unwrap_or_default(),
        })
    }

    pub fn with_server_overrides(mut self, bind: Option<String>, port: Option<u16>) -> Self {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{EnvGuard, lock_env};

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());

        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            server: ServerSection {
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
        };
        let path = save_config(&original).unwrap();
        assert_eq!(path, tmp.path().join("roadmap").join("config.toml"));

        let loaded = load_config().unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.server, original.server);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());

        let path = save_config(&ConfigFile {
            database: DatabaseSection {
                url: DbConfig::DEFAULT_URL.to_string(),
            },
            server: ServerSection::default(),
        })
        .unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn server_section_is_optional() {
        let cfg: ConfigFile = toml::from_str("[database]\nurl = \"postgresql://h/db\"\n").unwrap();
        assert_eq!(cfg.server, ServerSection::default());

        let cfg: ConfigFile =
            toml::from_str("[database]\nurl = \"postgresql://h/db\"\n[server]\nport = 9000\n")
                .unwrap();
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        let _env = EnvGuard::set(DATABASE_URL_ENV, "postgresql://env:5432/envdb");

        let config = RoadmapConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            server: ServerSection::default(),
        })
        .unwrap();
        let _env = EnvGuard::set(DATABASE_URL_ENV, "postgresql://env:5432/envdb");

        let config = RoadmapConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        let _env = EnvGuard::remove(DATABASE_URL_ENV);
        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            server: ServerSection {
                bind: "0.0.0.0".to_string(),
                port: 4000,
            },
        })
        .unwrap();

        let config = RoadmapConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(config.server.port, 4000);

        let config = config.with_server_overrides(None, Some(5000));
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        let _env = EnvGuard::remove(DATABASE_URL_ENV);

        let config = RoadmapConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn resolve_rejects_malformed_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", tmp.path());
        std::fs::create_dir_all(config_dir()).unwrap();
        std::fs::write(config_path(), "this is = = not toml").unwrap();

        let err = RoadmapConfig::resolve(None).unwrap_err();
        assert!(
            format!("{err:#}").contains("failed to parse config file"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("roadmap/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
