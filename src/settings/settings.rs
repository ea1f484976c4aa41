use anyhow::{Result, anyhow};
use config::{Config, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub storage: Storage,
    pub auth: Auth,
    #[serde(default)]
    pub graph: Graph,
    #[serde(default)]
    pub feed: Feed,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub cert_path: String,
    pub key_path: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory" or "mysql"
    #[serde(default)]
    pub mysql_dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "jwt"
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
}

#[derive(Debug, Deserialize)]
pub struct Graph {
    #[serde(default = "default_write_retry_attempts")]
    pub write_retry_attempts: u32,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            write_retry_attempts: default_write_retry_attempts(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Feed {
    #[serde(default = "default_page_size")]
    pub page_size: u16,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_write_retry_attempts() -> u32 {
    3
}

fn default_page_size() -> u16 {
    10
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

/// Same as [`parse_settings`] for settings held in memory.
pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[http]
address = "127.0.0.1:8443"
cert_path = "certs/cert.pem"
key_path = "certs/key.pem"

[log]
filter = "info,socialgraph=debug"

[storage]
backend = "memory"

[auth]
backend = "fake"
"#;

    #[test]
    fn optional_sections_take_defaults() {
        let settings = parse_settings_str(MINIMAL).unwrap();
        assert_eq!(settings.storage.backend, "memory");
        assert_eq!(settings.storage.max_connections, 10);
        assert!(settings.storage.mysql_dsn.is_none());
        assert_eq!(settings.graph.write_retry_attempts, 3);
        assert_eq!(settings.feed.page_size, 10);
    }

    #[test]
    fn explicit_values_win() {
        let toml = format!(
            "{MINIMAL}\n[graph]\nwrite_retry_attempts = 5\n\n[feed]\npage_size = 25\n"
        );
        let settings = parse_settings_str(&toml).unwrap();
        assert_eq!(settings.graph.write_retry_attempts, 5);
        assert_eq!(settings.feed.page_size, 25);
    }

    #[test]
    fn missing_required_section_fails() {
        assert!(parse_settings_str("[log]\nfilter = \"info\"\n").is_err());
        assert!(parse_settings(Some("settings/does-not-exist")).is_err());
    }
}
