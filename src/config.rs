use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_STORAGE_KEY: &str = "coverdeck.songs";
pub const DEFAULT_CACHE_VERSION: &str = "coverdeck-v1";
pub const ICON_FONT_STYLESHEET: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl HttpConfig {
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Name of the persistence slot holding the serialized track list
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Directory local audio and documents are copied into
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            media_dir: default_media_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OfflineConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache generation. Changing it drops every other cache on activation.
    #[serde(default = "default_cache_version")]
    pub version_name: String,
    #[serde(default = "default_offline_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_offline_port")]
    pub port: u16,
    /// Resources fetched on install. Relative entries resolve against the page origin.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            version_name: default_cache_version(),
            bind_addr: default_offline_bind_addr(),
            port: default_offline_port(),
            precache: default_precache(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RequestConfig {
    /// Recipient of song requests, digits only
    #[serde(default)]
    pub phone: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_true() -> bool {
    true
}

fn default_cache_version() -> String {
    DEFAULT_CACHE_VERSION.to_string()
}

fn default_offline_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_offline_port() -> u16 {
    8081
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/styles.css", "/script.js", ICON_FONT_STYLESHEET]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
