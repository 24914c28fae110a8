use std::path::{Path, PathBuf};

use anyhow::{Context, Error, Result};
use serde::Deserialize;

const CONFIG_PATH: &str = "~/.config/shopfront/config.json";
const URL_VAR: &str = "SHOPFRONT_URL";
const ANON_KEY_VAR: &str = "SHOPFRONT_ANON_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where the hosted backend lives and how listings are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub bucket: String,
    pub currency_symbol: String,
    /// Per request limit for backend calls
    pub timeout_secs: u64,
}

// On disk everything is optional, env vars may fill the gaps
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    url: Option<String>,
    anon_key: Option<String>,
    table: Option<String>,
    bucket: Option<String>,
    currency_symbol: Option<String>,
    timeout_secs: Option<u64>,
}

pub fn default_path() -> Result<PathBuf> {
    let path = shellexpand::full(CONFIG_PATH)
        .with_context(|| format!("Config file path {} is invalid", CONFIG_PATH))?;
    Ok(Path::new(path.as_ref()).to_owned())
}

pub fn read(path: &Path) -> Result<Config> {
    let file = match std::fs::read_to_string(path) {
        Ok(c) => serde_json::from_str::<ConfigFile>(&c)
            .with_context(|| format!("Error de-serialising config file {:?}", path))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
        Err(e) => return Err(Error::new(e).context(format!("Error reading config file {:?}", path))),
    };
    resolve(file, |key| std::env::var(key).ok())
}

fn resolve<F: Fn(&str) -> Option<String>>(file: ConfigFile, env: F) -> Result<Config> {
    let url = env(URL_VAR)
        .or(file.url)
        .ok_or_else(|| Error::msg(format!("No backend url configured, set {} or \"url\" in the config file", URL_VAR)))?;
    let anon_key = env(ANON_KEY_VAR)
        .or(file.anon_key)
        .ok_or_else(|| Error::msg(format!("No anon key configured, set {} or \"anon_key\" in the config file", ANON_KEY_VAR)))?;
    Ok(Config {
        url: url.trim_end_matches('/').to_owned(),
        anon_key,
        table: file.table.unwrap_or_else(|| "products".to_owned()),
        bucket: file.bucket.unwrap_or_else(|| "product-images".to_owned()),
        currency_symbol: file.currency_symbol.unwrap_or_else(|| "₦".to_owned()),
        timeout_secs: file.timeout_secs.filter(|s| *s > 0).unwrap_or(DEFAULT_TIMEOUT_SECS),
    })
}
