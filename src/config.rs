use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::mail::imap_client::{IMAP_PORT, IMAPS_PORT};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub imap_server: String,
    pub imap_port: Option<u16>,
    #[serde(default = "default_ssl")]
    pub ssl: bool,
    pub user: String,
    #[serde(default = "default_mailboxes")]
    pub mailboxes: Vec<String>,
    #[serde(default)]
    pub subject_filter: String,
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_ssl() -> bool {
    true
}

fn default_mailboxes() -> Vec<String> {
    vec!["INBOX".to_string()]
}

fn default_top() -> usize {
    8
}

impl Config {
    pub fn port(&self) -> u16 {
        self.imap_port
            .unwrap_or(if self.ssl { IMAPS_PORT } else { IMAP_PORT })
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join("mailstats"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Read `path`, or write a template there and fail if it does not exist yet.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config {
            imap_server: "imap.example.net".to_string(),
            imap_port: None,
            ssl: true,
            user: "you@example.net".to_string(),
            mailboxes: default_mailboxes(),
            subject_filter: String::new(),
            top: default_top(),
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(path, tom)?;
        return Err(anyhow!(
            "Created template config at {} - edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}
