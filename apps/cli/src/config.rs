//! Client configuration.
//!
//! Read from `~/.config/sealpost/config.json` when present, then
//! overridden by `SEALPOST_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sealpost_auth::DEFAULT_NTP_SERVERS;
use sealpost_http::ProxyCredentials;
use sealpost_stream::StreamSettings;
use sealpost_transfer::DEFAULT_CHUNK_SIZE;
use serde::Deserialize;

const DEFAULT_INSTANCE_URL: &str = "https://ega.elixir.no";
const DEFAULT_TSD_BASE_URL: &str = "https://api.tsd.usit.no";
const DEFAULT_TSD_PROJECT: &str = "p969";
const MIB: usize = 1024 * 1024;

/// On-disk shape; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    username: Option<String>,
    password: Option<String>,
    proxy_token: Option<String>,
    instance_url: Option<String>,
    tsd_base_url: Option<String>,
    tsd_project: Option<String>,
    /// MiB
    chunk_size: Option<u64>,
    ntp_servers: Option<Vec<String>>,
}

/// Resolved configuration, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: ProxyCredentials,
    pub instance_url: String,
    pub tsd_base_url: String,
    pub tsd_project: String,
    /// Bytes.
    pub chunk_size: usize,
    pub ntp_servers: Vec<String>,
    pub download_dir: PathBuf,
}

impl AppConfig {
    /// Loads the config file and applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let file = read_config_file(&config_path()?)?;
        let download_dir = std::env::current_dir().context("cannot determine current directory")?;
        Self::resolve(file, download_dir, |key| std::env::var(key).ok())
    }

    fn resolve(
        file: ConfigFile,
        download_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let pick = |key: &str, from_file: Option<String>| {
            env(key).filter(|v| !v.is_empty()).or(from_file.filter(|v| !v.is_empty()))
        };
        let required = |key: &str, from_file: Option<String>| {
            pick(key, from_file).with_context(|| format!("{key} is not set"))
        };

        let credentials = ProxyCredentials::new(
            required("SEALPOST_USERNAME", file.username)?,
            required("SEALPOST_PASSWORD", file.password)?,
            required("SEALPOST_PROXY_TOKEN", file.proxy_token)?,
        );

        let chunk_raw = env("SEALPOST_CHUNK_SIZE").or_else(|| file.chunk_size.map(|n| n.to_string()));
        let chunk_size = match chunk_raw {
            None => DEFAULT_CHUNK_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(mib) if mib > 0 => mib.checked_mul(MIB).unwrap_or(DEFAULT_CHUNK_SIZE),
                _ => {
                    tracing::warn!(value = %raw, "invalid chunk size, using the default");
                    DEFAULT_CHUNK_SIZE
                }
            },
        };

        let ntp_servers = match env("SEALPOST_NTP_SERVERS") {
            Some(raw) => split_list(&raw),
            None => file.ntp_servers.unwrap_or_default(),
        };
        let ntp_servers = if ntp_servers.is_empty() {
            DEFAULT_NTP_SERVERS.iter().map(|s| s.to_string()).collect()
        } else {
            ntp_servers
        };

        Ok(Self {
            credentials,
            instance_url: trim_url(
                pick("SEALPOST_INSTANCE_URL", file.instance_url)
                    .as_deref()
                    .unwrap_or(DEFAULT_INSTANCE_URL),
            ),
            tsd_base_url: trim_url(
                pick("SEALPOST_TSD_BASE_URL", file.tsd_base_url)
                    .as_deref()
                    .unwrap_or(DEFAULT_TSD_BASE_URL),
            ),
            tsd_project: pick("SEALPOST_TSD_PROJECT", file.tsd_project)
                .unwrap_or_else(|| DEFAULT_TSD_PROJECT.into()),
            chunk_size,
            ntp_servers,
            download_dir,
        })
    }

    /// Direct-mode base: `{tsd_base_url}/v1/{project}/ega`.
    pub fn tsd_url(&self) -> String {
        format!("{}/v1/{}/ega", self.tsd_base_url, self.tsd_project)
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings::new(&self.instance_url, &self.tsd_url())
            .with_chunk_size(self.chunk_size)
            .with_download_dir(&self.download_dir)
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(file) => Ok(file),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config file, using defaults"
            );
            Ok(ConfigFile::default())
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("sealpost").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").context("APPDATA is not set")?;
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(xdg));
        }
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
