//! Configuration file handling and the operation context.
//!
//! The config lives in a `key=value` text file under `~/.fontfetch`. Invalid
//! values warn and fall back to defaults; `set` validates before writing and
//! preserves keys it does not know about. Everything the drivers need is
//! carried by an explicitly constructed [`Context`] — there is no ambient
//! global state.

use crate::cache::ArchiveCache;
use crate::format::{self, FormatLabel};
use crate::{FetchResult, FontfetchError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default archive cache budget (200 MB).
pub const DEFAULT_CACHE_SIZE: u64 = 200 * 1024 * 1024;

/// User-tunable settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Format preference order for installs
    pub priorities: Vec<FormatLabel>,
    /// Destination directory for installed fonts
    pub font_dir: PathBuf,
    /// Archive cache byte budget; 0 disables caching
    pub cache_size: u64,
    /// GitHub API token for authenticated requests
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            priorities: FormatLabel::DEFAULT_PRIORITIES.to_vec(),
            font_dir: default_font_dir(),
            cache_size: DEFAULT_CACHE_SIZE,
            github_token: None,
        }
    }
}

impl Config {
    /// Load the config file, falling back to defaults for anything missing
    /// or malformed. A missing file is not an error.
    pub fn load(path: &Path) -> Config {
        let mut config = Config::default();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return config,
            Err(e) => {
                log::warn!("could not load config file {}: {e}", path.display());
                return config;
            }
        };

        for line in content.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "format" => {
                    if value == "auto" {
                        continue;
                    }
                    match format::parse_priorities(value) {
                        Ok(priorities) => config.priorities = priorities,
                        Err(_) => log::warn!("invalid format in config, using default"),
                    }
                }
                "path" => {
                    if !value.is_empty() {
                        config.font_dir = PathBuf::from(value);
                    }
                }
                "cache-size" => match value.parse::<u64>() {
                    Ok(size) => config.cache_size = size,
                    Err(_) => log::warn!("invalid cache-size in config, using default"),
                },
                "github_token" => {
                    if !value.is_empty() {
                        config.github_token = Some(value.to_string());
                    }
                }
                other => log::debug!("ignoring unknown config key: {other}"),
            }
        }
        config
    }

    /// Validate and persist a single key, keeping unknown keys intact.
    pub fn set(path: &Path, key: &str, value: &str) -> FetchResult<()> {
        match key {
            "format" => {
                format::parse_priorities(value)?;
            }
            "cache-size" => {
                value.parse::<u64>().map_err(|_| {
                    FontfetchError::Config(format!("invalid cache size: {value}"))
                })?;
            }
            "path" | "github_token" => {}
            other => {
                return Err(FontfetchError::Config(format!("unknown config key: {other}")));
            }
        }

        let mut entries: BTreeMap<String, String> = BTreeMap::new();
        if let Ok(content) = fs::read_to_string(path) {
            for line in content.lines() {
                if let Some((k, v)) = line.trim().split_once('=') {
                    entries.insert(k.trim().to_string(), v.trim().to_string());
                }
            }
        }
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        for (k, v) in &entries {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }
}

/// Directory holding the config file and installed manifest.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fontfetch")
}

pub fn config_file() -> PathBuf {
    config_dir().join("config")
}

pub fn manifest_file() -> PathBuf {
    config_dir().join("installed.json")
}

/// Directory for cached release archives.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fontfetch")
}

/// Platform default for installed fonts.
fn default_font_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join("Library")
            .join("Fonts")
    }

    #[cfg(target_os = "windows")]
    {
        dirs::font_dir().unwrap_or_else(|| PathBuf::from("C:\\Windows\\Fonts"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".local")
            .join("share")
            .join("fonts")
    }
}

/// Everything a driver needs for one operation, built once at startup.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub manifest_path: PathBuf,
    pub cache: Option<ArchiveCache>,
}

impl Context {
    pub fn new(config: Config, manifest_path: PathBuf, cache: Option<ArchiveCache>) -> Context {
        Context {
            config,
            manifest_path,
            cache,
        }
    }

    /// Build the context from the on-disk config.
    pub fn from_disk() -> FetchResult<Context> {
        let config = Config::load(&config_file());
        let cache = ArchiveCache::open(cache_dir(), config.cache_size)?;
        Ok(Context {
            config,
            manifest_path: manifest_file(),
            cache,
        })
    }

    pub fn font_dir(&self) -> &Path {
        &self.config.font_dir
    }
}
