use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use log::{debug, warn};
use serde::de::Deserializer;
use serde::Deserialize;
use url::Url;

const CONFIG_FILE_NAME: &str = "config.toml";
pub const APP_NAME: &str = "contactbook";

const DEFAULT_BASE_URL: &str = "https://mysite.itvarsity.org/api/ContactBook/";
const DEFAULT_AVATAR_SERVICE: &str = "https://ui-avatars.com/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub base_url: Url,
    pub avatar_service: Url,
    pub timeout: Duration,
    pub ui: UiConfig,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
    pub error: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

// =============================================================================
// File representation
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ConfigFile {
    base_url: String,
    avatar_service: String,
    timeout_secs: u64,
    ui: UiFile,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            avatar_service: DEFAULT_AVATAR_SERVICE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ui: UiFile::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
    error: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 107, 107),
            selection_bg: RgbColor::new(255, 107, 107),
            selection_fg: RgbColor::new(0, 0, 0),
            status_fg: RgbColor::new(255, 107, 107),
            status_bg: RgbColor::new(0, 0, 0),
            error: RgbColor::new(230, 60, 60),
        }
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
                error: file.colors.error,
            },
        }
    }
}

impl Config {
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::from_file(PathBuf::new(), ConfigFile::default(), None).unwrap()
    }

    fn from_file(config_path: PathBuf, file: ConfigFile, base_override: Option<&str>) -> Result<Self> {
        let raw_base = base_override.unwrap_or(&file.base_url);
        let base_url = parse_base_url(raw_base)
            .with_context(|| format!("invalid base_url `{}`", raw_base))?;
        let avatar_service = Url::parse(file.avatar_service.trim())
            .with_context(|| format!("invalid avatar_service `{}`", file.avatar_service))?;

        let timeout_secs = if file.timeout_secs == 0 {
            DEFAULT_TIMEOUT_SECS
        } else {
            file.timeout_secs
        };

        Ok(Config {
            config_path,
            base_url,
            avatar_service,
            timeout: Duration::from_secs(timeout_secs),
            ui: file.ui.into(),
        })
    }
}

/// Parses an http(s) base URL and forces a trailing slash so endpoint paths
/// join underneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash)?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme `{}`", url.scheme());
    }
    Ok(url)
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration. A missing file yields the built-in defaults.
pub fn load(path: Option<&Path>, base_override: Option<&str>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        debug!("no configuration at {}, using defaults", path.display());
        return Config::from_file(path, ConfigFile::default(), base_override);
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    Config::from_file(path, cfg_file, base_override)
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    for (key, value) in table {
        match key.as_str() {
            "base_url" | "avatar_service" | "timeout_secs" => {}
            "ui" => warn_unknown_ui_keys(value),
            other => warn!("unknown config key `{}` ignored", other),
        }
    }
}

fn warn_unknown_ui_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    for (key, value) in table {
        match key.as_str() {
            "colors" => warn_unknown_in_context(
                value,
                "ui.colors",
                &["border", "selection_bg", "selection_fg", "status_fg", "status_bg", "error"],
            ),
            other => warn!("unknown config key `ui.{}` ignored", other),
        }
    }
}

fn warn_unknown_in_context(value: &toml::Value, context: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    for key in table.keys() {
        if !known.contains(&key.as_str()) {
            warn!("unknown config key `{}.{}` ignored", context, key);
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load(Some(&dir.path().join("config.toml")), None).unwrap();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.avatar_service.as_str(), DEFAULT_AVATAR_SERVICE);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_file_values_and_colors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
base_url = "http://localhost:8080/api/ContactBook"
timeout_secs = 3
mystery = true

[ui.colors]
border = [1, 2, 3]
error = { r = 9, g = 8, b = 7 }
"#,
        )
        .unwrap();

        let config = load(Some(&path), None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/api/ContactBook/");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.error, RgbColor::new(9, 8, 7));
        assert_eq!(config.ui.colors.selection_fg, RgbColor::new(0, 0, 0));
    }

    #[test]
    fn test_base_url_override_wins() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"https://file.example/api/\"\n").unwrap();
        let config = load(Some(&path), Some("https://cli.example/api")).unwrap();
        assert_eq!(config.base_url.as_str(), "https://cli.example/api/");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"ftp://files.example/\"\n").unwrap();
        assert!(load(Some(&path), None).is_err());

        fs::write(&path, "base_url = \"not a url\"\n").unwrap();
        let err = load(Some(&path), None).unwrap_err();
        assert!(format!("{err:#}").contains("invalid base_url"));
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout_secs = 0\n").unwrap();
        let config = load(Some(&path), None).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
