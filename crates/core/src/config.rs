use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceheadError};
use crate::format::TimeZoneMode;
use crate::view::{HeaderFlags, TraceViewType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub time_zone: TimeZoneMode,
    pub default_view: TraceViewType,
    pub hide_map: bool,
    pub hide_summary: bool,
    pub slim_view: bool,
    pub can_collapse: bool,
    pub disable_json_view: bool,
    pub ask_endpoint: String,
    pub ask_method: String,
    pub ask_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_zone: TimeZoneMode::Utc,
            default_view: TraceViewType::Timeline,
            hide_map: false,
            hide_summary: false,
            slim_view: false,
            can_collapse: true,
            disable_json_view: false,
            ask_endpoint: "http://localhost:54320/api/ask".to_string(),
            ask_method: crate::ask::DEFAULT_METHOD.to_string(),
            ask_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Defaults, then the TOML file at `path` if it exists, then the
    /// environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(file_overrides) = load_file_overrides(path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn header_flags(&self) -> HeaderFlags {
        HeaderFlags {
            hide_map: self.hide_map,
            hide_summary: self.hide_summary,
            slim_view: self.slim_view,
            can_collapse: self.can_collapse,
            disable_json_view: self.disable_json_view,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    time_zone: Option<String>,
    default_view: Option<String>,
    hide_map: Option<bool>,
    hide_summary: Option<bool>,
    slim_view: Option<bool>,
    can_collapse: Option<bool>,
    disable_json_view: Option<bool>,
    ask_endpoint: Option<String>,
    ask_method: Option<String>,
    ask_timeout: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("TRACEHEAD_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("tracehead/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| TraceheadError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| TraceheadError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    Ok(ConfigOverrides {
        time_zone: env::var("TRACEHEAD_TIME_ZONE").ok(),
        default_view: env::var("TRACEHEAD_DEFAULT_VIEW").ok(),
        hide_map: env_flag("TRACEHEAD_HIDE_MAP")?,
        hide_summary: env_flag("TRACEHEAD_HIDE_SUMMARY")?,
        slim_view: env_flag("TRACEHEAD_SLIM_VIEW")?,
        can_collapse: env_flag("TRACEHEAD_CAN_COLLAPSE")?,
        disable_json_view: env_flag("TRACEHEAD_DISABLE_JSON_VIEW")?,
        ask_endpoint: env::var("TRACEHEAD_ASK_ENDPOINT").ok(),
        ask_method: env::var("TRACEHEAD_ASK_METHOD").ok(),
        ask_timeout: env::var("TRACEHEAD_ASK_TIMEOUT").ok(),
    })
}

fn env_flag(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(v) => parse_flag(&v)
            .map(Some)
            .map_err(|e| TraceheadError::Config(format!("bad {name} in environment: {e}"))),
        Err(_) => Ok(None),
    }
}

fn parse_flag(raw: &str) -> std::result::Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other}")),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.time_zone {
        cfg.time_zone = v.parse().map_err(|e| {
            TraceheadError::Config(format!("bad time_zone in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.default_view {
        cfg.default_view = v.parse().map_err(|e| {
            TraceheadError::Config(format!("bad default_view in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.hide_map {
        cfg.hide_map = v;
    }
    if let Some(v) = overrides.hide_summary {
        cfg.hide_summary = v;
    }
    if let Some(v) = overrides.slim_view {
        cfg.slim_view = v;
    }
    if let Some(v) = overrides.can_collapse {
        cfg.can_collapse = v;
    }
    if let Some(v) = overrides.disable_json_view {
        cfg.disable_json_view = v;
    }
    if let Some(v) = overrides.ask_endpoint {
        cfg.ask_endpoint = v;
    }
    if let Some(v) = overrides.ask_method {
        cfg.ask_method = v;
    }
    if let Some(v) = overrides.ask_timeout {
        cfg.ask_timeout = humantime::parse_duration(&v).map_err(|e| {
            TraceheadError::Config(format!("bad ask_timeout in {source}: {e} (value={v})"))
        })?;
    }
    Ok(())
}
