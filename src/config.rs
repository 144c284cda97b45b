//! Configuration for termfolio.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termfolio/config.toml`
//! - Animation, visitor-notification and theme settings
//! - Optional page content overrides
//!
//! # Configuration File
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 2323
//! shutdown_grace_secs = 5
//!
//! [animation]
//! tick_ms = 50
//! session_timeout_secs = 600
//! top_margin = 1
//! bottom_margin = 5
//! background_phrase = "termfolio "
//!
//! [visitor]
//! scanner_threshold_secs = 15
//! scanner_cooldown_secs = 3600
//! visitor_cooldown_secs = 60
//! geo_endpoint = "http://ip-api.com/json/{ip}"
//! geo_timeout_secs = 3
//!
//! [theme]
//! background = "#3a3a3a"
//!
//! [pages.misc]
//! title = "MISC"
//! color = "#069494"
//! body = "..."
//! ```
//!
//! The webhook URL is read from the `DISCORD_WEBHOOK` environment variable,
//! which takes precedence over `visitor.webhook_url`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable carrying the notification webhook URL
pub const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub animation: AnimationConfig,
    pub visitor: VisitorConfig,
    pub theme: Theme,
    /// Page content overrides keyed by page label
    pub pages: HashMap<String, PageOverride>,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 2323,
            shutdown_grace_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Home screen animation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub tick_ms: u64,
    pub session_timeout_secs: u64,
    pub top_margin: u16,
    pub bottom_margin: u16,
    pub background_phrase: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            session_timeout_secs: 600,
            top_margin: 1,
            bottom_margin: 5,
            background_phrase: "termfolio ".to_string(),
        }
    }
}

/// Visitor classification and notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorConfig {
    pub scanner_threshold_secs: u64,
    pub scanner_cooldown_secs: u64,
    pub visitor_cooldown_secs: u64,
    /// Lookup URL; `{ip}` is replaced with the visitor address
    pub geo_endpoint: String,
    pub geo_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub webhook_url: Option<String>,
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            scanner_threshold_secs: 15,
            scanner_cooldown_secs: 3600,
            visitor_cooldown_secs: 60,
            geo_endpoint: "http://ip-api.com/json/{ip}".to_string(),
            geo_timeout_secs: 3,
            notify_timeout_secs: 3,
            webhook_url: None,
        }
    }
}

impl VisitorConfig {
    pub fn scanner_threshold(&self) -> Duration {
        Duration::from_secs(self.scanner_threshold_secs)
    }

    pub fn scanner_cooldown(&self) -> Duration {
        Duration::from_secs(self.scanner_cooldown_secs)
    }

    pub fn visitor_cooldown(&self) -> Duration {
        Duration::from_secs(self.visitor_cooldown_secs)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

/// Colors used outside of the per-page palette
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Background phrase on the home screen
    pub background: Color,
    pub footer_fg: Color,
    pub footer_bg: Color,
    /// Footer hint on content pages
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::new(0x3a, 0x3a, 0x3a),
            footer_fg: Color::new(0xff, 0xff, 0xff),
            footer_bg: Color::new(0x1a, 0x1a, 0x1a),
            dim: Color::new(0x88, 0x88, 0x88),
        }
    }
}

/// Replacement content for one page; unset fields keep the built-in value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOverride {
    pub title: Option<String>,
    pub color: Option<Color>,
    pub body: Option<String>,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(WEBHOOK_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.visitor.webhook_url = Some(url.to_string());
            }
        }
    }

    /// Get config file path
    fn default_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termfolio").join("config.toml"))
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.animation.tick_ms, 50);
        assert_eq!(config.animation.session_timeout_secs, 600);
        assert_eq!(config.visitor.scanner_threshold(), Duration::from_secs(15));
        assert_eq!(config.visitor.scanner_cooldown(), Duration::from_secs(3600));
        assert_eq!(config.visitor.visitor_cooldown(), Duration::from_secs(60));
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(5));
        assert!(config.visitor.webhook_url.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r##"
            [animation]
            top_margin = 2
            bottom_margin = 3

            [pages.misc]
            title = "ELSEWHERE"
            color = "#102030"
            "##,
        )
        .unwrap();

        assert_eq!(config.animation.top_margin, 2);
        assert_eq!(config.animation.bottom_margin, 3);
        // Untouched fields keep their defaults
        assert_eq!(config.animation.tick_ms, 50);
        assert_eq!(config.server.port, 2323);

        let misc = &config.pages["misc"];
        assert_eq!(misc.title.as_deref(), Some("ELSEWHERE"));
        assert_eq!(misc.color, Some(Color::new(0x10, 0x20, 0x30)));
        assert!(misc.body.is_none());
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#cc0000").unwrap(), Color::new(0xcc, 0, 0));
        assert_eq!(Color::from_hex("D4A017").unwrap(), Color::new(0xd4, 0xa0, 0x17));
        assert_eq!(Color::new(0x06, 0x94, 0x94).to_string(), "#069494");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_bad_color_rejected() {
        assert!(Config::parse("[theme]\nbackground = \"red\"\n").is_err());
    }
}
