//! Runtime configuration for the status line.
//!
//! Configuration is resolved once per invocation, in order of precedence:
//! 1. Command-line flags (highest priority)
//! 2. Config file (`--config <path>` or `~/.config/ctxhud/config.toml`)
//! 3. Built-in defaults (lowest priority)
//!
//! Nothing here is mutated after startup.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;

/// Context-percentage thresholds for urgency coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// At or above this percentage the context segment turns yellow.
    pub warn_percent: u32,
    /// At or above this percentage the context segment turns red.
    pub critical_percent: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn_percent: 70,
            critical_percent: 85,
        }
    }
}

/// Bounds on how much of the transcript is read and how many agents are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Files larger than this are tailed instead of read in full.
    pub tail_window_bytes: u64,
    /// Bytes read from the head of a tailed file to recover the first record.
    pub head_probe_bytes: usize,
    /// Maximum agent tasks tracked in memory during one fold.
    pub max_tracked_agents: usize,
    /// Running agents older than this are shown as completed.
    pub stale_after_minutes: i64,
    /// Maximum agents kept in the derived list.
    pub max_listed_agents: usize,
    /// Maximum per-agent detail lines under the summary.
    pub max_detail_lines: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tail_window_bytes: 512 * 1024,
            head_probe_bytes: 4096,
            max_tracked_agents: 100,
            stale_after_minutes: 30,
            max_listed_agents: 10,
            max_detail_lines: 5,
        }
    }
}

/// Column widths and optional segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub type_width: usize,
    pub description_width: usize,
    /// List recently completed agents after running ones.
    pub show_completed: bool,
    /// Show the cumulative session cost.
    pub show_cost: bool,
    /// Emit terminal color sequences.
    pub color: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            type_width: 14,
            description_width: 45,
            show_completed: false,
            show_cost: false,
            color: true,
        }
    }
}

/// Complete configuration, as loaded from `config.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    pub thresholds: Thresholds,
    pub limits: Limits,
    pub layout: Layout,
}

impl HudConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ctxhud").join("config.toml"))
    }

    /// Parse a TOML document. Missing sections and keys fall back to defaults.
    pub fn from_toml(source: &str) -> Result<Self> {
        let mut config: HudConfig =
            toml::from_str(source).wrap_err("Failed to parse config")?;
        config.normalize();
        Ok(config)
    }

    /// Load from an explicitly requested path. Any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&source).wrap_err_with(|| format!("Invalid config {}", path.display()))
    }

    /// Load from the default location. A missing file yields defaults; an
    /// unreadable or malformed one is logged and also yields defaults.
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    fn normalize(&mut self) {
        if self.thresholds.warn_percent > self.thresholds.critical_percent {
            self.thresholds.warn_percent = self.thresholds.critical_percent;
        }
    }
}
