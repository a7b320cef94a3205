//! Session snapshot piped in by the host on every status line refresh.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::de;

/// Top-level snapshot. Every field is optional; unknown fields are ignored,
/// and `null` or mistyped fields read as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "de::or_default")]
    pub context_window: ContextWindow,
    #[serde(deserialize_with = "de::or_default")]
    pub model: ModelInfo,
    #[serde(deserialize_with = "de::or_default")]
    pub version: Option<String>,
    #[serde(deserialize_with = "de::or_default")]
    pub cost: CostCounters,
    #[serde(deserialize_with = "de::or_default")]
    pub transcript_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContextWindow {
    #[serde(deserialize_with = "de::number")]
    pub used_percentage: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub context_window_size: Option<f64>,
    #[serde(deserialize_with = "de::or_default")]
    pub current_usage: TokenUsage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    #[serde(deserialize_with = "de::number")]
    pub input_tokens: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub cache_creation_input_tokens: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub cache_read_input_tokens: Option<f64>,
}

impl TokenUsage {
    pub fn total(&self) -> f64 {
        [
            self.input_tokens,
            self.cache_creation_input_tokens,
            self.cache_read_input_tokens,
        ]
        .iter()
        .map(|v| v.unwrap_or(0.0))
        .sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    #[serde(deserialize_with = "de::or_default")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de::or_default")]
    pub display_name: Option<String>,
}

/// Cumulative counters reported by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CostCounters {
    #[serde(deserialize_with = "de::number")]
    pub total_lines_added: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub total_lines_removed: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub total_cost_usd: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    pub total_duration_ms: Option<f64>,
}

impl CostCounters {
    pub fn lines_added(&self) -> u64 {
        non_negative(self.total_lines_added)
    }

    pub fn lines_removed(&self) -> u64 {
        non_negative(self.total_lines_removed)
    }
}

fn non_negative(v: Option<f64>) -> u64 {
    v.filter(|n| *n > 0.0).map(|n| n as u64).unwrap_or(0)
}

impl Snapshot {
    /// Parse a snapshot document. Blank or invalid input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                tracing::debug!("snapshot is not a JSON object");
                return None;
            }
            Err(e) => {
                tracing::debug!("snapshot is not valid JSON: {e}");
                return None;
            }
        };
        serde_json::from_value(value)
            .map_err(|e| tracing::debug!("unexpected snapshot shape: {e}"))
            .ok()
    }

    /// Read the snapshot from stdin. An interactive terminal counts as no data.
    pub fn from_stdin() -> Option<Self> {
        let mut stdin = io::stdin();
        if stdin.is_terminal() {
            return None;
        }
        let mut raw = String::new();
        if let Err(e) = stdin.read_to_string(&mut raw) {
            tracing::debug!("failed to read stdin: {e}");
            return None;
        }
        Self::parse(&raw)
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| tracing::debug!("failed to read {}: {e}", path.display()))
            .ok()?;
        Self::parse(&raw)
    }

    /// Context window usage in whole percent, clamped to [0, 100].
    ///
    /// An explicit `used_percentage` wins. Otherwise the percentage is derived
    /// from the token counters and the window size; with no usable window
    /// size the result is 0.
    pub fn context_percent(&self) -> u32 {
        let window = &self.context_window;
        if let Some(pct) = window.used_percentage.filter(|p| p.is_finite()) {
            return clamp_percent(pct);
        }
        let size = match window.context_window_size {
            Some(size) if size > 0.0 => size,
            _ => return 0,
        };
        clamp_percent(window.current_usage.total() / size * 100.0)
    }

    /// Raw model identifier: `model.id`, else `model.display_name`.
    pub fn model_id(&self) -> &str {
        self.model
            .id
            .as_deref()
            .or(self.model.display_name.as_deref())
            .unwrap_or("unknown")
    }

    /// Human label for the active model.
    pub fn model_label(&self) -> String {
        model_label(self.model_id())
    }

    /// Host tool version, if non-empty.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

fn clamp_percent(pct: f64) -> u32 {
    pct.round().clamp(0.0, 100.0) as u32
}

static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:claude-)?(?P<family>opus|sonnet|haiku)-(?P<major>\d+)-(?P<minor>\d+)").unwrap()
});

/// Normalize `claude-opus-4-5-20251101` style ids to `Opus 4.5`.
/// Anything that does not match passes through unchanged.
pub fn model_label(id: &str) -> String {
    let Some(caps) = MODEL_RE.captures(id) else {
        return id.to_string();
    };
    let family = &caps["family"];
    let mut chars = family.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} {}.{}", name, &caps["major"], &caps["minor"])
}
