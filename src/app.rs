//! One status line refresh: snapshot in, text out.

use chrono::{DateTime, Utc};

use crate::config::HudConfig;
use crate::ingest::tail::read_transcript;
use crate::render::{Renderer, StatusBlock, StatusInput};
use crate::snapshot::Snapshot;
use crate::tracking::{reconstruct, DerivedState};

/// Holds the configuration for a single invocation.
#[derive(Debug, Clone)]
pub struct App {
    pub config: HudConfig,
    renderer: Renderer,
}

impl App {
    pub fn new(config: HudConfig) -> Self {
        let renderer = Renderer::new(&config);
        Self { config, renderer }
    }

    /// Rebuild session state from the snapshot's transcript, if it names one.
    pub fn derive_state(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> DerivedState {
        let Some(path) = snapshot.transcript_path() else {
            return DerivedState::default();
        };
        let transcript = read_transcript(path, &self.config.limits);
        tracing::debug!(
            lines = transcript.lines.len(),
            tailed = transcript.first_record.is_some(),
            "transcript loaded"
        );
        reconstruct(&transcript, self.config.limits, now)
    }

    /// Render a refresh. `None` means the host gave us nothing to show.
    pub fn refresh(&self, snapshot: Option<&Snapshot>, now: DateTime<Utc>) -> StatusBlock {
        let Some(snapshot) = snapshot else {
            return StatusBlock::placeholder();
        };
        let state = self.derive_state(snapshot, now);
        let model_label = snapshot.model_label();
        let input = StatusInput {
            state: &state,
            context_percent: snapshot.context_percent(),
            model_label: &model_label,
            version: snapshot.version(),
            cost: &snapshot.cost,
        };
        self.renderer.render(&input, now)
    }

    /// Render a refresh to text, honoring the color setting.
    pub fn refresh_text(&self, snapshot: Option<&Snapshot>, now: DateTime<Utc>) -> String {
        self.refresh(snapshot, now).to_text(self.config.layout.color)
    }
}

#[cfg(test)]
#[path = "../tests/helpers/mod.rs"]
#[allow(dead_code)]
mod helpers;
