//! Turn derived session state into the status line text.
//!
//! Rendering builds ratatui [`Line`]s of styled [`Span`]s first, so tests can
//! assert on colors directly; [`ansi`] encodes them for the terminal.

pub mod ansi;
pub mod colors;

use chrono::{DateTime, Utc};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{HudConfig, Layout, Limits, Thresholds};
use crate::snapshot::CostCounters;
use crate::tracking::{AgentTask, DerivedState};

/// Everything the renderer reads for one refresh.
#[derive(Debug, Clone, Copy)]
pub struct StatusInput<'a> {
    pub state: &'a DerivedState,
    pub context_percent: u32,
    pub model_label: &'a str,
    pub version: Option<&'a str>,
    pub cost: &'a CostCounters,
}

/// A rendered refresh: one summary line and zero or more agent lines.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBlock {
    pub summary: Line<'static>,
    pub details: Vec<Line<'static>>,
}

impl StatusBlock {
    /// Encode the block, newline-terminated.
    pub fn to_text(&self, color: bool) -> String {
        let mut out = ansi::encode_line(&self.summary, color);
        out.push('\n');
        for line in &self.details {
            out.push_str(&ansi::encode_line(line, color));
            out.push('\n');
        }
        out
    }

    /// Shown when the host supplied no usable snapshot.
    pub fn placeholder() -> Self {
        Self {
            summary: Line::from(Span::styled("[HUD] waiting for data...", dim())),
            details: Vec::new(),
        }
    }

    /// Single-line diagnostic for an unexpected failure.
    pub fn error(message: &str) -> Self {
        let first_line = message.lines().next().unwrap_or_default();
        Self {
            summary: Line::from(format!("[HUD] error: {first_line}")),
            details: Vec::new(),
        }
    }
}

/// Urgency band of the context usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    /// Lower bounds are inclusive.
    pub fn for_percent(pct: u32, thresholds: &Thresholds) -> Self {
        if pct >= thresholds.critical_percent {
            Urgency::Critical
        } else if pct >= thresholds.warn_percent {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }

    pub fn color(self) -> Color {
        match self {
            Urgency::Normal => colors::CONTEXT_NORMAL,
            Urgency::Warning => colors::CONTEXT_WARNING,
            Urgency::Critical => colors::CONTEXT_CRITICAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    thresholds: Thresholds,
    limits: Limits,
    layout: Layout,
}

impl Renderer {
    pub fn new(config: &HudConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            limits: config.limits,
            layout: config.layout,
        }
    }

    pub fn render(&self, input: &StatusInput<'_>, now: DateTime<Utc>) -> StatusBlock {
        StatusBlock {
            summary: self.summary_line(input, now),
            details: self.detail_lines(input.state, now),
        }
    }

    fn summary_line(&self, input: &StatusInput<'_>, now: DateTime<Utc>) -> Line<'static> {
        let mut parts: Vec<Vec<Span<'static>>> = Vec::new();

        let urgency = Urgency::for_percent(input.context_percent, &self.thresholds);
        parts.push(vec![
            Span::styled("Ctx:", fg(colors::LABEL)),
            Span::raw(" "),
            Span::styled(format!("{}%", input.context_percent), fg(urgency.color())),
        ]);

        let added = input.cost.lines_added();
        let removed = input.cost.lines_removed();
        if added + removed > 0 {
            parts.push(vec![
                Span::styled(format!("+{added}"), fg(colors::LINES_ADDED)),
                Span::styled("/", dim()),
                Span::styled(format!("-{removed}"), fg(colors::LINES_REMOVED)),
            ]);
        }

        if self.layout.show_cost {
            if let Some(usd) = input.cost.total_cost_usd.filter(|c| *c > 0.0) {
                parts.push(vec![Span::styled(format!("${usd:.2}"), fg(cost_color(usd)))]);
            }
        }

        let elapsed_ms = match input.state.session_start {
            Some(start) => Some((now - start).num_milliseconds()),
            None => input
                .cost
                .total_duration_ms
                .filter(|ms| *ms > 0.0)
                .map(|ms| ms as i64),
        };
        if let Some(ms) = elapsed_ms {
            parts.push(vec![Span::styled(format_duration(ms), dim())]);
        }

        let running = input.state.running_count();
        if running > 0 {
            let noun = if running > 1 { "agents" } else { "agent" };
            parts.push(vec![Span::styled(
                format!("{running} {noun}"),
                fg(colors::AGENT_COUNT),
            )]);
        }

        if !input.state.todos.is_empty() {
            let done = input.state.todos_done();
            let total = input.state.todos.len();
            let color = if done == total {
                colors::TODOS_DONE
            } else {
                colors::TODOS_PENDING
            };
            parts.push(vec![Span::styled(format!("{done}/{total} todos"), fg(color))]);
        }

        parts.push(vec![Span::styled(input.model_label.to_string(), dim())]);
        if let Some(version) = input.version {
            parts.push(vec![Span::styled(format!("v{version}"), dim())]);
        }

        let mut spans = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
                spans.push(Span::styled("|", dim()));
                spans.push(Span::raw(" "));
            }
            spans.extend(part);
        }
        Line::from(spans)
    }

    fn detail_lines(&self, state: &DerivedState, now: DateTime<Utc>) -> Vec<Line<'static>> {
        let listed: Vec<&AgentTask> = state
            .agents
            .iter()
            .filter(|a| a.is_running() || self.layout.show_completed)
            .take(self.limits.max_detail_lines)
            .collect();

        let last = listed.len().saturating_sub(1);
        listed
            .iter()
            .enumerate()
            .map(|(i, agent)| self.agent_line(agent, i == last, now))
            .collect()
    }

    fn agent_line(&self, agent: &AgentTask, is_last: bool, now: DateTime<Utc>) -> Line<'static> {
        let prefix = if is_last { "└─" } else { "├─" };
        let running = agent.is_running();

        let elapsed = match (running, agent.end_time) {
            (false, Some(end)) => end - agent.start_time,
            _ => now - agent.start_time,
        };

        let badge = if running {
            model_badge(agent.model.as_deref())
        } else {
            Span::styled("✓", fg(colors::BADGE_DONE))
        };

        let type_name = if agent.agent_type.is_empty() {
            "agent"
        } else {
            agent.agent_type.as_str()
        };
        let type_style = if running { fg(colors::AGENT_TYPE) } else { dim() };

        Line::from(vec![
            Span::styled(prefix, dim()),
            Span::raw(" "),
            badge,
            Span::raw(" "),
            Span::styled(pad_to_width(type_name, self.layout.type_width), type_style),
            Span::raw(" "),
            Span::styled(
                format!("{:>5}", format_duration(elapsed.num_milliseconds())),
                dim(),
            ),
            Span::raw("   "),
            Span::styled(
                truncate_to_width(&agent.description, self.layout.description_width),
                fg(colors::AGENT_DESCRIPTION),
            ),
        ])
    }
}

fn fg(color: Color) -> Style {
    Style::default().fg(color)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn model_badge(model: Option<&str>) -> Span<'static> {
    match model {
        Some("opus") => Span::styled("O", fg(colors::BADGE_OPUS)),
        Some("haiku") => Span::styled("h", fg(colors::BADGE_HAIKU)),
        _ => Span::styled("s", fg(colors::BADGE_DEFAULT)),
    }
}

fn cost_color(usd: f64) -> Color {
    if usd >= 5.0 {
        colors::COST_HIGH
    } else if usd >= 1.0 {
        colors::COST_MID
    } else {
        colors::COST_LOW
    }
}

/// Format elapsed milliseconds using the two most significant units:
/// `1h01m`, `2m05s`, `45s`. Negative values read as zero.
pub fn format_duration(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Cut `s` to at most `width` terminal columns.
fn truncate_to_width(s: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Cut or pad `s` to exactly `width` terminal columns.
fn pad_to_width(s: &str, width: usize) -> String {
    let mut out = truncate_to_width(s, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}
