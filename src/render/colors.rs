//! Shared color palette for the status line.

use ratatui::style::Color;

// ── Context usage urgency ───────────────────────────────────────────
pub const CONTEXT_NORMAL: Color = Color::Green;
pub const CONTEXT_WARNING: Color = Color::Yellow;
pub const CONTEXT_CRITICAL: Color = Color::Red;

// ── Summary segments ────────────────────────────────────────────────
pub const LABEL: Color = Color::DarkGray;
pub const LINES_ADDED: Color = Color::Green;
pub const LINES_REMOVED: Color = Color::Red;
pub const AGENT_COUNT: Color = Color::Cyan;
pub const TODOS_DONE: Color = Color::Green;
pub const TODOS_PENDING: Color = Color::Yellow;

// ── Session cost ────────────────────────────────────────────────────
pub const COST_LOW: Color = Color::Green;
pub const COST_MID: Color = Color::Yellow;
pub const COST_HIGH: Color = Color::Red;

// ── Agent detail lines ──────────────────────────────────────────────
pub const BADGE_OPUS: Color = Color::Magenta;
pub const BADGE_HAIKU: Color = Color::Green;
pub const BADGE_DEFAULT: Color = Color::Cyan;
pub const BADGE_DONE: Color = Color::Green;
pub const AGENT_TYPE: Color = Color::White;
pub const AGENT_DESCRIPTION: Color = Color::DarkGray;
