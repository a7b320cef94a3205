//! Encode styled spans as terminal escape sequences.

use std::fmt::Write;

use crossterm::style::{Attribute, Color as TermColor, ContentStyle, StyledContent};
use ratatui::style::{Color, Modifier};
use ratatui::text::{Line, Span};

/// Write a line as text. With `color` off, styles are dropped.
pub fn encode_line(line: &Line<'_>, color: bool) -> String {
    let mut out = String::new();
    for span in &line.spans {
        if color {
            let _ = write!(out, "{}", styled(span));
        } else {
            out.push_str(&span.content);
        }
    }
    out
}

fn styled<'a>(span: &'a Span<'_>) -> StyledContent<&'a str> {
    let mut style = ContentStyle::new();
    style.foreground_color = span.style.fg.map(term_color);
    let modifiers = span.style.add_modifier;
    if modifiers.contains(Modifier::BOLD) {
        style.attributes.set(Attribute::Bold);
    }
    if modifiers.contains(Modifier::DIM) {
        style.attributes.set(Attribute::Dim);
    }
    StyledContent::new(style, span.content.as_ref())
}

/// Same mapping the crossterm backend uses: the plain names are the normal
/// ANSI colors, the `Light*` names are the bright ones.
fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}
