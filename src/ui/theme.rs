//! Colour palette and text styles used across the UI.
//!
//! Colours are RGB (not named ANSI) so opacity blending can interpolate
//! channel values.

use ratatui::style::{Color, Modifier, Style};

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    /// Terminal background the fades blend toward.
    pub const BACKGROUND: Color = Color::Rgb(16, 16, 24);

    pub const TAG: Color = Color::Rgb(95, 215, 255);
    pub const ID: Color = Color::Rgb(255, 175, 95);
    pub const CLASS: Color = Color::Rgb(175, 255, 135);
    pub const TEXT: Color = Color::Rgb(220, 220, 220);
    pub const HIDDEN_HINT: Color = Color::Rgb(110, 110, 110);

    pub fn selected_style() -> Style {
        Style::default()
            .bg(Color::Rgb(60, 60, 80))
            .add_modifier(Modifier::BOLD)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }
}

/// Blend `fg` toward `bg` by `opacity` (1.0 = fully `fg`, 0.0 = fully `bg`).
/// Non-RGB colors are passed through untouched — there is nothing to
/// interpolate between palette indices.
pub fn blend(fg: Color, bg: Color, opacity: f32) -> Color {
    let t = opacity.clamp(0.0, 1.0);
    match (fg, bg) {
        (Color::Rgb(fr, fg_, fb), Color::Rgb(br, bg_, bb)) => Color::Rgb(
            lerp(br, fr, t),
            lerp(bg_, fg_, t),
            lerp(bb, fb, t),
        ),
        _ => fg,
    }
}

fn lerp(from: u8, to: u8, t: f32) -> u8 {
    (from as f32 + (to as f32 - from as f32) * t).round() as u8
}
