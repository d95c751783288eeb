use std::collections::HashSet;

use ratatui::style::Color;

use super::ThemeName;

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    names: HashSet<ThemeName>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.names.contains(theme)
    }

    pub fn all(&self) -> impl Iterator<Item = &ThemeName> {
        self.names.iter()
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let names = [ThemeName::Dark, ThemeName::Light, ThemeName::HighContrast]
            .into_iter()
            .collect();
        Self { names }
    }
}

/// Palette handed to every draw function. Colours are RGB so cards can be
/// faded towards `background` while they animate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    pub pinned: Color,
    pub selected: Color,
    pub danger: Color,
    pub highlight: Color,
}

impl Theme {
    pub fn for_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self {
                background: Color::Rgb(24, 24, 28),
                text: Color::Rgb(230, 230, 235),
                muted: Color::Rgb(140, 140, 150),
                accent: Color::Rgb(97, 175, 239),
                border: Color::Rgb(80, 80, 92),
                pinned: Color::Rgb(229, 192, 123),
                selected: Color::Rgb(152, 195, 121),
                danger: Color::Rgb(224, 108, 117),
                highlight: Color::Rgb(255, 214, 102),
            },
            ThemeName::Light => Self {
                background: Color::Rgb(250, 250, 250),
                text: Color::Rgb(40, 42, 54),
                muted: Color::Rgb(120, 120, 130),
                accent: Color::Rgb(64, 120, 242),
                border: Color::Rgb(200, 200, 208),
                pinned: Color::Rgb(193, 132, 1),
                selected: Color::Rgb(80, 161, 79),
                danger: Color::Rgb(202, 18, 67),
                highlight: Color::Rgb(152, 104, 1),
            },
            ThemeName::HighContrast => Self {
                background: Color::Rgb(0, 0, 0),
                text: Color::Rgb(255, 255, 255),
                muted: Color::Rgb(200, 200, 200),
                accent: Color::Rgb(0, 255, 255),
                border: Color::Rgb(255, 255, 255),
                pinned: Color::Rgb(255, 255, 0),
                selected: Color::Rgb(0, 255, 0),
                danger: Color::Rgb(255, 64, 64),
                highlight: Color::Rgb(255, 0, 255),
            },
        }
    }

    /// Blend `color` towards the background. `alpha` 1.0 keeps `color`.
    pub fn fade(&self, color: Color, alpha: f32) -> Color {
        let alpha = alpha.clamp(0.0, 1.0);
        match (color, self.background) {
            (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => Color::Rgb(
                mix(br, r, alpha),
                mix(bg, g, alpha),
                mix(bb, b, alpha),
            ),
            _ => color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::for_name(ThemeName::Dark)
    }
}

fn mix(from: u8, to: u8, t: f32) -> u8 {
    let value = f32::from(from) + (f32::from(to) - f32::from(from)) * t;
    value.round().clamp(0.0, 255.0) as u8
}
