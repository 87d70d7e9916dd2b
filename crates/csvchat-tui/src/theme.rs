//! Color palettes for the dark and light themes.

use csvchat_config::ThemeMode;
use ratatui::style::Color;

/// Colors used by every widget in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_active: Color,
    pub surface: Color,
    pub badge_text: Color,
    pub error: Color,
}

const DARK: Palette = Palette {
    primary: Color::Rgb(236, 91, 43),
    secondary: Color::Rgb(238, 121, 72),
    text: Color::Rgb(238, 238, 238),
    text_muted: Color::Rgb(128, 128, 128),
    border: Color::Rgb(60, 60, 60),
    border_active: Color::Rgb(238, 121, 72),
    surface: Color::Rgb(20, 20, 20),
    badge_text: Color::Rgb(10, 10, 10),
    error: Color::Rgb(255, 110, 110),
};

const LIGHT: Palette = Palette {
    primary: Color::Rgb(200, 70, 25),
    secondary: Color::Rgb(37, 99, 235),
    text: Color::Rgb(30, 30, 30),
    text_muted: Color::Rgb(110, 110, 110),
    border: Color::Rgb(200, 200, 200),
    border_active: Color::Rgb(37, 99, 235),
    surface: Color::Rgb(250, 250, 250),
    badge_text: Color::Rgb(255, 255, 255),
    error: Color::Rgb(190, 30, 30),
};

pub fn palette(theme: ThemeMode) -> &'static Palette {
    match theme {
        ThemeMode::Dark => &DARK,
        ThemeMode::Light => &LIGHT,
    }
}
