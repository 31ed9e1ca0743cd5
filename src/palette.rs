//! Hecate color palette and semantic roles.

use ratatui::style::Color;

pub const HECATE_VIOLET_RGB: (u8, u8, u8) = (148, 103, 224); // #9467E0
pub const HECATE_TORCH_RGB: (u8, u8, u8) = (240, 180, 92);
pub const HECATE_MOON_RGB: (u8, u8, u8) = (176, 196, 222);
pub const HECATE_NIGHT_RGB: (u8, u8, u8) = (16, 12, 28);
pub const HECATE_DUSK_RGB: (u8, u8, u8) = (28, 22, 46);
pub const HECATE_EMBER_RGB: (u8, u8, u8) = (224, 92, 108);

pub const HECATE_VIOLET: Color = Color::Rgb(
    HECATE_VIOLET_RGB.0,
    HECATE_VIOLET_RGB.1,
    HECATE_VIOLET_RGB.2,
);
pub const HECATE_TORCH: Color = Color::Rgb(
    HECATE_TORCH_RGB.0,
    HECATE_TORCH_RGB.1,
    HECATE_TORCH_RGB.2,
);
pub const HECATE_MOON: Color =
    Color::Rgb(HECATE_MOON_RGB.0, HECATE_MOON_RGB.1, HECATE_MOON_RGB.2);
pub const HECATE_NIGHT: Color = Color::Rgb(
    HECATE_NIGHT_RGB.0,
    HECATE_NIGHT_RGB.1,
    HECATE_NIGHT_RGB.2,
);
pub const HECATE_DUSK: Color =
    Color::Rgb(HECATE_DUSK_RGB.0, HECATE_DUSK_RGB.1, HECATE_DUSK_RGB.2);
pub const HECATE_EMBER: Color = Color::Rgb(
    HECATE_EMBER_RGB.0,
    HECATE_EMBER_RGB.1,
    HECATE_EMBER_RGB.2,
);

pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_MUTED: Color = Color::DarkGray;
pub const TEXT_DIM: Color = Color::Gray;

pub const STATUS_HEALTHY: Color = HECATE_VIOLET;
pub const STATUS_DEGRADED: Color = HECATE_TORCH;
pub const STATUS_ERROR: Color = HECATE_EMBER;

// Mode badge accents
pub const MODE_NORMAL: Color = Color::Gray;
pub const MODE_INSERT: Color = Color::Rgb(110, 190, 120);
pub const MODE_COMMAND: Color = HECATE_TORCH;
pub const MODE_OVERLAY: Color = HECATE_VIOLET;

pub const SELECTION_BG: Color = Color::Rgb(52, 40, 86);
pub const COMPOSER_BG: Color = HECATE_DUSK;
pub const BORDER_COLOR: Color = Color::Rgb(72, 58, 112);

/// Theme names accepted by `/theme` and settings.
pub const THEME_NAMES: &[&str] = &["torch", "moon", "dusk"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiTheme {
    pub name: &'static str,
    pub accent: Color,
    pub composer_bg: Color,
    pub selection_bg: Color,
    pub header_bg: Color,
}

pub fn ui_theme(name: &str) -> UiTheme {
    match name.to_ascii_lowercase().as_str() {
        "moon" => UiTheme {
            name: "moon",
            accent: HECATE_MOON,
            composer_bg: HECATE_NIGHT,
            selection_bg: Color::Rgb(40, 52, 78),
            header_bg: HECATE_NIGHT,
        },
        "dusk" => UiTheme {
            name: "dusk",
            accent: HECATE_TORCH,
            composer_bg: Color::Rgb(38, 28, 52),
            selection_bg: Color::Rgb(66, 48, 96),
            header_bg: HECATE_DUSK,
        },
        _ => UiTheme {
            name: "torch",
            accent: HECATE_VIOLET,
            composer_bg: COMPOSER_BG,
            selection_bg: SELECTION_BG,
            header_bg: HECATE_NIGHT,
        },
    }
}

/// True if `name` resolves to a theme rather than falling back to the default.
pub fn is_theme_name(name: &str) -> bool {
    THEME_NAMES.contains(&name.to_ascii_lowercase().as_str())
}
