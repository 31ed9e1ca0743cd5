//! Palette audit tests to prevent color drift.
//!
//! These tests ensure that raw brand colors (HECATE_VIOLET, HECATE_TORCH,
//! HECATE_MOON, HECATE_EMBER) are not used directly in user-visible code.
//! Accents reach the screen through semantic aliases (STATUS_HEALTHY,
//! STATUS_ERROR, MODE_COMMAND, ...) or the active theme, so a rebrand
//! touches palette.rs and nothing else.

use std::fs;
use std::path::Path;

use ratatui::style::Color;

#[path = "../src/palette.rs"]
#[allow(dead_code)]
mod palette;

/// Colors that should not be used directly in TUI code.
/// Use semantic aliases (STATUS_HEALTHY, MODE_COMMAND, etc.) or the theme.
const DEPRECATED_DIRECT_COLORS: &[&str] = &[
    "HECATE_VIOLET",
    "HECATE_TORCH",
    "HECATE_MOON",
    "HECATE_EMBER",
];

/// Patterns that indicate proper usage (in palette.rs definitions)
const ALLOWED_PATTERNS: &[&str] = &[
    "pub const HECATE_VIOLET",
    "pub const HECATE_TORCH",
    "pub const HECATE_MOON",
    "pub const HECATE_EMBER",
    "_RGB",
];

fn color_to_rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::White => (255, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (169, 169, 169),
        Color::Red => (255, 0, 0),
        Color::LightRed => (255, 102, 102),
        Color::Green => (0, 255, 0),
        Color::LightGreen => (102, 255, 102),
        Color::Yellow => (255, 255, 0),
        Color::LightYellow => (255, 255, 153),
        Color::Blue => (0, 0, 255),
        Color::LightBlue => (102, 153, 255),
        Color::Magenta => (255, 0, 255),
        Color::LightMagenta => (255, 153, 255),
        Color::Cyan => (0, 255, 255),
        Color::LightCyan => (153, 255, 255),
        _ => panic!("unsupported color variant for contrast test: {:?}", color),
    }
}

fn linearize_srgb(component: u8) -> f64 {
    let srgb = f64::from(component) / 255.0;
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

fn relative_luminance(color: Color) -> f64 {
    let (r, g, b) = color_to_rgb(color);
    0.2126 * linearize_srgb(r) + 0.7152 * linearize_srgb(g) + 0.0722 * linearize_srgb(b)
}

fn contrast_ratio(foreground: Color, background: Color) -> f64 {
    let fg = relative_luminance(foreground);
    let bg = relative_luminance(background);
    if fg >= bg {
        (fg + 0.05) / (bg + 0.05)
    } else {
        (bg + 0.05) / (fg + 0.05)
    }
}

fn assert_min_contrast(label: &str, foreground: Color, background: Color, min_ratio: f64) {
    let ratio = contrast_ratio(foreground, background);
    assert!(
        ratio >= min_ratio,
        "{label} contrast {ratio:.2} is below minimum {min_ratio:.2}"
    );
}

/// Audit a single file for deprecated color usage.
fn audit_file(path: &Path, violations: &mut Vec<String>) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (line_num, line) in content.lines().enumerate() {
        for deprecated in DEPRECATED_DIRECT_COLORS {
            // Check for palette::DEPRECATED usage
            let pattern = format!("palette::{}", deprecated);
            if line.contains(&pattern) {
                // Skip if this is an allowed pattern (definition)
                let is_allowed = ALLOWED_PATTERNS.iter().any(|p| line.contains(p));
                if !is_allowed {
                    violations.push(format!(
                        "{}:{}: direct use of {} (use semantic alias instead)",
                        path.display(),
                        line_num + 1,
                        deprecated
                    ));
                }
            }
        }
    }
}

/// Recursively audit a directory for deprecated color usage.
fn audit_directory(dir: &Path, violations: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            audit_directory(&path, violations);
        } else if path.extension().is_some_and(|e| e == "rs") {
            // Skip palette.rs itself (where colors are defined)
            if path.file_name().is_some_and(|n| n == "palette.rs") {
                continue;
            }
            audit_file(&path, violations);
        }
    }
}

#[test]
fn audit_no_direct_brand_color_usage() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let src_dir = Path::new(manifest_dir).join("src");
    let mut violations = Vec::new();

    audit_directory(&src_dir, &mut violations);

    if !violations.is_empty() {
        let report = violations.join("\n");
        panic!(
            "Palette audit failed! Found {} direct uses of raw brand colors:\n{}",
            violations.len(),
            report
        );
    }
}

#[test]
fn verify_status_colors_route_through_aliases() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let palette_path = Path::new(manifest_dir).join("src/palette.rs");
    let content = fs::read_to_string(&palette_path).expect("Failed to read palette.rs");

    assert!(
        content.contains("pub const STATUS_HEALTHY: Color = HECATE_VIOLET;"),
        "STATUS_HEALTHY should alias HECATE_VIOLET"
    );
    assert!(
        content.contains("pub const STATUS_DEGRADED: Color = HECATE_TORCH;"),
        "STATUS_DEGRADED should alias HECATE_TORCH"
    );
    assert!(
        content.contains("pub const STATUS_ERROR: Color = HECATE_EMBER;"),
        "STATUS_ERROR should alias HECATE_EMBER"
    );
}

#[test]
fn verify_brand_colors_defined() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let palette_path = Path::new(manifest_dir).join("src/palette.rs");
    let content = fs::read_to_string(&palette_path).expect("Failed to read palette.rs");

    // Verify primary brand colors are defined (check for the constant names with values)
    assert!(
        content.contains("HECATE_VIOLET_RGB: (u8, u8, u8) = (148, 103, 224);"),
        "HECATE_VIOLET should be #9467E0"
    );
    assert!(
        content.contains("HECATE_TORCH_RGB: (u8, u8, u8) = (240, 180, 92);"),
        "HECATE_TORCH should be #F0B45C"
    );
    assert!(
        content.contains("HECATE_EMBER_RGB: (u8, u8, u8) = (224, 92, 108);"),
        "HECATE_EMBER should be #E05C6C"
    );
    assert!(
        content.contains("HECATE_NIGHT_RGB: (u8, u8, u8) = (16, 12, 28);"),
        "HECATE_NIGHT should be #100C1C"
    );
}

#[test]
fn contrast_guardrails_for_key_ui_pairs() {
    let min_readable = 4.5;

    assert_min_contrast(
        "TEXT_PRIMARY on HECATE_NIGHT",
        palette::TEXT_PRIMARY,
        palette::HECATE_NIGHT,
        min_readable,
    );
    assert_min_contrast(
        "TEXT_MUTED on HECATE_NIGHT",
        palette::TEXT_MUTED,
        palette::HECATE_NIGHT,
        min_readable,
    );
    assert_min_contrast(
        "TEXT_DIM on HECATE_NIGHT",
        palette::TEXT_DIM,
        palette::HECATE_NIGHT,
        min_readable,
    );
    assert_min_contrast(
        "STATUS_HEALTHY on HECATE_NIGHT",
        palette::STATUS_HEALTHY,
        palette::HECATE_NIGHT,
        min_readable,
    );
    assert_min_contrast(
        "STATUS_DEGRADED on HECATE_NIGHT",
        palette::STATUS_DEGRADED,
        palette::HECATE_NIGHT,
        min_readable,
    );
    assert_min_contrast(
        "STATUS_ERROR on HECATE_NIGHT",
        palette::STATUS_ERROR,
        palette::HECATE_NIGHT,
        min_readable,
    );

    // The mode badge inverts: night text on the mode accent.
    for (label, accent) in [
        ("MODE_NORMAL", palette::MODE_NORMAL),
        ("MODE_INSERT", palette::MODE_INSERT),
        ("MODE_COMMAND", palette::MODE_COMMAND),
        ("MODE_OVERLAY", palette::MODE_OVERLAY),
    ] {
        assert_min_contrast(
            &format!("HECATE_NIGHT badge text on {label}"),
            palette::HECATE_NIGHT,
            accent,
            min_readable,
        );
    }

    for theme in palette::THEME_NAMES {
        let theme = palette::ui_theme(theme);
        assert_min_contrast(
            &format!("TEXT_PRIMARY on {} selection", theme.name),
            palette::TEXT_PRIMARY,
            theme.selection_bg,
            min_readable,
        );
        assert_min_contrast(
            &format!("TEXT_PRIMARY on {} composer", theme.name),
            palette::TEXT_PRIMARY,
            theme.composer_bg,
            min_readable,
        );
    }
}
