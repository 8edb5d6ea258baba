use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

use super::captions::StatusLevel;

/// Catppuccin flavour used for the whole TUI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    /// Dark
    #[default]
    Mocha,
    /// Light
    Latte,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub rosewater: Color,
    pub mauve: Color,
    pub red: Color,
    pub maroon: Color,
    pub peach: Color,
    pub yellow: Color,
    pub green: Color,
    pub teal: Color,
    pub sky: Color,
    pub sapphire: Color,
    pub blue: Color,
    pub lavender: Color,
    pub text: Color,
    pub subtext0: Color,
    pub overlay1: Color,
    pub overlay0: Color,
    pub surface1: Color,
    pub surface0: Color,
    pub base: Color,
    pub mantle: Color,
}

impl Theme {
    pub fn new(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Mocha => Self::mocha(),
            ThemeVariant::Latte => Self::latte(),
        }
    }

    fn mocha() -> Self {
        Self {
            rosewater: Color::Rgb(0xf5, 0xe0, 0xdc),
            mauve: Color::Rgb(0xcb, 0xa6, 0xf7),
            red: Color::Rgb(0xf3, 0x8b, 0xa8),
            maroon: Color::Rgb(0xeb, 0xa0, 0xac),
            peach: Color::Rgb(0xfa, 0xb3, 0x87),
            yellow: Color::Rgb(0xf9, 0xe2, 0xaf),
            green: Color::Rgb(0xa6, 0xe3, 0xa1),
            teal: Color::Rgb(0x94, 0xe2, 0xd5),
            sky: Color::Rgb(0x89, 0xdc, 0xeb),
            sapphire: Color::Rgb(0x74, 0xc7, 0xec),
            blue: Color::Rgb(0x89, 0xb4, 0xfa),
            lavender: Color::Rgb(0xb4, 0xbe, 0xfe),
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            subtext0: Color::Rgb(0xa6, 0xad, 0xc8),
            overlay1: Color::Rgb(0x7f, 0x84, 0x9c),
            overlay0: Color::Rgb(0x6c, 0x70, 0x86),
            surface1: Color::Rgb(0x45, 0x47, 0x5a),
            surface0: Color::Rgb(0x31, 0x32, 0x44),
            base: Color::Rgb(0x1e, 0x1e, 0x2e),
            mantle: Color::Rgb(0x18, 0x18, 0x25),
        }
    }

    fn latte() -> Self {
        Self {
            rosewater: Color::Rgb(0xdc, 0x8a, 0x78),
            mauve: Color::Rgb(0x88, 0x39, 0xef),
            red: Color::Rgb(0xd2, 0x0f, 0x39),
            maroon: Color::Rgb(0xe6, 0x45, 0x53),
            peach: Color::Rgb(0xfe, 0x64, 0x0b),
            yellow: Color::Rgb(0xdf, 0x8e, 0x1d),
            green: Color::Rgb(0x40, 0xa0, 0x2b),
            teal: Color::Rgb(0x17, 0x92, 0x99),
            sky: Color::Rgb(0x04, 0xa5, 0xe5),
            sapphire: Color::Rgb(0x20, 0x9f, 0xb5),
            blue: Color::Rgb(0x1e, 0x66, 0xf5),
            lavender: Color::Rgb(0x72, 0x87, 0xfd),
            text: Color::Rgb(0x4c, 0x4f, 0x69),
            subtext0: Color::Rgb(0x6c, 0x6f, 0x85),
            overlay1: Color::Rgb(0x8c, 0x8f, 0xa1),
            overlay0: Color::Rgb(0x9c, 0xa0, 0xb0),
            surface1: Color::Rgb(0xbc, 0xc0, 0xcc),
            surface0: Color::Rgb(0xcc, 0xd0, 0xda),
            base: Color::Rgb(0xef, 0xf1, 0xf5),
            mantle: Color::Rgb(0xe6, 0xe9, 0xef),
        }
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.red)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.yellow)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.green)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.teal)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.overlay1)
    }

    pub fn title_style(&self) -> Style {
        Style::default().fg(self.blue).add_modifier(Modifier::BOLD)
    }

    /// Highlighted row or button
    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.base)
            .bg(self.lavender)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_style(&self, level: StatusLevel) -> Style {
        match level {
            StatusLevel::Info => self.info_style(),
            StatusLevel::Success => self.success_style(),
            StatusLevel::Warning => self.warning_style(),
            StatusLevel::Error => self.error_style(),
        }
    }

    /// Accent for dialog borders and titles
    pub fn dialog_accent(&self, destructive: bool) -> Color {
        if destructive { self.red } else { self.blue }
    }

    /// Stable badge colour for an instance name
    pub fn instance_color(&self, instance: &str) -> Color {
        let palette = [
            self.mauve,
            self.peach,
            self.green,
            self.teal,
            self.sapphire,
            self.lavender,
            self.maroon,
            self.sky,
        ];
        let mut hasher = DefaultHasher::new();
        instance.hash(&mut hasher);
        palette[(hasher.finish() % palette.len() as u64) as usize]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_color_is_stable() {
        let theme = Theme::default();
        assert_eq!(theme.instance_color("prod"), theme.instance_color("prod"));
    }

    #[test]
    fn test_variant_parses_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            theme: ThemeVariant,
        }
        let parsed: Wrapper = toml::from_str("theme = \"latte\"").unwrap();
        assert_eq!(parsed.theme, ThemeVariant::Latte);
    }
}
