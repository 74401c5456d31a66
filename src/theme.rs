use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Theme {
    pub sidebar_bg: Color,
    pub chat_bg: Color,
    pub input_bg: Color,
    pub input_disabled_bg: Color,
    pub status_bg: Color,
    pub text_fg: Color,
    pub muted_fg: Color,
    pub user_fg: Color,
    pub agent_fg: Color,
    pub notice_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            sidebar_bg: Color::Rgb(44, 44, 44),
            chat_bg: Color::Rgb(54, 54, 54),
            input_bg: Color::Rgb(62, 62, 62),
            input_disabled_bg: Color::Rgb(48, 48, 48),
            status_bg: Color::Rgb(36, 36, 36),
            text_fg: Color::Rgb(225, 225, 225),
            muted_fg: Color::Rgb(150, 150, 150),
            user_fg: Color::Rgb(120, 180, 235),
            agent_fg: Color::Rgb(150, 215, 150),
            notice_fg: Color::Rgb(240, 190, 90),
        }
    }
}

impl Theme {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path_ref = path.as_ref();
        match fs::read_to_string(path_ref) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(theme) => theme,
                Err(err) => {
                    warn!(path = %path_ref.display(), %err, "failed to parse theme file, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path_ref.display(), %err, "failed to read theme file, using defaults");
                Self::default()
            }
        }
    }

    /// Every color is optional; anything left out keeps its default.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let cfg: ThemeToml = toml::from_str(s)?;
        let defaults = Self::default();
        let colors = cfg.colors;
        let pick = |value: Option<RgbToml>, fallback: Color| value.map_or(fallback, RgbToml::to_color);
        Ok(Self {
            sidebar_bg: pick(colors.sidebar_bg, defaults.sidebar_bg),
            chat_bg: pick(colors.chat_bg, defaults.chat_bg),
            input_bg: pick(colors.input_bg, defaults.input_bg),
            input_disabled_bg: pick(colors.input_disabled_bg, defaults.input_disabled_bg),
            status_bg: pick(colors.status_bg, defaults.status_bg),
            text_fg: pick(colors.text_fg, defaults.text_fg),
            muted_fg: pick(colors.muted_fg, defaults.muted_fg),
            user_fg: pick(colors.user_fg, defaults.user_fg),
            agent_fg: pick(colors.agent_fg, defaults.agent_fg),
            notice_fg: pick(colors.notice_fg, defaults.notice_fg),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    #[serde(default)]
    colors: ThemeColorsToml,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeColorsToml {
    sidebar_bg: Option<RgbToml>,
    chat_bg: Option<RgbToml>,
    input_bg: Option<RgbToml>,
    input_disabled_bg: Option<RgbToml>,
    status_bg: Option<RgbToml>,
    text_fg: Option<RgbToml>,
    muted_fg: Option<RgbToml>,
    user_fg: Option<RgbToml>,
    agent_fg: Option<RgbToml>,
    notice_fg: Option<RgbToml>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RgbToml {
    r: u8,
    g: u8,
    b: u8,
}

impl RgbToml {
    fn to_color(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
