use std::str::FromStr;

use crossterm::style::{Color, Stylize};
use serde::Deserialize;

/// How a progress line is rendered before each task.
///
/// - `Bar`: fixed-width progress bar plus percentage and position.
/// - `Percentage`: percentage plus position.
/// - `Plain`: "Running task X (i/N)".
///
/// Any unrecognised style name falls back to `Plain` instead of being rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProgressStyle {
    #[default]
    Bar,
    Percentage,
    Plain,
}

impl From<&str> for ProgressStyle {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bar" => ProgressStyle::Bar,
            "percentage" => ProgressStyle::Percentage,
            _ => ProgressStyle::Plain,
        }
    }
}

impl From<String> for ProgressStyle {
    fn from(s: String) -> Self {
        ProgressStyle::from(s.as_str())
    }
}

/// Highlight color for task and completion lines.
///
/// Parsed from a color name (`green`, `cyan`, ...). `"none"` and unknown names
/// both disable coloring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum HighlightColor {
    None,
    #[default]
    Green,
    Cyan,
    Yellow,
    Blue,
    Magenta,
    Red,
    White,
}

impl FromStr for HighlightColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(HighlightColor::None),
            "green" => Ok(HighlightColor::Green),
            "cyan" => Ok(HighlightColor::Cyan),
            "yellow" => Ok(HighlightColor::Yellow),
            "blue" => Ok(HighlightColor::Blue),
            "magenta" => Ok(HighlightColor::Magenta),
            "red" => Ok(HighlightColor::Red),
            "white" => Ok(HighlightColor::White),
            other => Err(format!("unknown highlight color: {other}")),
        }
    }
}

impl From<String> for HighlightColor {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(HighlightColor::None)
    }
}

impl HighlightColor {
    /// Bright terminal color for this highlight, or `None` when disabled.
    pub fn terminal_color(self) -> Option<Color> {
        match self {
            HighlightColor::None => None,
            HighlightColor::Green => Some(Color::Green),
            HighlightColor::Cyan => Some(Color::Cyan),
            HighlightColor::Yellow => Some(Color::Yellow),
            HighlightColor::Blue => Some(Color::Blue),
            HighlightColor::Magenta => Some(Color::Magenta),
            HighlightColor::Red => Some(Color::Red),
            HighlightColor::White => Some(Color::White),
        }
    }

    pub fn is_enabled(self) -> bool {
        self.terminal_color().is_some()
    }

    /// Wrap `message` in this color's escape codes (no-op when disabled).
    pub fn paint(self, message: String, bold: bool) -> String {
        match self.terminal_color() {
            None => message,
            Some(color) if bold => message.with(color).bold().to_string(),
            Some(color) => message.with(color).to_string(),
        }
    }
}
