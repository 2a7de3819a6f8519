//! Cell presentation metadata
//!
//! The store carries a [`CellStyle`] on every node but never interprets it;
//! renderers read it back when drawing.

use std::fmt;

/// Presentation metadata attached to a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellStyle {
    /// Font family name
    pub font_family: String,
    /// Font size in pixels
    pub font_size: f64,
    /// Text color
    pub color: Color,
    /// Horizontal text alignment
    pub horizontal: HorizontalAlignment,
    /// Vertical text alignment
    pub vertical: VerticalAlignment,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 14.0,
            color: Color::BLACK,
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Middle,
        }
    }
}

impl CellStyle {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font family
    pub fn font_family<S: Into<String>>(mut self, name: S) -> Self {
        self.font_family = name.into();
        self
    }

    /// Set font size
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set text color
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set horizontal alignment
    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    /// Set vertical alignment
    pub fn vertical_alignment(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// RGB text color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Create an RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Create from a hex string (e.g., "#FF0000" or "FF0000")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color { r, g, b })
    }

    /// Convert to hex string (without # prefix)
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = CellStyle::default();
        assert_eq!(style.font_family, "Arial");
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.color, Color::BLACK);
        assert_eq!(style.horizontal, HorizontalAlignment::Center);
        assert_eq!(style.vertical, VerticalAlignment::Middle);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#FF8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("#FFF"), None);
        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102FF");
    }
}
