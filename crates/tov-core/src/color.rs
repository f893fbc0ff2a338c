//! Fill color specifications.
//!
//! Layers store their color as the string the UI handed us (`#ff6b6b`,
//! `rgba(0, 0, 0, 0.4)`, `white`). Backends that paint pixels themselves
//! parse it into a [`Color`]; backends that speak CSS pass the string through.

use serde::{Deserialize, Serialize};
use winnow::ascii::{float, space0};
use winnow::combinator::{alt, delimited, preceded, separated, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a CSS-style color spec: hex, `rgb()`, `rgba()` or a named color.
    /// Surrounding whitespace is ignored. Returns `None` for anything else.
    pub fn parse(spec: &str) -> Option<Self> {
        delimited(space0, parse_color_spec, space0).parse(spec).ok()
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let digits = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();

        let mut rgba = [255u8; 4];
        match hex.len() {
            3 | 4 => {
                for (i, slot) in rgba.iter_mut().enumerate().take(hex.len()) {
                    *slot = digits(i..i + 1)? * 17;
                }
            }
            6 | 8 => {
                for (i, slot) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
                    *slot = digits(i * 2..i * 2 + 2)?;
                }
            }
            _ => return None,
        }
        let [r, g, b, a] = rgba;
        Some(Self::from_rgba8(r, g, b, a))
    }

    /// Quantize to 8-bit channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// CSS `rgba()` form, for backends that take color strings.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("rgba({r}, {g}, {b}, {})", self.a.clamp(0.0, 1.0))
    }

    /// Build from `rgb()`/`rgba()` channel values: 0–255 for color, 0–1 for alpha.
    fn from_channels(channels: &[f32]) -> Option<Self> {
        let color = |v: f32| (v.is_finite() && (0.0..=255.0).contains(&v)).then_some(v / 255.0);
        let (r, g, b) = (color(channels[0])?, color(channels[1])?, color(channels[2])?);
        let a = match channels.get(3) {
            Some(&a) if a.is_finite() => a.clamp(0.0, 1.0),
            Some(_) => return None,
            None => 1.0,
        };
        Some(Self::rgba(r, g, b, a))
    }
}

fn named_color(name: &str) -> Option<Color> {
    let hex = match name.to_ascii_lowercase().as_str() {
        "transparent" => return Some(Color::TRANSPARENT),
        "black" => "#000000",
        "white" => "#ffffff",
        "red" => "#ff0000",
        "green" => "#008000",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "orange" => "#ffa500",
        "purple" => "#800080",
        "pink" => "#ffc0cb",
        "gray" | "grey" => "#808080",
        "gold" => "#ffd700",
        "cyan" => "#00ffff",
        "magenta" => "#ff00ff",
        _ => return None,
    };
    Color::from_hex(hex)
}

// ─── Parsers ─────────────────────────────────────────────────────────────

fn parse_color_spec(input: &mut &str) -> ModalResult<Color> {
    alt((parse_hex_color, parse_rgb_function, parse_named_color)).parse_next(input)
}

fn parse_hex_color(input: &mut &str) -> ModalResult<Color> {
    preceded('#', take_while(1..=8, |c: char| c.is_ascii_hexdigit()))
        .verify_map(Color::from_hex)
        .parse_next(input)
}

fn parse_channel(input: &mut &str) -> ModalResult<f32> {
    float.parse_next(input)
}

fn parse_rgb_function(input: &mut &str) -> ModalResult<Color> {
    (
        terminated(alt(("rgba", "rgb")), (space0, '(', space0)),
        separated(3..=4, parse_channel, (space0, ',', space0)),
        preceded(space0, ')'),
    )
        .verify_map(|(_, channels, _): (&str, Vec<f32>, char)| Color::from_channels(&channels))
        .parse_next(input)
}

fn parse_named_color(input: &mut &str) -> ModalResult<Color> {
    take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify_map(named_color)
        .parse_next(input)
}
