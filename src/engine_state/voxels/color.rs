//! # Voxel Colors
//!
//! Normalized RGB colors and the hexadecimal parsing used by the color palette.
//!
//! Every `Rgb` value holds channels in `[0, 1]`. Constructors clamp out-of-range
//! input and map non-finite input to `0.0`, so nothing downstream ever sees a
//! channel the rasterizer cannot represent.

/// Color substituted for malformed hexadecimal input.
pub const DEFAULT_COLOR: Rgb = Rgb {
    r: 1.0,
    g: 0.0,
    b: 0.0,
};

/// A normalized, opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    r: f32,
    g: f32,
    b: f32,
}

impl Rgb {
    /// Creates a color, clamping each channel into `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: clamp_channel(r),
            g: clamp_channel(g),
            b: clamp_channel(b),
        }
    }

    /// Creates a color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn r(&self) -> f32 {
        self.r
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    /// RGBA with alpha fixed to `1.0`.
    pub fn to_rgba(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

fn clamp_channel(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Parses a `#rrggbb` triplet (the `#` is optional, digits are case-insensitive).
///
/// Returns `None` for anything else.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();

    Some(Rgb::from_rgb8(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Parses a hexadecimal color, falling back to `DEFAULT_COLOR` on malformed input.
///
/// # Examples
///
/// ```
/// use voxel_renderer::{hex_to_rgb, Rgb};
///
/// assert_eq!(hex_to_rgb("#00ff00"), Rgb::new(0.0, 1.0, 0.0));
/// assert_eq!(hex_to_rgb("not-a-color"), Rgb::new(1.0, 0.0, 0.0));
/// ```
pub fn hex_to_rgb(hex: &str) -> Rgb {
    parse_hex(hex).unwrap_or_else(|| {
        log::warn!("Malformed color {:?}, using default {:?}", hex, DEFAULT_COLOR);
        DEFAULT_COLOR
    })
}

/// Colors selectable from the keyboard.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Rgb>,
    selected: usize,
}

impl Palette {
    /// Builds a palette from hexadecimal entries. Malformed entries become the default color.
    /// An empty list yields a single-entry palette holding the default color.
    pub fn from_hex<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut colors: Vec<Rgb> = entries.iter().map(|hex| hex_to_rgb(hex.as_ref())).collect();
        if colors.is_empty() {
            colors.push(DEFAULT_COLOR);
        }

        Self {
            colors,
            selected: 0,
        }
    }

    /// Selects the color at `index`. Out-of-range indices leave the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<Rgb> {
        let color = *self.colors.get(index)?;
        self.selected = index;
        Some(color)
    }

    pub fn selected(&self) -> Rgb {
        self.colors[self.selected]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }
}
