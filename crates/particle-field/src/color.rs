//! RGB colors for particle vertex data
//!
//! Components are stored in linear space. 8-bit values (panel pickers, the
//! `#rrggbb` defaults) are sRGB-encoded and converted on the way in and out,
//! so gradients are interpolated in linear light and an sRGB surface encodes
//! them exactly once.

/// Linear RGB color with components in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Color from sRGB-encoded 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        let linear = |c: u8| srgb_to_linear(f32::from(c) / 255.0);
        Self::rgb(linear(r), linear(g), linear(b))
    }

    /// sRGB-encoded 8-bit channels
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Linear interpolation towards `other`; `t` is not clamped.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
