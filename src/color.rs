use std::fmt;

/// Four octets `{b, g, r, a}` in storage order, with no premultiplication
/// at this layer (§3). This is the layout downstream shaders decode
/// directly out of the `Buffer` header, so field order must not change.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Colorant {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Colorant {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    #[must_use]
    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Whether this color is fully opaque, the gate used by the solid-cell
    /// fast path (§4.5 "Opacity test", §8 invariant 3).
    #[must_use]
    #[inline]
    pub const fn is_opaque(&self) -> bool {
        self.a == 255
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn with_opacity(&self, opacity: f32) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..*self
        }
    }
}

impl Default for Colorant {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Colorant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}
