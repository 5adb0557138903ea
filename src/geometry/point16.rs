//! The quantized "Point16" cache: a fixed-point, 16-bit-per-coordinate
//! shadow of a [`Geometry`]'s point stream, grouped into fixed-size runs
//! of [`KFAST_SEGMENTS`] segments for the solid-cell / molecule fast path
//! (§4.1, §4.8).

use super::{Geometry, Opcode};

/// Number of opcodes per Point16 group. Groups that divide evenly into
/// this size are candidates for the opaque-fast-path "molecule" dispatch.
pub const KFAST_SEGMENTS: usize = 4;

/// One quantized coordinate pair. Each axis is encoded in 16 bits: 14 bits
/// of magnitude (`[0, 16383)` for x, `[0, 32767)` for y — y gets the extra
/// bit since curve-class flags are stashed in x's top 2 bits) plus 2 flag
/// bits in `x` identifying the opcode this point terminates.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Point16 {
    pub x: u16,
    pub y: u16,
}

impl Point16 {
    const MAGNITUDE_BITS: u32 = 14;
    const MAGNITUDE_MASK: u16 = (1 << Self::MAGNITUDE_BITS) - 1;

    #[must_use]
    pub fn quantize(x: f32, y: f32, bounds_lo: (f32, f32), bounds_scale: (f32, f32), flags: u8) -> Self {
        let qx = (((x - bounds_lo.0) * bounds_scale.0).clamp(0.0, f32::from(Self::MAGNITUDE_MASK))) as u16;
        let qy = (((y - bounds_lo.1) * bounds_scale.1).clamp(0.0, f32::from(Self::MAGNITUDE_MASK))) as u16;
        Self {
            x: qx | (u16::from(flags & 0b11) << Self::MAGNITUDE_BITS),
            y: qy,
        }
    }

    #[must_use]
    pub const fn magnitude(self) -> (u16, u16) {
        (self.x & Self::MAGNITUDE_MASK, self.y)
    }

    #[must_use]
    pub const fn flags(self) -> u8 {
        (self.x >> Self::MAGNITUDE_BITS) as u8
    }
}

/// A built Point16 cache: quantized points plus group-end markers so
/// consumers can locate each run of up to [`KFAST_SEGMENTS`] opcodes.
#[derive(Debug, Default)]
pub struct Point16Cache {
    pub points: Vec<Point16>,
    /// Index (exclusive end, into `points`) of each opcode group's last
    /// entry — one entry per group of up to `KFAST_SEGMENTS` opcodes.
    pub p16ends: Vec<u32>,
}

impl Point16Cache {
    #[must_use]
    pub fn build(geometry: &Geometry) -> Self {
        let bounds = geometry.bounds();
        let w = bounds.width().max(f32::EPSILON);
        let h = bounds.height().max(f32::EPSILON);
        let lo = (bounds.lx, bounds.ly);
        let scale = (
            f32::from(Point16::MAGNITUDE_MASK) / w,
            f32::from(Point16::MAGNITUDE_MASK) / h,
        );

        let mut points = Vec::with_capacity(geometry.points().len() / 2);
        let mut p16ends = Vec::new();

        let coords = geometry.points();
        let mut coord_idx = 0usize;
        for (i, op) in geometry.types().iter().enumerate() {
            let n = op.point_count();
            for _ in 0..n {
                let x = coords[coord_idx];
                let y = coords[coord_idx + 1];
                coord_idx += 2;
                points.push(Point16::quantize(x, y, lo, scale, flags_for(*op)));
            }
            if (i + 1) % KFAST_SEGMENTS == 0 {
                p16ends.push(points.len() as u32);
            }
        }
        if p16ends.last().copied() != Some(points.len() as u32) && !points.is_empty() {
            p16ends.push(points.len() as u32);
        }

        Self { points, p16ends }
    }
}

const fn flags_for(op: Opcode) -> u8 {
    match op {
        Opcode::Move => 0,
        Opcode::Line | Opcode::Close => 1,
        Opcode::Quadratic => 2,
        Opcode::Cubic => 3,
    }
}
