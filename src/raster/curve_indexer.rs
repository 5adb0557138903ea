//! Fat-row scanline coverage accumulation (§4.4, §11).
//!
//! Device space is binned into "fat rows" [`KFH`] pixels tall rather than
//! one bin per scanline, trading a little extra per-row bookkeeping for
//! far fewer bins to walk on sparse scenes. Within a row, each clipped
//! line segment contributes a signed coverage delta at the pixel column
//! it occupies, keyed by the owning path's index so that two overlapping
//! fills never settle a shared winding number — each path's deltas sort
//! and prefix-sum independently in [`CurveIndexer::finalize_row`].

use std::collections::HashMap;

use super::sort::sort_by_key_u32;

/// Fat row height, in device pixels.
pub const KFH: u32 = 16;

/// Fixed-point scale for coverage accumulation: one fully-covered pixel
/// row contributes exactly this much signed area.
pub const K_COVER_SCALE: f32 = 2047.937_5;

#[derive(Default)]
struct Row {
    // path_index -> column -> signed coverage delta
    deltas: HashMap<u32, HashMap<i32, f32>>,
}

/// Accumulates per-row, per-path signed coverage from clipped line
/// segments, then compiles each `(row, path)` pair into sorted `(x,
/// cumulative_cover)` runs.
#[derive(Default)]
pub struct CurveIndexer {
    rows: HashMap<i32, Row>,
}

impl CurveIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row_of(y: f32) -> i32 {
        (y / KFH as f32).floor() as i32
    }

    /// Adds one clipped, device-space edge `p0 -> p1` belonging to
    /// `path_index`, splitting it across every fat row it crosses and
    /// accumulating a coverage delta at the column it occupies in each
    /// row.
    pub fn add_edge(&mut self, path_index: u32, p0: (f32, f32), p1: (f32, f32)) {
        if p0.1 == p1.1 {
            return; // horizontal edges contribute zero vertical coverage
        }
        let (lo, hi, dir) = if p0.1 < p1.1 { (p0, p1, 1.0f32) } else { (p1, p0, -1.0f32) };

        let row_lo = Self::row_of(lo.1);
        let row_hi = Self::row_of(hi.1 - f32::EPSILON).max(row_lo);

        let dy_total = hi.1 - lo.1;
        let dx_total = hi.0 - lo.0;

        for row in row_lo..=row_hi {
            let row_y0 = (row * KFH as i32) as f32;
            let row_y1 = row_y0 + KFH as f32;
            let y0 = lo.1.max(row_y0);
            let y1 = hi.1.min(row_y1);
            if y1 <= y0 {
                continue;
            }
            let t0 = (y0 - lo.1) / dy_total;
            let t1 = (y1 - lo.1) / dy_total;
            let x_mid = lo.0 + dx_total * (t0 + t1) * 0.5;
            let column = x_mid.floor() as i32;

            let coverage = (y1 - y0) * K_COVER_SCALE * dir;
            *self
                .rows
                .entry(row)
                .or_default()
                .deltas
                .entry(path_index)
                .or_default()
                .entry(column)
                .or_insert(0.0) += coverage;
        }
    }

    /// Compiles `path_index`'s accumulated deltas within `row` into
    /// ascending `(indices, uxcovers)` runs: `uxcovers[i]` is the constant
    /// coverage level over `[indices[i], indices[i + 1])` (or to
    /// infinity, for the last run).
    #[must_use]
    pub fn finalize_row(&self, row: i32, path_index: u32) -> (Vec<u32>, Vec<i32>) {
        let Some(deltas) = self.rows.get(&row).and_then(|r| r.deltas.get(&path_index)) else {
            return (Vec::new(), Vec::new());
        };
        if deltas.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut keys: Vec<u32> = Vec::with_capacity(deltas.len());
        let mut values: Vec<i32> = Vec::with_capacity(deltas.len());
        for (&col, &delta) in deltas {
            // Columns are relative to an arbitrary origin; shift so the
            // radix sort (which operates on unsigned keys) sees a
            // non-negative range. A shard never spans more than 2^20
            // device pixels, so this bias is always safe.
            keys.push((col + (1 << 20)) as u32);
            values.push((delta.round()) as i32);
        }
        sort_by_key_u32(&mut keys, &mut values);

        let mut indices = Vec::with_capacity(keys.len());
        let mut uxcovers = Vec::with_capacity(keys.len());
        let mut running = 0i32;
        for (k, v) in keys.into_iter().zip(values) {
            running += v;
            indices.push((k as i64 - (1 << 20)) as u32);
            uxcovers.push(running);
        }
        (indices, uxcovers)
    }

    #[must_use]
    pub fn rows(&self) -> Vec<i32> {
        let mut rows: Vec<i32> = self.rows.keys().copied().collect();
        rows.sort_unstable();
        rows
    }

    /// Every path index with at least one recorded delta in `row`,
    /// ascending.
    #[must_use]
    pub fn path_indices_in_row(&self, row: i32) -> Vec<u32> {
        let Some(r) = self.rows.get(&row) else {
            return Vec::new();
        };
        let mut paths: Vec<u32> = r.deltas.keys().copied().collect();
        paths.sort_unstable();
        paths
    }
}
