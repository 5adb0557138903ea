//! Per-shard rendering context (§4.2, §4.8): walks one contiguous range
//! of `(scene, item)` pairs, subdividing/clipping each item's geometry and
//! writing the resulting coverage edges, stroke segments, placement
//! instances, and per-item [`Header`] rows into a shard-local [`Buffer`].

use crate::clip::{self, Visitor};
use crate::raster::allocator::{Allocator, PrimitiveKind};
use crate::raster::buffer::{Buffer, Edge, EntryTag, Header, Instance, InstanceTag, Opaque};
use crate::raster::curve_indexer::{CurveIndexer, KFH, K_COVER_SCALE};
use crate::raster::outliner;
use crate::scene::ItemFlags;
use crate::{Bounds, Colorant, Geometry, Opcode, RenderConfig, SceneList, Transform};

/// Full vertical+horizontal coverage within one fat row, the denominator
/// against which a raw signed delta is turned into a `[0, 1]` fraction.
const K_FULL_ROW_COVERAGE: f32 = KFH as f32 * K_COVER_SCALE;

/// Per-item paint/clip state, indexed by the sequential `path_index`
/// assigned in [`Context::draw_list`] — looked up again in [`Context::flush_rows`]
/// once every item in the shard has been walked and its edges accumulated.
struct ItemMeta {
    color: Colorant,
    even_odd: bool,
    clip_bounds: Bounds,
}

#[must_use]
fn has_curves(path: &Geometry) -> bool {
    path.types().iter().any(|op| matches!(op, Opcode::Quadratic | Opcode::Cubic))
}

struct EdgeCollector<'a> {
    indexer: &'a mut CurveIndexer,
    path_index: u32,
}

impl Visitor for EdgeCollector<'_> {
    fn line(&mut self, p0: (f32, f32), p1: (f32, f32)) {
        self.indexer.add_edge(self.path_index, p0, p1);
    }
}

struct PolylineCollector {
    points: Vec<(f32, f32)>,
    closed: Vec<bool>,
}

impl Visitor for PolylineCollector {
    fn line(&mut self, p0: (f32, f32), _p1: (f32, f32)) {
        if self.points.last() != Some(&p0) {
            self.points.push(p0);
        }
    }

    fn close(&mut self, closed: bool) {
        self.points.push((f32::NAN, f32::NAN)); // subpath separator
        self.closed.push(closed);
    }
}

/// One shard's worth of rasterization state: a private [`CurveIndexer`]
/// and [`Allocator`], writing into a private [`Buffer`] that the
/// [`super::Renderer`] later concatenates in shard order (§5, §8
/// invariant: shard-order-independent final output).
pub struct Context {
    indexer: CurveIndexer,
    allocator: Allocator,
    buffer: Buffer,
    item_meta: Vec<ItemMeta>,
}

impl Context {
    #[must_use]
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            indexer: CurveIndexer::new(),
            allocator: Allocator::new(),
            buffer: Buffer::with_capacity(buffer_capacity),
            item_meta: Vec::new(),
        }
    }

    /// Renders the `(scene_index, item_index)` pairs in `items` from
    /// `scene_list`, under `config`. Returns the populated shard buffer.
    pub fn draw_list(
        mut self,
        scene_list: &SceneList,
        items: &[(usize, usize)],
        config: &RenderConfig,
    ) -> Result<Buffer, crate::BufferError> {
        crate::trace_function!();

        for (idx, &(scene_idx, item_idx)) in items.iter().enumerate() {
            let scene = &scene_list.scenes()[scene_idx];
            let item = scene.item(item_idx);
            if item.flags.contains(ItemFlags::INVISIBLE) {
                continue;
            }

            let path_index = idx as u32;
            let ctm = scene_list.scene_ctm(scene_idx).concat(&item.ctm);
            let clip_bounds = item.clip.or_else(|| scene_list.clip(scene_idx)).unwrap_or(Bounds::new(
                f32::MIN / 2.0,
                f32::MIN / 2.0,
                f32::MAX / 2.0,
                f32::MAX / 2.0,
            ));
            let clip_ctm = clip_bounds.quad(&Transform::IDENTITY);
            let even_odd = item.flags.contains(ItemFlags::FILL_EVEN_ODD);

            self.buffer.header_mut().push(item.color, ctm, clip_ctm, item.width, clip_bounds);
            self.item_meta.push(ItemMeta { color: item.color, even_odd, clip_bounds });

            let mut tags = InstanceTag::empty();
            if even_odd {
                tags |= InstanceTag::EVEN_ODD;
            }
            if item.flags.contains(ItemFlags::ROUND_CAP) {
                tags |= InstanceTag::ROUND_CAP;
            }
            if item.flags.contains(ItemFlags::SQUARE_CAP) {
                tags |= InstanceTag::SQUARE_CAP;
            }
            if item.width > 0.0 {
                tags |= InstanceTag::OUTLINES;
            }
            self.buffer.push(
                Instance { ctm, color: item.color, iz: Instance::pack_iz(path_index, tags) },
                path_index,
                EntryTag::Instances,
            )?;

            if item.width > 0.0 {
                self.draw_stroke(&item, ctm, &clip_bounds, config, path_index)?;
            } else {
                self.draw_fill(&item, ctm, &clip_bounds, config, path_index)?;
            }
        }

        self.flush_rows()?;
        Ok(self.buffer)
    }

    /// A fill dispatches to the cached-Point16 "molecule" fast path (§4.8
    /// step 3) when the item's whole device-space footprint fits within
    /// one molecule tile and isn't cut down further by the clip rect;
    /// otherwise it falls through to the general subdivide/accumulate path.
    fn draw_fill(
        &mut self,
        item: &crate::scene::Item,
        ctm: crate::Transform,
        clip_bounds: &Bounds,
        config: &RenderConfig,
        path_index: u32,
    ) -> Result<(), crate::BufferError> {
        let b = item.path.bounds();
        let corners = [ctm.apply(b.lx, b.ly), ctm.apply(b.ux, b.ly), ctm.apply(b.ux, b.uy), ctm.apply(b.lx, b.uy)];
        let dev_bounds = corners.into_iter().fold(Bounds::EMPTY, |acc, (x, y)| acc.extend(x, y));

        let fits_molecule = dev_bounds.width() <= crate::raster::allocator::K_MOLECULE_HEIGHT
            && dev_bounds.height() <= crate::raster::allocator::K_MOLECULE_HEIGHT
            && clip_bounds.contains(dev_bounds.lx, dev_bounds.ly)
            && clip_bounds.contains(dev_bounds.ux, dev_bounds.uy);

        if fits_molecule {
            item.path.point16_cache(); // memoized; built eagerly at add_path time already
            let kind = if has_curves(&item.path) { PrimitiveKind::QuadMolecules } else { PrimitiveKind::FastMolecules };
            let tag = if has_curves(&item.path) { EntryTag::QuadMolecules } else { EntryTag::FastMolecules };
            let mut tags = InstanceTag::MOLECULE;
            if item.flags.contains(ItemFlags::FILL_EVEN_ODD) {
                tags |= InstanceTag::EVEN_ODD;
            }
            let offset = self.buffer.bytes_used() as u32;
            self.buffer.push(
                Instance { ctm, color: item.color, iz: Instance::pack_iz(path_index, tags) },
                path_index,
                tag,
            )?;
            self.allocator.assign(dev_bounds.height().max(1.0), dev_bounds.width().max(1.0), kind, offset);
            return Ok(());
        }

        let mut collector = EdgeCollector { indexer: &mut self.indexer, path_index };
        clip::divide_geometry(
            &item.path,
            &ctm,
            clip_bounds,
            config.flatness,
            config.cubic_policy,
            false,
            true,
            false,
            &mut collector,
        );
        Ok(())
    }

    fn draw_stroke(
        &mut self,
        item: &crate::scene::Item,
        ctm: crate::Transform,
        clip_bounds: &Bounds,
        config: &RenderConfig,
        path_index: u32,
    ) -> Result<(), crate::BufferError> {
        // Presize the flattened-point buffer from the path's precomputed
        // worst-case segment bound (§4.8 step 3) instead of growing it by
        // doubling during the walk.
        let upper = item.path.upper_bound(ctm.det().abs()) as usize;
        let mut collector = PolylineCollector { points: Vec::with_capacity(upper), closed: Vec::new() };
        clip::divide_geometry(
            &item.path,
            &ctm,
            clip_bounds,
            config.flatness,
            config.cubic_policy,
            true,
            false,
            false,
            &mut collector,
        );

        let kind = if has_curves(&item.path) { PrimitiveKind::QuadOutlines } else { PrimitiveKind::FastOutlines };
        let subpaths: Vec<_> = collector.points.split(|p| p.0.is_nan()).collect();
        for (subpath, closed) in subpaths.into_iter().zip(collector.closed.iter().copied()) {
            if subpath.len() < 2 {
                continue;
            }
            let bounds = subpath.iter().fold(Bounds::EMPTY, |acc, &(x, y)| acc.extend(x, y));
            for segment in outliner::outline(subpath, item.width, closed) {
                let offset = self.buffer.bytes_used() as u32;
                self.buffer.push(segment, path_index, EntryTag::Segment)?;
                self.allocator.assign(bounds.height(), bounds.width().max(1.0), kind, offset);
            }
        }
        Ok(())
    }

    /// Fraction of the fat row's full area covered by a raw signed
    /// `level`, folded through the item's fill rule (§4.5).
    #[must_use]
    fn coverage_frac(level: i32, even_odd: bool) -> f32 {
        let w = (level as f32 / K_FULL_ROW_COVERAGE).abs();
        if even_odd {
            let m = w.rem_euclid(2.0);
            if m > 1.0 { 2.0 - m } else { m }
        } else {
            w.min(1.0)
        }
    }

    /// A span is eligible for `Opaque` emission, rather than a per-column
    /// `Edge`, only when its paint is fully opaque, its coverage is
    /// saturated, and the cell it covers sits inside the item's clip
    /// rectangle (within a small epsilon, to absorb the row-boundary
    /// rounding inherent in fat-row accumulation).
    #[must_use]
    fn is_opaque_cell(meta: &ItemMeta, row: i32, x0: u32, x1: u32, frac: f32) -> bool {
        if !meta.color.is_opaque() || frac < 0.999 {
            return false;
        }
        let y0 = (row * KFH as i32) as f32;
        let y1 = y0 + KFH as f32;
        let tolerant = meta.clip_bounds.inset(1e-2, 1e-2);
        tolerant.contains(x0 as f32, y0) && tolerant.contains(x1 as f32, y1)
    }

    /// §4.5's Instance-writer: for each fat row, settle every path's
    /// independent winding runs into merged, classified spans and emit
    /// either a solid [`Opaque`] or a fractional-coverage [`Edge`] record
    /// per span (never both — transparent spans emit nothing).
    fn flush_rows(&mut self) -> Result<(), crate::BufferError> {
        for row in self.indexer.rows() {
            for path_index in self.indexer.path_indices_in_row(row) {
                let Some(meta) = self.item_meta.get(path_index as usize) else { continue };
                let (indices, uxcovers) = self.indexer.finalize_row(row, path_index);
                if indices.is_empty() {
                    continue;
                }

                // (x0, x1, fraction, opaque?) per non-transparent run, with
                // adjacent runs of identical classification pre-merged.
                let mut pending: Option<(u32, u32, f32, bool)> = None;
                for i in 0..indices.len() {
                    let level = uxcovers[i];
                    if level == 0 {
                        continue;
                    }
                    let x0 = indices[i];
                    let x1 = indices.get(i + 1).copied().unwrap_or(x0 + 1);
                    if x1 <= x0 {
                        continue;
                    }
                    let frac = Self::coverage_frac(level, meta.even_odd);
                    if frac <= 0.0 {
                        continue;
                    }
                    let opaque = Self::is_opaque_cell(meta, row, x0, x1, frac);

                    match &mut pending {
                        Some((px0, px1, pfrac, popaque)) if *px1 == x0 && *popaque == opaque && (opaque || (*pfrac - frac).abs() < 1e-3) => {
                            *px1 = x1;
                        }
                        _ => {
                            if let Some(span) = pending.replace((x0, x1, frac, opaque)) {
                                self.emit_span(row, path_index, meta, span)?;
                            }
                        }
                    }
                }
                if let Some(span) = pending {
                    self.emit_span(row, path_index, meta, span)?;
                }
            }
        }
        Ok(())
    }

    fn emit_span(
        &mut self,
        row: i32,
        path_index: u32,
        meta: &ItemMeta,
        (x0, x1, frac, opaque): (u32, u32, f32, bool),
    ) -> Result<(), crate::BufferError> {
        let mut tags = InstanceTag::EDGE;
        if meta.even_odd {
            tags |= InstanceTag::EVEN_ODD;
        }
        let offset = self.buffer.bytes_used() as u32;
        if opaque {
            tags = InstanceTag::SOLID_CELL;
            if meta.even_odd {
                tags |= InstanceTag::EVEN_ODD;
            }
            let y0 = (row * KFH as i32) as f32;
            let y1 = y0 + KFH as f32;
            self.buffer.push(
                Opaque {
                    iz: Instance::pack_iz(path_index, tags),
                    base: (frac * K_FULL_ROW_COVERAGE) as i32,
                    lx: x0.min(u16::MAX as u32) as u16,
                    ly: y0.max(0.0).min(u16::MAX as f32) as u16,
                    ux: x1.min(u16::MAX as u32) as u16,
                    uy: y1.max(0.0).min(u16::MAX as f32) as u16,
                    ox: 0,
                    oy: 0,
                    cover: (frac * i16::MAX as f32) as i16,
                    _pad: 0,
                },
                path_index,
                EntryTag::Opaques,
            )?;
        } else {
            self.buffer.push(
                Edge::new(row, x0.min(u16::MAX as u32) as u16, (frac * u16::MAX as f32) as u16, false, false),
                path_index,
                EntryTag::FastEdges,
            )?;
            let width = (x1 - x0).max(1) as f32;
            self.allocator.assign(KFH as f32, width, PrimitiveKind::FastEdges, offset);
        }
        Ok(())
    }
}
