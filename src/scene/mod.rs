//! A [`Scene`]: the flat, parallel-array item table a single render pass
//! draws (§3, §4.2). Geometry is shared by reference count across items;
//! a per-scene path [`Cache`] deduplicates repeated content by hash.

mod cache;

pub use cache::Cache;

use bitflags::bitflags;
use rayon::prelude::*;

use crate::{Bounds, Colorant, GeometryRef, Transform, Transforms};

bitflags! {
    /// Per-item drawing flags (§3). Stored as a dense `u8` column rather
    /// than per-item bools so a shard can test/branch on a whole row at
    /// once.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ItemFlags: u8 {
        const INVISIBLE       = 0b0000_0001;
        const FILL_EVEN_ODD   = 0b0000_0010;
        const ROUND_CAP       = 0b0000_0100;
        const SQUARE_CAP      = 0b0000_1000;
    }
}

/// One drawable item: a shared path plus its placement and paint state.
/// `Scene` stores these fields as parallel columns rather than a `Vec` of
/// this struct; it exists for the ergonomic `add_path`/iteration API.
#[derive(Clone, Debug)]
pub struct Item {
    pub path: GeometryRef,
    pub ctm: Transform,
    pub color: Colorant,
    pub width: f32,
    pub flags: ItemFlags,
    pub clip: Option<Bounds>,
}

/// A flat table of drawable items sharing one coordinate space (§3). Items
/// are appended via [`Scene::add_path`]; geometry is deduplicated by
/// content hash through an internal [`Cache`] so repeated glyphs/tiles
/// only store one [`GeometryRef`] regardless of how many items draw them.
///
/// `ctms`/`colors`/`widths`/`flags` are each kept as two copies: `src`
/// (authoring state, as passed to [`Scene::add_path`]) and `dst`
/// (post-transfer state, what [`Scene::item`]/the accessors and the
/// render pipeline actually read). A "transfer function" run via
/// [`Scene::transfer`] rewrites `dst` in place without disturbing `src`,
/// so a caller can always recover the authored values with
/// [`Scene::reset_transfer`] (§3: "do not unify" — these stay genuinely
/// separate arrays, not one array with an undo log).
#[derive(Default, Debug)]
pub struct Scene {
    paths: Vec<GeometryRef>,
    src_ctms: Vec<Transform>,
    src_colors: Vec<Colorant>,
    src_widths: Vec<f32>,
    src_flags: Vec<ItemFlags>,
    dst_ctms: Vec<Transform>,
    dst_colors: Vec<Colorant>,
    dst_widths: Vec<f32>,
    dst_flags: Vec<ItemFlags>,
    clips: Vec<Option<Bounds>>,
    cache: Cache,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Appends a drawable item, deduplicating `path` against the scene's
    /// content-hash cache (§3, §8 invariant 6).
    pub fn add_path(
        &mut self,
        path: GeometryRef,
        ctm: Transform,
        color: Colorant,
        width: f32,
        flags: ItemFlags,
        clip: Option<Bounds>,
    ) -> usize {
        let path = self.cache.intern(path);
        // Prime the Point16 cache and the worst-case segment bound at
        // authoring time rather than paying for both lazily during the
        // parallel render pass (§4.2 step 2/3); both are memoized, so this
        // is a no-op on a cache hit.
        path.point16_cache();
        path.upper_bound(crate::geometry::K_MIN_UPPER_DET);
        let index = self.paths.len();
        self.paths.push(path);
        self.src_ctms.push(ctm);
        self.src_colors.push(color);
        self.src_widths.push(width);
        self.src_flags.push(flags);
        self.dst_ctms.push(ctm);
        self.dst_colors.push(color);
        self.dst_widths.push(width);
        self.dst_flags.push(flags);
        self.clips.push(clip);
        index
    }

    /// Builds the item from `dst` (post-transfer) state — what the render
    /// pipeline and hit-testing actually see.
    #[must_use]
    pub fn item(&self, index: usize) -> Item {
        Item {
            path: self.paths[index].clone(),
            ctm: self.dst_ctms[index],
            color: self.dst_colors[index],
            width: self.dst_widths[index],
            flags: self.dst_flags[index],
            clip: self.clips[index],
        }
    }

    #[must_use]
    pub fn paths(&self) -> &[GeometryRef] {
        &self.paths
    }

    #[must_use]
    pub fn ctms(&self) -> &[Transform] {
        &self.dst_ctms
    }

    #[must_use]
    pub fn colors(&self) -> &[Colorant] {
        &self.dst_colors
    }

    #[must_use]
    pub fn widths(&self) -> &[f32] {
        &self.dst_widths
    }

    #[must_use]
    pub fn flags(&self) -> &[ItemFlags] {
        &self.dst_flags
    }

    #[must_use]
    pub fn clips(&self) -> &[Option<Bounds>] {
        &self.clips
    }

    /// The item's state as originally authored via [`Self::add_path`],
    /// unaffected by any [`Self::transfer`] pass.
    #[must_use]
    pub fn src_item(&self, index: usize) -> Item {
        Item {
            path: self.paths[index].clone(),
            ctm: self.src_ctms[index],
            color: self.src_colors[index],
            width: self.src_widths[index],
            flags: self.src_flags[index],
            clip: self.clips[index],
        }
    }

    /// Runs a transfer function over every item's `dst` state, in place,
    /// without touching `src`. `f` receives the item index plus mutable
    /// references to that item's post-transfer ctm/color/width/flags.
    pub fn transfer<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &mut Transform, &mut Colorant, &mut f32, &mut ItemFlags),
    {
        for i in 0..self.paths.len() {
            f(i, &mut self.dst_ctms[i], &mut self.dst_colors[i], &mut self.dst_widths[i], &mut self.dst_flags[i]);
        }
    }

    /// Discards any prior transfer, resetting every item's `dst` state
    /// back to its authored `src` state.
    pub fn reset_transfer(&mut self) {
        self.dst_ctms.clone_from(&self.src_ctms);
        self.dst_colors.clone_from(&self.src_colors);
        self.dst_widths.clone_from(&self.src_widths);
        self.dst_flags.clone_from(&self.src_flags);
    }

    /// The device-space bounds of every visible item's transformed path,
    /// unioned in parallel (§3).
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        crate::trace_function!();
        (0..self.paths.len())
            .into_par_iter()
            .filter(|&i| !self.dst_flags[i].contains(ItemFlags::INVISIBLE))
            .map(|i| {
                let b = self.paths[i].bounds();
                let ctm = &self.dst_ctms[i];
                let corners = [
                    ctm.apply(b.lx, b.ly),
                    ctm.apply(b.ux, b.ly),
                    ctm.apply(b.ux, b.uy),
                    ctm.apply(b.lx, b.uy),
                ];
                corners.into_iter().fold(Bounds::EMPTY, |acc, (x, y)| acc.extend(x, y))
            })
            .reduce(|| Bounds::EMPTY, |a, b| a.union(&b))
    }

    /// A coarse cost estimate for shard balancing: the total opcode count
    /// across all visible items (§4.2 step 3, §5).
    #[must_use]
    pub fn weight(&self) -> usize {
        self.paths
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.dst_flags[*i].contains(ItemFlags::INVISIBLE))
            .map(|(_, p)| p.types().len())
            .sum()
    }

    /// Applies `t` to every item's placement transform in parallel,
    /// mirroring the teacher's `Layer::transform` (§3). This rewrites
    /// `dst` only, consistent with [`Self::transfer`] — `src_item` still
    /// reports the pre-transform placement.
    pub fn transform_items(&mut self, t: &Transform) {
        self.dst_ctms.par_iter_mut().for_each(|ctm| {
            *ctm = t.concat(ctm);
        });
    }
}

impl Transforms for Scene {
    fn transform(&mut self, t: &Transform) -> &mut Self {
        self.transform_items(t);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::GeometryBuilder;

    fn unit_square() -> GeometryRef {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0).line_to(1.0, 0.0).line_to(1.0, 1.0).line_to(0.0, 1.0).close();
        b.build()
    }

    #[test]
    fn test_add_path_and_item() {
        let mut scene = Scene::new();
        let idx = scene.add_path(
            unit_square(),
            Transform::IDENTITY,
            Colorant::BLACK,
            1.0,
            ItemFlags::empty(),
            None,
        );
        assert_eq!(idx, 0);
        assert_eq!(scene.len(), 1);
        let item = scene.item(0);
        assert_eq!(item.color, Colorant::BLACK);
    }

    #[test]
    fn test_bounds_union_across_items() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        scene.add_path(
            unit_square(),
            Transform::translate(5.0, 5.0),
            Colorant::BLACK,
            1.0,
            ItemFlags::empty(),
            None,
        );
        let b = scene.bounds();
        assert_eq!(b, Bounds::new(0.0, 0.0, 6.0, 6.0));
    }

    #[test]
    fn test_invisible_items_excluded_from_bounds() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        scene.add_path(
            unit_square(),
            Transform::translate(100.0, 100.0),
            Colorant::BLACK,
            1.0,
            ItemFlags::INVISIBLE,
            None,
        );
        let b = scene.bounds();
        assert_eq!(b, Bounds::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_weight_counts_opcodes() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        assert_eq!(scene.weight(), 5);
    }

    #[test]
    fn test_transfer_rewrites_dst_without_disturbing_src() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        scene.transfer(|_, ctm, color, _, _| {
            *ctm = Transform::translate(10.0, 0.0).concat(ctm);
            *color = Colorant::WHITE;
        });
        assert_eq!(scene.item(0).color, Colorant::WHITE);
        assert_eq!(scene.item(0).ctm, Transform::translate(10.0, 0.0));
        let src = scene.src_item(0);
        assert_eq!(src.color, Colorant::BLACK);
        assert_eq!(src.ctm, Transform::IDENTITY);
    }

    #[test]
    fn test_reset_transfer_restores_src_state() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        scene.transfer(|_, _, color, _, _| *color = Colorant::WHITE);
        scene.reset_transfer();
        assert_eq!(scene.item(0).color, Colorant::BLACK);
    }

    #[test]
    fn test_repeated_geometry_is_interned() {
        let mut scene = Scene::new();
        let a = unit_square();
        let b = unit_square();
        scene.add_path(a, Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        scene.add_path(b, Transform::IDENTITY, Colorant::BLACK, 1.0, ItemFlags::empty(), None);
        assert!(std::sync::Arc::ptr_eq(&scene.paths()[0], &scene.paths()[1]));
    }
}
