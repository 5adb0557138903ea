//! A [`SceneList`]: the top-level render input, grouping several
//! [`Scene`]s under one root transform and computing the balanced shard
//! boundaries [`crate::raster::Renderer`] dispatches on (§4.2, §5).

use crate::{Bounds, Scene, Transform};

/// One render request: a sequence of scenes, each placed by its own
/// transform and optionally restricted to a clip rectangle, drawn under a
/// shared root transform (§4.2).
#[derive(Default, Debug)]
pub struct SceneList {
    scenes: Vec<Scene>,
    ctms: Vec<Transform>,
    clips: Vec<Option<Bounds>>,
    root_ctm: Transform,
    /// Whether any scene contains quadratic/cubic opcodes — lets the
    /// renderer skip curve-dispatch machinery entirely for polyline-only
    /// input (§4.2 step 1).
    use_curves: bool,
}

impl SceneList {
    #[must_use]
    pub fn new(root_ctm: Transform) -> Self {
        Self {
            root_ctm,
            ..Self::default()
        }
    }

    pub fn push_scene(&mut self, scene: Scene, ctm: Transform, clip: Option<Bounds>) -> usize {
        self.use_curves |= scene
            .paths()
            .iter()
            .any(|p| p.types().iter().any(|op| matches!(op, crate::Opcode::Quadratic | crate::Opcode::Cubic)));
        let index = self.scenes.len();
        self.scenes.push(scene);
        self.ctms.push(ctm);
        self.clips.push(clip);
        index
    }

    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    #[must_use]
    pub fn scene_ctm(&self, index: usize) -> Transform {
        self.root_ctm.concat(&self.ctms[index])
    }

    #[must_use]
    pub fn clip(&self, index: usize) -> Option<Bounds> {
        self.clips[index]
    }

    #[must_use]
    pub fn root_ctm(&self) -> Transform {
        self.root_ctm
    }

    #[must_use]
    pub fn use_curves(&self) -> bool {
        self.use_curves
    }

    /// Total opcode count across every scene — `Σ types.end` in the
    /// original, used both as the shard-balancing weight and as a coarse
    /// upper bound on output size (§4.2 step 3, §5).
    #[must_use]
    pub fn path_count(&self) -> usize {
        self.scenes.iter().map(Scene::weight).sum()
    }

    /// The flattened `(scene_index, item_index)` sequence every item in
    /// this list maps to, in the same order [`Self::shard_boundaries`]
    /// indexes into.
    #[must_use]
    pub fn items(&self) -> Vec<(usize, usize)> {
        self.scenes
            .iter()
            .enumerate()
            .flat_map(|(scene_idx, scene)| (0..scene.len()).map(move |item_idx| (scene_idx, item_idx)))
            .collect()
    }

    /// Device-space bounds across every scene, placed under its own CTM
    /// then the root CTM (§4.2 step 2).
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        crate::trace_function!();
        let mut acc = Bounds::EMPTY;
        for (i, scene) in self.scenes.iter().enumerate() {
            let scene_bounds = scene.bounds();
            if scene_bounds.is_empty() {
                continue;
            }
            let ctm = self.scene_ctm(i);
            let corners = [
                ctm.apply(scene_bounds.lx, scene_bounds.ly),
                ctm.apply(scene_bounds.ux, scene_bounds.ly),
                ctm.apply(scene_bounds.ux, scene_bounds.uy),
                ctm.apply(scene_bounds.lx, scene_bounds.uy),
            ];
            let mut placed = Bounds::EMPTY;
            for (x, y) in corners {
                placed = placed.extend(x, y);
            }
            acc = acc.union(&placed);
        }
        acc
    }

    /// Splits the combined `(scene_index, item_index)` item sequence into
    /// `shard_count` contiguous, load-balanced ranges by cumulative
    /// opcode weight, so every shard does roughly `path_count() /
    /// shard_count` units of subdivision work regardless of how items are
    /// skewed across scenes (§4.2 step 3, §5).
    #[must_use]
    pub fn shard_boundaries(&self, shard_count: usize) -> Vec<(usize, usize)> {
        let shard_count = shard_count.max(1);
        let items = self.items();

        if items.is_empty() {
            return Vec::new();
        }

        let weights: Vec<usize> = items
            .iter()
            .map(|&(scene_idx, item_idx)| self.scenes[scene_idx].paths()[item_idx].types().len())
            .collect();
        let total: usize = weights.iter().sum();
        let target = (total / shard_count).max(1);

        let mut boundaries = Vec::with_capacity(shard_count);
        let mut start = 0usize;
        let mut running = 0usize;
        for (i, &w) in weights.iter().enumerate() {
            running += w;
            let items_left_for_shard = boundaries.len() + 1 < shard_count;
            if running >= target && items_left_for_shard {
                boundaries.push((start, i + 1));
                start = i + 1;
                running = 0;
            }
        }
        if start < items.len() {
            boundaries.push((start, items.len()));
        }
        boundaries
    }
}
