//! The top-level parallel renderer (§5): splits a [`SceneList`] into
//! `shard_count` balanced shards, renders each on a fixed-size worker
//! pool, and concatenates the results in shard order — not completion
//! order — so the final [`Buffer`] is identical regardless of scheduling
//! (§8 invariant: deterministic output).

use rayon::prelude::*;

use crate::raster::{Buffer, Context};
use crate::{BufferError, RenderConfig, SceneList};

/// Stateless entry point: owns no data itself, just drives
/// [`Context::draw_list`] across a fixed [`rayon::ThreadPool`] (§5, §10.3).
pub struct Renderer;

impl Renderer {
    /// Renders `scene_list` into one [`Buffer`] of at most `capacity`
    /// bytes. Shards run concurrently on a pool sized to
    /// `config.shard_count`; each shard's own buffer is capped at an even
    /// share of `capacity` plus the header slop a single giant item can
    /// need, then copied into the final buffer at its deterministic
    /// offset.
    pub fn render_list(scene_list: &SceneList, config: &RenderConfig, capacity: usize) -> Result<Buffer, BufferError> {
        crate::trace_function!();

        let items = scene_list.items();
        let boundaries = scene_list.shard_boundaries(config.shard_count);
        if boundaries.is_empty() {
            return Ok(Buffer::with_capacity(capacity));
        }

        let per_shard_capacity = capacity / boundaries.len().max(1);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.shard_count)
            .build()
            .expect("fixed-size shard pool must build");

        let shard_buffers: Vec<Result<Buffer, BufferError>> = pool.install(|| {
            boundaries
                .par_iter()
                .map(|&(lo, hi)| {
                    let shard_items = &items[lo..hi];
                    let ctx = Context::new(per_shard_capacity);
                    ctx.draw_list(scene_list, shard_items, config)
                })
                .collect()
        });

        let mut out = Buffer::with_capacity(capacity);
        for result in shard_buffers {
            let shard = result?;
            out.append(&shard)?;
        }

        assert!(
            out.capacity() >= out.bytes_used(),
            "renderer wrote past its reserved buffer capacity"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Colorant, GeometryBuilder, ItemFlags, Scene, Transform};

    fn unit_square() -> crate::GeometryRef {
        let mut b = GeometryBuilder::new();
        b.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0).line_to(0.0, 10.0).close();
        b.build()
    }

    #[test]
    fn test_render_empty_scene_list() {
        let list = SceneList::new(Transform::IDENTITY);
        let buffer = Renderer::render_list(&list, &RenderConfig::default(), 1 << 20).unwrap();
        assert_eq!(buffer.bytes_used(), 0);
    }

    #[test]
    fn test_render_small_scene_produces_instances() {
        let mut scene = Scene::new();
        for _ in 0..4 {
            scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        }
        let mut list = SceneList::new(Transform::IDENTITY);
        list.push_scene(scene, Transform::IDENTITY, None);

        let config = RenderConfig::default().with_shard_count(2);
        let buffer = Renderer::render_list(&list, &config, 1 << 20).unwrap();
        assert!(buffer.bytes_used() > 0);
        assert_eq!(
            buffer
                .entries()
                .iter()
                .filter(|e| e.tag() == crate::raster::EntryTag::Instances as u8)
                .count(),
            4
        );
    }

    #[test]
    fn test_render_is_deterministic_across_shard_counts() {
        let mut scene = Scene::new();
        for _ in 0..8 {
            scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        }
        let mut list = SceneList::new(Transform::IDENTITY);
        list.push_scene(scene, Transform::IDENTITY, None);

        let c1 = RenderConfig::default().with_shard_count(1);
        let c4 = RenderConfig::default().with_shard_count(4);
        let b1 = Renderer::render_list(&list, &c1, 1 << 20).unwrap();
        let b4 = Renderer::render_list(&list, &c4, 1 << 20).unwrap();

        let instances_of = |b: &Buffer| {
            b.entries()
                .iter()
                .filter(|e| e.tag() == crate::raster::EntryTag::Instances as u8)
                .count()
        };
        assert_eq!(instances_of(&b1), instances_of(&b4));
    }
}
