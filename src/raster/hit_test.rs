//! Winding-number hit-testing (§4.10 `indicesForPoint`): which item, across
//! every scene in a [`SceneList`], covers a given device-space point — lets
//! a caller pick/tag the item under a cursor without a full render pass.

use crate::{Bounds, SceneList, Transform};

/// Crossing-number winding test (Dan Sunday's algorithm) over an already
/// flattened, closed polygon: casts a ray from `p` along `+x` and counts
/// signed crossings.
fn winding_number(p: (f32, f32), polygon: &[(f32, f32)]) -> i32 {
    if polygon.len() < 2 {
        return 0;
    }
    let mut winding = 0;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if a.1 <= p.1 {
            if b.1 > p.1 && cross(sub(b, a), sub(p, a)) > 0.0 {
                winding += 1;
            }
        } else if b.1 <= p.1 && cross(sub(b, a), sub(p, a)) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Shortest distance from `p` to segment `a..b`.
fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let ab = sub(b, a);
    let len2 = ab.0 * ab.0 + ab.1 * ab.1;
    if len2 < f32::EPSILON {
        return length(sub(p, a));
    }
    let ap = sub(p, a);
    let t = ((ap.0 * ab.0 + ap.1 * ab.1) / len2).clamp(0.0, 1.0);
    let closest = (a.0 + ab.0 * t, a.1 + ab.1 * t);
    length(sub(p, closest))
}

#[inline]
fn sub(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    (a.0 - b.0, a.1 - b.1)
}

#[inline]
fn cross(a: (f32, f32), b: (f32, f32)) -> f32 {
    a.0 * b.1 - a.1 * b.0
}

#[inline]
fn length(a: (f32, f32)) -> f32 {
    (a.0 * a.0 + a.1 * a.1).sqrt()
}

/// The sentinel returned by [`indices_for_point`] when no item covers the
/// point, matching the original's `(INT_MAX, INT_MAX)` convention.
pub const NO_HIT: (usize, usize) = (usize::MAX, usize::MAX);

fn subpaths_device_space(path: &crate::Geometry, ctm: &Transform, flatness: f32) -> Vec<Vec<(f32, f32)>> {
    let mut subpaths = Vec::new();
    let mut subpath = Vec::new();
    let mut idx = 0usize;
    let coords = path.points();
    for op in path.types() {
        match op {
            crate::Opcode::Move => {
                if subpath.len() >= 2 {
                    subpaths.push(std::mem::take(&mut subpath));
                } else {
                    subpath.clear();
                }
                subpath.push(ctm.apply(coords[idx], coords[idx + 1]));
                idx += 2;
            }
            crate::Opcode::Line | crate::Opcode::Close => {
                subpath.push(ctm.apply(coords[idx], coords[idx + 1]));
                idx += 2;
            }
            crate::Opcode::Quadratic => {
                let start = *subpath.last().unwrap();
                let ctrl = ctm.apply(coords[idx], coords[idx + 1]);
                let end = ctm.apply(coords[idx + 2], coords[idx + 3]);
                crate::clip::bisect_quadratic(start, ctrl, end, flatness, &mut subpath);
                idx += 4;
            }
            crate::Opcode::Cubic => {
                let start = *subpath.last().unwrap();
                let c1 = ctm.apply(coords[idx], coords[idx + 1]);
                let c2 = ctm.apply(coords[idx + 2], coords[idx + 3]);
                let end = ctm.apply(coords[idx + 4], coords[idx + 5]);
                crate::clip::divide_cubic(start, c1, c2, end, flatness, &mut subpath);
                idx += 6;
            }
        }
    }
    if subpath.len() >= 2 {
        subpaths.push(subpath);
    }
    subpaths
}

fn item_covers(
    subpaths: &[Vec<(f32, f32)>],
    flags: crate::scene::ItemFlags,
    width: f32,
    point: (f32, f32),
) -> bool {
    if width > 0.0 {
        let half = width * 0.5;
        return subpaths.iter().any(|sp| sp.windows(2).any(|w| distance_to_segment(point, w[0], w[1]) <= half));
    }
    let winding: i32 = subpaths.iter().map(|sp| winding_number(point, sp)).sum();
    if flags.contains(crate::scene::ItemFlags::FILL_EVEN_ODD) {
        winding % 2 != 0
    } else {
        winding != 0
    }
}

/// Walks every scene in `list` back-to-front, rejecting a scene outright
/// if `(px, py)` falls outside its clip rectangle, and returns the
/// topmost `(scene_index, item_index)` whose item covers the point, or
/// [`NO_HIT`] if none does (§4.10).
#[must_use]
pub fn indices_for_point(list: &SceneList, px: f32, py: f32) -> (usize, usize) {
    crate::trace_function!();
    let mut hit = NO_HIT;

    for scene_idx in 0..list.scenes().len() {
        if let Some(clip) = list.clip(scene_idx) {
            let ctm = list.scene_ctm(scene_idx);
            let corners = [
                ctm.apply(clip.lx, clip.ly),
                ctm.apply(clip.ux, clip.ly),
                ctm.apply(clip.ux, clip.uy),
                ctm.apply(clip.lx, clip.uy),
            ];
            let device_clip = corners.into_iter().fold(Bounds::EMPTY, |acc, (x, y)| acc.extend(x, y));
            if !device_clip.contains(px, py) {
                continue;
            }
        }

        let scene = &list.scenes()[scene_idx];
        let ctm = list.scene_ctm(scene_idx);

        for item_idx in 0..scene.len() {
            let flags = scene.flags()[item_idx];
            if flags.contains(crate::scene::ItemFlags::INVISIBLE) {
                continue;
            }
            let item_ctm = ctm.concat(&scene.ctms()[item_idx]);
            let path = &scene.paths()[item_idx];

            let device_bounds = {
                let b = path.bounds();
                let corners = [
                    item_ctm.apply(b.lx, b.ly),
                    item_ctm.apply(b.ux, b.ly),
                    item_ctm.apply(b.ux, b.uy),
                    item_ctm.apply(b.lx, b.uy),
                ];
                corners.into_iter().fold(Bounds::EMPTY, |acc, (cx, cy)| acc.extend(cx, cy))
            };
            if !device_bounds.contains(px, py) {
                continue;
            }

            let subpaths = subpaths_device_space(path, &item_ctm, 0.25);
            if item_covers(&subpaths, flags, scene.widths()[item_idx], (px, py)) {
                hit = (scene_idx, item_idx);
            }
        }
    }
    hit
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

    fn list_with(scene: Scene) -> SceneList {
        let mut list = SceneList::new(Transform::IDENTITY);
        list.push_scene(scene, Transform::IDENTITY, None);
        list
    }

    #[test]
    fn test_point_inside_square_hits() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        let list = list_with(scene);
        assert_eq!(indices_for_point(&list, 5.0, 5.0), (0, 0));
    }

    #[test]
    fn test_point_outside_square_misses() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        let list = list_with(scene);
        assert_eq!(indices_for_point(&list, 50.0, 50.0), NO_HIT);
    }

    #[test]
    fn test_invisible_item_never_hits() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::INVISIBLE, None);
        let list = list_with(scene);
        assert_eq!(indices_for_point(&list, 5.0, 5.0), NO_HIT);
    }

    #[test]
    fn test_topmost_item_wins_when_stacked() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::RED, 0.0, ItemFlags::empty(), None);
        let list = list_with(scene);
        assert_eq!(indices_for_point(&list, 5.0, 5.0), (0, 1));
    }

    #[test]
    fn test_scene_clip_rejects_point_outside_it() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 0.0, ItemFlags::empty(), None);
        let mut list = SceneList::new(Transform::IDENTITY);
        list.push_scene(scene, Transform::IDENTITY, Some(Bounds::new(0.0, 0.0, 2.0, 2.0)));
        assert_eq!(indices_for_point(&list, 5.0, 5.0), NO_HIT);
    }

    #[test]
    fn test_stroke_item_hits_near_its_edge() {
        let mut scene = Scene::new();
        scene.add_path(unit_square(), Transform::IDENTITY, Colorant::BLACK, 2.0, ItemFlags::empty(), None);
        let list = list_with(scene);
        assert_eq!(indices_for_point(&list, 0.0, 5.0), (0, 0));
        assert_eq!(indices_for_point(&list, 5.0, 5.0), NO_HIT);
    }
}
